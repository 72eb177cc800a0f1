//! Conversational interview engine for CivicScribe.
//!
//! Resolves sessions, builds the bounded model context from the transcript,
//! calls the language model once per user turn and records both sides of
//! the exchange. Every collaborator failure degrades the turn instead of
//! failing it.

pub mod context;
pub mod controller;
pub mod error;
pub mod llm;
pub mod plan;
pub mod session;
pub mod voice;

pub use context::{ContextBuilder, DEFLECTION};
pub use controller::{InterviewController, TurnOutcome};
pub use error::InterviewError;
pub use llm::{model_from_config, GeminiModel, LanguageModel, UnconfiguredModel};
pub use plan::{Topic, CONVERSATION_PLAN};
pub use session::{ResolvedSession, SessionManager, LOCAL_PREFIX};
pub use voice::{notifier_from_config, AudioNotifier, HttpSpeechNotifier, SilentNotifier};
