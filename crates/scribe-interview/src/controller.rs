//! Interview controller: runs one user turn end to end.
//!
//! resolve session -> read prior transcript -> append user turn -> build
//! context -> one model call -> append agent reply -> audio notification.
//! Every collaborator failure is converted into a degradation marker.

use std::sync::Arc;

use tracing::{debug, info, warn};

use scribe_core::config::InterviewConfig;
use scribe_core::types::{Degradation, Sender, Turn};

use crate::context::ContextBuilder;
use crate::error::InterviewError;
use crate::llm::LanguageModel;
use crate::session::SessionManager;
use crate::voice::AudioNotifier;

/// Result of a single interview turn.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnOutcome {
    pub session_id: String,
    pub reply: String,
    pub audio_url: Option<String>,
    /// Components that failed while the turn still completed.
    pub degradations: Vec<Degradation>,
}

impl TurnOutcome {
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}

/// Central coordinator for interview turns.
pub struct InterviewController {
    sessions: SessionManager,
    context: ContextBuilder,
    model: Arc<dyn LanguageModel>,
    notifier: Arc<dyn AudioNotifier>,
    fallback_reply: String,
}

impl InterviewController {
    pub fn new(
        sessions: SessionManager,
        model: Arc<dyn LanguageModel>,
        notifier: Arc<dyn AudioNotifier>,
        config: &InterviewConfig,
    ) -> Self {
        let context = ContextBuilder::new(config.context_turns, sessions.form_type());
        Self {
            sessions,
            context,
            model,
            notifier,
            fallback_reply: config.fallback_reply.clone(),
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Handle one user message and produce the agent's reply.
    ///
    /// Never fails: store, model and audio failures yield degraded outcomes.
    pub async fn handle_turn(
        &self,
        user_id: &str,
        message: &str,
        supplied_session: Option<&str>,
    ) -> TurnOutcome {
        let resolved = self.sessions.resolve_or_create(user_id, supplied_session);
        let mut degradations = resolved.degradations;
        let session_id = resolved.value.id;

        let history = if resolved.value.created {
            Vec::new()
        } else {
            match self.sessions.transcript(&session_id) {
                Ok(turns) => turns,
                Err(e) => {
                    warn!(
                        session_id = %session_id,
                        error = %e,
                        "Failed to read transcript, continuing without history"
                    );
                    mark(&mut degradations, Degradation::StoreUnavailable);
                    Vec::new()
                }
            }
        };

        if let Some(d) = self.sessions.append(&session_id, Sender::User, message) {
            mark(&mut degradations, d);
        }

        let ctx = self.context.build(&history, message);
        let reply = match self.model.generate(&ctx).await {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    model = self.model.name(),
                    error = %e,
                    "Model call failed, using fallback reply"
                );
                mark(&mut degradations, Degradation::ModelUnavailable);
                self.fallback_reply.clone()
            }
        };

        if let Some(d) = self.sessions.append(&session_id, Sender::Agent, &reply) {
            mark(&mut degradations, d);
        }

        let audio_url = match self.notifier.notify(&reply).await {
            Ok(url) => url,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Audio notification failed");
                mark(&mut degradations, Degradation::AudioUnavailable);
                None
            }
        };

        if degradations.is_empty() {
            debug!(session_id = %session_id, turns = history.len() + 2, "Turn complete");
        } else {
            info!(
                session_id = %session_id,
                degradations = ?degradations,
                "Turn completed degraded"
            );
        }

        TurnOutcome {
            session_id,
            reply,
            audio_url,
            degradations,
        }
    }

    /// Full transcript of a session, for extraction and rendering.
    pub fn transcript(&self, session_id: &str) -> Result<Vec<Turn>, InterviewError> {
        Ok(self.sessions.transcript(session_id)?)
    }
}

fn mark(degradations: &mut Vec<Degradation>, d: Degradation) {
    if !degradations.contains(&d) {
        degradations.push(d);
    }
}
