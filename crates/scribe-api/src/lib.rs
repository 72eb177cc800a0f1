//! Scribe API crate - axum HTTP server and route handlers.
//!
//! Exposes the interview turn endpoint, the filled-document download, a
//! record preview and the liveness check. Protected routes require a
//! bearer token resolved to a verified subject.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::{AuthError, IdentityVerifier, StaticTokenVerifier, VerifiedSubject};
pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
