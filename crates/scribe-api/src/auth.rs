//! API authentication via bearer tokens.
//!
//! A verifier maps `Authorization: Bearer <token>` to a verified subject.
//! The middleware rejects the request with 401 before any handler runs, or
//! inserts the `VerifiedSubject` into the request extensions.

use std::collections::HashMap;
use std::path::Path;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use rand::Rng;

use scribe_core::config::AuthConfig;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    Missing,
    #[error("Malformed Authorization header")]
    Malformed,
    #[error("Invalid bearer token")]
    Rejected,
}

/// The identity a request was authenticated as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedSubject(pub String);

impl VerifiedSubject {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Verifies a bearer token.
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<VerifiedSubject, AuthError>;
}

/// Verifier backed by a fixed token -> subject table.
#[derive(Debug, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    pub fn new<I, T, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, S)>,
        T: Into<String>,
        S: Into<String>,
    {
        Self {
            tokens: pairs
                .into_iter()
                .map(|(t, s)| (t.into(), s.into()))
                .collect(),
        }
    }

    /// Build from configuration.
    ///
    /// With no configured tokens, a single local token is loaded from (or
    /// generated into) the token file and bound to the local subject.
    pub fn from_config(config: &AuthConfig, data_dir: &Path) -> Self {
        if !config.tokens.is_empty() {
            tracing::info!(count = config.tokens.len(), "Loaded configured API tokens");
            return Self::new(
                config
                    .tokens
                    .iter()
                    .map(|t| (t.token.clone(), t.subject.clone())),
            );
        }
        let token = load_or_generate_token(&data_dir.join(&config.token_file));
        Self::new([(token, config.local_subject.clone())])
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl IdentityVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Result<VerifiedSubject, AuthError> {
        if token.is_empty() {
            return Err(AuthError::Malformed);
        }
        self.tokens
            .get(token)
            .map(|subject| VerifiedSubject(subject.clone()))
            .ok_or(AuthError::Rejected)
    }
}

/// Generate a random 32-character hex token.
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    hex::encode(bytes)
}

/// Load token from file, or generate and save a new one.
pub fn load_or_generate_token(token_path: &Path) -> String {
    if let Ok(contents) = std::fs::read_to_string(token_path) {
        let token = contents.trim().to_string();
        if !token.is_empty() {
            tracing::info!("API token loaded from {}", token_path.display());
            return token;
        }
    }

    let token = generate_token();

    if let Some(parent) = token_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = std::fs::write(token_path, &token) {
        tracing::warn!(error = %e, "Failed to save API token to {}", token_path.display());
    } else {
        // Owner-only access.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(token_path, std::fs::Permissions::from_mode(0o600));
        }
        tracing::info!("API token saved to {}", token_path.display());
    }

    token
}

/// Extract the bearer token from an `Authorization` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::Missing)?;
    let (scheme, token) = value.split_once(' ').ok_or(AuthError::Malformed)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::Malformed);
    }
    Ok(token.trim())
}

/// Middleware that validates bearer token authentication.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let header = match req.headers().get("authorization") {
        Some(value) => match value.to_str() {
            Ok(s) => Some(s),
            Err(_) => return ApiError::from(AuthError::Malformed).into_response(),
        },
        None => None,
    };

    let subject = match bearer_token(header).and_then(|t| state.verifier.verify(t)) {
        Ok(subject) => subject,
        Err(e) => {
            tracing::debug!(reason = %e, "Rejected request");
            return ApiError::from(e).into_response();
        }
    };

    req.extensions_mut().insert(subject);
    next.run(req).await
}
