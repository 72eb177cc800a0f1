//! Route handler functions for all API endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use scribe_core::types::{Degradation, Turn};
use scribe_form::FormRecord;

use crate::auth::VerifiedSubject;
use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    /// Components that failed while the turn still completed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<Degradation>,
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub session_id: String,
    pub filled: usize,
    pub fields: FormRecord,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub storage_backend: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET / and GET /health - liveness check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        storage_backend: state.controller.sessions().backend_name().to_string(),
    })
}

/// POST /chat - run one interview turn.
pub async fn chat(
    State(state): State<AppState>,
    Extension(subject): Extension<VerifiedSubject>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let (user_id, user_degradation) = resolve_user(&state, &subject);
    let outcome = state
        .controller
        .handle_turn(&user_id, &req.message, req.session_id.as_deref())
        .await;

    let mut degraded = Vec::with_capacity(outcome.degradations.len() + 1);
    degraded.extend(user_degradation);
    degraded.extend(outcome.degradations);

    Ok(Json(ChatResponse {
        reply: outcome.reply,
        session_id: outcome.session_id,
        audio_url: outcome.audio_url,
        degraded,
    }))
}

/// POST /download - render the session's record as a PDF attachment.
pub async fn download(
    State(state): State<AppState>,
    Extension(_subject): Extension<VerifiedSubject>,
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let transcript = load_transcript(&state, &req.session_id)?;

    let record = state.extractor.extract(&transcript);
    let bytes = state
        .renderer
        .render(&record)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    tracing::info!(
        session_id = %req.session_id,
        filled = record.filled_count(),
        size = bytes.len(),
        "Document rendered"
    );

    let disposition = format!(
        "attachment; filename=\"{}\"",
        state.config.interview.download_filename
    );
    let disposition = HeaderValue::from_str(&disposition)
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// POST /record - the extracted record as JSON, for review before download.
pub async fn record(
    State(state): State<AppState>,
    Extension(_subject): Extension<VerifiedSubject>,
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<Json<RecordResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let transcript = load_transcript(&state, &req.session_id)?;
    let fields = state.extractor.extract(&transcript);

    Ok(Json(RecordResponse {
        session_id: req.session_id,
        filled: fields.filled_count(),
        fields,
    }))
}

// =============================================================================
// Helpers
// =============================================================================

/// Map the verified subject to a user id, falling back to the subject itself.
fn resolve_user(state: &AppState, subject: &VerifiedSubject) -> (String, Option<Degradation>) {
    match state.users.get_or_create_user(subject.as_str()) {
        Ok(user_id) => (user_id, None),
        Err(e) => {
            tracing::warn!(
                subject = %subject.as_str(),
                error = %e,
                "User directory unavailable, using subject as user id"
            );
            (
                subject.as_str().to_string(),
                Some(Degradation::UserDirectoryUnavailable),
            )
        }
    }
}

/// Read a transcript, treating an empty one as not found.
fn load_transcript(state: &AppState, session_id: &str) -> Result<Vec<Turn>, ApiError> {
    let transcript = state.controller.transcript(session_id)?;
    if transcript.is_empty() {
        return Err(ApiError::NotFound(
            "No conversation found for this session".to_string(),
        ));
    }
    Ok(transcript)
}
