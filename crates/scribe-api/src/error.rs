//! API error types and JSON error response formatting.
//!
//! Only authentication and not-found failures carry a specific message to
//! the caller; bad input and internal failures collapse to generic bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use scribe_interview::InterviewError;

use crate::auth::AuthError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "unauthorized", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 401 Unauthorized - missing or rejected credential.
    Unauthorized(String),
    /// 400 Bad Request - the body could not be parsed. Detail is logged only.
    BadRequest(String),
    /// 404 Not Found - resource does not exist.
    NotFound(String),
    /// 500 Internal Server Error. Detail is logged only.
    Internal(String),
}

pub const BAD_REQUEST_MESSAGE: &str = "The request could not be processed.";
pub const INTERNAL_MESSAGE: &str = "An internal error occurred.";

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::BadRequest(detail) => {
                tracing::debug!(detail = %detail, "Rejected request body");
                (
                    StatusCode::BAD_REQUEST,
                    "bad_request",
                    BAD_REQUEST_MESSAGE.to_string(),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    INTERNAL_MESSAGE.to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl From<InterviewError> for ApiError {
    fn from(err: InterviewError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
