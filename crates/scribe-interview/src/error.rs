//! Error types for the interview engine.

use scribe_core::error::ScribeError;

/// Errors from interview collaborators.
///
/// None of these reach the caller of a chat turn; the controller converts
/// them into degradation markers.
#[derive(Debug, thiserror::Error)]
pub enum InterviewError {
    #[error("model error: {0}")]
    Model(String),
    #[error("speech error: {0}")]
    Speech(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<ScribeError> for InterviewError {
    fn from(err: ScribeError) -> Self {
        InterviewError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interview_error_display() {
        let err = InterviewError::Model("quota exceeded".to_string());
        assert_eq!(err.to_string(), "model error: quota exceeded");

        let err = InterviewError::Speech("endpoint returned 503".to_string());
        assert_eq!(err.to_string(), "speech error: endpoint returned 503");

        let err = InterviewError::Storage("disk full".to_string());
        assert_eq!(err.to_string(), "storage error: disk full");
    }

    #[test]
    fn test_from_scribe_error() {
        let err: InterviewError = ScribeError::Storage("connection lost".to_string()).into();
        assert!(matches!(err, InterviewError::Storage(_)));
        assert!(err.to_string().contains("connection lost"));
    }
}
