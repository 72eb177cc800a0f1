use thiserror::Error;

/// Top-level error type for the CivicScribe service.
///
/// Subsystem crates define their own error types and implement
/// `From<ScribeError>` so that the `?` operator works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScribeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for ScribeError {
    fn from(err: toml::de::Error) -> Self {
        ScribeError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ScribeError {
    fn from(err: toml::ser::Error) -> Self {
        ScribeError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ScribeError {
    fn from(err: serde_json::Error) -> Self {
        ScribeError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for CivicScribe operations.
pub type Result<T> = std::result::Result<T, ScribeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(ScribeError, &str)> = vec![
            (
                ScribeError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                ScribeError::Storage("disk full".to_string()),
                "Storage error: disk full",
            ),
            (
                ScribeError::Model("quota exceeded".to_string()),
                "Model error: quota exceeded",
            ),
            (
                ScribeError::Speech("endpoint down".to_string()),
                "Speech error: endpoint down",
            ),
            (
                ScribeError::Auth("expired".to_string()),
                "Authentication error: expired",
            ),
            (
                ScribeError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: ScribeError = io_err.into();
        assert!(matches!(err, ScribeError::Io(_)));
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn test_error_from_toml() {
        let toml_err = toml::from_str::<toml::Value>("not = [valid").unwrap_err();
        let err: ScribeError = toml_err.into();
        assert!(matches!(err, ScribeError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ScribeError = json_err.into();
        assert!(matches!(err, ScribeError::Serialization(_)));
    }
}
