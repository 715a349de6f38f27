//! Error types for explanation access, chart routing and the dashboard lifecycle

use thiserror::Error;

/// Result type alias for explain-viz operations
pub type Result<T> = std::result::Result<T, ExplainError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum ExplainError {
    #[error("Missing data: {0}")]
    MissingData(String),

    #[error("Not supported configuration: {explanation_type}, {feature_type}")]
    UnsupportedConfiguration {
        explanation_type: String,
        feature_type: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid key: {key} (valid range 0..{len})")]
    InvalidKey { key: usize, len: usize },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Could not bind a dashboard port after {attempts} attempt(s): {reason}")]
    PortBindFailure { attempts: usize, reason: String },

    #[error("Cannot {operation} while dashboard is {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<serde_json::Error> for ExplainError {
    fn from(err: serde_json::Error) -> Self {
        ExplainError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_configuration_names_both_values() {
        let err = ExplainError::UnsupportedConfiguration {
            explanation_type: "local".to_string(),
            feature_type: "pairwise".to_string(),
        };
        assert_eq!(err.to_string(), "Not supported configuration: local, pairwise");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let err: ExplainError = io_err.into();
        assert!(matches!(err, ExplainError::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ExplainError = json_err.into();
        assert!(matches!(err, ExplainError::Serialization(_)));
    }
}
