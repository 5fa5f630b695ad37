use serde_json::json;
use thiserror::Error;

use crate::query::formatter::Envelope;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Detail lookup by an id the repository does not know
    #[error("Entry not found: {0}")]
    NotFound(String),
    /// Unknown maintenance action, missing confirmation, bad argument value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Storage collaborator not reachable or failing
    #[error("Storage unavailable: {0}")]
    UpstreamUnavailable(String),
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AppError {
    /// Render the error as a well-formed error envelope
    pub fn to_envelope(&self) -> Envelope {
        Envelope::error(
            self.to_string(),
            json!({
                "error": {
                    "message": self.to_string(),
                    "type": error_type_name(self),
                }
            }),
        )
    }
}

pub fn error_type_name(error: &AppError) -> &'static str {
    match error {
        AppError::NotFound(_) => "not_found",
        AppError::InvalidArgument(_) => "invalid_argument",
        AppError::UpstreamUnavailable(_) => "upstream_unavailable",
        AppError::ConfigError(_) => "config_error",
        AppError::InternalError(_) => "internal_error",
    }
}

// Implement conversions from common error types
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::UpstreamUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::InternalError(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = AppError::NotFound("abc-123".to_string());
        assert_eq!(error.to_string(), "Entry not found: abc-123");
    }

    #[test]
    fn test_error_type_name() {
        assert_eq!(
            error_type_name(&AppError::InvalidArgument("test".to_string())),
            "invalid_argument"
        );
        assert_eq!(
            error_type_name(&AppError::UpstreamUnavailable("test".to_string())),
            "upstream_unavailable"
        );
    }

    #[test]
    fn test_error_envelope() {
        let envelope = AppError::InvalidArgument("Unknown action: vacuum".to_string()).to_envelope();
        assert!(envelope.is_error);
        assert_eq!(envelope.text(), "Error: Invalid argument: Unknown action: vacuum");

        let data = envelope.data.unwrap();
        assert_eq!(data["error"]["type"], "invalid_argument");
    }
}
