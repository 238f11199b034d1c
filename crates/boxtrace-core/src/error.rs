//! Error types for boxtrace.

use thiserror::Error;

/// Result type alias using boxtrace's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for boxtrace operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Authentication failed (bad or missing signature)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Payload failed validation (malformed body, missing required id)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Relay publish failed or timed out
    #[error("Publish error: {0}")]
    Publish(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl Error {
    /// Whether queue redelivery can plausibly succeed for this error.
    ///
    /// Authentication and validation failures are terminal: the payload will
    /// not become valid on a second delivery. Infrastructure failures
    /// (database, publish) are retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Database(_) | Error::Publish(_) | Error::Internal(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_unauthorized() {
        let err = Error::Unauthorized("invalid signature".to_string());
        assert_eq!(err.to_string(), "Unauthorized: invalid signature");
    }

    #[test]
    fn test_error_display_validation() {
        let err = Error::Validation("shipment fragment missing id".to_string());
        assert_eq!(
            err.to_string(),
            "Validation error: shipment fragment missing id"
        );
    }

    #[test]
    fn test_error_display_publish() {
        let err = Error::Publish("acknowledgment timed out".to_string());
        assert_eq!(err.to_string(), "Publish error: acknowledgment timed out");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("WEBHOOK_SECRET not set".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: WEBHOOK_SECRET not set"
        );
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_terminal_errors_are_not_retryable() {
        assert!(!Error::Unauthorized("x".into()).is_retryable());
        assert!(!Error::Validation("x".into()).is_retryable());
        assert!(!Error::Serialization("x".into()).is_retryable());
        assert!(!Error::Config("x".into()).is_retryable());
    }

    #[test]
    fn test_infrastructure_errors_are_retryable() {
        assert!(Error::Publish("timeout".into()).is_retryable());
        assert!(Error::Internal("oops".into()).is_retryable());
        assert!(Error::Database(sqlx::Error::PoolTimedOut).is_retryable());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
