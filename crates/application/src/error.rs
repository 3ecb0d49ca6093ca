//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The embedding provider call failed (network, model, timeout)
    #[error("Embedding provider error: {0}")]
    Provider(String),

    /// The backing store could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_error_is_transparent() {
        let err = ApplicationError::from(DomainError::EmptyText);
        assert_eq!(err.to_string(), "Cannot embed empty text");
    }

    #[test]
    fn provider_error_message() {
        let err = ApplicationError::Provider("connection refused".to_string());
        assert_eq!(
            err.to_string(),
            "Embedding provider error: connection refused"
        );
    }

    #[test]
    fn storage_error_message() {
        let err = ApplicationError::Storage("disk I/O error".to_string());
        assert_eq!(err.to_string(), "Storage error: disk I/O error");
    }
}
