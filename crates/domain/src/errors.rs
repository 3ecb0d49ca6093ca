//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// Model identifier is empty or malformed
    #[error("Invalid model id: {0}")]
    InvalidModelId(String),

    /// Content hash string is not a valid digest
    #[error("Invalid content hash: {0}")]
    InvalidContentHash(String),

    /// Input text is empty or whitespace-only
    #[error("Cannot embed empty text")]
    EmptyText,

    /// A stored vector's length disagrees with the recorded dimension
    #[error("Dimension mismatch for model {model}: expected {expected}, got {actual}")]
    DimensionMismatch {
        model: String,
        expected: usize,
        actual: usize,
    },
}

impl DomainError {
    /// Create a dimension mismatch error
    pub fn dimension_mismatch(model: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            model: model.into(),
            expected,
            actual,
        }
    }
}
