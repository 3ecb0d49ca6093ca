//! Embedding engine errors

use thiserror::Error;

/// Errors that can occur while computing embeddings
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Failed to connect to the embedding server
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request to the embedding server failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Model not found or not loaded
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Response parsing failed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Timeout while waiting for the embedding
    #[error("Embedding timeout after {0}ms")]
    Timeout(u64),

    /// Server-side error
    #[error("Server error: {0}")]
    ServerError(String),

    /// Engine configuration is invalid
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl EmbeddingError {
    /// Classify a transport error, attributing timeouts to the
    /// configured request deadline
    #[must_use]
    pub fn from_reqwest(err: &reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_ms)
        } else if err.is_connect() {
            Self::ConnectionFailed(err.to_string())
        } else {
            Self::RequestFailed(err.to_string())
        }
    }
}
