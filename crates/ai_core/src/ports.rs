//! Port definitions for embedding engines
//!
//! Defines the trait that concrete embedding providers implement.

use async_trait::async_trait;
use domain::ModelId;

use crate::error::EmbeddingError;

/// Port for embedding engine implementations
///
/// Implementations are assumed deterministic: the same `(text, model)`
/// pair always yields an equal vector, with a fixed dimension per model.
#[async_trait]
pub trait EmbeddingEngine: Send + Sync {
    /// Compute the embedding for a single text under `model`
    async fn embed(&self, text: &str, model: &ModelId) -> Result<Vec<f32>, EmbeddingError>;

    /// Check whether the backing server is reachable
    async fn health_check(&self) -> Result<bool, EmbeddingError>;

    /// The model used when callers do not specify one
    fn default_model(&self) -> &ModelId;

    /// The vector dimension for `model`, when the engine knows it
    fn dimensions(&self, model: &ModelId) -> Option<usize>;
}
