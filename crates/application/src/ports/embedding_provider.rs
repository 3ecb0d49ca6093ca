//! Embedding provider port - Interface for computing vector embeddings
//!
//! The cache treats the provider as a pure, deterministic, but expensive
//! function of `(text, model)`. The call may block on network or model
//! inference and may fail; timeout policy belongs to the implementation,
//! not to the cache.

use async_trait::async_trait;
use domain::ModelId;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for computing text embeddings
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Compute the embedding vector for `text` under `model`
    ///
    /// Deterministic for a given `(text, model)` pair: repeated calls
    /// return equal vectors.
    async fn embed(&self, text: &str, model: &ModelId) -> Result<Vec<f32>, ApplicationError>;

    /// The vector dimension this provider produces for `model`, if known
    ///
    /// Used to validate stored vectors on read. `None` means the
    /// dimension is established by the first computed vector.
    fn dimensions(&self, model: &ModelId) -> Option<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider;

    #[async_trait]
    impl EmbeddingProvider for FixedProvider {
        async fn embed(
            &self,
            _text: &str,
            _model: &ModelId,
        ) -> Result<Vec<f32>, ApplicationError> {
            Ok(vec![0.1, 0.2, 0.3])
        }

        fn dimensions(&self, _model: &ModelId) -> Option<usize> {
            Some(3)
        }
    }

    #[tokio::test]
    async fn provider_returns_declared_dimension() {
        let provider = FixedProvider;
        let model = ModelId::parse("m1").unwrap();
        let vector = provider.embed("hello", &model).await.unwrap();
        assert_eq!(Some(vector.len()), provider.dimensions(&model));
    }

    #[tokio::test]
    async fn mock_provider_can_fail() {
        let mut mock = MockEmbeddingProvider::new();
        mock.expect_embed()
            .returning(|_, _| Err(ApplicationError::Provider("model unavailable".to_string())));
        let model = ModelId::parse("m1").unwrap();
        let result = mock.embed("hello", &model).await;
        assert!(result.is_err());
    }
}
