//! Engine provider adapter - binds an embedding engine to the
//! application's provider port
//!
//! The engine crate has its own error taxonomy; everything it can fail
//! with surfaces to the cache as a provider failure, unchanged in
//! content.

use std::sync::Arc;

use ai_core::EmbeddingEngine;
use application::{error::ApplicationError, ports::EmbeddingProvider};
use async_trait::async_trait;
use domain::ModelId;
use tracing::instrument;

/// Adapter exposing an [`EmbeddingEngine`] as an [`EmbeddingProvider`]
#[derive(Clone)]
pub struct EngineProviderAdapter {
    engine: Arc<dyn EmbeddingEngine>,
}

impl std::fmt::Debug for EngineProviderAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineProviderAdapter")
            .field("default_model", &self.engine.default_model())
            .finish_non_exhaustive()
    }
}

impl EngineProviderAdapter {
    /// Wrap an embedding engine
    #[must_use]
    pub fn new(engine: Arc<dyn EmbeddingEngine>) -> Self {
        Self { engine }
    }

    /// The engine's default model
    #[must_use]
    pub fn default_model(&self) -> &ModelId {
        self.engine.default_model()
    }
}

#[async_trait]
impl EmbeddingProvider for EngineProviderAdapter {
    #[instrument(skip(self, text), fields(model = %model))]
    async fn embed(&self, text: &str, model: &ModelId) -> Result<Vec<f32>, ApplicationError> {
        self.engine
            .embed(text, model)
            .await
            .map_err(|e| ApplicationError::Provider(e.to_string()))
    }

    fn dimensions(&self, model: &ModelId) -> Option<usize> {
        self.engine.dimensions(model)
    }
}

#[cfg(test)]
mod tests {
    use ai_core::EmbeddingError;

    use super::*;

    #[derive(Debug)]
    struct StubEngine {
        fail: bool,
        default_model: ModelId,
    }

    impl StubEngine {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                default_model: ModelId::parse("stub-model").unwrap(),
            }
        }
    }

    #[async_trait]
    impl EmbeddingEngine for StubEngine {
        async fn embed(&self, _text: &str, model: &ModelId) -> Result<Vec<f32>, EmbeddingError> {
            if self.fail {
                Err(EmbeddingError::ModelNotAvailable(model.to_string()))
            } else {
                Ok(vec![1.0, 2.0, 3.0])
            }
        }

        async fn health_check(&self) -> Result<bool, EmbeddingError> {
            Ok(!self.fail)
        }

        fn default_model(&self) -> &ModelId {
            &self.default_model
        }

        fn dimensions(&self, _model: &ModelId) -> Option<usize> {
            Some(3)
        }
    }

    #[tokio::test]
    async fn successful_embed_passes_through() {
        let adapter = EngineProviderAdapter::new(Arc::new(StubEngine::new(false)));
        let model = ModelId::parse("m1").unwrap();

        let vector = adapter.embed("hello", &model).await.unwrap();
        assert_eq!(vector, vec![1.0, 2.0, 3.0]);
        assert_eq!(adapter.dimensions(&model), Some(3));
    }

    #[tokio::test]
    async fn engine_failure_becomes_provider_error() {
        let adapter = EngineProviderAdapter::new(Arc::new(StubEngine::new(true)));
        let model = ModelId::parse("m1").unwrap();

        let result = adapter.embed("hello", &model).await;
        match result {
            Err(ApplicationError::Provider(msg)) => assert!(msg.contains("m1")),
            _ => unreachable!("expected provider error"),
        }
    }

    #[test]
    fn default_model_is_exposed() {
        let adapter = EngineProviderAdapter::new(Arc::new(StubEngine::new(false)));
        assert_eq!(adapter.default_model().as_str(), "stub-model");
    }
}
