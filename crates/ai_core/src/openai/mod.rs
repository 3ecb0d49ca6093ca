//! OpenAI-compatible embedding engine implementation
//!
//! Computes text embeddings against a hosted `/v1/embeddings` endpoint
//! (OpenAI or any API-compatible service). The API key is taken from
//! configuration; requests without one are sent unauthenticated, which
//! compatible self-hosted servers accept.

use std::time::Duration;

use async_trait::async_trait;
use domain::ModelId;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::{config::OpenAiConfig, error::EmbeddingError, ports::EmbeddingEngine};

/// OpenAI-compatible embedding engine
#[derive(Debug)]
pub struct OpenAiEmbeddingEngine {
    client: Client,
    config: OpenAiConfig,
    default_model: ModelId,
}

impl OpenAiEmbeddingEngine {
    /// Create a new embedding engine with the given configuration
    pub fn new(config: OpenAiConfig) -> Result<Self, EmbeddingError> {
        let default_model = ModelId::parse(&config.default_model)
            .map_err(|e| EmbeddingError::Configuration(e.to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| EmbeddingError::ConnectionFailed(e.to_string()))?;

        info!(
            base_url = %config.base_url,
            default_model = %default_model,
            "Initialized OpenAI embedding engine"
        );

        Ok(Self {
            client,
            config,
            default_model,
        })
    }

    /// Build the embeddings endpoint URL
    fn embeddings_url(&self) -> String {
        format!("{}/v1/embeddings", self.config.base_url)
    }

    /// Build the model listing endpoint URL
    fn models_url(&self) -> String {
        format!("{}/v1/models", self.config.base_url)
    }

    async fn request_embedding(
        &self,
        text: &str,
        model: &ModelId,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let request = OpenAiEmbedRequest {
            model: model.as_str(),
            input: text,
        };

        debug!("Sending embeddings request");

        let mut builder = self.client.post(self.embeddings_url()).json(&request);
        if let Some(ref api_key) = self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "Failed to reach embeddings endpoint");
            EmbeddingError::from_reqwest(&e, self.config.timeout_ms)
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Embeddings request failed");
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(EmbeddingError::ModelNotAvailable(model.to_string()));
            }
            return Err(EmbeddingError::ServerError(format!(
                "API returned {status}: {error_text}"
            )));
        }

        let result: OpenAiEmbedResponse = response.json().await.map_err(|e| {
            warn!(error = %e, "Failed to parse embeddings response");
            EmbeddingError::InvalidResponse(e.to_string())
        })?;

        let embedding = result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| {
                EmbeddingError::InvalidResponse("No embedding in response".to_string())
            })?;

        debug!(dimensions = embedding.len(), "Received embedding");
        Ok(embedding)
    }
}

#[async_trait]
impl EmbeddingEngine for OpenAiEmbeddingEngine {
    #[instrument(skip(self, text), fields(model = %model, text_len = text.len()))]
    async fn embed(&self, text: &str, model: &ModelId) -> Result<Vec<f32>, EmbeddingError> {
        self.request_embedding(text, model).await
    }

    async fn health_check(&self) -> Result<bool, EmbeddingError> {
        let mut builder = self.client.get(self.models_url());
        if let Some(ref api_key) = self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| EmbeddingError::from_reqwest(&e, self.config.timeout_ms))?;
        Ok(response.status().is_success())
    }

    fn default_model(&self) -> &ModelId {
        &self.default_model
    }

    fn dimensions(&self, model: &ModelId) -> Option<usize> {
        self.config.dimensions.get(model.as_str()).copied()
    }
}

/// OpenAI embeddings request body
#[derive(Debug, Serialize)]
struct OpenAiEmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

/// One embedding in the response's data array
#[derive(Debug, Deserialize)]
struct OpenAiEmbedding {
    embedding: Vec<f32>,
}

/// OpenAI embeddings response body
#[derive(Debug, Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedding>,
}
