//! Ollama embedding engine implementation
//!
//! Computes text embeddings against an Ollama-compatible model server
//! (nomic-embed-text, mxbai-embed-large, bge-m3, ...) via `/api/embed`.

use std::time::Duration;

use async_trait::async_trait;
use domain::ModelId;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::{config::OllamaConfig, error::EmbeddingError, ports::EmbeddingEngine};

/// Ollama-compatible embedding engine
#[derive(Debug)]
pub struct OllamaEmbeddingEngine {
    client: Client,
    config: OllamaConfig,
    default_model: ModelId,
}

impl OllamaEmbeddingEngine {
    /// Create a new embedding engine with the given configuration
    pub fn new(config: OllamaConfig) -> Result<Self, EmbeddingError> {
        let default_model = ModelId::parse(&config.default_model)
            .map_err(|e| EmbeddingError::Configuration(e.to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| EmbeddingError::ConnectionFailed(e.to_string()))?;

        info!(
            base_url = %config.base_url,
            default_model = %default_model,
            "Initialized Ollama embedding engine"
        );

        Ok(Self {
            client,
            config,
            default_model,
        })
    }

    /// Build the API URL for the embed endpoint
    fn embed_url(&self) -> String {
        format!("{}/api/embed", self.config.base_url)
    }

    /// Build the API URL for the model listing endpoint
    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.config.base_url)
    }

    async fn request_embedding(
        &self,
        text: &str,
        model: &ModelId,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let request = OllamaEmbedRequest {
            model: model.as_str(),
            input: text,
        };

        debug!("Sending embed request to Ollama");

        let response = self
            .client
            .post(self.embed_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to connect to Ollama server");
                EmbeddingError::from_reqwest(&e, self.config.timeout_ms)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Ollama embed request failed");
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(EmbeddingError::ModelNotAvailable(model.to_string()));
            }
            return Err(EmbeddingError::ServerError(format!(
                "Ollama returned {status}: {error_text}"
            )));
        }

        let result: OllamaEmbedResponse = response.json().await.map_err(|e| {
            warn!(error = %e, "Failed to parse Ollama response");
            EmbeddingError::InvalidResponse(e.to_string())
        })?;

        // Newer servers answer with `embeddings`, older ones with `embedding`.
        let embedding = match result.embeddings {
            Some(mut embeddings) if !embeddings.is_empty() => embeddings.swap_remove(0),
            _ => result.embedding.ok_or_else(|| {
                EmbeddingError::InvalidResponse("No embedding in response".to_string())
            })?,
        };

        debug!(dimensions = embedding.len(), "Received embedding from Ollama");
        Ok(embedding)
    }
}

#[async_trait]
impl EmbeddingEngine for OllamaEmbeddingEngine {
    #[instrument(skip(self, text), fields(model = %model, text_len = text.len()))]
    async fn embed(&self, text: &str, model: &ModelId) -> Result<Vec<f32>, EmbeddingError> {
        self.request_embedding(text, model).await
    }

    async fn health_check(&self) -> Result<bool, EmbeddingError> {
        let response = self
            .client
            .get(self.tags_url())
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

/// Ollama embed request format
#[derive(Debug, Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

/// Ollama embed response format
#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    /// Single embedding (older API format)
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    /// Multiple embeddings (newer API format)
    #[serde(default)]
    embeddings: Option<Vec<Vec<f32>>>,
}
