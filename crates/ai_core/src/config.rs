//! Embedding provider configuration and construction
//!
//! Provider selection happens here, once, at construction time; call
//! sites only ever see the [`EmbeddingEngine`] trait.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    error::EmbeddingError, ollama::OllamaEmbeddingEngine, openai::OpenAiEmbeddingEngine,
    ports::EmbeddingEngine,
};

/// Configuration for the Ollama engine (local model server)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Model used when the caller does not specify one
    #[serde(default = "default_ollama_model")]
    pub default_model: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Known vector dimensions per model (for read validation)
    #[serde(default = "default_ollama_dimensions")]
    pub dimensions: HashMap<String, usize>,
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "nomic-embed-text".to_string()
}

const fn default_timeout_ms() -> u64 {
    30000 // 30 seconds
}

fn default_ollama_dimensions() -> HashMap<String, usize> {
    HashMap::from([
        ("nomic-embed-text".to_string(), 384),
        ("mxbai-embed-large".to_string(), 1024),
        ("bge-m3".to_string(), 1024),
    ])
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            default_model: default_ollama_model(),
            timeout_ms: default_timeout_ms(),
            dimensions: default_ollama_dimensions(),
        }
    }
}

/// Configuration for the OpenAI-compatible engine (remote API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Base URL of the API (without the `/v1` suffix)
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model used when the caller does not specify one
    #[serde(default = "default_openai_model")]
    pub default_model: String,

    /// API key; omitted requests go out unauthenticated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Known vector dimensions per model (for read validation)
    #[serde(default = "default_openai_dimensions")]
    pub dimensions: HashMap<String, usize>,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_openai_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_openai_dimensions() -> HashMap<String, usize> {
    HashMap::from([
        ("text-embedding-3-small".to_string(), 1536),
        ("text-embedding-3-large".to_string(), 3072),
        ("text-embedding-ada-002".to_string(), 1536),
    ])
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            default_model: default_openai_model(),
            api_key: None,
            timeout_ms: default_timeout_ms(),
            dimensions: default_openai_dimensions(),
        }
    }
}

/// Which embedding provider to construct
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// Local model server speaking the Ollama API
    Ollama(OllamaConfig),
    /// Remote OpenAI-compatible API
    OpenAi(OpenAiConfig),
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::Ollama(OllamaConfig::default())
    }
}

/// Construct the configured embedding engine
pub fn create_engine(config: &ProviderConfig) -> Result<Arc<dyn EmbeddingEngine>, EmbeddingError> {
    match config {
        ProviderConfig::Ollama(cfg) => Ok(Arc::new(OllamaEmbeddingEngine::new(cfg.clone())?)),
        ProviderConfig::OpenAi(cfg) => Ok(Arc::new(OpenAiEmbeddingEngine::new(cfg.clone())?)),
    }
}
