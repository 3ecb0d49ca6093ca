//! Embedding engines
//!
//! Concrete embedding providers behind the [`EmbeddingEngine`] trait:
//! an Ollama-compatible local model server and an OpenAI-compatible
//! remote API. The active provider is chosen by configuration at
//! construction time via [`create_engine`].

pub mod config;
pub mod error;
pub mod ollama;
pub mod openai;
pub mod ports;

pub use config::{OllamaConfig, OpenAiConfig, ProviderConfig, create_engine};
pub use error::EmbeddingError;
pub use ollama::OllamaEmbeddingEngine;
pub use openai::OpenAiEmbeddingEngine;
pub use ports::EmbeddingEngine;
