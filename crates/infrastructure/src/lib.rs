//! Infrastructure layer for the embedding cache
//!
//! Provides the SQLite-backed store, application configuration, and the
//! adapter binding an embedding engine to the application's provider port.

pub mod adapters;
pub mod config;
pub mod persistence;

pub use adapters::EngineProviderAdapter;
pub use config::{AppConfig, CacheConfig, DatabaseConfig};
pub use persistence::{SqliteEmbeddingStore, StoreOpenError};
