//! Application services

mod embedding_cache_service;

pub use embedding_cache_service::{CacheReport, EmbeddingCacheService};
