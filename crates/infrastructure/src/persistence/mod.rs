//! Persistence layer
//!
//! The SQLite-backed embedding store and its schema migrations. The
//! store owns its connection pool; [`SqliteEmbeddingStore::open`] is the
//! only way a deployment obtains one.

mod embedding_store;
pub mod migrations;

pub use embedding_store::SqliteEmbeddingStore;

use thiserror::Error;

/// Errors opening or migrating the embedding store
#[derive(Debug, Error)]
pub enum StoreOpenError {
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Could not create database directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },
}
