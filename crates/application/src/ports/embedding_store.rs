//! Embedding store port - durable persistence of cache entries
//!
//! The store exclusively owns all `CacheEntry` records. Lookup by key,
//! upsert, access tracking, and the removal operations backing the
//! retention policy all live behind this port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{CacheEntry, CacheKey};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for the durable embedding store
///
/// Absence of a key is the expected miss signal and is reported as
/// `Ok(None)`; any I/O failure is an `Err` and must never be mistaken
/// for a miss.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    /// Look up the entry for `key`
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, ApplicationError>;

    /// Insert or overwrite the entry
    ///
    /// Overwrite is legal (recomputation after a clear); concurrent
    /// readers never observe a partially written entry.
    async fn put(&self, entry: &CacheEntry) -> Result<(), ApplicationError>;

    /// Bump `last_accessed_at` to `at` and increment `access_count`
    ///
    /// A no-op when the key is absent.
    async fn touch(&self, key: &CacheKey, at: DateTime<Utc>) -> Result<(), ApplicationError>;

    /// Remove the entry for `key`; returns whether an entry was removed
    async fn delete(&self, key: &CacheKey) -> Result<bool, ApplicationError>;

    /// Remove every entry whose `last_accessed_at` is strictly older
    /// than `threshold`; returns the number removed
    async fn delete_older_than(&self, threshold: DateTime<Utc>) -> Result<u64, ApplicationError>;

    /// Remove all entries; returns the number removed
    async fn delete_all(&self) -> Result<u64, ApplicationError>;

    /// Number of stored entries
    async fn count(&self) -> Result<u64, ApplicationError>;

    /// All stored entries (stats/export tooling)
    async fn list_all(&self) -> Result<Vec<CacheEntry>, ApplicationError>;

    /// The `limit` oldest entries by creation time
    async fn list_oldest(&self, limit: usize) -> Result<Vec<CacheEntry>, ApplicationError>;
}
