//! Cached embedding entry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::CacheKey;

/// One memoized embedding, owned exclusively by the store
///
/// Created on the first miss for its key. `last_accessed_at` and
/// `access_count` move forward on every subsequent hit; the entry is
/// destroyed only by an explicit cleanup or clear operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub vector: Vec<f32>,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub access_count: u64,
}

impl CacheEntry {
    /// Create a fresh entry for a vector computed at `now`
    #[must_use]
    pub fn new(key: CacheKey, vector: Vec<f32>, now: DateTime<Utc>) -> Self {
        Self {
            key,
            vector,
            created_at: now,
            last_accessed_at: now,
            access_count: 0,
        }
    }

    /// Set the creation timestamp (used when rehydrating from storage)
    #[must_use]
    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    /// Set the last-access timestamp
    #[must_use]
    pub fn with_last_accessed_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_accessed_at = at;
        self
    }

    /// Set the access count
    #[must_use]
    pub const fn with_access_count(mut self, count: u64) -> Self {
        self.access_count = count;
        self
    }

    /// Number of dimensions in the stored vector
    #[must_use]
    pub const fn dimensions(&self) -> usize {
        self.vector.len()
    }
}
