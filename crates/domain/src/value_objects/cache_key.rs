//! Composite cache lookup key

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ContentHash, ModelId};

/// Addresses one cached embedding: `(model id, content hash)`
///
/// Identical `(text, model)` pairs always produce the same key; the same
/// text under two different models produces two unrelated keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub model: ModelId,
    pub content: ContentHash,
}

impl CacheKey {
    /// Create a key from an already computed hash
    #[must_use]
    pub const fn new(model: ModelId, content: ContentHash) -> Self {
        Self { model, content }
    }

    /// Fingerprint `text` and build the key for it under `model`
    #[must_use]
    pub fn for_text(model: ModelId, text: &str) -> Self {
        Self {
            model,
            content: ContentHash::from_text(text),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.model, self.content)
    }
}
