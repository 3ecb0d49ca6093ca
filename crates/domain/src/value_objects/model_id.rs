//! Embedding model identifier

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Identifies an embedding model (and implicitly its version and dimension)
///
/// Vectors produced by different models are never interchangeable, so the
/// model id is part of every cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    /// Parse a model id from a string
    ///
    /// # Errors
    ///
    /// Returns an error if the string is empty or whitespace-only.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidModelId(s.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the model id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ModelId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_normal_names() {
        let id = ModelId::parse("nomic-embed-text").unwrap();
        assert_eq!(id.as_str(), "nomic-embed-text");
    }

    #[test]
    fn parse_trims_whitespace() {
        let id = ModelId::parse("  bge-m3  ").unwrap();
        assert_eq!(id.as_str(), "bge-m3");
    }

    #[test]
    fn parse_rejects_empty() {
        assert!(ModelId::parse("").is_err());
        assert!(ModelId::parse("   ").is_err());
    }

    #[test]
    fn display_format() {
        let id = ModelId::parse("text-embedding-3-small").unwrap();
        assert_eq!(id.to_string(), "text-embedding-3-small");
    }

    #[test]
    fn equality_and_hash() {
        use std::collections::HashSet;
        let a = ModelId::parse("m1").unwrap();
        let b = ModelId::parse("m1").unwrap();
        assert_eq!(a, b);
        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn serialize_is_transparent() {
        let id = ModelId::parse("m1").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"m1\"");
        let back: ModelId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
