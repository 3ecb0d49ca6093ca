//! Content fingerprinting for cache lookups

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Length of the hex-encoded blake3 digest
const HASH_HEX_LEN: usize = 64;

/// Fixed-length fingerprint of a piece of input text
///
/// The digest is deterministic across processes and machines (no seeding),
/// so the same text always maps to the same stored entry. Input is hashed
/// verbatim; callers are responsible for consistent encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Fingerprint a piece of text
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self(blake3::hash(text.as_bytes()).to_hex().to_string())
    }

    /// Parse a previously computed hash from its hex representation
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a 64-character lowercase
    /// hex digest.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let is_lower_hex = s
            .bytes()
            .all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase());
        if s.len() != HASH_HEX_LEN || !is_lower_hex {
            return Err(DomainError::InvalidContentHash(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Get the hash as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn from_text_is_deterministic() {
        let a = ContentHash::from_text("hello world");
        let b = ContentHash::from_text("hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn from_text_differs_for_different_inputs() {
        let a = ContentHash::from_text("hello");
        let b = ContentHash::from_text("world");
        assert_ne!(a, b);
    }

    #[test]
    fn from_text_has_fixed_length() {
        assert_eq!(ContentHash::from_text("").as_str().len(), HASH_HEX_LEN);
        assert_eq!(ContentHash::from_text("x").as_str().len(), HASH_HEX_LEN);
        let long = "a".repeat(100_000);
        assert_eq!(ContentHash::from_text(&long).as_str().len(), HASH_HEX_LEN);
    }

    #[test]
    fn from_text_is_case_sensitive() {
        assert_ne!(
            ContentHash::from_text("Hello"),
            ContentHash::from_text("hello")
        );
    }

    #[test]
    fn parse_roundtrips() {
        let hash = ContentHash::from_text("some text");
        let parsed = ContentHash::parse(hash.as_str()).unwrap();
        assert_eq!(hash, parsed);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!(ContentHash::parse("abc123").is_err());
        assert!(ContentHash::parse("").is_err());
    }

    #[test]
    fn parse_rejects_non_hex() {
        let bad = "g".repeat(HASH_HEX_LEN);
        assert!(ContentHash::parse(&bad).is_err());
    }

    #[test]
    fn parse_rejects_uppercase() {
        let upper = ContentHash::from_text("x").as_str().to_uppercase();
        assert!(ContentHash::parse(&upper).is_err());
    }

    proptest! {
        #[test]
        fn any_text_produces_parseable_hash(text in ".*") {
            let hash = ContentHash::from_text(&text);
            prop_assert!(ContentHash::parse(hash.as_str()).is_ok());
        }

        #[test]
        fn distinct_texts_do_not_collide(a in "[a-z]{1,32}", b in "[a-z]{1,32}") {
            prop_assume!(a != b);
            prop_assert_ne!(ContentHash::from_text(&a), ContentHash::from_text(&b));
        }
    }
}
