//! ID generation and reference validation.

use ulid::Ulid;

use crate::{AppError, AppResult};

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs are:
    /// - Lexicographically sortable
    /// - Monotonically increasing within the same millisecond
    /// - Shorter than UUIDs when represented as strings
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }
}

/// Validate that a string is a well-formed entity reference.
///
/// Malformed ids are rejected with [`AppError::InvalidId`] before any
/// query is issued, so "not a valid id" and "no such entity" stay
/// distinguishable at the API boundary (400 vs 404).
pub fn validate_id(id: &str, what: &str) -> AppResult<()> {
    if Ulid::from_string(&id.to_uppercase()).is_ok() {
        Ok(())
    } else {
        Err(AppError::InvalidId(format!("invalid {what} id: {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ulid() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate();
        let id2 = id_gen.generate();

        assert_eq!(id1.len(), 26);
        assert_eq!(id2.len(), 26);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_validate_generated_id() {
        let id_gen = IdGenerator::new();
        let id = id_gen.generate();
        assert!(validate_id(&id, "video").is_ok());
    }

    #[test]
    fn test_validate_rejects_malformed() {
        assert!(validate_id("not-an-id", "video").is_err());
        assert!(validate_id("", "video").is_err());
        assert!(validate_id("123", "comment").is_err());
    }

    #[test]
    fn test_validate_error_is_invalid_id() {
        match validate_id("xyz", "tweet") {
            Err(AppError::InvalidId(msg)) => assert!(msg.contains("tweet")),
            _ => panic!("Expected InvalidId error"),
        }
    }
}
