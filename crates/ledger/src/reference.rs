//! Reference ids correlate the rows written by one logical operation.
//!
//! A deposit or withdrawal gets a reference of its own; both legs of a
//! transfer share one. When the caller supplies an idempotency key it
//! becomes the reference, which lets a retried call find the rows written by
//! the first attempt.

use std::fmt;

use uuid::Uuid;

use crate::{EngineError, ResultEngine};

pub const MAX_REFERENCE_LEN: usize = 255;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReferenceId {
    value: String,
    caller_supplied: bool,
}

impl ReferenceId {
    /// A fresh, globally unique reference.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            value: Uuid::new_v4().to_string(),
            caller_supplied: false,
        }
    }

    /// Use a caller-supplied idempotency key as the reference.
    pub fn from_key(key: &str) -> ResultEngine<Self> {
        let key = key.trim();
        if key.is_empty() {
            return Err(EngineError::InvalidReference(
                "idempotency key must not be empty".to_string(),
            ));
        }
        if key.len() > MAX_REFERENCE_LEN {
            return Err(EngineError::InvalidReference(format!(
                "idempotency key longer than {MAX_REFERENCE_LEN} bytes"
            )));
        }
        Ok(Self {
            value: key.to_string(),
            caller_supplied: true,
        })
    }

    /// The caller's key if present, a generated reference otherwise.
    pub fn resolve(key: Option<&str>) -> ResultEngine<Self> {
        key.map_or_else(|| Ok(Self::generate()), Self::from_key)
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Generated references are fresh, so only caller keys can collide with
    /// an earlier operation.
    pub fn is_idempotency_key(&self) -> bool {
        self.caller_supplied
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_references_are_unique() {
        let a = ReferenceId::generate();
        let b = ReferenceId::generate();
        assert_ne!(a, b);
        assert!(!a.is_idempotency_key());
    }

    #[test]
    fn caller_keys_are_validated() {
        let key = ReferenceId::resolve(Some(" order-42 ")).unwrap();
        assert_eq!(key.as_str(), "order-42");
        assert!(key.is_idempotency_key());

        assert!(matches!(
            ReferenceId::from_key("  "),
            Err(EngineError::InvalidReference(_))
        ));
        assert!(matches!(
            ReferenceId::from_key(&"k".repeat(MAX_REFERENCE_LEN + 1)),
            Err(EngineError::InvalidReference(_))
        ));
    }
}
