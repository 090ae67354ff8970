//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::Corrupted(format!("invalid {label} id")))
}

/// Parse a stored decimal string. A stored value that fails to parse is
/// corruption, not bad user input.
pub(crate) fn parse_money(value: &str, label: &str) -> ResultEngine<Money> {
    value
        .parse()
        .map_err(|_| EngineError::Corrupted(format!("invalid {label}: {value:?}")))
}

pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_description(value: &str) -> String {
    value.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_garbage_is_corruption() {
        assert!(matches!(
            parse_money("1e3", "balance"),
            Err(EngineError::Corrupted(_))
        ));
        assert!(matches!(
            parse_uuid("not-a-uuid", "account"),
            Err(EngineError::Corrupted(_))
        ));
    }

    #[test]
    fn names_are_trimmed_and_required() {
        assert_eq!(normalize_required_name("  Savings ", "account").unwrap(), "Savings");
        assert!(matches!(
            normalize_required_name("   ", "account"),
            Err(EngineError::InvalidName(_))
        ));
    }
}
