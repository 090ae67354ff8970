//! The module contains the errors the ledger engine can return.
//!
//! Errors are kinds, not transport codes: the serving layer decides how to
//! present them. Validation errors are reported before any row lock is taken.
//!
//! - [`InvalidAmount`] for non-positive, unparsable or over-precise amounts.
//! - [`NotFound`] when an account is absent.
//! - [`InsufficientBalance`] when a debit exceeds the available balance.
//! - [`StoreFailure`] wraps the underlying database error.
//!
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`NotFound`]: EngineError::NotFound
//!  [`InsufficientBalance`]: EngineError::InsufficientBalance
//!  [`StoreFailure`]: EngineError::StoreFailure
use sea_orm::DbErr;
use thiserror::Error;

/// Ledger engine errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Account {0} is not active")]
    InactiveAccount(String),
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error("Cannot transfer to the same account")]
    SameAccount,
    #[error("Unsupported currency: {0}")]
    InvalidCurrency(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
    #[error("Reference \"{0}\" already used by a different operation")]
    DuplicateReference(String),
    #[error("Concurrent modification: {0}")]
    Conflict(String),
    #[error("Operation cancelled: {0}")]
    Cancelled(String),
    #[error("Corrupted record: {0}")]
    Corrupted(String),
    #[error(transparent)]
    StoreFailure(#[from] DbErr),
}

impl EngineError {
    /// Returns `true` when the whole operation may be safely re-attempted by
    /// the caller.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StoreFailure(_) | Self::Conflict(_) | Self::Cancelled(_)
        )
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::InactiveAccount(a), Self::InactiveAccount(b)) => a == b,
            (Self::InsufficientBalance(a), Self::InsufficientBalance(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::SameAccount, Self::SameAccount) => true,
            (Self::InvalidCurrency(a), Self::InvalidCurrency(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidReference(a), Self::InvalidReference(b)) => a == b,
            (Self::DuplicateReference(a), Self::DuplicateReference(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Cancelled(a), Self::Cancelled(b)) => a == b,
            (Self::Corrupted(a), Self::Corrupted(b)) => a == b,
            (Self::StoreFailure(a), Self::StoreFailure(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_kinds() {
        assert!(EngineError::Conflict("account".to_string()).is_retryable());
        assert!(EngineError::Cancelled("deadline".to_string()).is_retryable());
        assert!(EngineError::StoreFailure(DbErr::Custom("io".to_string())).is_retryable());
        assert!(!EngineError::SameAccount.is_retryable());
        assert!(!EngineError::InsufficientBalance("x".to_string()).is_retryable());
    }
}
