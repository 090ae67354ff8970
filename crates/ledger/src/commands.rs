//! Command structs for engine operations.
//!
//! These types group parameters for the money-moving operations, keeping
//! call sites readable and avoiding long argument lists.

use std::time::Duration;

use uuid::Uuid;

use crate::Money;

/// Single-account balance change (deposit or withdrawal).
#[derive(Clone, Debug)]
pub struct MovementCmd {
    pub account_id: Uuid,
    pub amount: Money,
    pub description: String,
    /// Stable key from the caller; reused as the reference id so a retried
    /// call is recognized instead of applied twice.
    pub idempotency_key: Option<String>,
    /// Upper bound for the whole unit of work, lock waits included.
    pub deadline: Option<Duration>,
}

pub type DepositCmd = MovementCmd;
pub type WithdrawCmd = MovementCmd;

impl MovementCmd {
    #[must_use]
    pub fn new(account_id: Uuid, amount: Money) -> Self {
        Self {
            account_id,
            amount,
            description: String::new(),
            idempotency_key: None,
            deadline: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Move money between two accounts of the same currency.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: Money,
    pub description: String,
    pub idempotency_key: Option<String>,
    pub deadline: Option<Duration>,
}

impl TransferCmd {
    #[must_use]
    pub fn new(from_account_id: Uuid, to_account_id: Uuid, amount: Money) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount,
            description: String::new(),
            idempotency_key: None,
            deadline: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}
