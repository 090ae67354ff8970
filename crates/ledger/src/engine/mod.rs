use std::time::Duration;

use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction};
use serde::{Deserialize, Serialize};

use crate::{
    AtomicWork, EngineError, Money, ResultEngine, Transaction, TransactionKind, UnitOfWork,
    supports_row_locks,
};

mod accounts;
mod history;
mod movements;
mod transfer;

/// Tunables of the engine. Every field has a sensible default.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Page size used when a history request asks for `limit <= 0`.
    pub default_page_size: u64,
    pub max_page_size: u64,
    /// How many times a unit of work is re-run after losing an optimistic
    /// version check. Only used on backends without row locks.
    pub max_conflict_retries: u32,
    /// Applied to every mutating operation that carries no deadline of its own.
    pub operation_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
            max_conflict_retries: 3,
            operation_timeout: None,
        }
    }
}

/// Resulting balances of a transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    /// Shared by the debit and the credit row.
    pub reference_id: String,
    pub source_balance: Money,
    pub destination_balance: Money,
}

#[derive(Clone, Debug)]
pub struct Engine {
    database: DatabaseConnection,
    config: EngineConfig,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run `work` as one unit of work, honoring the deadline and re-running
    /// it after a lost version check when the backend has no row locks.
    async fn atomically<F, T>(
        &self,
        operation: &'static str,
        deadline: Option<Duration>,
        work: F,
    ) -> ResultEngine<T>
    where
        F: for<'c> Fn(&'c DatabaseTransaction) -> AtomicWork<'c, T> + Send + Sync,
        T: Send,
    {
        let retries = if supports_row_locks(self.database.get_database_backend()) {
            0
        } else {
            self.config.max_conflict_retries
        };
        let deadline = deadline
            .or(self.config.operation_timeout)
            .map(|limit| (limit, tokio::time::Instant::now() + limit));

        let mut attempt = 0;
        loop {
            let unit = self.database.run_atomic(&work);
            let result = match deadline {
                Some((limit, at)) => tokio::time::timeout_at(at, unit).await.map_err(|_| {
                    EngineError::Cancelled(format!("{operation} exceeded {limit:?}"))
                })?,
                None => unit.await,
            };
            match result {
                Err(EngineError::Conflict(reason)) if attempt < retries => {
                    attempt += 1;
                    tracing::warn!(operation, attempt, %reason, "version check lost, retrying");
                }
                Err(err) => {
                    tracing::debug!(operation, %err, "unit of work rolled back");
                    return Err(err);
                }
                Ok(value) => return Ok(value),
            }
        }
    }
}

/// Reject amounts that can never be valid, before any lock is taken.
fn ensure_positive(amount: Money) -> ResultEngine<()> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount(format!(
            "amount must be > 0, got {amount}"
        )));
    }
    Ok(())
}

/// Accept `existing` as an earlier run of the same operation, or reject the
/// reuse of its reference by a different one.
fn replayed(
    existing: Transaction,
    kind: TransactionKind,
    amount: Money,
) -> ResultEngine<Transaction> {
    if existing.kind != kind || existing.amount != amount {
        return Err(EngineError::DuplicateReference(existing.reference_id));
    }
    tracing::info!(
        reference_id = %existing.reference_id,
        account_id = %existing.account_id,
        "idempotent replay, nothing written"
    );
    Ok(existing)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    config: EngineConfig,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    pub fn config(mut self, config: EngineConfig) -> EngineBuilder {
        self.config = config;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        self.database.ping().await?;
        Ok(Engine {
            database: self.database,
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    use sea_orm::Database;
    use uuid::Uuid;

    use super::*;

    async fn sqlite_engine(max_conflict_retries: u32) -> Engine {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Engine::builder()
            .database(db)
            .config(EngineConfig {
                max_conflict_retries,
                ..EngineConfig::default()
            })
            .build()
            .await
            .unwrap()
    }

    /// Run a unit of work that fails with `failure` on its first `failing`
    /// attempts and succeeds afterwards.
    async fn run_counted(
        engine: &Engine,
        failing: u32,
        failure: fn() -> EngineError,
        attempts: &Arc<AtomicU32>,
    ) -> ResultEngine<u32> {
        engine
            .atomically("counted", None, move |_db_tx| {
                let attempts = Arc::clone(attempts);
                Box::pin(async move {
                    let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                    if attempt < failing {
                        return Err(failure());
                    }
                    Ok(attempt)
                })
            })
            .await
    }

    fn conflict() -> EngineError {
        EngineError::Conflict("version moved".to_string())
    }

    #[tokio::test]
    async fn conflicts_are_retried_up_to_the_limit() {
        let engine = sqlite_engine(3).await;

        let attempts = Arc::new(AtomicU32::new(0));
        let result = run_counted(&engine, 3, conflict, &attempts).await;
        assert_eq!(result, Ok(3));
        assert_eq!(attempts.load(Ordering::SeqCst), 4);

        let attempts = Arc::new(AtomicU32::new(0));
        let result = run_counted(&engine, u32::MAX, conflict, &attempts).await;
        assert_eq!(result, Err(conflict()));
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn zero_retries_reports_first_conflict() {
        let engine = sqlite_engine(0).await;
        let attempts = Arc::new(AtomicU32::new(0));
        let result = run_counted(&engine, 1, conflict, &attempts).await;
        assert_eq!(result, Err(conflict()));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn other_failures_are_not_retried() {
        let engine = sqlite_engine(3).await;
        let attempts = Arc::new(AtomicU32::new(0));
        let result = run_counted(
            &engine,
            1,
            || EngineError::InsufficientBalance("empty".to_string()),
            &attempts,
        )
        .await;
        assert!(matches!(result, Err(EngineError::InsufficientBalance(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    fn row(kind: TransactionKind, amount: &str) -> Transaction {
        Transaction::new(
            Uuid::new_v4(),
            "order-1".to_string(),
            kind,
            amount.parse().unwrap(),
            "0".parse().unwrap(),
            amount.parse().unwrap(),
            String::new(),
        )
        .unwrap()
    }

    #[test]
    fn non_positive_amounts_fail_fast() {
        assert!(ensure_positive("0.01".parse().unwrap()).is_ok());
        assert!(matches!(
            ensure_positive(Money::ZERO),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            ensure_positive("-5".parse().unwrap()),
            Err(EngineError::InvalidAmount(_))
        ));
    }

    #[test]
    fn replay_requires_same_operation() {
        let existing = row(TransactionKind::Deposit, "10");
        let same = replayed(existing.clone(), TransactionKind::Deposit, "10".parse().unwrap());
        assert_eq!(same, Ok(existing.clone()));
        assert_eq!(
            replayed(existing.clone(), TransactionKind::Deposit, "11".parse().unwrap()),
            Err(EngineError::DuplicateReference("order-1".to_string()))
        );
        assert_eq!(
            replayed(existing, TransactionKind::Withdrawal, "10".parse().unwrap()),
            Err(EngineError::DuplicateReference("order-1".to_string()))
        );
    }

    #[test]
    fn default_config_matches_history_contract() {
        let config = EngineConfig::default();
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.max_conflict_retries, 3);
        assert!(config.operation_timeout.is_none());
    }
}
