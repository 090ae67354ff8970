//! Wallet ledger engine.
//!
//! The [`Engine`] is the only component allowed to change account balances.
//! Every deposit, withdrawal and transfer runs as one unit of work against
//! the store: the affected account rows are read under an exclusive row lock,
//! balances are updated and the matching history rows are appended, then
//! everything commits or nothing does.
//!
//! ```no_run
//! # async fn run(db: sea_orm::DatabaseConnection) -> Result<(), ledger::EngineError> {
//! use ledger::{Currency, DepositCmd, Engine, TransferCmd};
//! use uuid::Uuid;
//!
//! let engine = Engine::builder().database(db).build().await?;
//! let owner = Uuid::new_v4();
//! let alice = engine.open_account(owner, "Main", Currency::Idr).await?;
//! let bob = engine.open_account(owner, "Savings", Currency::Idr).await?;
//!
//! engine
//!     .deposit(DepositCmd::new(alice.id, "200000".parse()?).description("salary"))
//!     .await?;
//! let moved = engine
//!     .transfer(TransferCmd::new(alice.id, bob.id, "100000".parse()?))
//!     .await?;
//! assert_eq!(moved.source_balance.to_string(), "100000");
//! # Ok(())
//! # }
//! ```

pub use accounts::{Account, AccountStatus};
pub use commands::{DepositCmd, MovementCmd, TransferCmd, WithdrawCmd};
pub use currency::Currency;
pub use engine::{Engine, EngineBuilder, EngineConfig, TransferOutcome};
pub use error::EngineError;
pub use money::Money;
pub use reference::ReferenceId;
pub use store::{AccountStore, AtomicWork, TransactionStore, UnitOfWork, supports_row_locks};
pub use transactions::{Transaction, TransactionKind};

pub mod accounts;
mod commands;
mod currency;
mod engine;
mod error;
mod money;
mod reference;
mod store;
pub mod transactions;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
