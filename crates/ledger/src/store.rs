//! Narrow store interfaces consumed by the engine.
//!
//! The traits are implemented for every sea-orm connection, so the handle a
//! unit of work hands out (`&DatabaseTransaction`) *is* the store for the
//! duration of that unit of work. Calls made through it commit or roll back
//! together.

use std::{future::Future, pin::Pin};

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseTransaction, DbBackend, QueryFilter, QueryOrder,
    QuerySelect, TransactionError, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{Account, EngineError, ResultEngine, Transaction, accounts, transactions};

/// Boxed body of a unit of work, borrowing the open database transaction.
pub type AtomicWork<'c, T> = Pin<Box<dyn Future<Output = ResultEngine<T>> + Send + 'c>>;

/// Whether `backend` honors `SELECT ... FOR UPDATE`.
///
/// SQLite has no row locks (sea-query drops the clause); there the version
/// check in [`AccountStore::update`] is what detects a lost update.
pub fn supports_row_locks(backend: DbBackend) -> bool {
    !matches!(backend, DbBackend::Sqlite)
}

#[async_trait]
pub trait AccountStore {
    /// Read an account holding an exclusive row lock until the surrounding
    /// unit of work ends.
    async fn locked_find_by_id(&self, id: Uuid) -> ResultEngine<Account>;

    async fn find_by_id(&self, id: Uuid) -> ResultEngine<Account>;

    /// Accounts of `owner_id`, oldest first.
    async fn find_by_owner(&self, owner_id: Uuid) -> ResultEngine<Vec<Account>>;

    async fn create(&self, account: &Account) -> ResultEngine<()>;

    /// Persist name, status and balance of `account`.
    ///
    /// The write only applies if the stored version still equals
    /// `account.version`; otherwise [`EngineError::Conflict`] is returned. On
    /// success `account.version` and `account.updated_at` are advanced.
    async fn update(&self, account: &mut Account) -> ResultEngine<()>;
}

#[async_trait]
pub trait TransactionStore {
    /// Append an immutable history row.
    async fn append(&self, record: &Transaction) -> ResultEngine<()>;

    /// History page of `account_id`, newest first.
    async fn find_by_account(
        &self,
        account_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> ResultEngine<Vec<Transaction>>;

    async fn find_by_reference(
        &self,
        account_id: Uuid,
        reference_id: &str,
    ) -> ResultEngine<Option<Transaction>>;
}

#[async_trait]
pub trait UnitOfWork {
    /// Run `work` inside one database transaction: commit if it returns
    /// `Ok`, roll back otherwise. Dropping the returned future before it
    /// completes also rolls back.
    async fn run_atomic<F, T>(&self, work: F) -> ResultEngine<T>
    where
        F: for<'c> FnOnce(&'c DatabaseTransaction) -> AtomicWork<'c, T> + Send,
        T: Send;
}

#[async_trait]
impl<C> AccountStore for C
where
    C: ConnectionTrait + Send + Sync,
{
    async fn locked_find_by_id(&self, id: Uuid) -> ResultEngine<Account> {
        let mut query = accounts::Entity::find_by_id(id.to_string());
        if supports_row_locks(self.get_database_backend()) {
            query = query.lock_exclusive();
        }
        let model = query
            .one(self)
            .await?
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        Account::try_from(model)
    }

    async fn find_by_id(&self, id: Uuid) -> ResultEngine<Account> {
        let model = accounts::Entity::find_by_id(id.to_string())
            .one(self)
            .await?
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        Account::try_from(model)
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> ResultEngine<Vec<Account>> {
        accounts::Entity::find()
            .filter(accounts::Column::OwnerId.eq(owner_id.to_string()))
            .order_by_asc(accounts::Column::CreatedAt)
            .order_by_asc(accounts::Column::Id)
            .all(self)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    async fn create(&self, account: &Account) -> ResultEngine<()> {
        accounts::ActiveModel::from(account).insert(self).await?;
        Ok(())
    }

    async fn update(&self, account: &mut Account) -> ResultEngine<()> {
        let now = Utc::now();
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::Name, Expr::value(account.name.clone()))
            .col_expr(
                accounts::Column::Balance,
                Expr::value(account.balance.to_string()),
            )
            .col_expr(accounts::Column::Status, Expr::value(account.status.as_str()))
            .col_expr(accounts::Column::Version, Expr::value(account.version + 1))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(account.id.to_string()))
            .filter(accounts::Column::Version.eq(account.version))
            .exec(self)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::Conflict(format!(
                "account {} changed since version {}",
                account.id, account.version
            )));
        }
        account.version += 1;
        account.updated_at = now;
        Ok(())
    }
}

#[async_trait]
impl<C> TransactionStore for C
where
    C: ConnectionTrait + Send + Sync,
{
    async fn append(&self, record: &Transaction) -> ResultEngine<()> {
        transactions::ActiveModel::from(record).insert(self).await?;
        Ok(())
    }

    async fn find_by_account(
        &self,
        account_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> ResultEngine<Vec<Transaction>> {
        // Served by the (account_id, created_at) index; the id breaks ties
        // between rows stamped in the same instant.
        transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.to_string()))
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(self)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }

    async fn find_by_reference(
        &self,
        account_id: Uuid,
        reference_id: &str,
    ) -> ResultEngine<Option<Transaction>> {
        transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.to_string()))
            .filter(transactions::Column::ReferenceId.eq(reference_id))
            .one(self)
            .await?
            .map(Transaction::try_from)
            .transpose()
    }
}

#[async_trait]
impl<C> UnitOfWork for C
where
    C: TransactionTrait + Send + Sync,
{
    async fn run_atomic<F, T>(&self, work: F) -> ResultEngine<T>
    where
        F: for<'c> FnOnce(&'c DatabaseTransaction) -> AtomicWork<'c, T> + Send,
        T: Send,
    {
        self.transaction::<F, T, EngineError>(work)
            .await
            .map_err(|err| match err {
                TransactionError::Connection(db_err) => EngineError::StoreFailure(db_err),
                TransactionError::Transaction(err) => err,
            })
    }
}
