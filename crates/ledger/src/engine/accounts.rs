use uuid::Uuid;

use crate::{
    Account, AccountStatus, AccountStore, Currency, ResultEngine,
    util::normalize_required_name,
};

use super::Engine;

impl Engine {
    /// Open a new account: zero balance, status `active`.
    pub async fn open_account(
        &self,
        owner_id: Uuid,
        name: &str,
        currency: Currency,
    ) -> ResultEngine<Account> {
        let name = normalize_required_name(name, "account")?;
        let account = Account::new(owner_id, name, currency);
        self.database.create(&account).await?;
        tracing::info!(account_id = %account.id, %owner_id, %currency, "account opened");
        Ok(account)
    }

    /// Return an account snapshot from DB.
    pub async fn account(&self, account_id: Uuid) -> ResultEngine<Account> {
        self.database.find_by_id(account_id).await
    }

    /// Accounts of an owner, oldest first.
    pub async fn accounts_by_owner(&self, owner_id: Uuid) -> ResultEngine<Vec<Account>> {
        self.database.find_by_owner(owner_id).await
    }

    /// Administrative status change (activate, deactivate, freeze).
    ///
    /// Takes the same row lock as money movement, so it never interleaves
    /// with an operation in flight on the account.
    pub async fn set_account_status(
        &self,
        account_id: Uuid,
        status: AccountStatus,
    ) -> ResultEngine<Account> {
        let account = self
            .atomically("set_account_status", None, |db_tx| {
                Box::pin(async move {
                    let mut account = db_tx.locked_find_by_id(account_id).await?;
                    if account.status != status {
                        account.status = status;
                        db_tx.update(&mut account).await?;
                    }
                    Ok(account)
                })
            })
            .await?;
        tracing::info!(%account_id, status = status.as_str(), "account status set");
        Ok(account)
    }
}
