use sea_orm::DatabaseTransaction;
use uuid::Uuid;

use crate::{
    AccountStore, DepositCmd, Money, ReferenceId, ResultEngine, Transaction, TransactionKind,
    TransactionStore, WithdrawCmd, util::normalize_description,
};

use super::{Engine, ensure_positive, replayed};

impl Engine {
    /// Credit `cmd.amount` to an active account and return its new balance.
    #[tracing::instrument(skip(self, cmd), fields(account_id = %cmd.account_id, amount = %cmd.amount))]
    pub async fn deposit(&self, cmd: DepositCmd) -> ResultEngine<Money> {
        self.apply_movement(cmd, TransactionKind::Deposit).await
    }

    /// Debit `cmd.amount` from an active account and return its new balance.
    ///
    /// Fails with `InsufficientBalance` rather than going below zero.
    #[tracing::instrument(skip(self, cmd), fields(account_id = %cmd.account_id, amount = %cmd.amount))]
    pub async fn withdraw(&self, cmd: WithdrawCmd) -> ResultEngine<Money> {
        self.apply_movement(cmd, TransactionKind::Withdrawal).await
    }

    async fn apply_movement(&self, cmd: DepositCmd, kind: TransactionKind) -> ResultEngine<Money> {
        ensure_positive(cmd.amount)?;
        let reference = ReferenceId::resolve(cmd.idempotency_key.as_deref())?;
        let description = normalize_description(&cmd.description);
        let account_id = cmd.account_id;
        let amount = cmd.amount;

        let balance = self
            .atomically(kind.as_str(), cmd.deadline, |db_tx| {
                Box::pin(move_balance(
                    db_tx,
                    account_id,
                    amount,
                    kind,
                    reference.clone(),
                    description.clone(),
                ))
            })
            .await?;

        tracing::info!(%account_id, %amount, %balance, kind = kind.as_str(), "balance moved");
        Ok(balance)
    }
}

async fn move_balance(
    db_tx: &DatabaseTransaction,
    account_id: Uuid,
    amount: Money,
    kind: TransactionKind,
    reference: ReferenceId,
    description: String,
) -> ResultEngine<Money> {
    let mut account = db_tx.locked_find_by_id(account_id).await?;
    tracing::debug!(%account_id, version = account.version, "account locked");

    if reference.is_idempotency_key()
        && let Some(existing) = db_tx.find_by_reference(account_id, reference.as_str()).await?
    {
        return replayed(existing, kind, amount).map(|row| row.balance_after);
    }

    account.ensure_active()?;
    account.currency.check_precision(amount)?;

    let balance_before = account.balance;
    let balance_after = match kind {
        TransactionKind::Withdrawal => account.debit(amount)?,
        TransactionKind::Deposit | TransactionKind::Transfer => account.credit(amount)?,
    };
    db_tx.update(&mut account).await?;

    let row = Transaction::new(
        account_id,
        reference.to_string(),
        kind,
        amount,
        balance_before,
        balance_after,
        description,
    )?;
    db_tx.append(&row).await?;

    Ok(balance_after)
}
