use sea_orm::DatabaseTransaction;
use uuid::Uuid;

use crate::{
    AccountStore, EngineError, Money, ReferenceId, ResultEngine, Transaction, TransactionKind,
    TransactionStore, TransferCmd, util::normalize_description,
};

use super::{Engine, TransferOutcome, ensure_positive, replayed};

impl Engine {
    /// Move `cmd.amount` from one active account to another of the same
    /// currency.
    ///
    /// Both rows are locked in ascending id order whatever the direction, so
    /// concurrent `A -> B` and `B -> A` transfers queue on the same first
    /// lock instead of deadlocking. The debit and credit rows share one
    /// reference id.
    #[tracing::instrument(
        skip(self, cmd),
        fields(from = %cmd.from_account_id, to = %cmd.to_account_id, amount = %cmd.amount)
    )]
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultEngine<TransferOutcome> {
        ensure_positive(cmd.amount)?;
        if cmd.from_account_id == cmd.to_account_id {
            return Err(EngineError::SameAccount);
        }
        let reference = ReferenceId::resolve(cmd.idempotency_key.as_deref())?;
        let description = normalize_description(&cmd.description);
        let TransferCmd {
            from_account_id,
            to_account_id,
            amount,
            deadline,
            ..
        } = cmd;

        let outcome = self
            .atomically("transfer", deadline, |db_tx| {
                Box::pin(move_between(
                    db_tx,
                    from_account_id,
                    to_account_id,
                    amount,
                    reference.clone(),
                    description.clone(),
                ))
            })
            .await?;

        tracing::info!(
            reference_id = %outcome.reference_id,
            source_balance = %outcome.source_balance,
            destination_balance = %outcome.destination_balance,
            "transfer committed"
        );
        Ok(outcome)
    }
}

/// Canonical lock order for a pair of accounts.
pub(crate) fn lock_order(a: Uuid, b: Uuid) -> [Uuid; 2] {
    if a <= b { [a, b] } else { [b, a] }
}

/// Descriptions of the debit and the credit row.
pub(crate) fn leg_descriptions(description: &str, from: Uuid, to: Uuid) -> (String, String) {
    let debit = format!("Transfer to {to}");
    let credit = format!("Transfer from {from}");
    if description.is_empty() {
        return (debit, credit);
    }
    (
        format!("{description} - {debit}"),
        format!("{description} - {credit}"),
    )
}

async fn move_between(
    db_tx: &DatabaseTransaction,
    from: Uuid,
    to: Uuid,
    amount: Money,
    reference: ReferenceId,
    description: String,
) -> ResultEngine<TransferOutcome> {
    let [first, second] = lock_order(from, to);
    let first = db_tx.locked_find_by_id(first).await?;
    let second = db_tx.locked_find_by_id(second).await?;
    tracing::debug!(first = %first.id, second = %second.id, "accounts locked");
    let (mut source, mut destination) = if first.id == from {
        (first, second)
    } else {
        (second, first)
    };

    if reference.is_idempotency_key() {
        if let Some(existing) = db_tx.find_by_reference(from, reference.as_str()).await? {
            return replayed_transfer(db_tx, existing, to, amount).await;
        }
        if db_tx.find_by_reference(to, reference.as_str()).await?.is_some() {
            return Err(EngineError::DuplicateReference(reference.to_string()));
        }
    }

    source.ensure_active()?;
    destination.ensure_active()?;
    if source.currency != destination.currency {
        return Err(EngineError::CurrencyMismatch(format!(
            "cannot transfer {} to {}",
            source.currency, destination.currency
        )));
    }
    source.currency.check_precision(amount)?;

    let source_before = source.balance;
    let source_after = source.debit(amount)?;
    let destination_before = destination.balance;
    let destination_after = destination.credit(amount)?;

    db_tx.update(&mut source).await?;
    db_tx.update(&mut destination).await?;

    let (debit_description, credit_description) = leg_descriptions(&description, from, to);
    let debit = Transaction::new(
        from,
        reference.to_string(),
        TransactionKind::Transfer,
        amount,
        source_before,
        source_after,
        debit_description,
    )?;
    db_tx.append(&debit).await?;
    let credit = Transaction::new(
        to,
        reference.to_string(),
        TransactionKind::Transfer,
        amount,
        destination_before,
        destination_after,
        credit_description,
    )?;
    db_tx.append(&credit).await?;

    Ok(TransferOutcome {
        reference_id: reference.to_string(),
        source_balance: source_after,
        destination_balance: destination_after,
    })
}

async fn replayed_transfer(
    db_tx: &DatabaseTransaction,
    existing: Transaction,
    to: Uuid,
    amount: Money,
) -> ResultEngine<TransferOutcome> {
    let debit = replayed(existing, TransactionKind::Transfer, amount)?;
    if !debit.is_debit() {
        return Err(EngineError::DuplicateReference(debit.reference_id));
    }
    let credit = db_tx
        .find_by_reference(to, &debit.reference_id)
        .await?
        .ok_or_else(|| EngineError::DuplicateReference(debit.reference_id.clone()))?;
    Ok(TransferOutcome {
        reference_id: debit.reference_id,
        source_balance: debit.balance_after,
        destination_balance: credit.balance_after,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_order_ignores_direction() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(lock_order(a, b), lock_order(b, a));
        let [first, second] = lock_order(a, b);
        assert!(first < second);
    }

    #[test]
    fn leg_descriptions_cross_reference_accounts() {
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        let (debit, credit) = leg_descriptions("rent", from, to);
        assert_eq!(debit, format!("rent - Transfer to {to}"));
        assert_eq!(credit, format!("rent - Transfer from {from}"));

        let (debit, credit) = leg_descriptions("", from, to);
        assert_eq!(debit, format!("Transfer to {to}"));
        assert_eq!(credit, format!("Transfer from {from}"));
    }
}
