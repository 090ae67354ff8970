//! Transaction records.
//!
//! A `Transaction` is one immutable row of an account's history. Deposits and
//! withdrawals write one row; a transfer writes a debit row on the source
//! and a credit row on the destination, both carrying the same reference.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Money, ResultEngine,
    util::{parse_money, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Transfer => "transfer",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "deposit" => Ok(Self::Deposit),
            "withdrawal" => Ok(Self::Withdrawal),
            "transfer" => Ok(Self::Transfer),
            other => Err(EngineError::Corrupted(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub account_id: Uuid,
    pub reference_id: String,
    pub kind: TransactionKind,
    /// Always positive; direction follows from `kind` and the balances.
    pub amount: Money,
    pub balance_before: Money,
    pub balance_after: Money,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Build a history row, checking that the balances agree with `kind`.
    ///
    /// Ids are UUIDv7, so ordering rows by id follows creation order.
    pub fn new(
        account_id: Uuid,
        reference_id: String,
        kind: TransactionKind,
        amount: Money,
        balance_before: Money,
        balance_after: Money,
        description: String,
    ) -> ResultEngine<Self> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount("amount must be > 0".to_string()));
        }
        let credited = balance_before.checked_add(amount) == Some(balance_after);
        let debited = balance_before.checked_sub(amount) == Some(balance_after);
        let consistent = match kind {
            TransactionKind::Deposit => credited,
            TransactionKind::Withdrawal => debited,
            TransactionKind::Transfer => credited || debited,
        };
        if !consistent {
            return Err(EngineError::InvalidAmount(format!(
                "{} of {amount} cannot move {balance_before} to {balance_after}",
                kind.as_str()
            )));
        }

        Ok(Self {
            id: Uuid::now_v7(),
            account_id,
            reference_id,
            kind,
            amount,
            balance_before,
            balance_after,
            description,
            created_at: Utc::now(),
        })
    }

    /// `true` when this row took money out of its account.
    pub fn is_debit(&self) -> bool {
        self.balance_after < self.balance_before
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub reference_id: String,
    pub kind: String,
    pub amount: String,
    pub balance_before: String,
    pub balance_after: String,
    pub description: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            account_id: ActiveValue::Set(tx.account_id.to_string()),
            reference_id: ActiveValue::Set(tx.reference_id.clone()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount: ActiveValue::Set(tx.amount.to_string()),
            balance_before: ActiveValue::Set(tx.balance_before.to_string()),
            balance_after: ActiveValue::Set(tx.balance_after.to_string()),
            description: ActiveValue::Set(tx.description.clone()),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            account_id: parse_uuid(&model.account_id, "account")?,
            reference_id: model.reference_id,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount: parse_money(&model.amount, "amount")?,
            balance_before: parse_money(&model.balance_before, "balance_before")?,
            balance_after: parse_money(&model.balance_after, "balance_after")?,
            description: model.description,
            created_at: model.created_at,
        })
    }
}
