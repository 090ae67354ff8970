//! The module contains the `Account` struct, its lifecycle status and the
//! `accounts` table entity.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError, Money, ResultEngine,
    util::{parse_money, parse_uuid},
};

/// Lifecycle status of an account. Only `Active` accounts take part in
/// money movement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
    Frozen,
}

impl AccountStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Frozen => "frozen",
        }
    }
}

impl TryFrom<&str> for AccountStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "frozen" => Ok(Self::Frozen),
            other => Err(EngineError::Corrupted(format!(
                "invalid account status: {other}"
            ))),
        }
    }
}

/// A user-owned account holding a single-currency balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub currency: Currency,
    pub balance: Money,
    pub status: AccountStatus,
    /// Bumped on every persisted update; see [`AccountStore::update`].
    ///
    /// [`AccountStore::update`]: crate::AccountStore::update
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// A fresh account: zero balance, `Active`.
    pub fn new(owner_id: Uuid, name: String, currency: Currency) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name,
            currency,
            balance: Money::ZERO,
            status: AccountStatus::Active,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    pub(crate) fn ensure_active(&self) -> ResultEngine<()> {
        if !self.is_active() {
            return Err(EngineError::InactiveAccount(self.id.to_string()));
        }
        Ok(())
    }

    /// Credit `amount`, returning the new balance.
    pub(crate) fn credit(&mut self, amount: Money) -> ResultEngine<Money> {
        let after = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| EngineError::InvalidAmount("balance overflow".to_string()))?;
        self.balance = after;
        Ok(after)
    }

    /// Debit `amount`, refusing to drive the balance below zero.
    pub(crate) fn debit(&mut self, amount: Money) -> ResultEngine<Money> {
        if self.balance < amount {
            return Err(EngineError::InsufficientBalance(format!(
                "account {} holds {}, requested {amount}",
                self.id, self.balance
            )));
        }
        self.balance = self.balance - amount;
        Ok(self.balance)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub currency: String,
    pub balance: String,
    pub status: String,
    pub version: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(value: &Account) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            owner_id: ActiveValue::Set(value.owner_id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            balance: ActiveValue::Set(value.balance.to_string()),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            version: ActiveValue::Set(value.version),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "account")?,
            owner_id: parse_uuid(&model.owner_id, "owner")?,
            name: model.name,
            currency: Currency::try_from(model.currency.as_str())
                .map_err(|_| EngineError::Corrupted(format!("currency {}", model.currency)))?,
            balance: parse_money(&model.balance, "balance")?,
            status: AccountStatus::try_from(model.status.as_str())?,
            version: model.version,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(balance: &str) -> Account {
        let mut account = Account::new(Uuid::new_v4(), "Main".to_string(), Currency::Idr);
        account.balance = balance.parse().unwrap();
        account
    }

    #[test]
    fn new_account_is_active_and_empty() {
        let account = Account::new(Uuid::new_v4(), "Main".to_string(), Currency::Usd);
        assert!(account.is_active());
        assert_eq!(account.balance, Money::ZERO);
        assert_eq!(account.version, 0);
    }

    #[test]
    fn debit_never_goes_negative() {
        let mut account = account("100000");
        assert_eq!(account.debit("50000".parse().unwrap()).unwrap().to_string(), "50000");
        let err = account.debit("100000".parse().unwrap()).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientBalance(_)));
        assert_eq!(account.balance.to_string(), "50000");
        assert_eq!(account.debit("50000".parse().unwrap()).unwrap(), Money::ZERO);
    }

    #[test]
    fn inactive_accounts_are_rejected() {
        let mut account = account("0");
        account.status = AccountStatus::Frozen;
        assert_eq!(
            account.ensure_active(),
            Err(EngineError::InactiveAccount(account.id.to_string()))
        );
    }

    #[test]
    fn model_round_trip_keeps_exact_balance() {
        let account = account("1234.56");
        let active: ActiveModel = (&account).into();
        let model = Model {
            id: active.id.unwrap(),
            owner_id: active.owner_id.unwrap(),
            name: active.name.unwrap(),
            currency: active.currency.unwrap(),
            balance: active.balance.unwrap(),
            status: active.status.unwrap(),
            version: active.version.unwrap(),
            created_at: active.created_at.unwrap(),
            updated_at: active.updated_at.unwrap(),
        };
        assert_eq!(model.balance, "1234.56");
        assert_eq!(Account::try_from(model).unwrap(), account);
    }
}
