use sea_orm_migration::prelude::*;

use crate::m20250601_000001_init::Transactions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // A reference appears at most once per account: a transfer shares it
        // across two different accounts.
        manager
            .create_index(
                Index::create()
                    .name("uidx-transactions-account_id-reference_id")
                    .table(Transactions::Table)
                    .col(Transactions::AccountId)
                    .col(Transactions::ReferenceId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-reference_id")
                    .table(Transactions::Table)
                    .col(Transactions::ReferenceId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx-transactions-reference_id")
                    .table(Transactions::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("uidx-transactions-account_id-reference_id")
                    .table(Transactions::Table)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
