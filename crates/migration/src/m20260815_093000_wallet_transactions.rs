use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum WalletTransactions {
    Table,
    Id,
    UserId,
    Direction,
    Kind,
    Channel,
    Provider,
    AmountMinor,
    Currency,
    Status,
    ExternalRef,
    PredictionId,
    EntryId,
    Description,
    FromAccount,
    ToAccount,
    ReferenceType,
    ReferenceId,
    Metadata,
    CreatedAt,
}

#[derive(Iden)]
enum EventLog {
    Table,
    Id,
    Source,
    Kind,
    RefId,
    Payload,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WalletTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WalletTransactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WalletTransactions::UserId).string().not_null())
                    .col(
                        ColumnDef::new(WalletTransactions::Direction)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WalletTransactions::Kind).string().not_null())
                    .col(ColumnDef::new(WalletTransactions::Channel).string().not_null())
                    .col(
                        ColumnDef::new(WalletTransactions::Provider)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::Currency)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WalletTransactions::Status).string().not_null())
                    .col(
                        ColumnDef::new(WalletTransactions::ExternalRef)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WalletTransactions::PredictionId).string())
                    .col(ColumnDef::new(WalletTransactions::EntryId).string())
                    .col(ColumnDef::new(WalletTransactions::Description).string())
                    .col(ColumnDef::new(WalletTransactions::FromAccount).string())
                    .col(ColumnDef::new(WalletTransactions::ToAccount).string())
                    .col(ColumnDef::new(WalletTransactions::ReferenceType).string())
                    .col(ColumnDef::new(WalletTransactions::ReferenceId).string())
                    .col(
                        ColumnDef::new(WalletTransactions::Metadata)
                            .json()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WalletTransactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // The idempotency anchor: replaying an external event inserts
        // nothing.
        manager
            .create_index(
                Index::create()
                    .name("uq-wallet_transactions-provider-external_ref")
                    .table(WalletTransactions::Table)
                    .col(WalletTransactions::Provider)
                    .col(WalletTransactions::ExternalRef)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallet_transactions-user_id-created_at")
                    .table(WalletTransactions::Table)
                    .col(WalletTransactions::UserId)
                    .col(WalletTransactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EventLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventLog::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EventLog::Source).string().not_null())
                    .col(ColumnDef::new(EventLog::Kind).string().not_null())
                    .col(ColumnDef::new(EventLog::RefId).string())
                    .col(ColumnDef::new(EventLog::Payload).json().not_null())
                    .col(ColumnDef::new(EventLog::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-event_log-kind-created_at")
                    .table(EventLog::Table)
                    .col(EventLog::Kind)
                    .col(EventLog::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventLog::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WalletTransactions::Table).to_owned())
            .await?;
        Ok(())
    }
}
