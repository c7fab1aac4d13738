use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum WalletAccounts {
    Table,
    Id,
    OwnerType,
    OwnerId,
    Currency,
    Bucket,
    BalanceMinor,
    UpdatedAt,
}

#[derive(Iden)]
enum WalletLedger {
    Table,
    Id,
    Currency,
    AmountMinor,
    FromOwnerType,
    FromOwnerId,
    FromBucket,
    ToOwnerType,
    ToOwnerId,
    ToBucket,
    EntryType,
    ReferenceType,
    ReferenceId,
    Metadata,
    CreatedAt,
}

#[derive(Iden)]
enum Wallets {
    Table,
    UserId,
    Currency,
    StakeBalanceMinor,
    ReservedMinor,
    CreatorEarningsMinor,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WalletAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WalletAccounts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WalletAccounts::OwnerType).string().not_null())
                    .col(ColumnDef::new(WalletAccounts::OwnerId).string().not_null())
                    .col(ColumnDef::new(WalletAccounts::Currency).string().not_null())
                    .col(ColumnDef::new(WalletAccounts::Bucket).string().not_null())
                    .col(
                        ColumnDef::new(WalletAccounts::BalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(WalletAccounts::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // One balance row per (owner, currency, bucket); lazy creation
        // relies on this conflict target.
        manager
            .create_index(
                Index::create()
                    .name("uq-wallet_accounts-owner-currency-bucket")
                    .table(WalletAccounts::Table)
                    .col(WalletAccounts::OwnerType)
                    .col(WalletAccounts::OwnerId)
                    .col(WalletAccounts::Currency)
                    .col(WalletAccounts::Bucket)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WalletLedger::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WalletLedger::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WalletLedger::Currency).string().not_null())
                    .col(
                        ColumnDef::new(WalletLedger::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WalletLedger::FromOwnerType).string())
                    .col(ColumnDef::new(WalletLedger::FromOwnerId).string())
                    .col(ColumnDef::new(WalletLedger::FromBucket).string())
                    .col(ColumnDef::new(WalletLedger::ToOwnerType).string())
                    .col(ColumnDef::new(WalletLedger::ToOwnerId).string())
                    .col(ColumnDef::new(WalletLedger::ToBucket).string())
                    .col(ColumnDef::new(WalletLedger::EntryType).string().not_null())
                    .col(ColumnDef::new(WalletLedger::ReferenceType).string())
                    .col(ColumnDef::new(WalletLedger::ReferenceId).string())
                    .col(ColumnDef::new(WalletLedger::Metadata).json().not_null())
                    .col(
                        ColumnDef::new(WalletLedger::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallet_ledger-from_owner")
                    .table(WalletLedger::Table)
                    .col(WalletLedger::FromOwnerType)
                    .col(WalletLedger::FromOwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallet_ledger-to_owner")
                    .table(WalletLedger::Table)
                    .col(WalletLedger::ToOwnerType)
                    .col(WalletLedger::ToOwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-wallet_ledger-reference")
                    .table(WalletLedger::Table)
                    .col(WalletLedger::ReferenceType)
                    .col(WalletLedger::ReferenceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Wallets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Wallets::UserId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Wallets::Currency).string().not_null())
                    .col(
                        ColumnDef::new(Wallets::StakeBalanceMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Wallets::ReservedMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Wallets::CreatorEarningsMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Wallets::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Wallets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WalletLedger::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WalletAccounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
