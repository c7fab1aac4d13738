use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Predictions {
    Table,
    Id,
    Title,
    Status,
    EntryDeadline,
    CreatedAt,
}

#[derive(Iden)]
enum PredictionOptions {
    Table,
    Id,
    PredictionId,
    Label,
    PayoutMultiplierBp,
    CreatedAt,
}

#[derive(Iden)]
enum EscrowLocks {
    Table,
    Id,
    UserId,
    PredictionId,
    AmountMinor,
    Status,
    Currency,
    Provider,
    CreatedAt,
}

#[derive(Iden)]
enum PredictionEntries {
    Table,
    Id,
    PredictionId,
    OptionId,
    UserId,
    AmountMinor,
    Status,
    PotentialPayoutMinor,
    EscrowLockId,
    Provider,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Predictions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Predictions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Predictions::Title).string().not_null())
                    .col(ColumnDef::new(Predictions::Status).string().not_null())
                    .col(
                        ColumnDef::new(Predictions::EntryDeadline)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Predictions::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PredictionOptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PredictionOptions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PredictionOptions::PredictionId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PredictionOptions::Label).string().not_null())
                    .col(
                        ColumnDef::new(PredictionOptions::PayoutMultiplierBp)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PredictionOptions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-prediction_options-prediction_id")
                            .from(PredictionOptions::Table, PredictionOptions::PredictionId)
                            .to(Predictions::Table, Predictions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EscrowLocks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EscrowLocks::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EscrowLocks::UserId).string().not_null())
                    .col(ColumnDef::new(EscrowLocks::PredictionId).string().not_null())
                    .col(
                        ColumnDef::new(EscrowLocks::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EscrowLocks::Status).string().not_null())
                    .col(ColumnDef::new(EscrowLocks::Currency).string().not_null())
                    .col(ColumnDef::new(EscrowLocks::Provider).string().not_null())
                    .col(ColumnDef::new(EscrowLocks::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // At most one open lock per (user, prediction). Partial unique
        // indexes have no sea-query builder, so raw SQL; the syntax is the
        // same on sqlite and postgres.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS uq_escrow_locks_open \
                 ON escrow_locks (user_id, prediction_id) WHERE status = 'locked'",
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-escrow_locks-user_id")
                    .table(EscrowLocks::Table)
                    .col(EscrowLocks::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PredictionEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PredictionEntries::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PredictionEntries::PredictionId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PredictionEntries::OptionId).string().not_null())
                    .col(ColumnDef::new(PredictionEntries::UserId).string().not_null())
                    .col(
                        ColumnDef::new(PredictionEntries::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PredictionEntries::Status).string().not_null())
                    .col(
                        ColumnDef::new(PredictionEntries::PotentialPayoutMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PredictionEntries::EscrowLockId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PredictionEntries::Provider).string().not_null())
                    .col(
                        ColumnDef::new(PredictionEntries::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-prediction_entries-prediction_id")
                            .from(PredictionEntries::Table, PredictionEntries::PredictionId)
                            .to(Predictions::Table, Predictions::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-prediction_entries-option_id")
                            .from(PredictionEntries::Table, PredictionEntries::OptionId)
                            .to(PredictionOptions::Table, PredictionOptions::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-prediction_entries-escrow_lock_id")
                            .from(PredictionEntries::Table, PredictionEntries::EscrowLockId)
                            .to(EscrowLocks::Table, EscrowLocks::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // One entry per consumed lock; retried placements converge here.
        manager
            .create_index(
                Index::create()
                    .name("uq-prediction_entries-escrow_lock_id")
                    .table(PredictionEntries::Table)
                    .col(PredictionEntries::EscrowLockId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-prediction_entries-user_id")
                    .table(PredictionEntries::Table)
                    .col(PredictionEntries::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-prediction_entries-prediction_id")
                    .table(PredictionEntries::Table)
                    .col(PredictionEntries::PredictionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PredictionEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EscrowLocks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PredictionOptions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Predictions::Table).to_owned())
            .await?;
        Ok(())
    }
}
