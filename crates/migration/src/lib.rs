pub use sea_orm_migration::prelude::*;

mod m20260815_090000_wallet_accounts;
mod m20260815_091500_predictions;
mod m20260815_093000_wallet_transactions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260815_090000_wallet_accounts::Migration),
            Box::new(m20260815_091500_predictions::Migration),
            Box::new(m20260815_093000_wallet_transactions::Migration),
        ]
    }
}
