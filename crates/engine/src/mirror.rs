//! Legacy denormalized wallet summary.
//!
//! Older read paths consume one row per user with three figures (stake
//! balance, reserved, creator earnings). The row is a derived cache,
//! rewritten from the account store inside the same transaction as every
//! mutation that touches a user owner. Never a source of truth.

use sea_orm::entity::prelude::*;

use crate::Money;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub currency: String,
    pub stake_balance_minor: i64,
    pub reserved_minor: i64,
    pub creator_earnings_minor: i64,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    #[must_use]
    pub fn stake_balance(&self) -> Money {
        Money::from_minor(self.stake_balance_minor)
    }

    #[must_use]
    pub fn reserved(&self) -> Money {
        Money::from_minor(self.reserved_minor)
    }

    #[must_use]
    pub fn creator_earnings(&self) -> Money {
        Money::from_minor(self.creator_earnings_minor)
    }
}
