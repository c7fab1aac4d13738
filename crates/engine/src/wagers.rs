//! Prediction entries (wagers).
//!
//! One entry consumes exactly one escrow lock; the unique constraint on
//! `escrow_lock_id` is the idempotency anchor for the whole placement
//! workflow. If an entry already references a lock, the lock was already
//! consumed and a retried placement returns the existing entry.

use sea_orm::{ActiveValue, entity::prelude::*};

use crate::{EngineError, Money};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WagerStatus {
    Active,
    Won,
    Lost,
    Refunded,
}

impl WagerStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Won => "won",
            Self::Lost => "lost",
            Self::Refunded => "refunded",
        }
    }
}

impl TryFrom<&str> for WagerStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "won" => Ok(Self::Won),
            "lost" => Ok(Self::Lost),
            "refunded" => Ok(Self::Refunded),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid wager status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "prediction_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub prediction_id: String,
    pub option_id: String,
    pub user_id: String,
    pub amount_minor: i64,
    pub status: String,
    pub potential_payout_minor: i64,
    pub escrow_lock_id: String,
    pub provider: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[allow(clippy::too_many_arguments)]
pub(crate) fn new_entry(
    prediction_id: &str,
    option_id: &str,
    user_id: &str,
    amount: Money,
    potential_payout: Money,
    escrow_lock_id: &str,
    provider: &str,
) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4().to_string()),
        prediction_id: ActiveValue::Set(prediction_id.to_string()),
        option_id: ActiveValue::Set(option_id.to_string()),
        user_id: ActiveValue::Set(user_id.to_string()),
        amount_minor: ActiveValue::Set(amount.minor()),
        status: ActiveValue::Set(WagerStatus::Active.as_str().to_string()),
        potential_payout_minor: ActiveValue::Set(potential_payout.minor()),
        escrow_lock_id: ActiveValue::Set(escrow_lock_id.to_string()),
        provider: ActiveValue::Set(provider.to_string()),
        created_at: ActiveValue::Set(chrono::Utc::now()),
    }
}
