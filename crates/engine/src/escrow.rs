//! Escrow locks: reservations of deposited funds against one prediction.
//!
//! At most one `locked` row may exist per (user, prediction); the partial
//! unique index in the migration enforces it. A lock transitions
//! locked → consumed exactly once, inside the bet placement transaction.

use sea_orm::{ActiveValue, entity::prelude::*};

use crate::{Currency, EngineError, Money};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EscrowStatus {
    Locked,
    Consumed,
}

impl EscrowStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Consumed => "consumed",
        }
    }
}

impl core::fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EscrowStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "locked" => Ok(Self::Locked),
            "consumed" => Ok(Self::Consumed),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid escrow status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "escrow_locks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub prediction_id: String,
    pub amount_minor: i64,
    pub status: String,
    pub currency: String,
    pub provider: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn status(&self) -> Result<EscrowStatus, EngineError> {
        EscrowStatus::try_from(self.status.as_str())
    }

    #[must_use]
    pub fn amount(&self) -> Money {
        Money::from_minor(self.amount_minor)
    }
}

pub(crate) fn new_lock(
    user_id: &str,
    prediction_id: &str,
    amount: Money,
    currency: Currency,
    provider: &str,
) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4().to_string()),
        user_id: ActiveValue::Set(user_id.to_string()),
        prediction_id: ActiveValue::Set(prediction_id.to_string()),
        amount_minor: ActiveValue::Set(amount.minor()),
        status: ActiveValue::Set(EscrowStatus::Locked.as_str().to_string()),
        currency: ActiveValue::Set(currency.code().to_string()),
        provider: ActiveValue::Set(provider.to_string()),
        created_at: ActiveValue::Set(chrono::Utc::now()),
    }
}
