//! Append-only movement ledger.
//!
//! Every balance change inserts exactly one row here. Rows are never updated
//! or deleted; account balances are a materialized view of this table and
//! can be recomputed from it (see `Engine::reconcile_owner`).

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{AccountRef, Currency, EngineError, Money};

/// Business meaning of a ledger entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerEntryType {
    OpeningBalance,
    DailyClaim,
    StakeLock,
    StakeUnlock,
    Payout,
    PlatformFee,
    CreatorEarningCredit,
    CreatorEarningMove,
    Adjustment,
}

impl LedgerEntryType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpeningBalance => "OPENING_BALANCE",
            Self::DailyClaim => "DAILY_CLAIM",
            Self::StakeLock => "STAKE_LOCK",
            Self::StakeUnlock => "STAKE_UNLOCK",
            Self::Payout => "PAYOUT",
            Self::PlatformFee => "PLATFORM_FEE",
            Self::CreatorEarningCredit => "CREATOR_EARNING_CREDIT",
            Self::CreatorEarningMove => "CREATOR_EARNING_MOVE",
            Self::Adjustment => "ADJUSTMENT",
        }
    }
}

impl TryFrom<&str> for LedgerEntryType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "OPENING_BALANCE" => Ok(Self::OpeningBalance),
            "DAILY_CLAIM" => Ok(Self::DailyClaim),
            "STAKE_LOCK" => Ok(Self::StakeLock),
            "STAKE_UNLOCK" => Ok(Self::StakeUnlock),
            "PAYOUT" => Ok(Self::Payout),
            "PLATFORM_FEE" => Ok(Self::PlatformFee),
            "CREATOR_EARNING_CREDIT" => Ok(Self::CreatorEarningCredit),
            "CREATOR_EARNING_MOVE" => Ok(Self::CreatorEarningMove),
            "ADJUSTMENT" => Ok(Self::Adjustment),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid ledger entry type: {other}"
            ))),
        }
    }
}

/// Why a movement happened: entry type plus an optional pointer at the
/// business event that caused it and free-form metadata.
///
/// Known metadata keys by reference type: `prediction` entries carry
/// `option_id`/`entry_id`/`lock_id`; `settlement` entries carry
/// `settlement_run_id`.
#[derive(Clone, Debug)]
pub struct LedgerRef {
    pub entry_type: LedgerEntryType,
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
    pub metadata: Option<Map<String, Value>>,
}

impl LedgerRef {
    #[must_use]
    pub fn new(entry_type: LedgerEntryType) -> Self {
        Self {
            entry_type,
            reference_type: None,
            reference_id: None,
            metadata: None,
        }
    }

    #[must_use]
    pub fn reference(mut self, reference_type: impl Into<String>, reference_id: impl Into<String>) -> Self {
        self.reference_type = Some(reference_type.into());
        self.reference_id = Some(reference_id.into());
        self
    }

    #[must_use]
    pub fn metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallet_ledger")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub currency: String,
    pub amount_minor: i64,
    pub from_owner_type: Option<String>,
    pub from_owner_id: Option<String>,
    pub from_bucket: Option<String>,
    pub to_owner_type: Option<String>,
    pub to_owner_id: Option<String>,
    pub to_bucket: Option<String>,
    pub entry_type: String,
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
    pub metadata: Json,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Builds the row for one movement. Exactly one of `from`/`to` is `None`
/// for debits/credits; both are set for transfers.
pub(crate) fn entry(
    currency: Currency,
    amount: Money,
    from: Option<&AccountRef>,
    to: Option<&AccountRef>,
    reference: &LedgerRef,
) -> (String, ActiveModel) {
    let id = Uuid::new_v4().to_string();
    let metadata = reference
        .metadata
        .clone()
        .map(Value::Object)
        .unwrap_or_else(|| Value::Object(Map::new()));
    let model = ActiveModel {
        id: ActiveValue::Set(id.clone()),
        currency: ActiveValue::Set(currency.code().to_string()),
        amount_minor: ActiveValue::Set(amount.minor()),
        from_owner_type: ActiveValue::Set(from.map(|a| a.owner_type.as_str().to_string())),
        from_owner_id: ActiveValue::Set(from.map(|a| a.owner_id.clone())),
        from_bucket: ActiveValue::Set(from.map(|a| a.bucket.as_str().to_string())),
        to_owner_type: ActiveValue::Set(to.map(|a| a.owner_type.as_str().to_string())),
        to_owner_id: ActiveValue::Set(to.map(|a| a.owner_id.clone())),
        to_bucket: ActiveValue::Set(to.map(|a| a.bucket.as_str().to_string())),
        entry_type: ActiveValue::Set(reference.entry_type.as_str().to_string()),
        reference_type: ActiveValue::Set(reference.reference_type.clone()),
        reference_id: ActiveValue::Set(reference.reference_id.clone()),
        metadata: ActiveValue::Set(metadata),
        created_at: ActiveValue::Set(chrono::Utc::now()),
    };
    (id, model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bucket;

    #[test]
    fn entry_type_round_trips() {
        for kind in [
            LedgerEntryType::OpeningBalance,
            LedgerEntryType::DailyClaim,
            LedgerEntryType::StakeLock,
            LedgerEntryType::StakeUnlock,
            LedgerEntryType::Payout,
            LedgerEntryType::PlatformFee,
            LedgerEntryType::CreatorEarningCredit,
            LedgerEntryType::CreatorEarningMove,
            LedgerEntryType::Adjustment,
        ] {
            assert_eq!(LedgerEntryType::try_from(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn transfer_entry_populates_both_sides() {
        let from = AccountRef::user("alice", Bucket::CreatorEarnings);
        let to = AccountRef::user("alice", Bucket::PromoAvailable);
        let reference = LedgerRef::new(LedgerEntryType::CreatorEarningMove);

        let (_, model) = entry(
            Currency::Usd,
            Money::from_units(5),
            Some(&from),
            Some(&to),
            &reference,
        );

        assert_eq!(model.from_bucket.as_ref(), &Some("CREATOR_EARNINGS".to_string()));
        assert_eq!(model.to_bucket.as_ref(), &Some("PROMO_AVAILABLE".to_string()));
        assert_eq!(model.amount_minor.as_ref(), &500_000_000);
    }
}
