//! Typed balance accounts.
//!
//! An account is one non-negative balance identified by
//! (owner type, owner id, currency, bucket). Rows are created lazily on
//! first reference and never deleted; only the ledger primitives in
//! [`crate::ops`] may change a balance, and only under a row lock.

use sea_orm::entity::{ActiveValue, prelude::*};

use crate::{Currency, EngineError, Money};

/// Who owns an account: an end user or a platform-level system owner
/// (treasury, fee sink).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OwnerType {
    User,
    System,
}

impl OwnerType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::System => "system",
        }
    }
}

impl TryFrom<&str> for OwnerType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Self::User),
            "system" => Ok(Self::System),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid owner type: {other}"
            ))),
        }
    }
}

/// Named sub-balance within an owner's wallet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bucket {
    PromoAvailable,
    PromoLocked,
    CreatorEarnings,
    CashAvailable,
    CashLocked,
    Withdrawable,
}

impl Bucket {
    pub const ALL: [Bucket; 6] = [
        Self::PromoAvailable,
        Self::PromoLocked,
        Self::CreatorEarnings,
        Self::CashAvailable,
        Self::CashLocked,
        Self::Withdrawable,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PromoAvailable => "PROMO_AVAILABLE",
            Self::PromoLocked => "PROMO_LOCKED",
            Self::CreatorEarnings => "CREATOR_EARNINGS",
            Self::CashAvailable => "CASH_AVAILABLE",
            Self::CashLocked => "CASH_LOCKED",
            Self::Withdrawable => "WITHDRAWABLE",
        }
    }

    /// Stable position in the global lock-acquisition order.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::PromoAvailable => 0,
            Self::PromoLocked => 1,
            Self::CreatorEarnings => 2,
            Self::CashAvailable => 3,
            Self::CashLocked => 4,
            Self::Withdrawable => 5,
        }
    }
}

impl TryFrom<&str> for Bucket {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "PROMO_AVAILABLE" => Ok(Self::PromoAvailable),
            "PROMO_LOCKED" => Ok(Self::PromoLocked),
            "CREATOR_EARNINGS" => Ok(Self::CreatorEarnings),
            "CASH_AVAILABLE" => Ok(Self::CashAvailable),
            "CASH_LOCKED" => Ok(Self::CashLocked),
            "WITHDRAWABLE" => Ok(Self::Withdrawable),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid bucket: {other}"
            ))),
        }
    }
}

/// Reference to one account, without its balance.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AccountRef {
    pub owner_type: OwnerType,
    pub owner_id: String,
    pub bucket: Bucket,
}

impl AccountRef {
    #[must_use]
    pub fn user(owner_id: impl Into<String>, bucket: Bucket) -> Self {
        Self {
            owner_type: OwnerType::User,
            owner_id: owner_id.into(),
            bucket,
        }
    }

    #[must_use]
    pub fn system(owner_id: impl Into<String>, bucket: Bucket) -> Self {
        Self {
            owner_type: OwnerType::System,
            owner_id: owner_id.into(),
            bucket,
        }
    }

    /// Key used to sort accounts before locking.
    ///
    /// Independent of which side an account appears on in a transfer, so two
    /// concurrent transfers over the same pair acquire row locks in the same
    /// order and cannot cyclically wait.
    #[must_use]
    pub fn lock_key(&self) -> (&'static str, &str, u8) {
        (self.owner_type.as_str(), &self.owner_id, self.bucket.rank())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallet_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_type: String,
    pub owner_id: String,
    pub currency: String,
    pub bucket: String,
    pub balance_minor: i64,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    #[must_use]
    pub fn balance(&self) -> Money {
        Money::from_minor(self.balance_minor)
    }
}

/// Fresh zero-balance row for lazy account creation.
pub(crate) fn zero_account(account: &AccountRef, currency: Currency) -> ActiveModel {
    ActiveModel {
        id: ActiveValue::Set(Uuid::new_v4().to_string()),
        owner_type: ActiveValue::Set(account.owner_type.as_str().to_string()),
        owner_id: ActiveValue::Set(account.owner_id.clone()),
        currency: ActiveValue::Set(currency.code().to_string()),
        bucket: ActiveValue::Set(account.bucket.as_str().to_string()),
        balance_minor: ActiveValue::Set(0),
        updated_at: ActiveValue::Set(chrono::Utc::now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_round_trips() {
        for bucket in Bucket::ALL {
            assert_eq!(Bucket::try_from(bucket.as_str()).unwrap(), bucket);
        }
        assert!(Bucket::try_from("STAKE").is_err());
    }

    #[test]
    fn lock_key_ignores_transfer_direction() {
        let a = AccountRef::user("alice", Bucket::CreatorEarnings);
        let b = AccountRef::user("alice", Bucket::PromoAvailable);

        let mut forward = [a.clone(), b.clone()];
        forward.sort_by(|x, y| x.lock_key().cmp(&y.lock_key()));
        let mut reverse = [b, a];
        reverse.sort_by(|x, y| x.lock_key().cmp(&y.lock_key()));

        assert_eq!(forward, reverse);
        assert_eq!(forward[0].bucket, Bucket::PromoAvailable);
    }

    #[test]
    fn system_owners_sort_after_users() {
        let user = AccountRef::user("zed", Bucket::PromoAvailable);
        let system = AccountRef::system("treasury", Bucket::PromoAvailable);
        // "system" < "user" lexicographically, so system rows lock first.
        assert!(system.lock_key() < user.lock_key());
    }
}
