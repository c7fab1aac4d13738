//! Account row management: lazy creation, row locking, balance reads and
//! the legacy mirror rewrite.

use std::collections::HashMap;

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction,
    EntityTrait, QueryFilter, QuerySelect,
};

use super::{Engine, row_locks_supported};
use crate::{AccountRef, Bucket, EngineError, Money, OwnerType, ResultEngine, accounts, ledger, mirror};

/// Snapshot of an account row held under a row lock for the rest of the
/// enclosing transaction.
pub(crate) struct LockedAccount {
    pub id: String,
    pub balance: Money,
}

/// One bucket whose stored balance disagrees with the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BucketDrift {
    pub bucket: Bucket,
    pub ledger_balance: Money,
    pub account_balance: Money,
}

impl Engine {
    /// Creates the account row if it does not exist yet. Safe to race: the
    /// insert ignores the unique (owner type, owner id, currency, bucket)
    /// conflict.
    pub(crate) async fn ensure_account(
        &self,
        tx: &DatabaseTransaction,
        account: &AccountRef,
    ) -> ResultEngine<()> {
        let row = accounts::zero_account(account, self.currency());
        accounts::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    accounts::Column::OwnerType,
                    accounts::Column::OwnerId,
                    accounts::Column::Currency,
                    accounts::Column::Bucket,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(tx)
            .await?;
        Ok(())
    }

    /// Reads one account row under `FOR UPDATE` (on backends that support
    /// it), pinning its balance until the transaction ends.
    pub(crate) async fn lock_account(
        &self,
        tx: &DatabaseTransaction,
        account: &AccountRef,
    ) -> ResultEngine<LockedAccount> {
        let mut query = accounts::Entity::find()
            .filter(accounts::Column::OwnerType.eq(account.owner_type.as_str()))
            .filter(accounts::Column::OwnerId.eq(account.owner_id.as_str()))
            .filter(accounts::Column::Currency.eq(self.currency().code()))
            .filter(accounts::Column::Bucket.eq(account.bucket.as_str()));
        if row_locks_supported(tx.get_database_backend()) {
            query = query.lock_exclusive();
        }
        let row = query.one(tx).await?.ok_or(EngineError::AccountNotFound)?;
        Ok(LockedAccount {
            balance: row.balance(),
            id: row.id,
        })
    }

    pub(crate) async fn write_balance(
        &self,
        tx: &DatabaseTransaction,
        locked: &LockedAccount,
        balance: Money,
    ) -> ResultEngine<()> {
        let row = accounts::ActiveModel {
            id: ActiveValue::Unchanged(locked.id.clone()),
            balance_minor: ActiveValue::Set(balance.minor()),
            updated_at: ActiveValue::Set(chrono::Utc::now()),
            ..Default::default()
        };
        row.update(tx).await?;
        Ok(())
    }

    /// All bucket balances for one user, zero-filled for buckets without a
    /// row yet. Plain read, no locks.
    pub async fn get_balances(&self, user_id: &str) -> ResultEngine<HashMap<Bucket, Money>> {
        self.read_balances(self.database(), OwnerType::User, user_id)
            .await
    }

    pub(crate) async fn read_balances<C: ConnectionTrait>(
        &self,
        conn: &C,
        owner_type: OwnerType,
        owner_id: &str,
    ) -> ResultEngine<HashMap<Bucket, Money>> {
        let rows = accounts::Entity::find()
            .filter(accounts::Column::OwnerType.eq(owner_type.as_str()))
            .filter(accounts::Column::OwnerId.eq(owner_id))
            .filter(accounts::Column::Currency.eq(self.currency().code()))
            .all(conn)
            .await?;
        let mut balances: HashMap<Bucket, Money> =
            Bucket::ALL.iter().map(|b| (*b, Money::ZERO)).collect();
        for row in rows {
            let bucket = Bucket::try_from(row.bucket.as_str())?;
            balances.insert(bucket, row.balance());
        }
        Ok(balances)
    }

    /// Rewrites the denormalized `wallets` row for a user from the account
    /// store. Called inside every transaction that changes a user-owned
    /// balance so the mirror can never be observed out of step.
    pub(crate) async fn sync_legacy_mirror(
        &self,
        tx: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<()> {
        let balances = self.read_balances(tx, OwnerType::User, user_id).await?;
        let get = |bucket: Bucket| balances.get(&bucket).copied().unwrap_or(Money::ZERO);
        let row = mirror::ActiveModel {
            user_id: ActiveValue::Set(user_id.to_string()),
            currency: ActiveValue::Set(self.currency().code().to_string()),
            stake_balance_minor: ActiveValue::Set(get(Bucket::PromoAvailable).minor()),
            reserved_minor: ActiveValue::Set(get(Bucket::PromoLocked).minor()),
            creator_earnings_minor: ActiveValue::Set(get(Bucket::CreatorEarnings).minor()),
            updated_at: ActiveValue::Set(chrono::Utc::now()),
        };
        mirror::Entity::insert(row)
            .on_conflict(
                OnConflict::column(mirror::Column::UserId)
                    .update_columns([
                        mirror::Column::Currency,
                        mirror::Column::StakeBalanceMinor,
                        mirror::Column::ReservedMinor,
                        mirror::Column::CreatorEarningsMinor,
                        mirror::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(tx)
            .await?;
        Ok(())
    }

    /// Recomputes every bucket balance of an owner from the ledger and
    /// reports the buckets where the stored balance disagrees. An empty
    /// result means the owner's accounts reconcile.
    pub async fn reconcile_owner(
        &self,
        owner_type: OwnerType,
        owner_id: &str,
    ) -> ResultEngine<Vec<BucketDrift>> {
        let from_side = Condition::all()
            .add(ledger::Column::FromOwnerType.eq(owner_type.as_str()))
            .add(ledger::Column::FromOwnerId.eq(owner_id));
        let to_side = Condition::all()
            .add(ledger::Column::ToOwnerType.eq(owner_type.as_str()))
            .add(ledger::Column::ToOwnerId.eq(owner_id));
        let rows = ledger::Entity::find()
            .filter(ledger::Column::Currency.eq(self.currency().code()))
            .filter(Condition::any().add(from_side).add(to_side))
            .all(self.database())
            .await?;

        let mut computed: HashMap<Bucket, Money> =
            Bucket::ALL.iter().map(|b| (*b, Money::ZERO)).collect();
        for row in rows {
            let amount = Money::from_minor(row.amount_minor);
            if row.from_owner_type.as_deref() == Some(owner_type.as_str())
                && row.from_owner_id.as_deref() == Some(owner_id)
            {
                if let Some(name) = row.from_bucket.as_deref() {
                    let bucket = Bucket::try_from(name)?;
                    let entry = computed.entry(bucket).or_insert(Money::ZERO);
                    *entry = *entry - amount;
                }
            }
            if row.to_owner_type.as_deref() == Some(owner_type.as_str())
                && row.to_owner_id.as_deref() == Some(owner_id)
            {
                if let Some(name) = row.to_bucket.as_deref() {
                    let bucket = Bucket::try_from(name)?;
                    let entry = computed.entry(bucket).or_insert(Money::ZERO);
                    *entry = *entry + amount;
                }
            }
        }

        let stored = self
            .read_balances(self.database(), owner_type, owner_id)
            .await?;
        let mut drift = Vec::new();
        for bucket in Bucket::ALL {
            let ledger_balance = computed.get(&bucket).copied().unwrap_or(Money::ZERO);
            let account_balance = stored.get(&bucket).copied().unwrap_or(Money::ZERO);
            if ledger_balance != account_balance {
                drift.push(BucketDrift {
                    bucket,
                    ledger_balance,
                    account_balance,
                });
            }
        }
        Ok(drift)
    }
}
