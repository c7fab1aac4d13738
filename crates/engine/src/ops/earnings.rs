//! Creator earnings workflows: idempotent settlement credits, the
//! earnings-to-stake move and the summary/history reads.

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{Engine, with_tx};
use crate::audit::{self, AuditRow, Direction};
use crate::{
    AccountRef, Bucket, EngineError, LedgerEntryType, LedgerRef, Money, OwnerType, ResultEngine,
};

const EARNINGS_PROVIDER: &str = "internal-wallet";

/// The three figures legacy read paths care about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceSummary {
    pub creator_earnings: Money,
    pub stake_balance: Money,
    pub stake_reserved: Money,
}

/// One settlement-time earnings credit. `external_ref` is the idempotency
/// key: replaying the same (provider, external_ref) pair is a no-op.
#[derive(Clone, Debug)]
pub struct CreatorEarningsCredit {
    pub user_id: String,
    pub amount: Money,
    pub description: String,
    pub external_ref: String,
    pub prediction_id: Option<String>,
    pub reference_id: Option<String>,
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EarningsCredited {
    /// `false` when the credit had already been applied by an earlier call.
    pub applied: bool,
    pub balances: BalanceSummary,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EarningsMoved {
    pub transaction_id: String,
    pub balances: BalanceSummary,
}

impl Engine {
    /// Current earnings/stake/reserved figures for a user.
    pub async fn balance_summary(&self, user_id: &str) -> ResultEngine<BalanceSummary> {
        self.summary(self.database(), user_id).await
    }

    async fn summary<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
    ) -> ResultEngine<BalanceSummary> {
        let balances = self.read_balances(conn, OwnerType::User, user_id).await?;
        let get = |bucket: Bucket| balances.get(&bucket).copied().unwrap_or(Money::ZERO);
        Ok(BalanceSummary {
            creator_earnings: get(Bucket::CreatorEarnings),
            stake_balance: get(Bucket::PromoAvailable),
            stake_reserved: get(Bucket::PromoLocked),
        })
    }

    /// Credits settlement earnings into the creator's earnings bucket,
    /// exactly once per (provider, external_ref). A replay reports
    /// `applied: false` alongside the unchanged balances.
    pub async fn credit_creator_earnings(
        &self,
        credit: &CreatorEarningsCredit,
    ) -> ResultEngine<EarningsCredited> {
        if !credit.amount.is_positive() {
            return Err(EngineError::InvalidAmount(format!(
                "amount must be positive, got {}",
                credit.amount
            )));
        }
        with_tx!(self, |tx| {
            self.credit_creator_earnings_tx(&tx, credit).await
        })
    }

    async fn credit_creator_earnings_tx(
        &self,
        tx: &DatabaseTransaction,
        credit: &CreatorEarningsCredit,
    ) -> ResultEngine<EarningsCredited> {
        let reference_id = credit
            .reference_id
            .as_deref()
            .or(credit.prediction_id.as_deref());
        let (_, row) = AuditRow {
            user_id: &credit.user_id,
            direction: Direction::Credit,
            kind: "deposit",
            channel: "creator_fee",
            provider: EARNINGS_PROVIDER,
            amount: credit.amount,
            currency: self.currency(),
            external_ref: &credit.external_ref,
            prediction_id: credit.prediction_id.as_deref(),
            entry_id: None,
            description: Some(&credit.description),
            from_account: Some("SYSTEM"),
            to_account: Some(Bucket::CreatorEarnings.as_str()),
            reference_type: Some("settlement"),
            reference_id,
            metadata: credit.metadata.clone(),
        }
        .into_model();

        // The audit row doubles as the idempotency record: zero rows
        // inserted means this external_ref was already processed.
        let inserted = audit::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([audit::Column::Provider, audit::Column::ExternalRef])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(tx)
            .await?;
        if inserted == 0 {
            tracing::info!(
                user_id = %credit.user_id,
                external_ref = %credit.external_ref,
                "creator earnings credit replayed, skipping"
            );
            let balances = self.summary(tx, &credit.user_id).await?;
            return Ok(EarningsCredited {
                applied: false,
                balances,
            });
        }

        let mut reference = LedgerRef::new(LedgerEntryType::CreatorEarningCredit);
        if let Some(id) = reference_id {
            reference = reference.reference("settlement", id);
        }
        if let Some(metadata) = credit.metadata.clone() {
            reference = reference.metadata(metadata);
        }
        let account = AccountRef::user(credit.user_id.as_str(), Bucket::CreatorEarnings);
        self.credit_in(tx, &account, credit.amount, &reference)
            .await?;

        let balances = self.summary(tx, &credit.user_id).await?;
        Ok(EarningsCredited {
            applied: true,
            balances,
        })
    }

    /// Moves accumulated earnings into the stakeable balance.
    pub async fn transfer_creator_earnings_to_stake(
        &self,
        user_id: &str,
        amount: Money,
    ) -> ResultEngine<EarningsMoved> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(format!(
                "amount must be positive, got {amount}"
            )));
        }
        with_tx!(self, |tx| {
            self.transfer_earnings_tx(&tx, user_id, amount).await
        })
    }

    async fn transfer_earnings_tx(
        &self,
        tx: &DatabaseTransaction,
        user_id: &str,
        amount: Money,
    ) -> ResultEngine<EarningsMoved> {
        // Precondition read without a lock; the transfer re-checks under one.
        let summary = self.summary(tx, user_id).await?;
        if summary.creator_earnings < amount {
            return Err(EngineError::InsufficientCreatorEarnings {
                available: summary.creator_earnings,
                requested: amount,
            });
        }

        let from = AccountRef::user(user_id, Bucket::CreatorEarnings);
        let to = AccountRef::user(user_id, Bucket::PromoAvailable);
        let reference = LedgerRef::new(LedgerEntryType::CreatorEarningMove);
        self.transfer_in(tx, &from, &to, amount, &reference)
            .await
            .map_err(|err| match err {
                EngineError::InsufficientFunds {
                    available,
                    requested,
                } => EngineError::InsufficientCreatorEarnings {
                    available,
                    requested,
                },
                other => other,
            })?;

        let external_ref = format!("creator_earnings_transfer:{}:{}", user_id, Uuid::new_v4());
        let (transaction_id, row) = AuditRow {
            user_id,
            direction: Direction::Credit,
            kind: "deposit",
            channel: "wallet_transfer",
            provider: EARNINGS_PROVIDER,
            amount,
            currency: self.currency(),
            external_ref: &external_ref,
            prediction_id: None,
            entry_id: None,
            description: Some("Creator earnings moved to stake balance"),
            from_account: Some(Bucket::CreatorEarnings.as_str()),
            to_account: Some(Bucket::PromoAvailable.as_str()),
            reference_type: Some("wallet_transfer"),
            reference_id: Some(user_id),
            metadata: None,
        }
        .into_model();
        row.insert(tx).await?;

        let balances = self.summary(tx, user_id).await?;
        Ok(EarningsMoved {
            transaction_id,
            balances,
        })
    }

    /// Recent audit rows that touched the creator earnings bucket, newest
    /// first. `limit` is clamped to 1..=100.
    pub async fn creator_earnings_history(
        &self,
        user_id: &str,
        limit: u64,
    ) -> ResultEngine<Vec<audit::Model>> {
        let limit = limit.clamp(1, 100);
        let touches_earnings = Condition::any()
            .add(audit::Column::FromAccount.eq(Bucket::CreatorEarnings.as_str()))
            .add(audit::Column::ToAccount.eq(Bucket::CreatorEarnings.as_str()));
        let rows = audit::Entity::find()
            .filter(audit::Column::UserId.eq(user_id))
            .filter(touches_earnings)
            .order_by_desc(audit::Column::CreatedAt)
            .limit(limit)
            .all(self.database())
            .await?;
        Ok(rows)
    }
}
