//! Atomic bet placement.
//!
//! One transaction validates the market, checks escrow headroom, resolves
//! (or creates) the escrow lock, creates the entry, consumes the lock and
//! writes the audit and event records. Any failure rolls the whole thing
//! back; retries converge on the same entry through the unique
//! `escrow_lock_id` on entries and the unique (provider, external_ref) on
//! audit rows.

use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter};
use serde_json::json;

use super::{Engine, with_tx};
use crate::audit::{self, AuditRow, Direction};
use crate::{
    EngineError, EscrowStatus, Money, PredictionStatus, ResultEngine, escrow, events, options,
    predictions, wagers,
};

const BET_PROVIDER: &str = "escrow-usdc";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BetPlacement {
    pub entry_id: String,
    pub lock_id: String,
}

impl Engine {
    /// Places a bet, consuming escrow headroom. Pass `existing_lock_id` to
    /// spend a pre-created lock; otherwise a lock for the full stake is
    /// created (or an open one for this prediction reused) in the same
    /// transaction.
    pub async fn place_bet(
        &self,
        user_id: &str,
        prediction_id: &str,
        option_id: &str,
        amount: Money,
        existing_lock_id: Option<&str>,
    ) -> ResultEngine<BetPlacement> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(format!(
                "amount must be positive, got {amount}"
            )));
        }
        tracing::info!(
            user_id,
            prediction_id,
            option_id,
            amount = %amount,
            "placing bet"
        );
        let result: ResultEngine<BetPlacement> = with_tx!(self, |tx| {
            self.place_bet_tx(&tx, user_id, prediction_id, option_id, amount, existing_lock_id)
                .await
        });
        match &result {
            Ok(placed) => {
                tracing::info!(user_id, entry_id = %placed.entry_id, "bet placed");
            }
            Err(err) => {
                tracing::warn!(user_id, prediction_id, code = err.code(), "bet placement failed");
            }
        }
        result
    }

    async fn place_bet_tx(
        &self,
        tx: &DatabaseTransaction,
        user_id: &str,
        prediction_id: &str,
        option_id: &str,
        amount: Money,
        existing_lock_id: Option<&str>,
    ) -> ResultEngine<BetPlacement> {
        // 1. Market must exist, be open and accept entries.
        let prediction = predictions::Entity::find_by_id(prediction_id)
            .one(tx)
            .await?
            .ok_or(EngineError::PredictionNotFound)?;
        let status = prediction.status()?;
        if status != PredictionStatus::Open {
            return Err(EngineError::PredictionNotOpen(status));
        }
        if prediction.entry_deadline < chrono::Utc::now() {
            return Err(EngineError::DeadlinePassed);
        }

        // 2. Option must belong to this market.
        let option = options::Entity::find_by_id(option_id)
            .filter(options::Column::PredictionId.eq(prediction_id))
            .one(tx)
            .await?
            .ok_or(EngineError::OptionNotFound)?;

        // 3. Escrow headroom, recomputed from the user's lock rows.
        let lock_rows = escrow::Entity::find()
            .filter(escrow::Column::UserId.eq(user_id))
            .all(tx)
            .await?;
        let mut total = Money::ZERO;
        let mut reserved = Money::ZERO;
        for row in &lock_rows {
            match row.status()? {
                EscrowStatus::Locked => {
                    total = total + row.amount();
                    reserved = reserved + row.amount();
                }
                EscrowStatus::Consumed => total = total + row.amount(),
            }
        }
        let available = total - reserved;
        if available < amount {
            return Err(EngineError::InsufficientEscrow {
                available,
                requested: amount,
            });
        }

        // 4. Resolve the escrow lock to spend.
        let lock = match existing_lock_id {
            Some(lock_id) => {
                let lock = escrow::Entity::find_by_id(lock_id)
                    .one(tx)
                    .await?
                    .ok_or(EngineError::LockNotFound)?;
                if lock.user_id != user_id || lock.prediction_id != prediction_id {
                    return Err(EngineError::LockMismatch);
                }
                let status = lock.status()?;
                if status != EscrowStatus::Locked {
                    // A consumed lock with an entry is a retried placement:
                    // converge on that entry instead of failing.
                    let replayed = wagers::Entity::find()
                        .filter(wagers::Column::EscrowLockId.eq(lock.id.as_str()))
                        .one(tx)
                        .await?;
                    if let Some(entry) = replayed {
                        tracing::info!(
                            user_id,
                            entry_id = %entry.id,
                            lock_id = %lock.id,
                            "lock already consumed by existing entry, returning it"
                        );
                        return Ok(BetPlacement {
                            entry_id: entry.id,
                            lock_id: lock.id,
                        });
                    }
                    return Err(EngineError::LockNotLocked(status));
                }
                lock
            }
            None => {
                self.resolve_or_create_lock(tx, user_id, prediction_id, amount)
                    .await?
            }
        };

        // 5. An entry already referencing this lock means a retry: return it
        //    instead of double-spending.
        let existing_entry = wagers::Entity::find()
            .filter(wagers::Column::EscrowLockId.eq(lock.id.as_str()))
            .one(tx)
            .await?;
        let entry = match existing_entry {
            Some(entry) => {
                tracing::info!(
                    user_id,
                    entry_id = %entry.id,
                    lock_id = %lock.id,
                    "entry already exists for lock, reusing"
                );
                entry
            }
            None => {
                // 6. Create the entry with its payout ceiling.
                let potential = amount
                    .mul_bp(option.payout_multiplier_bp)
                    .ok_or_else(|| EngineError::InvalidAmount("payout overflow".to_string()))?;
                wagers::new_entry(
                    prediction_id,
                    option_id,
                    user_id,
                    amount,
                    potential,
                    &lock.id,
                    BET_PROVIDER,
                )
                .insert(tx)
                .await
                .map_err(|_| EngineError::EntryCreationFailed)?
            }
        };

        // 7. Consume the lock, guarded on its current status so a replayed
        //    placement leaves an already-consumed lock untouched.
        escrow::Entity::update_many()
            .col_expr(
                escrow::Column::Status,
                Expr::value(EscrowStatus::Consumed.as_str()),
            )
            .filter(escrow::Column::Id.eq(lock.id.as_str()))
            .filter(escrow::Column::Status.eq(EscrowStatus::Locked.as_str()))
            .exec(tx)
            .await?;

        // 8. Audit row (idempotent on the entry id) and event log.
        let external_ref = format!("bet_{}", entry.id);
        let (_, audit_row) = AuditRow {
            user_id,
            direction: Direction::Debit,
            kind: "bet",
            channel: "prediction",
            provider: BET_PROVIDER,
            amount,
            currency: self.currency(),
            external_ref: &external_ref,
            prediction_id: Some(prediction_id),
            entry_id: Some(&entry.id),
            description: Some(&prediction.title),
            from_account: None,
            to_account: None,
            reference_type: Some("prediction"),
            reference_id: Some(prediction_id),
            metadata: None,
        }
        .into_model();
        audit::Entity::insert(audit_row)
            .on_conflict(
                OnConflict::columns([audit::Column::Provider, audit::Column::ExternalRef])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(tx)
            .await?;

        events::new_event(
            "place_bet",
            "prediction.entry.created",
            Some(&entry.id),
            json!({
                "prediction_id": prediction_id,
                "option_id": option_id,
                "user_id": user_id,
                "amount_minor": amount.minor(),
                "lock_id": lock.id,
            }),
        )
        .insert(tx)
        .await?;

        Ok(BetPlacement {
            entry_id: entry.id,
            lock_id: lock.id,
        })
    }

    /// Finds the open lock for (user, prediction) or creates one for the
    /// full stake. Creation ignores the partial unique conflict so a
    /// concurrent placement's lock is fetched and reused rather than
    /// erroring.
    async fn resolve_or_create_lock(
        &self,
        tx: &DatabaseTransaction,
        user_id: &str,
        prediction_id: &str,
        amount: Money,
    ) -> ResultEngine<escrow::Model> {
        let find_open = || {
            escrow::Entity::find()
                .filter(escrow::Column::UserId.eq(user_id))
                .filter(escrow::Column::PredictionId.eq(prediction_id))
                .filter(escrow::Column::Status.eq(EscrowStatus::Locked.as_str()))
        };
        if let Some(lock) = find_open().one(tx).await? {
            return Ok(lock);
        }
        let row = escrow::new_lock(user_id, prediction_id, amount, self.currency(), BET_PROVIDER);
        let mut on_conflict =
            OnConflict::columns([escrow::Column::UserId, escrow::Column::PredictionId]);
        on_conflict
            // Inline literal, not a bind parameter: sqlite (and postgres)
            // cannot match the partial index against a parameterized target
            // WHERE clause.
            .target_and_where(Expr::cust(format!(
                "\"status\" = '{}'",
                EscrowStatus::Locked.as_str()
            )))
            .do_nothing();
        escrow::Entity::insert(row)
            .on_conflict(on_conflict)
            .exec_without_returning(tx)
            .await?;
        // Whether we inserted or lost the race, the open lock must exist now.
        find_open()
            .one(tx)
            .await?
            .ok_or(EngineError::LockCreationFailed)
    }
}
