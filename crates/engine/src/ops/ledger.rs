//! Movement primitives: credit, debit and the two-sided transfer.
//!
//! Each primitive runs under row locks, rejects non-positive amounts,
//! appends exactly one ledger row and rewrites the legacy mirror for every
//! user owner it touched. The `_in` variants join a caller-owned
//! transaction; the plain variants open and commit their own.

use sea_orm::{ActiveModelTrait, DatabaseTransaction};

use super::{Engine, with_tx};
use crate::{AccountRef, EngineError, LedgerRef, Money, OwnerType, ResultEngine, ledger};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreditOutcome {
    pub ledger_id: String,
    pub to_balance: Money,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebitOutcome {
    pub ledger_id: String,
    pub from_balance: Money,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferOutcome {
    pub ledger_id: String,
    pub from_balance: Money,
    pub to_balance: Money,
}

fn require_positive(amount: Money) -> ResultEngine<()> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount(format!(
            "amount must be positive, got {amount}"
        )));
    }
    Ok(())
}

fn overflow() -> EngineError {
    EngineError::InvalidAmount("balance overflow".to_string())
}

impl Engine {
    /// Mint into an account.
    pub async fn credit(
        &self,
        to: &AccountRef,
        amount: Money,
        reference: &LedgerRef,
    ) -> ResultEngine<CreditOutcome> {
        with_tx!(self, |tx| self.credit_in(&tx, to, amount, reference).await)
    }

    pub async fn credit_in(
        &self,
        tx: &DatabaseTransaction,
        to: &AccountRef,
        amount: Money,
        reference: &LedgerRef,
    ) -> ResultEngine<CreditOutcome> {
        require_positive(amount)?;
        self.ensure_account(tx, to).await?;
        let locked = self.lock_account(tx, to).await?;
        let next = locked.balance.checked_add(amount).ok_or_else(overflow)?;
        self.write_balance(tx, &locked, next).await?;
        let (ledger_id, row) = ledger::entry(self.currency(), amount, None, Some(to), reference);
        row.insert(tx).await?;
        if to.owner_type == OwnerType::User {
            self.sync_legacy_mirror(tx, &to.owner_id).await?;
        }
        Ok(CreditOutcome {
            ledger_id,
            to_balance: next,
        })
    }

    /// Burn from an account. Fails with `InsufficientFunds` rather than let
    /// a balance go negative.
    pub async fn debit(
        &self,
        from: &AccountRef,
        amount: Money,
        reference: &LedgerRef,
    ) -> ResultEngine<DebitOutcome> {
        with_tx!(self, |tx| self.debit_in(&tx, from, amount, reference).await)
    }

    pub async fn debit_in(
        &self,
        tx: &DatabaseTransaction,
        from: &AccountRef,
        amount: Money,
        reference: &LedgerRef,
    ) -> ResultEngine<DebitOutcome> {
        require_positive(amount)?;
        self.ensure_account(tx, from).await?;
        let locked = self.lock_account(tx, from).await?;
        if locked.balance < amount {
            return Err(EngineError::InsufficientFunds {
                available: locked.balance,
                requested: amount,
            });
        }
        let next = locked.balance - amount;
        self.write_balance(tx, &locked, next).await?;
        let (ledger_id, row) = ledger::entry(self.currency(), amount, Some(from), None, reference);
        row.insert(tx).await?;
        if from.owner_type == OwnerType::User {
            self.sync_legacy_mirror(tx, &from.owner_id).await?;
        }
        Ok(DebitOutcome {
            ledger_id,
            from_balance: next,
        })
    }

    /// Move between two accounts atomically.
    pub async fn transfer(
        &self,
        from: &AccountRef,
        to: &AccountRef,
        amount: Money,
        reference: &LedgerRef,
    ) -> ResultEngine<TransferOutcome> {
        with_tx!(self, |tx| {
            self.transfer_in(&tx, from, to, amount, reference).await
        })
    }

    pub async fn transfer_in(
        &self,
        tx: &DatabaseTransaction,
        from: &AccountRef,
        to: &AccountRef,
        amount: Money,
        reference: &LedgerRef,
    ) -> ResultEngine<TransferOutcome> {
        require_positive(amount)?;
        if from == to {
            return Err(EngineError::InvalidTransfer);
        }
        self.ensure_account(tx, from).await?;
        self.ensure_account(tx, to).await?;

        // Lock both rows in the global order, whichever side they are on.
        let mut ordered = [from, to];
        ordered.sort_by(|a, b| a.lock_key().cmp(&b.lock_key()));
        let first = self.lock_account(tx, ordered[0]).await?;
        let second = self.lock_account(tx, ordered[1]).await?;
        let (from_locked, to_locked) = if ordered[0] == from {
            (first, second)
        } else {
            (second, first)
        };

        if from_locked.balance < amount {
            return Err(EngineError::InsufficientFunds {
                available: from_locked.balance,
                requested: amount,
            });
        }
        let from_next = from_locked.balance - amount;
        let to_next = to_locked.balance.checked_add(amount).ok_or_else(overflow)?;
        self.write_balance(tx, &from_locked, from_next).await?;
        self.write_balance(tx, &to_locked, to_next).await?;

        let (ledger_id, row) =
            ledger::entry(self.currency(), amount, Some(from), Some(to), reference);
        row.insert(tx).await?;

        if from.owner_type == OwnerType::User {
            self.sync_legacy_mirror(tx, &from.owner_id).await?;
        }
        let same_user = from.owner_type == to.owner_type && from.owner_id == to.owner_id;
        if to.owner_type == OwnerType::User && !same_user {
            self.sync_legacy_mirror(tx, &to.owner_id).await?;
        }

        Ok(TransferOutcome {
            ledger_id,
            from_balance: from_next,
            to_balance: to_next,
        })
    }
}
