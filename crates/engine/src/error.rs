//! Error taxonomy for the wallet core.
//!
//! Business preconditions (insufficient balances, closed markets, lock
//! misuse) are ordinary typed outcomes; infrastructure failures (pool or
//! advisory lock unavailable, database errors) form a separate class so
//! callers can decide to retry only those. Every failure rolls back the
//! enclosing transaction in full.

use sea_orm::DbErr;
use thiserror::Error;

use crate::{EscrowStatus, Money, PredictionStatus};

/// Engine custom errors.
///
/// `code()` yields the stable wire code route handlers expose; the payload
/// fields replace the colon-delimited strings the legacy service parsed out
/// of exception messages.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Source and destination cannot be identical")]
    InvalidTransfer,
    #[error("Wallet account not found")]
    AccountNotFound,
    #[error("Insufficient balance: available {available}, requested {requested}")]
    InsufficientFunds { available: Money, requested: Money },
    #[error("Insufficient creator earnings: available {available}, requested {requested}")]
    InsufficientCreatorEarnings { available: Money, requested: Money },
    #[error("Insufficient escrow: available {available}, requested {requested}")]
    InsufficientEscrow { available: Money, requested: Money },
    #[error("Prediction not found")]
    PredictionNotFound,
    #[error("Prediction is {0}")]
    PredictionNotOpen(PredictionStatus),
    #[error("Entry deadline has passed")]
    DeadlinePassed,
    #[error("Option not found for prediction")]
    OptionNotFound,
    #[error("Escrow lock not found")]
    LockNotFound,
    #[error("Escrow lock belongs to another user or prediction")]
    LockMismatch,
    #[error("Escrow lock is {0}, expected locked")]
    LockNotLocked(EscrowStatus),
    #[error("Failed to create escrow lock")]
    LockCreationFailed,
    #[error("Failed to create prediction entry")]
    EntryCreationFailed,
    #[error("Database transaction pool is unavailable")]
    DbTxUnavailable,
    #[error("Database advisory lock is unavailable")]
    DbLockUnavailable,
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Stable machine-readable code for API error responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidTransfer => "INVALID_TRANSFER",
            Self::AccountNotFound => "ACCOUNT_NOT_FOUND",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::InsufficientCreatorEarnings { .. } => "INSUFFICIENT_CREATOR_EARNINGS",
            Self::InsufficientEscrow { .. } => "INSUFFICIENT_ESCROW",
            Self::PredictionNotFound => "PREDICTION_NOT_FOUND",
            Self::PredictionNotOpen(_) => "PREDICTION_NOT_OPEN",
            Self::DeadlinePassed => "DEADLINE_PASSED",
            Self::OptionNotFound => "OPTION_NOT_FOUND",
            Self::LockNotFound => "LOCK_NOT_FOUND",
            Self::LockMismatch => "LOCK_MISMATCH",
            Self::LockNotLocked(_) => "LOCK_NOT_LOCKED",
            Self::LockCreationFailed => "LOCK_CREATION_FAILED",
            Self::EntryCreationFailed => "ENTRY_CREATION_FAILED",
            Self::DbTxUnavailable => "DB_TX_UNAVAILABLE",
            Self::DbLockUnavailable => "DB_LOCK_UNAVAILABLE",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// `true` for failures of the infrastructure class (worth retrying),
    /// `false` for business outcomes.
    #[must_use]
    pub const fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::DbTxUnavailable | Self::DbLockUnavailable | Self::Database(_)
        )
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidTransfer, Self::InvalidTransfer) => true,
            (Self::AccountNotFound, Self::AccountNotFound) => true,
            (
                Self::InsufficientFunds {
                    available: a,
                    requested: r,
                },
                Self::InsufficientFunds {
                    available: b,
                    requested: s,
                },
            ) => a == b && r == s,
            (
                Self::InsufficientCreatorEarnings {
                    available: a,
                    requested: r,
                },
                Self::InsufficientCreatorEarnings {
                    available: b,
                    requested: s,
                },
            ) => a == b && r == s,
            (
                Self::InsufficientEscrow {
                    available: a,
                    requested: r,
                },
                Self::InsufficientEscrow {
                    available: b,
                    requested: s,
                },
            ) => a == b && r == s,
            (Self::PredictionNotFound, Self::PredictionNotFound) => true,
            (Self::PredictionNotOpen(a), Self::PredictionNotOpen(b)) => a == b,
            (Self::DeadlinePassed, Self::DeadlinePassed) => true,
            (Self::OptionNotFound, Self::OptionNotFound) => true,
            (Self::LockNotFound, Self::LockNotFound) => true,
            (Self::LockMismatch, Self::LockMismatch) => true,
            (Self::LockNotLocked(a), Self::LockNotLocked(b)) => a == b,
            (Self::LockCreationFailed, Self::LockCreationFailed) => true,
            (Self::EntryCreationFailed, Self::EntryCreationFailed) => true,
            (Self::DbTxUnavailable, Self::DbTxUnavailable) => true,
            (Self::DbLockUnavailable, Self::DbLockUnavailable) => true,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        let err = EngineError::InsufficientEscrow {
            available: Money::from_units(10),
            requested: Money::from_units(20),
        };
        assert_eq!(err.code(), "INSUFFICIENT_ESCROW");
        assert_eq!(EngineError::InvalidTransfer.code(), "INVALID_TRANSFER");
        assert_eq!(EngineError::DbLockUnavailable.code(), "DB_LOCK_UNAVAILABLE");
    }

    #[test]
    fn infrastructure_class_is_retryable_only() {
        assert!(EngineError::DbTxUnavailable.is_infrastructure());
        assert!(EngineError::DbLockUnavailable.is_infrastructure());
        assert!(!EngineError::PredictionNotFound.is_infrastructure());
        assert!(
            !EngineError::InsufficientFunds {
                available: Money::ZERO,
                requested: Money::from_units(1),
            }
            .is_infrastructure()
        );
    }
}
