//! Wallet ledger and atomic settlement core for a prediction platform.
//!
//! Balances live in typed accounts keyed by (owner, currency, bucket) and
//! change only through the movement primitives in [`ops`], which run under
//! row locks, append to an immutable ledger and keep a legacy denormalized
//! mirror in step. On top of the primitives sit the business workflows:
//! idempotent creator earnings credits, the earnings-to-stake move and
//! atomic bet placement against escrowed deposits.
//!
//! ```rust,no_run
//! use engine::{Engine, Money};
//!
//! # async fn run(db: sea_orm::DatabaseConnection) -> Result<(), engine::EngineError> {
//! let engine = Engine::builder().database(db).build();
//! let placed = engine
//!     .place_bet("user-1", "pred-1", "opt-yes", Money::from_units(25), None)
//!     .await?;
//! println!("entry {}", placed.entry_id);
//! # Ok(())
//! # }
//! ```

pub mod accounts;
pub mod audit;
mod currency;
mod error;
pub mod escrow;
pub mod events;
pub mod ledger;
pub mod mirror;
mod money;
mod ops;
pub mod options;
pub mod predictions;
pub mod wagers;

pub use accounts::{AccountRef, Bucket, OwnerType};
pub use currency::Currency;
pub use error::EngineError;
pub use escrow::EscrowStatus;
pub use ledger::{LedgerEntryType, LedgerRef};
pub use money::{MINOR_PER_UNIT, Money};
pub use ops::{
    BalanceSummary, BetPlacement, BucketDrift, CreatorEarningsCredit, CreditOutcome, DebitOutcome,
    EarningsCredited, EarningsMoved, Engine, EngineBuilder, StakeLockGuard, TransferOutcome,
};
pub use predictions::PredictionStatus;
pub use wagers::WagerStatus;

pub(crate) type ResultEngine<T> = Result<T, EngineError>;
