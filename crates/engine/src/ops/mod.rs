use sea_orm::{DatabaseConnection, DatabaseTransaction, DbBackend, DbErr, TransactionTrait};

use crate::{Currency, EngineError, ResultEngine};

mod accounts;
mod bets;
mod earnings;
mod ledger;
mod stake_lock;

pub use accounts::BucketDrift;
pub use bets::BetPlacement;
pub use earnings::{BalanceSummary, CreatorEarningsCredit, EarningsCredited, EarningsMoved};
pub use ledger::{CreditOutcome, DebitOutcome, TransferOutcome};
pub use stake_lock::StakeLockGuard;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// The wallet core.
///
/// Holds no state beyond the connection pool: every balance used for a
/// decision is read inside the deciding transaction, under a row lock.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    currency: Currency,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub(crate) fn database(&self) -> &DatabaseConnection {
        &self.database
    }

    pub(crate) fn currency(&self) -> Currency {
        self.currency
    }

    /// Opens a transaction, mapping pool exhaustion to `DbTxUnavailable` so
    /// callers can tell a retryable infrastructure failure from a business
    /// one.
    pub(crate) async fn begin(&self) -> ResultEngine<DatabaseTransaction> {
        self.database.begin().await.map_err(|err| match err {
            DbErr::ConnectionAcquire(_) => EngineError::DbTxUnavailable,
            other => EngineError::Database(other),
        })
    }
}

/// `SELECT … FOR UPDATE` is only meaningful on Postgres; sqlite has a single
/// writer per database and serializes transactions on its own.
pub(crate) fn row_locks_supported(backend: DbBackend) -> bool {
    matches!(backend, DbBackend::Postgres)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    currency: Currency,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Ledger currency (defaults to USD).
    pub fn currency(mut self, currency: Currency) -> EngineBuilder {
        self.currency = currency;
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> Engine {
        Engine {
            database: self.database,
            currency: self.currency,
        }
    }
}
