//! Advisory serialization of stake writes per prediction.
//!
//! On Postgres the guard takes `pg_advisory_xact_lock` over a
//! (namespace, prediction id) pair, so at most one settlement-adjacent
//! writer touches a prediction's stakes at a time. The lock lives exactly
//! as long as the guard's transaction. Sqlite serializes writers on its
//! own, so the guard degrades to a plain transaction there.

use sea_orm::{ConnectionTrait, DatabaseTransaction, DbBackend, DbErr, Statement, TransactionTrait};

use super::Engine;
use crate::{EngineError, ResultEngine};

const STAKE_LOCK_NAMESPACE: &str = "prediction_stake";

/// Holds the advisory lock. Dropping the guard without calling
/// [`StakeLockGuard::release`] rolls the transaction back and releases the
/// lock with it.
#[derive(Debug)]
pub struct StakeLockGuard {
    tx: DatabaseTransaction,
}

impl StakeLockGuard {
    /// The transaction the lock is bound to. Run the protected writes on it.
    pub fn transaction(&self) -> &DatabaseTransaction {
        &self.tx
    }

    /// Ends the transaction, releasing the advisory lock. `commit: false`
    /// rolls back instead.
    pub async fn release(self, commit: bool) -> ResultEngine<()> {
        if commit {
            self.tx.commit().await?;
        } else {
            self.tx.rollback().await?;
        }
        Ok(())
    }
}

impl Engine {
    /// Blocks until this process holds the per-prediction stake lock.
    pub async fn begin_prediction_stake_lock(
        &self,
        prediction_id: &str,
    ) -> ResultEngine<StakeLockGuard> {
        let tx = self
            .database()
            .begin()
            .await
            .map_err(|err| match err {
                DbErr::ConnectionAcquire(_) => EngineError::DbLockUnavailable,
                other => EngineError::Database(other),
            })?;
        if tx.get_database_backend() == DbBackend::Postgres {
            let stmt = Statement::from_sql_and_values(
                DbBackend::Postgres,
                "SELECT pg_advisory_xact_lock(hashtext($1), hashtext($2))",
                [STAKE_LOCK_NAMESPACE.into(), prediction_id.into()],
            );
            tx.execute(stmt).await?;
            tracing::debug!(prediction_id, "acquired prediction stake lock");
        }
        Ok(StakeLockGuard { tx })
    }
}
