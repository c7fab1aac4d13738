use sea_orm::{ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter};

use engine::{
    AccountRef, Bucket, CreatorEarningsCredit, Engine, EngineError, LedgerEntryType, LedgerRef,
    Money, audit, mirror,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db.clone()).build();
    (engine, db)
}

fn settlement_credit(user: &str, amount: Money, external_ref: &str) -> CreatorEarningsCredit {
    CreatorEarningsCredit {
        user_id: user.to_string(),
        amount,
        description: "Creator fee from settlement".to_string(),
        external_ref: external_ref.to_string(),
        prediction_id: Some("pred-1".to_string()),
        reference_id: None,
        metadata: None,
    }
}

#[tokio::test]
async fn credit_is_applied_once_per_external_ref() {
    let (engine, db) = engine_with_db().await;

    let first = engine
        .credit_creator_earnings(&settlement_credit("carol", Money::from_units(2), "settle-1"))
        .await
        .unwrap();
    assert!(first.applied);
    assert_eq!(first.balances.creator_earnings, Money::from_units(2));

    // Same external_ref with a different amount: nothing changes.
    let replay = engine
        .credit_creator_earnings(&settlement_credit("carol", Money::from_units(5), "settle-1"))
        .await
        .unwrap();
    assert!(!replay.applied);
    assert_eq!(replay.balances.creator_earnings, Money::from_units(2));

    let audit_rows = audit::Entity::find()
        .filter(audit::Column::ExternalRef.eq("settle-1"))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(audit_rows.len(), 1);
    assert_eq!(audit_rows[0].amount_minor, Money::from_units(2).minor());
}

#[tokio::test]
async fn distinct_external_refs_accumulate() {
    let (engine, _db) = engine_with_db().await;

    engine
        .credit_creator_earnings(&settlement_credit("carol", Money::from_units(2), "settle-1"))
        .await
        .unwrap();
    let second = engine
        .credit_creator_earnings(&settlement_credit("carol", Money::from_units(5), "settle-2"))
        .await
        .unwrap();
    assert!(second.applied);
    assert_eq!(second.balances.creator_earnings, Money::from_units(7));
}

#[tokio::test]
async fn credit_rejects_non_positive_amounts() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .credit_creator_earnings(&settlement_credit("carol", Money::ZERO, "settle-1"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_AMOUNT");
}

#[tokio::test]
async fn move_to_stake_updates_all_three_figures() {
    let (engine, db) = engine_with_db().await;
    engine
        .credit_creator_earnings(&settlement_credit("carol", Money::from_units(12), "settle-1"))
        .await
        .unwrap();
    engine
        .credit(
            &AccountRef::user("carol", Bucket::PromoAvailable),
            Money::from_units(20),
            &LedgerRef::new(LedgerEntryType::DailyClaim),
        )
        .await
        .unwrap();
    engine
        .credit(
            &AccountRef::user("carol", Bucket::PromoLocked),
            Money::from_units(3),
            &LedgerRef::new(LedgerEntryType::StakeLock),
        )
        .await
        .unwrap();

    let moved = engine
        .transfer_creator_earnings_to_stake("carol", "7.5".parse().unwrap())
        .await
        .unwrap();
    assert_eq!(moved.balances.creator_earnings, "4.5".parse().unwrap());
    assert_eq!(moved.balances.stake_balance, "27.5".parse().unwrap());
    assert_eq!(moved.balances.stake_reserved, Money::from_units(3));

    // The audit row is retrievable by the returned transaction id.
    let tx_row = audit::Entity::find_by_id(moved.transaction_id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx_row.amount_minor, 750_000_000);
    assert!(tx_row.external_ref.starts_with("creator_earnings_transfer:carol:"));

    let row = mirror::Entity::find_by_id("carol")
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.creator_earnings(), "4.5".parse().unwrap());
    assert_eq!(row.stake_balance(), "27.5".parse().unwrap());
    assert_eq!(row.reserved(), Money::from_units(3));
}

#[tokio::test]
async fn move_fails_without_enough_earnings() {
    let (engine, _db) = engine_with_db().await;
    engine
        .credit_creator_earnings(&settlement_credit("carol", Money::from_units(5), "settle-1"))
        .await
        .unwrap();

    let err = engine
        .transfer_creator_earnings_to_stake("carol", Money::from_units(100))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientCreatorEarnings {
            available: Money::from_units(5),
            requested: Money::from_units(100),
        }
    );

    // No side effects.
    let summary = engine.balance_summary("carol").await.unwrap();
    assert_eq!(summary.creator_earnings, Money::from_units(5));
    assert_eq!(summary.stake_balance, Money::ZERO);
}

#[tokio::test]
async fn move_for_unknown_user_reports_zero_earnings() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .transfer_creator_earnings_to_stake("nobody", Money::from_units(1))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientCreatorEarnings {
            available: Money::ZERO,
            requested: Money::from_units(1),
        }
    );
}

#[tokio::test]
async fn history_lists_earnings_activity_newest_first() {
    let (engine, _db) = engine_with_db().await;
    engine
        .credit_creator_earnings(&settlement_credit("carol", Money::from_units(2), "settle-1"))
        .await
        .unwrap();
    engine
        .credit_creator_earnings(&settlement_credit("carol", Money::from_units(5), "settle-2"))
        .await
        .unwrap();
    engine
        .transfer_creator_earnings_to_stake("carol", Money::from_units(4))
        .await
        .unwrap();

    let rows = engine.creator_earnings_history("carol", 10).await.unwrap();
    assert_eq!(rows.len(), 3);
    for pair in rows.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }

    // Limit is clamped to at least one row.
    let rows = engine.creator_earnings_history("carol", 0).await.unwrap();
    assert_eq!(rows.len(), 1);

    // Other users see nothing.
    let rows = engine.creator_earnings_history("dave", 10).await.unwrap();
    assert!(rows.is_empty());
}
