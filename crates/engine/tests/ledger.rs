use sea_orm::{ColumnTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Statement};

use engine::{
    AccountRef, Bucket, Engine, EngineError, LedgerEntryType, LedgerRef, Money, OwnerType, ledger,
    mirror,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db.clone()).build();
    (engine, db)
}

fn claim() -> LedgerRef {
    LedgerRef::new(LedgerEntryType::DailyClaim)
}

#[tokio::test]
async fn credit_creates_account_lazily_and_updates_mirror() {
    let (engine, db) = engine_with_db().await;
    let stake = AccountRef::user("alice", Bucket::PromoAvailable);

    let outcome = engine
        .credit(&stake, Money::from_units(10), &claim())
        .await
        .unwrap();
    assert_eq!(outcome.to_balance, Money::from_units(10));

    let balances = engine.get_balances("alice").await.unwrap();
    assert_eq!(balances[&Bucket::PromoAvailable], Money::from_units(10));
    assert_eq!(balances[&Bucket::CreatorEarnings], Money::ZERO);

    let row = mirror::Entity::find_by_id("alice")
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.stake_balance(), Money::from_units(10));
    assert_eq!(row.reserved(), Money::ZERO);
}

#[tokio::test]
async fn zero_and_negative_amounts_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    let stake = AccountRef::user("alice", Bucket::PromoAvailable);

    let err = engine.credit(&stake, Money::ZERO, &claim()).await.unwrap_err();
    assert_eq!(err.code(), "INVALID_AMOUNT");

    let err = engine
        .debit(&stake, Money::from_minor(-5), &claim())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_AMOUNT");

    let err = engine
        .transfer(
            &stake,
            &AccountRef::user("bob", Bucket::PromoAvailable),
            Money::ZERO,
            &claim(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_AMOUNT");
}

#[tokio::test]
async fn debit_never_overdraws() {
    let (engine, _db) = engine_with_db().await;
    let stake = AccountRef::user("alice", Bucket::PromoAvailable);
    engine
        .credit(&stake, Money::from_units(10), &claim())
        .await
        .unwrap();

    engine
        .debit(&stake, Money::from_units(6), &claim())
        .await
        .unwrap();
    let err = engine
        .debit(&stake, Money::from_units(6), &claim())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientFunds {
            available: Money::from_units(4),
            requested: Money::from_units(6),
        }
    );

    let balances = engine.get_balances("alice").await.unwrap();
    assert_eq!(balances[&Bucket::PromoAvailable], Money::from_units(4));
}

#[tokio::test]
async fn transfer_moves_between_users_and_conserves_total() {
    let (engine, db) = engine_with_db().await;
    let alice = AccountRef::user("alice", Bucket::PromoAvailable);
    let bob = AccountRef::user("bob", Bucket::PromoAvailable);
    engine
        .credit(&alice, Money::from_units(10), &claim())
        .await
        .unwrap();

    let outcome = engine
        .transfer(&alice, &bob, "7.5".parse().unwrap(), &claim())
        .await
        .unwrap();
    assert_eq!(outcome.from_balance, "2.5".parse().unwrap());
    assert_eq!(outcome.to_balance, "7.5".parse().unwrap());

    // One two-sided ledger row for the move.
    let rows = ledger::Entity::find()
        .filter(ledger::Column::FromOwnerId.eq("alice"))
        .filter(ledger::Column::ToOwnerId.eq("bob"))
        .all(&db)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].amount_minor, 750_000_000);

    // Both mirrors were rewritten in the same transaction.
    let bob_mirror = mirror::Entity::find_by_id("bob")
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bob_mirror.stake_balance(), "7.5".parse().unwrap());

    for user in ["alice", "bob"] {
        let drift = engine.reconcile_owner(OwnerType::User, user).await.unwrap();
        assert!(drift.is_empty(), "unexpected drift for {user}: {drift:?}");
    }
}

#[tokio::test]
async fn transfer_to_same_account_is_invalid() {
    let (engine, _db) = engine_with_db().await;
    let stake = AccountRef::user("alice", Bucket::PromoAvailable);
    engine
        .credit(&stake, Money::from_units(10), &claim())
        .await
        .unwrap();

    let err = engine
        .transfer(&stake, &stake, Money::from_units(1), &claim())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InvalidTransfer);
}

#[tokio::test]
async fn transfer_fails_without_funds_and_leaves_no_trace() {
    let (engine, db) = engine_with_db().await;
    let alice = AccountRef::user("alice", Bucket::PromoAvailable);
    let bob = AccountRef::user("bob", Bucket::PromoAvailable);

    let err = engine
        .transfer(&alice, &bob, Money::from_units(5), &claim())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientFunds {
            available: Money::ZERO,
            requested: Money::from_units(5),
        }
    );

    let rows = ledger::Entity::find().all(&db).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn opposite_direction_transfers_share_one_lock_order() {
    let (engine, _db) = engine_with_db().await;
    let alice = AccountRef::user("alice", Bucket::PromoAvailable);
    let bob = AccountRef::user("bob", Bucket::PromoAvailable);
    engine
        .credit(&alice, Money::from_units(10), &claim())
        .await
        .unwrap();
    engine
        .credit(&bob, Money::from_units(10), &claim())
        .await
        .unwrap();

    engine
        .transfer(&alice, &bob, Money::from_units(3), &claim())
        .await
        .unwrap();
    engine
        .transfer(&bob, &alice, Money::from_units(5), &claim())
        .await
        .unwrap();

    let balances = engine.get_balances("alice").await.unwrap();
    assert_eq!(balances[&Bucket::PromoAvailable], Money::from_units(12));
    let balances = engine.get_balances("bob").await.unwrap();
    assert_eq!(balances[&Bucket::PromoAvailable], Money::from_units(8));
}

#[tokio::test]
async fn system_owner_sinks_work_like_user_accounts() {
    let (engine, db) = engine_with_db().await;
    let alice = AccountRef::user("alice", Bucket::PromoAvailable);
    let fees = AccountRef::system("platform_fees", Bucket::CashAvailable);
    engine
        .credit(&alice, Money::from_units(10), &claim())
        .await
        .unwrap();

    engine
        .transfer(
            &alice,
            &fees,
            Money::from_units(1),
            &LedgerRef::new(LedgerEntryType::PlatformFee),
        )
        .await
        .unwrap();

    // System owners get no mirror row.
    let row = mirror::Entity::find_by_id("platform_fees").one(&db).await.unwrap();
    assert!(row.is_none());

    let drift = engine
        .reconcile_owner(OwnerType::System, "platform_fees")
        .await
        .unwrap();
    assert!(drift.is_empty());
}

#[tokio::test]
async fn reconcile_reports_tampered_balances() {
    let (engine, db) = engine_with_db().await;
    let stake = AccountRef::user("alice", Bucket::PromoAvailable);
    engine
        .credit(&stake, Money::from_units(10), &claim())
        .await
        .unwrap();

    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE wallet_accounts SET balance_minor = ? WHERE owner_id = ?",
        vec![1_234.into(), "alice".into()],
    ))
    .await
    .unwrap();

    let drift = engine
        .reconcile_owner(OwnerType::User, "alice")
        .await
        .unwrap();
    assert_eq!(drift.len(), 1);
    assert_eq!(drift[0].bucket, Bucket::PromoAvailable);
    assert_eq!(drift[0].ledger_balance, Money::from_units(10));
    assert_eq!(drift[0].account_balance, Money::from_minor(1_234));
}
