use chrono::Utc;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use engine::{Engine, EscrowStatus, Money, escrow};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db.clone()).build();
    (engine, db)
}

fn deposit_row(user_id: &str, amount: Money) -> escrow::ActiveModel {
    escrow::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        user_id: Set(user_id.to_string()),
        prediction_id: Set(format!("deposit-{}", Uuid::new_v4())),
        amount_minor: Set(amount.minor()),
        status: Set(EscrowStatus::Consumed.as_str().to_string()),
        currency: Set("USD".to_string()),
        provider: Set("escrow-usdc".to_string()),
        created_at: Set(Utc::now()),
    }
}

#[tokio::test]
async fn released_guard_commits_work_done_under_it() {
    let (engine, db) = engine_with_db().await;

    let guard = engine.begin_prediction_stake_lock("pred-1").await.unwrap();
    deposit_row("alice", Money::from_units(10))
        .insert(guard.transaction())
        .await
        .unwrap();
    guard.release(true).await.unwrap();

    assert_eq!(escrow::Entity::find().all(&db).await.unwrap().len(), 1);
}

#[tokio::test]
async fn abandoned_guard_rolls_back() {
    let (engine, db) = engine_with_db().await;

    let guard = engine.begin_prediction_stake_lock("pred-1").await.unwrap();
    deposit_row("alice", Money::from_units(10))
        .insert(guard.transaction())
        .await
        .unwrap();
    guard.release(false).await.unwrap();

    assert!(escrow::Entity::find().all(&db).await.unwrap().is_empty());
}
