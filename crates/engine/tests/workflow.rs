use sea_orm::{Database, DatabaseConnection};

use engine::{
    ContainerEdit, ContainerStatus, DeclaredShipment, EngineError, Engine, IncidentInput,
    IncidentStatus, Money, ReviewDisposition, TransactionKind, TransactionStatus, ValueDetailEdit,
};
use migration::MigratorTrait;
use uuid::Uuid;

const BILL_10K: i32 = 3;
const BILL_50K: i32 = 5;
const COIN_500: i32 = 14;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn engine_with_file_db() -> (Engine, DatabaseConnection, String, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();

    (engine, db, url, path)
}

async fn checkin_million(engine: &Engine) -> Uuid {
    engine
        .checkin(
            DeclaredShipment::new("OS-1001")
                .counts(1, 0, 0, 0)
                .bill(Money::major(1_000_000)),
            "alice",
        )
        .await
        .unwrap()
}

fn two_half_million_lines() -> ContainerEdit {
    ContainerEdit::bag("B-001")
        .line(ValueDetailEdit::bill(BILL_10K).quantity(50))
        .line(ValueDetailEdit::bill(BILL_10K).quantity(50))
}

#[tokio::test]
async fn checkin_records_declared_values_and_words() {
    let (engine, _db) = engine_with_db().await;

    let tx_id = checkin_million(&engine).await;

    let transaction = engine.transaction(tx_id).await.unwrap();
    assert_eq!(transaction.status, TransactionStatus::Checkin);
    assert_eq!(transaction.kind, TransactionKind::Collection);
    assert_eq!(transaction.declared.total, Money::major(1_000_000));
    assert_eq!(transaction.declared_words, "UN MILLON DE PESOS M/CTE");
    assert_eq!(transaction.counted_words, "CERO PESOS M/CTE");
    assert_eq!(transaction.value_difference, Money::major(-1_000_000));
    assert_eq!(transaction.registered_by, "alice");
}

#[tokio::test]
async fn checkin_rejects_unknown_order_blank_actor_and_negative_values() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .checkin(DeclaredShipment::new("OS-9999"), "alice")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("service order not exists".to_string())
    );

    let err = engine
        .checkin(DeclaredShipment::new("OS-1001"), "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidId(_)));

    let err = engine
        .checkin(
            DeclaredShipment::new("OS-1001").bill(Money::major(-1)),
            "alice",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn checkin_replay_with_same_idempotency_key_returns_same_transaction() {
    let (engine, _db) = engine_with_db().await;

    let shipment = DeclaredShipment::new("OS-1001")
        .bill(Money::major(200_000))
        .idempotency_key("planilla-77");
    let first = engine.checkin(shipment.clone(), "alice").await.unwrap();
    let second = engine.checkin(shipment, "alice").await.unwrap();
    assert_eq!(first, second);

    let err = engine
        .checkin(
            DeclaredShipment::new("OS-1003").idempotency_key("planilla-77"),
            "alice",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Invariant(_)));
}

#[tokio::test]
async fn counted_cash_matching_declaration_has_zero_difference() {
    let (engine, _db) = engine_with_db().await;
    let tx_id = checkin_million(&engine).await;

    engine
        .save_containers(tx_id, vec![two_half_million_lines()], "alice")
        .await
        .unwrap();

    let totals = engine.totals(tx_id).await.unwrap();
    assert_eq!(totals.status, TransactionStatus::InProcess);
    assert_eq!(totals.counted.bill_low, Money::major(1_000_000));
    assert_eq!(totals.counted.bill_high, Money::ZERO);
    assert_eq!(totals.counted.cash_subtotal, Money::major(1_000_000));
    assert_eq!(totals.difference, Money::ZERO);
    assert_eq!(totals.counted_words, "UN MILLON DE PESOS M/CTE");
}

#[tokio::test]
async fn adjusted_shortage_moves_difference_and_allows_finalize() {
    let (engine, _db) = engine_with_db().await;
    let tx_id = checkin_million(&engine).await;
    engine
        .save_containers(tx_id, vec![two_half_million_lines()], "alice")
        .await
        .unwrap();

    let incident_id = engine
        .register_incident(
            IncidentInput::new("FALTANTE")
                .transaction(tx_id)
                .amount(Money::major(5_000)),
            "alice",
        )
        .await
        .unwrap();

    // Reported incidents carry no effect yet and block the finalize gate.
    assert_eq!(engine.totals(tx_id).await.unwrap().difference, Money::ZERO);
    let err = engine.finalize(tx_id, "alice").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Incomplete("transaction has incidents awaiting adjudication".to_string())
    );

    let incident = engine
        .resolve_incident(incident_id, IncidentStatus::Adjusted, "bob")
        .await
        .unwrap();
    assert_eq!(incident.status, IncidentStatus::Adjusted);
    assert_eq!(incident.resolved_by.as_deref(), Some("bob"));

    let totals = engine.totals(tx_id).await.unwrap();
    assert_eq!(totals.approved_effect, Money::major(-5_000));
    assert_eq!(totals.difference, Money::major(-5_000));

    let totals = engine.finalize(tx_id, "alice").await.unwrap();
    assert_eq!(totals.status, TransactionStatus::PendingReview);
    assert_eq!(totals.difference, Money::major(-5_000));

    let err = engine.finalize(tx_id, "alice").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidState {
            current: "pending_review".to_string(),
            message: "transaction cannot be finalized".to_string(),
        }
    );
}

#[tokio::test]
async fn finalize_requires_counted_containers() {
    let (engine, _db) = engine_with_db().await;
    let tx_id = checkin_million(&engine).await;

    let err = engine.finalize(tx_id, "alice").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Incomplete("transaction has no containers".to_string())
    );

    engine
        .save_containers(
            tx_id,
            vec![
                two_half_million_lines(),
                ContainerEdit::bag("B-002").declared_value(Money::major(10_000)),
            ],
            "alice",
        )
        .await
        .unwrap();

    let err = engine.finalize(tx_id, "alice").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Incomplete("1 container(s) still pending or in process".to_string())
    );
    // The failed gate leaves the transaction counting.
    assert_eq!(
        engine.transaction(tx_id).await.unwrap().status,
        TransactionStatus::InProcess
    );
}

#[tokio::test]
async fn closed_transaction_rejects_counting_changes() {
    let (engine, _db) = engine_with_db().await;
    let tx_id = checkin_million(&engine).await;
    let ids = engine
        .save_containers(tx_id, vec![two_half_million_lines()], "alice")
        .await
        .unwrap();
    engine.finalize(tx_id, "alice").await.unwrap();

    let err = engine
        .save_containers(
            tx_id,
            vec![
                ContainerEdit::bag("B-001")
                    .id(ids[0])
                    .line(ValueDetailEdit::bill(BILL_50K).quantity(1)),
            ],
            "alice",
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidState {
            current: "pending_review".to_string(),
            message: "transaction is closed for counting".to_string(),
        }
    );

    let err = engine
        .register_incident(IncidentInput::new("SELLO_ROTO").transaction(tx_id), "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState { .. }));
}

#[tokio::test]
async fn review_then_cancel_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let tx_id = checkin_million(&engine).await;
    engine
        .save_containers(tx_id, vec![two_half_million_lines()], "alice")
        .await
        .unwrap();

    let err = engine
        .review(tx_id, ReviewDisposition::Approved, "carol")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidState {
            current: "in_process".to_string(),
            message: "only transactions pending review can be reviewed".to_string(),
        }
    );

    engine.finalize(tx_id, "alice").await.unwrap();
    let reviewed = engine
        .review(tx_id, ReviewDisposition::Approved, "carol")
        .await
        .unwrap();
    assert_eq!(reviewed.status, TransactionStatus::Approved);
    assert_eq!(reviewed.reviewed_by.as_deref(), Some("carol"));
    assert_eq!(reviewed.disposition, Some(ReviewDisposition::Approved));

    let err = engine.cancel(tx_id, "alice").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidState {
            current: "approved".to_string(),
            message: "transaction cannot move to cancelled".to_string(),
        }
    );
}

#[tokio::test]
async fn cancel_open_transaction_records_actor() {
    let (engine, _db) = engine_with_db().await;
    let tx_id = checkin_million(&engine).await;

    let cancelled = engine.cancel(tx_id, "alice").await.unwrap();
    assert_eq!(cancelled.status, TransactionStatus::Cancelled);
    assert_eq!(cancelled.cancelled_by.as_deref(), Some("alice"));

    let stored = engine.transaction(tx_id).await.unwrap();
    assert_eq!(stored.status, TransactionStatus::Cancelled);
    assert!(stored.cancelled_at.is_some());
}

#[tokio::test]
async fn recompute_is_idempotent() {
    let (engine, _db) = engine_with_db().await;
    let tx_id = checkin_million(&engine).await;
    engine
        .save_containers(
            tx_id,
            vec![
                ContainerEdit::bag("B-001")
                    .line(ValueDetailEdit::bill(BILL_50K).bundles(1).loose(10))
                    .line(ValueDetailEdit::coin(COIN_500).loose(40)),
            ],
            "alice",
        )
        .await
        .unwrap();

    let first = engine.recompute_totals(tx_id).await.unwrap();
    let second = engine.recompute_totals(tx_id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.counted.bill_high, Money::major(5_500_000));
    assert_eq!(first.counted.coin, Money::major(20_000));
    assert_eq!(
        first.difference,
        Money::major(5_520_000) - Money::major(1_000_000)
    );
}

#[tokio::test]
async fn provision_compares_against_bill_and_coin() {
    let (engine, _db) = engine_with_db().await;
    let tx_id = engine
        .checkin(
            DeclaredShipment::new("OS-1002")
                .bill(Money::major(100_000))
                .coin(Money::major(5_000))
                .total(Money::major(999_999)),
            "alice",
        )
        .await
        .unwrap();

    engine
        .save_containers(
            tx_id,
            vec![
                ContainerEdit::bag("P-1")
                    .line(ValueDetailEdit::bill(BILL_10K).quantity(10))
                    .line(ValueDetailEdit::coin(COIN_500).quantity(10)),
            ],
            "alice",
        )
        .await
        .unwrap();

    let totals = engine.totals(tx_id).await.unwrap();
    assert_eq!(totals.kind, TransactionKind::Provision);
    assert_eq!(totals.declared_cash, Money::major(105_000));
    assert_eq!(totals.counted.cash_subtotal, Money::major(105_000));
    assert_eq!(totals.difference, Money::ZERO);
}

#[tokio::test]
async fn verified_container_cannot_be_edited() {
    let (engine, _db) = engine_with_db().await;
    let tx_id = checkin_million(&engine).await;
    let ids = engine
        .save_containers(tx_id, vec![two_half_million_lines()], "alice")
        .await
        .unwrap();

    let verified = engine.verify_container(ids[0], "bob").await.unwrap();
    assert_eq!(verified.status, ContainerStatus::Verified);

    let err = engine
        .save_containers(
            tx_id,
            vec![ContainerEdit::bag("B-001").id(ids[0])],
            "alice",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState { .. }));
}

#[tokio::test]
async fn concurrent_saves_on_one_transaction_keep_totals_consistent() {
    let (engine, db, _url, path) = engine_with_file_db().await;
    let tx_id = checkin_million(&engine).await;

    let first = engine.save_containers(
        tx_id,
        vec![ContainerEdit::bag("B-A").line(ValueDetailEdit::bill(BILL_10K).quantity(30))],
        "alice",
    );
    let second = engine.save_containers(
        tx_id,
        vec![ContainerEdit::bag("B-B").line(ValueDetailEdit::bill(BILL_10K).quantity(70))],
        "bob",
    );
    let (first, second) = tokio::join!(first, second);
    first.unwrap();
    second.unwrap();

    let totals = engine.totals(tx_id).await.unwrap();
    assert_eq!(totals.counted.cash_subtotal, Money::major(1_000_000));
    assert_eq!(totals.difference, Money::ZERO);
    assert_eq!(engine.containers(tx_id).await.unwrap().len(), 2);

    drop(engine);
    drop(db);
    let _ = std::fs::remove_file(path);
}
