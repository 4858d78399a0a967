use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    ContainerEdit, ContainerKind, ContainerStatus, Currency, DeclaredShipment, EffectScope,
    Engine, EngineError, EnvelopeKind, IncidentInput, IncidentStatus, Money, TransactionStatus,
    ValueDetailEdit, ValueType,
};
use migration::MigratorTrait;
use uuid::Uuid;

const BILL_20K: i32 = 4;
const BILL_100K: i32 = 6;
const BILL_USD_100: i32 = 26;
const COIN_1000: i32 = 15;
const QUALITY_APTO_COIN: i32 = 4;
const BANK_BCO: i32 = 2;

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

async fn checkin(engine: &Engine, service_order: &str) -> Uuid {
    engine
        .checkin(
            DeclaredShipment::new(service_order).bill(Money::major(500_000)),
            "alice",
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn deleting_the_only_bag_fails_and_keeps_totals() {
    let (engine, _db) = engine_with_db().await;
    let tx_id = checkin(&engine, "OS-1001").await;
    let ids = engine
        .save_containers(
            tx_id,
            vec![ContainerEdit::bag("B-001").line(ValueDetailEdit::bill(BILL_20K).quantity(5))],
            "alice",
        )
        .await
        .unwrap();
    let before = engine.totals(tx_id).await.unwrap();

    let err = engine
        .delete_container(tx_id, ids[0], "alice")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Invariant("cannot delete the only bag of a transaction".to_string())
    );
    assert_eq!(engine.totals(tx_id).await.unwrap(), before);
    assert_eq!(engine.containers(tx_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn bag_holding_envelopes_cannot_be_deleted_until_emptied() {
    let (engine, _db) = engine_with_db().await;
    let tx_id = checkin(&engine, "OS-1001").await;
    let bag_a = Uuid::new_v4();
    let bag_b = Uuid::new_v4();
    let envelope = Uuid::new_v4();

    // Envelope listed before its bag: bags are written first.
    engine
        .save_containers(
            tx_id,
            vec![
                ContainerEdit::envelope(bag_a, EnvelopeKind::Cash, "S-001")
                    .id(envelope)
                    .line(ValueDetailEdit::bill(BILL_100K).quantity(2)),
                ContainerEdit::bag("B-001")
                    .id(bag_a)
                    .line(ValueDetailEdit::bill(BILL_20K).quantity(10)),
                ContainerEdit::bag("B-002")
                    .id(bag_b)
                    .line(ValueDetailEdit::coin(COIN_1000).quantity(30)),
            ],
            "alice",
        )
        .await
        .unwrap();

    let totals = engine.totals(tx_id).await.unwrap();
    assert_eq!(totals.counted.bill_high, Money::major(200_000));
    assert_eq!(totals.counted.bill_low, Money::major(200_000));
    assert_eq!(totals.counted.coin, Money::major(30_000));

    let err = engine
        .delete_container(tx_id, bag_a, "alice")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Invariant("bag B-001 still holds envelopes".to_string())
    );

    let totals = engine.delete_container(tx_id, envelope, "alice").await.unwrap();
    assert_eq!(totals.counted.bill_high, Money::ZERO);
    assert_eq!(totals.counted.cash_subtotal, Money::major(230_000));

    let totals = engine.delete_container(tx_id, bag_a, "alice").await.unwrap();
    assert_eq!(totals.counted.cash_subtotal, Money::major(30_000));
    let remaining = engine.containers(tx_id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, bag_b);
}

#[tokio::test]
async fn envelope_parent_must_be_a_bag_of_the_transaction() {
    let (engine, _db) = engine_with_db().await;
    let tx_id = checkin(&engine, "OS-1001").await;
    let bag = Uuid::new_v4();
    let envelope = Uuid::new_v4();
    engine
        .save_containers(
            tx_id,
            vec![
                ContainerEdit::bag("B-001").id(bag),
                ContainerEdit::envelope(bag, EnvelopeKind::Cash, "S-001").id(envelope),
            ],
            "alice",
        )
        .await
        .unwrap();

    for parent in [envelope, Uuid::new_v4()] {
        let err = engine
            .save_containers(
                tx_id,
                vec![ContainerEdit::envelope(parent, EnvelopeKind::Cash, "S-002")],
                "alice",
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Invariant(
                "envelope parent must be a bag of the same transaction".to_string()
            )
        );
    }

    let err = engine
        .save_containers(tx_id, vec![ContainerEdit::bag("S-001").id(envelope)], "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Invariant(_)));
}

#[tokio::test]
async fn point_without_optional_kinds_rejects_envelopes_and_checks() {
    let (engine, _db) = engine_with_db().await;
    let tx_id = checkin(&engine, "OS-1004").await;
    let bag = Uuid::new_v4();

    let err = engine
        .save_containers(
            tx_id,
            vec![
                ContainerEdit::bag("B-001").id(bag),
                ContainerEdit::envelope(bag, EnvelopeKind::Cash, "S-001"),
            ],
            "alice",
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Invariant("envelopes are not allowed for this service".to_string())
    );

    let err = engine
        .save_containers(
            tx_id,
            vec![
                ContainerEdit::bag("B-001")
                    .line(ValueDetailEdit::check(Money::major(150_000)).quantity(1)),
            ],
            "alice",
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Invariant("value type check is not allowed for this service".to_string())
    );

    // Rejected requests leave nothing behind, not even the status change.
    assert!(engine.containers(tx_id).await.unwrap().is_empty());
    assert_eq!(
        engine.transaction(tx_id).await.unwrap().status,
        TransactionStatus::Checkin
    );

    let caps = engine.point_capabilities("OS-1004").await.unwrap();
    assert!(!caps.allows_envelopes && !caps.allows_checks && !caps.allows_documents);
}

#[tokio::test]
async fn envelope_subtype_limits_its_lines() {
    let (engine, _db) = engine_with_db().await;
    let tx_id = checkin(&engine, "OS-1001").await;
    let bag = Uuid::new_v4();

    let err = engine
        .save_containers(
            tx_id,
            vec![
                ContainerEdit::bag("B-001").id(bag),
                ContainerEdit::envelope(bag, EnvelopeKind::Cash, "S-001")
                    .line(ValueDetailEdit::document(Money::major(80_000))),
            ],
            "alice",
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Invariant("cash envelope cannot hold document lines".to_string())
    );
}

#[tokio::test]
async fn checks_and_documents_count_overall_but_not_cash() {
    let (engine, _db) = engine_with_db().await;
    let tx_id = checkin(&engine, "OS-1001").await;
    let bag = Uuid::new_v4();

    let ids = engine
        .save_containers(
            tx_id,
            vec![
                ContainerEdit::bag("B-001").id(bag),
                ContainerEdit::envelope(bag, EnvelopeKind::Check, "C-001").line(
                    ValueDetailEdit::check(Money::major(150_000))
                        .quantity(2)
                        .bank_entity(BANK_BCO)
                        .account_number(" 123-456 ")
                        .check_number("0099")
                        .issued_on(NaiveDate::from_ymd_opt(2026, 9, 30).unwrap()),
                ),
                ContainerEdit::envelope(bag, EnvelopeKind::Document, "D-001")
                    .line(ValueDetailEdit::document(Money::major(45_000))),
            ],
            "alice",
        )
        .await
        .unwrap();

    let totals = engine.totals(tx_id).await.unwrap();
    assert_eq!(totals.counted.check, Money::major(300_000));
    assert_eq!(totals.counted.document, Money::major(45_000));
    assert_eq!(totals.counted.cash_subtotal, Money::ZERO);
    assert_eq!(totals.counted.overall, Money::major(345_000));

    let check_envelope = engine.container_with_detail(ids[1]).await.unwrap();
    assert_eq!(
        check_envelope.kind,
        ContainerKind::Envelope {
            parent_id: bag,
            subtype: EnvelopeKind::Check,
        }
    );
    let line = &check_envelope.details[0];
    assert_eq!(line.value_type, ValueType::Check);
    assert_eq!(line.unit_value, Money::major(150_000));
    assert_eq!(line.account_number.as_deref(), Some("123-456"));
    assert_eq!(line.bank_entity_id, Some(BANK_BCO));
}

#[tokio::test]
async fn line_references_are_checked_against_the_catalog() {
    let (engine, _db) = engine_with_db().await;
    let tx_id = checkin(&engine, "OS-1001").await;

    let err = engine
        .save_containers(
            tx_id,
            vec![ContainerEdit::bag("B-001").line(ValueDetailEdit::bill(99).quantity(1))],
            "alice",
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Unconfigured("denomination 99 not found".to_string())
    );

    let err = engine
        .save_containers(
            tx_id,
            vec![ContainerEdit::bag("B-001").line(ValueDetailEdit::bill(COIN_1000).quantity(1))],
            "alice",
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Invariant(format!("denomination {COIN_1000} is not a bill"))
    );

    let err = engine
        .save_containers(
            tx_id,
            vec![
                ContainerEdit::bag("B-001").line(
                    ValueDetailEdit::bill(BILL_20K)
                        .quantity(1)
                        .quality(QUALITY_APTO_COIN),
                ),
            ],
            "alice",
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Invariant("quality APTO does not grade bill lines".to_string())
    );

    let err = engine
        .save_containers(
            tx_id,
            vec![ContainerEdit::bag("   ")],
            "alice",
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Invariant("container code must not be empty".to_string())
    );
}

#[tokio::test]
async fn saving_again_by_id_updates_in_place() {
    let (engine, _db) = engine_with_db().await;
    let tx_id = checkin(&engine, "OS-1001").await;
    let bag = Uuid::new_v4();
    let first_line = Uuid::new_v4();
    let second_line = Uuid::new_v4();

    engine
        .save_containers(
            tx_id,
            vec![
                ContainerEdit::bag("B-001")
                    .id(bag)
                    .line(ValueDetailEdit::bill(BILL_20K).id(first_line).quantity(10))
                    .line(ValueDetailEdit::coin(COIN_1000).id(second_line).quantity(5)),
            ],
            "alice",
        )
        .await
        .unwrap();

    let ids = engine
        .save_containers(
            tx_id,
            vec![
                ContainerEdit::bag("B-001")
                    .id(bag)
                    .cashier("c-7", "Ana")
                    .line(ValueDetailEdit::bill(BILL_20K).id(first_line).quantity(20)),
            ],
            "bob",
        )
        .await
        .unwrap();
    assert_eq!(ids, vec![bag]);

    let container = engine.container_with_detail(bag).await.unwrap();
    assert_eq!(container.details.len(), 1);
    assert_eq!(container.details[0].id, first_line);
    assert_eq!(container.details[0].quantity, Some(20));
    assert_eq!(container.counted_value, Money::major(400_000));
    assert_eq!(container.cashier_name.as_deref(), Some("Ana"));
    // Creation is kept from the first save.
    assert_eq!(container.created_by, "alice");
    assert_eq!(engine.containers(tx_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn container_subtotal_is_sum_of_its_lines() {
    let (engine, _db) = engine_with_db().await;
    let tx_id = checkin(&engine, "OS-1001").await;

    let ids = engine
        .save_containers(
            tx_id,
            vec![
                ContainerEdit::bag("B-001")
                    .line(ValueDetailEdit::bill(BILL_20K).bundles(2).loose(3))
                    .line(ValueDetailEdit::bill(BILL_100K).quantity(-4))
                    .line(ValueDetailEdit::coin(COIN_1000).bundles(1)),
                ContainerEdit::bag("B-002"),
            ],
            "alice",
        )
        .await
        .unwrap();

    let counted = engine.container_with_detail(ids[0]).await.unwrap();
    let sum: Money = counted.details.iter().map(|line| line.amount).sum();
    assert_eq!(counted.counted_value, sum);
    // 203 × 20,000 + 0 × 100,000 + 1,000 × 1,000
    assert_eq!(sum, Money::major(5_060_000));
    assert_eq!(counted.status, ContainerStatus::Processed);
    assert_eq!(counted.processed_by.as_deref(), Some("alice"));

    let empty = engine.container_with_detail(ids[1]).await.unwrap();
    assert_eq!(empty.counted_value, Money::ZERO);
    assert_eq!(empty.status, ContainerStatus::Pending);
}

#[tokio::test]
async fn deleting_a_leaf_envelope_keeps_its_incident_effect() {
    let (engine, _db) = engine_with_db().await;
    let tx_id = checkin(&engine, "OS-1001").await;
    let bag_id = Uuid::new_v4();
    let envelope_id = Uuid::new_v4();
    engine
        .save_containers(
            tx_id,
            vec![
                ContainerEdit::bag("B-1").id(bag_id),
                ContainerEdit::envelope(bag_id, EnvelopeKind::Cash, "E-1")
                    .id(envelope_id)
                    .line(ValueDetailEdit::bill(BILL_100K).quantity(2)),
            ],
            "alice",
        )
        .await
        .unwrap();
    let line_id = engine
        .container_with_detail(envelope_id)
        .await
        .unwrap()
        .details[0]
        .id;

    let shortage = engine
        .register_incident(
            IncidentInput::new("FALTANTE")
                .container(envelope_id)
                .amount(Money::major(5_000)),
            "alice",
        )
        .await
        .unwrap();
    engine
        .resolve_incident(shortage, IncidentStatus::Adjusted, "bob")
        .await
        .unwrap();
    engine
        .register_incident(IncidentInput::new("BILLETE_FALSO").value_detail(line_id), "alice")
        .await
        .unwrap();
    let effect = engine
        .approved_effect(EffectScope::Transaction(tx_id))
        .await
        .unwrap();
    assert_eq!(effect, Money::major(-5_000));

    let totals = engine
        .delete_container(tx_id, envelope_id, "alice")
        .await
        .unwrap();
    assert_eq!(totals.approved_effect, effect);
    assert_eq!(totals.counted.cash_subtotal, Money::ZERO);
    assert_eq!(totals.difference, Money::major(-505_000));
    assert_eq!(
        engine
            .approved_effect(EffectScope::Transaction(tx_id))
            .await
            .unwrap(),
        effect
    );
    assert!(engine.has_pending_incidents(tx_id).await.unwrap());

    let incidents = engine.incidents(tx_id).await.unwrap();
    assert_eq!(incidents.len(), 2);
    for incident in &incidents {
        assert_eq!(incident.transaction_id, Some(tx_id));
        assert_eq!(incident.container_id, None);
        assert_eq!(incident.value_detail_id, None);
    }
    assert_eq!(engine.containers(tx_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn denominations_must_match_the_transaction_currency() {
    let (engine, _db) = engine_with_db().await;
    let tx_id = checkin(&engine, "OS-1001").await;

    let err = engine
        .save_containers(
            tx_id,
            vec![ContainerEdit::bag("B-001").line(ValueDetailEdit::bill(BILL_USD_100).quantity(10))],
            "alice",
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Invariant(format!(
            "denomination {BILL_USD_100} is not a COP denomination"
        ))
    );
    assert!(engine.containers(tx_id).await.unwrap().is_empty());
    assert_eq!(
        engine.totals(tx_id).await.unwrap().counted.cash_subtotal,
        Money::ZERO
    );

    let usd_tx = engine
        .checkin(
            DeclaredShipment::new("OS-1001")
                .currency(Currency::Usd)
                .bill(Money::major(1_000)),
            "alice",
        )
        .await
        .unwrap();
    engine
        .save_containers(
            usd_tx,
            vec![ContainerEdit::bag("B-001").line(ValueDetailEdit::bill(BILL_USD_100).quantity(10))],
            "alice",
        )
        .await
        .unwrap();
    let totals = engine.totals(usd_tx).await.unwrap();
    assert_eq!(totals.counted.cash_subtotal, Money::major(1_000));
    assert_eq!(totals.difference, Money::ZERO);

    let err = engine
        .save_containers(
            usd_tx,
            vec![ContainerEdit::bag("B-002").line(ValueDetailEdit::bill(BILL_20K).quantity(1))],
            "alice",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Invariant(_)));
}

#[tokio::test]
async fn bag_carrying_only_envelopes_does_not_hold_back_finalize() {
    let (engine, _db) = engine_with_db().await;
    let tx_id = engine
        .checkin(
            DeclaredShipment::new("OS-1001").bill(Money::major(200_000)),
            "alice",
        )
        .await
        .unwrap();
    let bag_id = Uuid::new_v4();
    let envelope_id = Uuid::new_v4();
    engine
        .save_containers(
            tx_id,
            vec![
                ContainerEdit::bag("B-1").id(bag_id),
                ContainerEdit::envelope(bag_id, EnvelopeKind::Cash, "E-1").id(envelope_id),
            ],
            "alice",
        )
        .await
        .unwrap();

    // the envelope itself is still uncounted
    let err = engine.finalize(tx_id, "alice").await.unwrap_err();
    assert_eq!(
        err,
        EngineError::Incomplete("2 container(s) still pending or in process".to_string())
    );

    engine
        .save_containers(
            tx_id,
            vec![
                ContainerEdit::envelope(bag_id, EnvelopeKind::Cash, "E-1")
                    .id(envelope_id)
                    .line(ValueDetailEdit::bill(BILL_100K).quantity(2)),
            ],
            "alice",
        )
        .await
        .unwrap();
    let bag = engine.container_with_detail(bag_id).await.unwrap();
    assert_eq!(bag.status, ContainerStatus::Pending);
    assert!(bag.details.is_empty());

    let totals = engine.finalize(tx_id, "alice").await.unwrap();
    assert_eq!(totals.status, TransactionStatus::PendingReview);
    assert_eq!(totals.difference, Money::ZERO);
}

#[tokio::test]
async fn empty_bag_without_envelopes_still_holds_back_finalize() {
    let (engine, _db) = engine_with_db().await;
    let tx_id = checkin(&engine, "OS-1001").await;
    engine
        .save_containers(
            tx_id,
            vec![
                ContainerEdit::bag("B-001").line(ValueDetailEdit::bill(BILL_100K).quantity(5)),
                ContainerEdit::bag("B-002"),
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
}

#[tokio::test]
async fn containers_of_another_transaction_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    let first = checkin(&engine, "OS-1001").await;
    let second = checkin(&engine, "OS-1001").await;
    let ids = engine
        .save_containers(first, vec![ContainerEdit::bag("B-001")], "alice")
        .await
        .unwrap();

    let err = engine
        .save_containers(second, vec![ContainerEdit::bag("B-001").id(ids[0])], "alice")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Invariant(format!("container {} belongs to another transaction", ids[0]))
    );

    let err = engine
        .delete_container(second, ids[0], "alice")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("container not exists".to_string()));
}
