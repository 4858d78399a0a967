use sea_orm::{Database, DatabaseConnection};

use engine::{
    ContainerEdit, ContainerStatus, DeclaredShipment, EffectScope, Engine, EngineError,
    IncidentInput, IncidentPatch, IncidentStatus, Money, ValueDetailEdit,
};
use migration::MigratorTrait;
use uuid::Uuid;

const BILL_20K: i32 = 4;
const BILL_50K: i32 = 5;

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

/// Checked-in transaction with one counted bag of 10 × 50,000.
async fn counted_transaction(engine: &Engine) -> (Uuid, Uuid, Uuid) {
    let tx_id = engine
        .checkin(
            DeclaredShipment::new("OS-1001").bill(Money::major(500_000)),
            "alice",
        )
        .await
        .unwrap();
    let ids = engine
        .save_containers(
            tx_id,
            vec![ContainerEdit::bag("B-001").line(ValueDetailEdit::bill(BILL_50K).quantity(10))],
            "alice",
        )
        .await
        .unwrap();
    let line_id = engine.container_with_detail(ids[0]).await.unwrap().details[0].id;
    (tx_id, ids[0], line_id)
}

#[tokio::test]
async fn incident_type_scope_is_enforced() {
    let (engine, _db) = engine_with_db().await;
    let (tx_id, bag_id, _) = counted_transaction(&engine).await;

    let err = engine
        .register_incident(IncidentInput::new("SELLO_ROTO").container(bag_id), "alice")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Invariant(
            "incident type SELLO_ROTO does not apply to containers or counted lines".to_string()
        )
    );

    let err = engine
        .register_incident(IncidentInput::new("BILLETE_FALSO").transaction(tx_id), "alice")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Invariant(
            "incident type BILLETE_FALSO does not apply to a whole service".to_string()
        )
    );

    let err = engine
        .register_incident(IncidentInput::new("NOPE").transaction(tx_id), "alice")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Unconfigured("incident type NOPE not configured".to_string())
    );

    engine
        .register_incident(IncidentInput::new("SELLO_ROTO").transaction(tx_id), "alice")
        .await
        .unwrap();
}

#[tokio::test]
async fn links_are_inferred_from_the_counted_line() {
    let (engine, _db) = engine_with_db().await;
    let (tx_id, bag_id, line_id) = counted_transaction(&engine).await;

    engine
        .register_incident(
            IncidentInput::new("BILLETE_FALSO")
                .value_detail(line_id)
                .denomination(BILL_50K, 2)
                .description("  serie repetida "),
            "alice",
        )
        .await
        .unwrap();

    let incidents = engine.incidents(tx_id).await.unwrap();
    assert_eq!(incidents.len(), 1);
    let incident = &incidents[0];
    assert_eq!(incident.transaction_id, Some(tx_id));
    assert_eq!(incident.container_id, Some(bag_id));
    assert_eq!(incident.value_detail_id, Some(line_id));
    assert_eq!(incident.denomination_id, Some(BILL_50K));
    assert_eq!(incident.amount, Money::major(100_000));
    assert_eq!(incident.description.as_deref(), Some("serie repetida"));
    assert_eq!(incident.status, IncidentStatus::Reported);

    let container = engine.container_with_detail(bag_id).await.unwrap();
    assert_eq!(container.status, ContainerStatus::WithIncident);
}

#[tokio::test]
async fn conflicting_or_missing_links_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    let (tx_id, _, line_id) = counted_transaction(&engine).await;
    let other_bag = engine
        .save_containers(tx_id, vec![ContainerEdit::bag("B-002")], "alice")
        .await
        .unwrap()[0];

    let err = engine
        .register_incident(
            IncidentInput::new("FALTANTE")
                .value_detail(line_id)
                .container(other_bag),
            "alice",
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Invariant("value detail does not belong to the given container".to_string())
    );

    let (other_tx, _, _) = counted_transaction(&engine).await;
    let err = engine
        .register_incident(
            IncidentInput::new("FALTANTE")
                .container(other_bag)
                .transaction(other_tx),
            "alice",
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Invariant("container does not belong to the given transaction".to_string())
    );

    let err = engine
        .register_incident(IncidentInput::new("FALTANTE"), "alice")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Invariant(
            "incident must reference a transaction, container or value detail".to_string()
        )
    );

    let err = engine
        .register_incident(
            IncidentInput::new("FALTANTE")
                .transaction(tx_id)
                .amount(Money::major(-1)),
            "alice",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn only_adjusted_incidents_carry_an_effect() {
    let (engine, _db) = engine_with_db().await;
    let (tx_id, bag_id, line_id) = counted_transaction(&engine).await;

    let surplus = engine
        .register_incident(
            IncidentInput::new("SOBRANTE")
                .container(bag_id)
                .denomination(BILL_20K, 3),
            "alice",
        )
        .await
        .unwrap();
    let shortage = engine
        .register_incident(
            IncidentInput::new("FALTANTE")
                .transaction(tx_id)
                .amount(Money::major(10_000)),
            "alice",
        )
        .await
        .unwrap();
    let counterfeit = engine
        .register_incident(IncidentInput::new("BILLETE_MUTILADO").value_detail(line_id), "alice")
        .await
        .unwrap();
    assert!(engine.has_pending_incidents(tx_id).await.unwrap());

    engine
        .resolve_incident(surplus, IncidentStatus::Adjusted, "bob")
        .await
        .unwrap();
    engine
        .resolve_incident(shortage, IncidentStatus::Closed, "bob")
        .await
        .unwrap();
    engine
        .resolve_incident(counterfeit, IncidentStatus::Adjusted, "bob")
        .await
        .unwrap();
    assert!(!engine.has_pending_incidents(tx_id).await.unwrap());

    // Surplus of 3 × 20,000; the closed shortage and the informational
    // incident carry nothing.
    assert_eq!(
        engine
            .approved_effect(EffectScope::Transaction(tx_id))
            .await
            .unwrap(),
        Money::major(60_000)
    );
    assert_eq!(
        engine
            .approved_effect(EffectScope::Container(bag_id))
            .await
            .unwrap(),
        Money::major(60_000)
    );
    let totals = engine.totals(tx_id).await.unwrap();
    assert_eq!(totals.difference, Money::major(60_000));
}

#[tokio::test]
async fn adjudication_follows_the_workflow() {
    let (engine, _db) = engine_with_db().await;
    let (tx_id, _, _) = counted_transaction(&engine).await;
    let incident_id = engine
        .register_incident(
            IncidentInput::new("FALTANTE")
                .transaction(tx_id)
                .amount(Money::major(5_000)),
            "alice",
        )
        .await
        .unwrap();

    let err = engine
        .resolve_incident(incident_id, IncidentStatus::UnderReview, "bob")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Invariant("incidents resolve to adjusted or closed, not under_review".to_string())
    );

    let incident = engine.start_incident_review(incident_id, "bob").await.unwrap();
    assert_eq!(incident.status, IncidentStatus::UnderReview);
    assert!(incident.resolved_by.is_none());

    let err = engine
        .update_incident(incident_id, IncidentPatch::new().amount(Money::major(1)), "bob")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidState {
            current: "under_review".to_string(),
            message: "only reported incidents can be edited".to_string(),
        }
    );

    let incident = engine
        .resolve_incident(incident_id, IncidentStatus::Adjusted, "bob")
        .await
        .unwrap();
    assert!(incident.resolved_at.is_some());

    let err = engine
        .resolve_incident(incident_id, IncidentStatus::Closed, "bob")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidState {
            current: "adjusted".to_string(),
            message: "incident cannot move to closed".to_string(),
        }
    );

    let err = engine.delete_incident(incident_id, "bob").await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidState { .. }));
}

#[tokio::test]
async fn reported_incidents_can_be_edited_and_deleted() {
    let (engine, _db) = engine_with_db().await;
    let (tx_id, bag_id, _) = counted_transaction(&engine).await;
    let incident_id = engine
        .register_incident(
            IncidentInput::new("FALTANTE")
                .container(bag_id)
                .denomination(BILL_50K, 1),
            "alice",
        )
        .await
        .unwrap();

    let incident = engine
        .update_incident(
            incident_id,
            IncidentPatch::new().type_code("SOBRANTE").denomination(BILL_20K, 4),
            "alice",
        )
        .await
        .unwrap();
    assert_eq!(incident.incident_type_code, "SOBRANTE");
    assert_eq!(incident.amount, Money::major(80_000));

    let err = engine
        .update_incident(incident_id, IncidentPatch::new().type_code("SELLO_ROTO"), "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Invariant(_)));

    engine.delete_incident(incident_id, "alice").await.unwrap();
    assert!(engine.incidents(tx_id).await.unwrap().is_empty());
    assert!(!engine.has_pending_incidents(tx_id).await.unwrap());

    // The container keeps its incident mark.
    let container = engine.container_with_detail(bag_id).await.unwrap();
    assert_eq!(container.status, ContainerStatus::WithIncident);

    let err = engine.delete_incident(incident_id, "alice").await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("incident not exists".to_string()));
}

#[tokio::test]
async fn pending_incident_blocks_finalize_until_closed() {
    let (engine, _db) = engine_with_db().await;
    let (tx_id, bag_id, _) = counted_transaction(&engine).await;
    let incident_id = engine
        .register_incident(IncidentInput::new("FALTANTE").container(bag_id), "alice")
        .await
        .unwrap();

    let err = engine.finalize(tx_id, "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::Incomplete(_)));

    engine
        .resolve_incident(incident_id, IncidentStatus::Closed, "bob")
        .await
        .unwrap();
    let totals = engine.finalize(tx_id, "alice").await.unwrap();
    assert_eq!(totals.difference, Money::ZERO);
}

#[tokio::test]
async fn editing_quantity_keeps_an_explicit_amount() {
    let (engine, _db) = engine_with_db().await;
    let (tx_id, bag_id, _) = counted_transaction(&engine).await;
    let flat = engine
        .register_incident(
            IncidentInput::new("FALTANTE")
                .transaction(tx_id)
                .amount(Money::major(5_000)),
            "alice",
        )
        .await
        .unwrap();

    let incident = engine
        .update_incident(flat, IncidentPatch::new().quantity(3), "alice")
        .await
        .unwrap();
    assert_eq!(incident.quantity, 3);
    assert_eq!(incident.amount, Money::major(5_000));

    // with a denomination the amount follows the pieces
    let counted = engine
        .register_incident(
            IncidentInput::new("FALTANTE")
                .container(bag_id)
                .denomination(BILL_50K, 1),
            "alice",
        )
        .await
        .unwrap();
    let incident = engine
        .update_incident(counted, IncidentPatch::new().quantity(3), "alice")
        .await
        .unwrap();
    assert_eq!(incident.amount, Money::major(150_000));
}

#[tokio::test]
async fn replacing_lines_detaches_their_incidents() {
    let (engine, _db) = engine_with_db().await;
    let (tx_id, bag_id, line_id) = counted_transaction(&engine).await;
    let incident_id = engine
        .register_incident(
            IncidentInput::new("BILLETE_FALSO")
                .value_detail(line_id)
                .amount(Money::major(50_000)),
            "alice",
        )
        .await
        .unwrap();
    engine
        .resolve_incident(incident_id, IncidentStatus::Adjusted, "bob")
        .await
        .unwrap();

    engine
        .save_containers(
            tx_id,
            vec![
                ContainerEdit::bag("B-001")
                    .id(bag_id)
                    .line(ValueDetailEdit::bill(BILL_20K).quantity(25)),
            ],
            "alice",
        )
        .await
        .unwrap();

    let container = engine.container_with_detail(bag_id).await.unwrap();
    assert_eq!(container.details.len(), 1);
    assert_ne!(container.details[0].id, line_id);

    let incidents = engine.incidents(tx_id).await.unwrap();
    assert_eq!(incidents.len(), 1);
    assert_eq!(incidents[0].value_detail_id, None);
    assert_eq!(incidents[0].container_id, Some(bag_id));
    assert_eq!(
        engine
            .approved_effect(EffectScope::Container(bag_id))
            .await
            .unwrap(),
        Money::major(-50_000)
    );
}
