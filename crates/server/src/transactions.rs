//! Transactions API endpoints

use api_types::transaction::{
    CheckinNew, ReviewRequest, TotalsView, TransactionCreated, TransactionView,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use engine::{DeclaredShipment, Money};
use uuid::Uuid;

use crate::{
    ServerError,
    server::{ActorHeader, ServerState},
    views::{currency_from_api, disposition_from_api, totals_view, transaction_view},
};

/// Handle checkin of a declared shipment.
pub async fn checkin(
    TypedHeader(ActorHeader(actor)): TypedHeader<ActorHeader>,
    State(state): State<ServerState>,
    Json(payload): Json<CheckinNew>,
) -> Result<(StatusCode, Json<TransactionCreated>), ServerError> {
    let mut shipment = DeclaredShipment::new(payload.service_order_id)
        .counts(
            payload.declared_bags,
            payload.declared_envelopes,
            payload.declared_checks,
            payload.declared_documents,
        )
        .bill(Money::new(payload.declared_bill_minor))
        .coin(Money::new(payload.declared_coin_minor))
        .document(Money::new(payload.declared_document_minor))
        .custody(payload.custody)
        .point_to_point(payload.point_to_point);
    if let Some(currency) = payload.currency {
        shipment = shipment.currency(currency_from_api(currency));
    }
    if let Some(total) = payload.declared_total_minor {
        shipment = shipment.total(Money::new(total));
    }
    shipment.route_id = payload.route_id;
    shipment.branch_id = payload.branch_id;
    shipment.note = payload.note;
    shipment.idempotency_key = payload.idempotency_key;

    let id = state.engine.checkin(shipment, &actor).await?;
    Ok((StatusCode::CREATED, Json(TransactionCreated { id })))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let transaction = state.engine.transaction(id).await?;
    Ok(Json(transaction_view(transaction)))
}

pub async fn totals(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TotalsView>, ServerError> {
    let totals = state.engine.totals(id).await?;
    Ok(Json(totals_view(totals)))
}

/// Close counting and move the transaction to review.
pub async fn finalize(
    TypedHeader(ActorHeader(actor)): TypedHeader<ActorHeader>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TotalsView>, ServerError> {
    let totals = state.engine.finalize(id, &actor).await?;
    Ok(Json(totals_view(totals)))
}

pub async fn review(
    TypedHeader(ActorHeader(actor)): TypedHeader<ActorHeader>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewRequest>,
) -> Result<Json<TransactionView>, ServerError> {
    let transaction = state
        .engine
        .review(id, disposition_from_api(payload.disposition), &actor)
        .await?;
    Ok(Json(transaction_view(transaction)))
}

pub async fn cancel(
    TypedHeader(ActorHeader(actor)): TypedHeader<ActorHeader>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let transaction = state.engine.cancel(id, &actor).await?;
    Ok(Json(transaction_view(transaction)))
}
