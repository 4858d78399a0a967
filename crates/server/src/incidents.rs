//! Incident API endpoints

use api_types::incident::{
    IncidentCreated, IncidentListResponse, IncidentNew, IncidentResolve, IncidentUpdate,
    IncidentView,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use engine::{IncidentInput, IncidentPatch, Money};
use uuid::Uuid;

use crate::{
    ServerError,
    server::{ActorHeader, ServerState},
    views::{incident_status_from_api, incident_view},
};

pub async fn register(
    TypedHeader(ActorHeader(actor)): TypedHeader<ActorHeader>,
    State(state): State<ServerState>,
    Json(payload): Json<IncidentNew>,
) -> Result<(StatusCode, Json<IncidentCreated>), ServerError> {
    let input = IncidentInput {
        type_code: payload.type_code,
        transaction_id: payload.transaction_id,
        container_id: payload.container_id,
        value_detail_id: payload.value_detail_id,
        denomination_id: payload.denomination_id,
        quantity: payload.quantity,
        amount: payload.amount_minor.map(Money::new),
        description: payload.description,
    };
    let id = state.engine.register_incident(input, &actor).await?;
    Ok((StatusCode::CREATED, Json(IncidentCreated { id })))
}

/// Incidents of a transaction, including those reported on its containers.
pub async fn list(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<IncidentListResponse>, ServerError> {
    let incidents = state.engine.incidents(id).await?;
    Ok(Json(IncidentListResponse {
        incidents: incidents.into_iter().map(incident_view).collect(),
    }))
}

pub async fn start_review(
    TypedHeader(ActorHeader(actor)): TypedHeader<ActorHeader>,
    State(state): State<ServerState>,
    Path(incident_id): Path<Uuid>,
) -> Result<Json<IncidentView>, ServerError> {
    let incident = state
        .engine
        .start_incident_review(incident_id, &actor)
        .await?;
    Ok(Json(incident_view(incident)))
}

pub async fn resolve(
    TypedHeader(ActorHeader(actor)): TypedHeader<ActorHeader>,
    State(state): State<ServerState>,
    Path(incident_id): Path<Uuid>,
    Json(payload): Json<IncidentResolve>,
) -> Result<Json<IncidentView>, ServerError> {
    let incident = state
        .engine
        .resolve_incident(incident_id, incident_status_from_api(payload.status), &actor)
        .await?;
    Ok(Json(incident_view(incident)))
}

pub async fn update(
    TypedHeader(ActorHeader(actor)): TypedHeader<ActorHeader>,
    State(state): State<ServerState>,
    Path(incident_id): Path<Uuid>,
    Json(payload): Json<IncidentUpdate>,
) -> Result<Json<IncidentView>, ServerError> {
    let patch = IncidentPatch {
        type_code: payload.type_code,
        denomination_id: payload.denomination_id,
        quantity: payload.quantity,
        amount: payload.amount_minor.map(Money::new),
        description: payload.description,
    };
    let incident = state
        .engine
        .update_incident(incident_id, patch, &actor)
        .await?;
    Ok(Json(incident_view(incident)))
}

pub async fn delete(
    TypedHeader(ActorHeader(actor)): TypedHeader<ActorHeader>,
    State(state): State<ServerState>,
    Path(incident_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_incident(incident_id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}
