//! Container API endpoints

use api_types::{
    container::{
        ContainerListResponse, ContainerUpsert, ContainerView, ContainersSave, ContainersSaved,
        ValueDetailUpsert,
    },
    transaction::TotalsView,
};
use axum::{
    Json,
    extract::{Path, State},
};
use axum_extra::TypedHeader;
use engine::{ContainerEdit, Money, ValueDetailEdit};
use uuid::Uuid;

use crate::{
    ServerError,
    server::{ActorHeader, ServerState},
    views::{container_kind_from_api, container_view, totals_view, value_type_from_api},
};

fn line_edit(line: ValueDetailUpsert) -> ValueDetailEdit {
    ValueDetailEdit {
        id: line.id,
        value_type: value_type_from_api(line.value_type),
        denomination_id: line.denomination_id,
        quality_id: line.quality_id,
        quantity: line.quantity,
        bundles: line.bundles,
        loose: line.loose,
        unit_value: line.unit_value_minor.map(Money::new),
        bank_entity_id: line.bank_entity_id,
        account_number: line.account_number,
        check_number: line.check_number,
        issued_on: line.issued_on,
    }
}

fn container_edit(container: ContainerUpsert) -> ContainerEdit {
    ContainerEdit {
        id: container.id,
        kind: container_kind_from_api(container.kind),
        code: container.code,
        declared_value: container.declared_value_minor.map(Money::new),
        cashier_id: container.cashier_id,
        cashier_name: container.cashier_name,
        lines: container.lines.into_iter().map(line_edit).collect(),
    }
}

/// Create or update containers and replace their counted lines.
pub async fn save(
    TypedHeader(ActorHeader(actor)): TypedHeader<ActorHeader>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ContainersSave>,
) -> Result<Json<ContainersSaved>, ServerError> {
    if payload.containers.is_empty() {
        return Err(ServerError::Generic(
            "at least one container is required".to_string(),
        ));
    }
    let edits = payload.containers.into_iter().map(container_edit).collect();
    let ids = state.engine.save_containers(id, edits, &actor).await?;
    Ok(Json(ContainersSaved { ids }))
}

pub async fn list(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ContainerListResponse>, ServerError> {
    let containers = state.engine.containers(id).await?;
    Ok(Json(ContainerListResponse {
        containers: containers.into_iter().map(container_view).collect(),
    }))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(container_id): Path<Uuid>,
) -> Result<Json<ContainerView>, ServerError> {
    let container = state.engine.container_with_detail(container_id).await?;
    Ok(Json(container_view(container)))
}

pub async fn delete(
    TypedHeader(ActorHeader(actor)): TypedHeader<ActorHeader>,
    State(state): State<ServerState>,
    Path((id, container_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<TotalsView>, ServerError> {
    let totals = state
        .engine
        .delete_container(id, container_id, &actor)
        .await?;
    Ok(Json(totals_view(totals)))
}

pub async fn verify(
    TypedHeader(ActorHeader(actor)): TypedHeader<ActorHeader>,
    State(state): State<ServerState>,
    Path(container_id): Path<Uuid>,
) -> Result<Json<ContainerView>, ServerError> {
    let container = state.engine.verify_container(container_id, &actor).await?;
    Ok(Json(container_view(container)))
}
