//! Reference catalog endpoints

use api_types::catalog::PointCapabilities;
use axum::{
    Json,
    extract::{Path, State},
};

use crate::{ServerError, server::ServerState};

/// Optional container kinds the client point of a service order accepts.
pub async fn capabilities(
    State(state): State<ServerState>,
    Path(service_order_id): Path<String>,
) -> Result<Json<PointCapabilities>, ServerError> {
    let caps = state.engine.point_capabilities(&service_order_id).await?;
    Ok(Json(PointCapabilities {
        allows_envelopes: caps.allows_envelopes,
        allows_documents: caps.allows_documents,
        allows_checks: caps.allows_checks,
    }))
}
