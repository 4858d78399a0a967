use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{ActorHeader, app, run_with_listener};

mod catalog;
mod containers;
mod incidents;
mod server;
mod transactions;
mod views;

pub mod types {
    pub mod transaction {
        pub use api_types::transaction::{
            CheckinNew, CountedView, DeclaredView, ReviewDisposition, ReviewRequest,
            TotalsView, TransactionCreated, TransactionKind, TransactionStatus, TransactionView,
        };
    }

    pub mod container {
        pub use api_types::container::{
            ContainerKind, ContainerListResponse, ContainerStatus, ContainerUpsert, ContainerView,
            ContainersSave, ContainersSaved, EnvelopeKind, ValueDetailUpsert, ValueDetailView,
            ValueType,
        };
    }

    pub mod incident {
        pub use api_types::incident::{
            IncidentCreated, IncidentListResponse, IncidentNew, IncidentResolve, IncidentStatus,
            IncidentUpdate, IncidentView,
        };
    }

    pub mod catalog {
        pub use api_types::catalog::PointCapabilities;
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
    /// Current state of the resource when the requested transition was refused.
    #[serde(skip_serializing_if = "Option::is_none")]
    current: Option<String>,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::InvalidState { .. } | EngineError::Incomplete(_) => StatusCode::CONFLICT,
        EngineError::Unconfigured(_) => StatusCode::FAILED_DEPENDENCY,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::Invariant(_) | EngineError::InvalidAmount(_) | EngineError::InvalidId(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

fn message_for_engine_error(err: EngineError) -> Error {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            Error {
                error: "internal server error".to_string(),
                current: None,
            }
        }
        EngineError::InvalidState { ref current, .. } => Error {
            current: Some(current.clone()),
            error: err.to_string(),
        },
        other => {
            tracing::debug!("request rejected: {other}");
            Error {
                error: other.to_string(),
                current: None,
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(error) => (
                StatusCode::BAD_REQUEST,
                Error {
                    error,
                    current: None,
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
