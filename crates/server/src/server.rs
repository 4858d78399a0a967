use axum::{
    Router,
    routing::{get, post, put},
};
use axum_extra::headers::{Error as AxumError, Header};

use std::sync::Arc;

use crate::{catalog, containers, incidents, transactions};
use engine::Engine;

static ACTOR_HEADER: axum::http::HeaderName = axum::http::HeaderName::from_static("x-actor-id");

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// `TypedHeader` for the acting user.
///
/// Every mutating request must carry the operator id in `x-actor-id`; it is
/// recorded as registered/processed/reported/resolved-by on the rows it
/// touches.
#[derive(Debug)]
pub struct ActorHeader(pub String);

impl Header for ActorHeader {
    fn name() -> &'static axum::http::HeaderName {
        &ACTOR_HEADER
    }

    fn decode<'i, I>(values: &mut I) -> Result<Self, AxumError>
    where
        Self: Sized,
        I: Iterator<Item = &'i axum::http::HeaderValue>,
    {
        let value = values.next().ok_or_else(AxumError::invalid)?;
        let Ok(value) = value.to_str() else {
            return Err(AxumError::invalid());
        };
        let value = value.trim();
        if value.is_empty() {
            return Err(AxumError::invalid());
        }

        Ok(ActorHeader(value.to_string()))
    }

    fn encode<E: Extend<axum::http::HeaderValue>>(&self, values: &mut E) {
        match axum::http::HeaderValue::from_str(&self.0) {
            Ok(value) => values.extend(std::iter::once(value)),
            Err(_) => tracing::error!("failed to encode x-actor-id header"),
        }
    }
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/transactions", post(transactions::checkin))
        .route("/transactions/{id}", get(transactions::get))
        .route("/transactions/{id}/totals", get(transactions::totals))
        .route(
            "/transactions/{id}/containers",
            put(containers::save).get(containers::list),
        )
        .route(
            "/transactions/{id}/containers/{container_id}",
            axum::routing::delete(containers::delete),
        )
        .route("/transactions/{id}/finalize", post(transactions::finalize))
        .route("/transactions/{id}/review", post(transactions::review))
        .route("/transactions/{id}/cancel", post(transactions::cancel))
        .route("/transactions/{id}/incidents", get(incidents::list))
        .route("/containers/{container_id}", get(containers::get))
        .route("/containers/{container_id}/verify", post(containers::verify))
        .route("/incidents", post(incidents::register))
        .route(
            "/incidents/{incident_id}",
            axum::routing::patch(incidents::update).delete(incidents::delete),
        )
        .route("/incidents/{incident_id}/review", post(incidents::start_review))
        .route("/incidents/{incident_id}/resolve", post(incidents::resolve))
        .route(
            "/service-orders/{service_order_id}/capabilities",
            get(catalog::capabilities),
        )
        .with_state(state)
}

/// Router over an existing engine, without binding a listener.
pub fn app(engine: Engine) -> Router {
    router(ServerState {
        engine: Arc::new(engine),
    })
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(engine)).await
}
