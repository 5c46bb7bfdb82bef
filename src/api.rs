// Axum surface for liveness, service metadata and the Prometheus scrape.
// The use-cases themselves are exposed by an external API layer; only the
// contract endpoints live here.

use axum::extract::Extension;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde_json::json;
use std::sync::Arc;

use crate::clock::Clock;
use crate::error::CoordinatorError;
use crate::repository::BatchRepository;
use crate::service_metrics::ServiceMetrics;

pub struct ApiState {
    pub metrics: Arc<ServiceMetrics>,
    pub repository: Arc<dyn BatchRepository>,
    pub clock: Arc<dyn Clock>,
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/status", get(service_status))
        .route("/metrics", get(prometheus_metrics))
        .layer(Extension(state))
}

async fn health(Extension(state): Extension<Arc<ApiState>>) -> Response {
    state.metrics.inc_http_requests();
    Json(json!({
        "status": "OK",
        "timestamp": state.clock.now(),
    }))
    .into_response()
}

async fn service_status(Extension(state): Extension<Arc<ApiState>>) -> Response {
    state.metrics.inc_http_requests();
    let now = state.clock.now();

    let active = match state.repository.get_current_active_batch(now).await {
        Ok(active) => active,
        Err(error) => return error_response(&state, CoordinatorError::from(error)),
    };

    Json(json!({
        "service": "fairbatch-coordinator",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": now,
        "active_batch": active.map(|batch| json!({
            "id": batch.id(),
            "status": batch.status(),
            "ordering_method": batch.ordering_method(),
            "commitments": batch.commitment_count(),
            "reveals": batch.revealed_count(),
            "commitment_phase_end": batch.commitment_phase_end(),
            "reveal_phase_end": batch.reveal_phase_end(),
        })),
        "metrics": state.metrics.export_json(),
    }))
    .into_response()
}

async fn prometheus_metrics(Extension(state): Extension<Arc<ApiState>>) -> Response {
    state.metrics.inc_http_requests();
    state.metrics.export_prometheus().into_response()
}

/// Stable `{code, message}` body with the taxonomy's HTTP status. No stack
/// traces, no internals.
fn error_response(state: &ApiState, error: CoordinatorError) -> Response {
    state.metrics.inc_http_errors();
    (
        error.http_status(),
        Json(json!({
            "error": {
                "code": error.code(),
                "message": error.to_string(),
            }
        })),
    )
        .into_response()
}
