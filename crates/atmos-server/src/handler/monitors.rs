//! Cache health status handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use super::response::MonitorStatus;
use crate::service::ServiceState;

/// Tracing target for monitor operations.
const TRACING_TARGET: &str = "atmos_server::handler::monitors";

/// Reports whether cached data is currently trusted.
///
/// Answers 503 while the health monitor is unhealthy; the gateway still
/// serves forecasts in that state, resolving every location by name.
#[tracing::instrument(skip_all)]
async fn health_status(
    State(service_state): State<ServiceState>,
) -> (StatusCode, Json<MonitorStatus>) {
    let snapshot = service_state.health.snapshot();
    let is_healthy = snapshot.healthy;

    let response = MonitorStatus::new(
        snapshot,
        service_state.location_cache.store().backend(),
        service_state.revalidation.is_connected(),
    );

    let status_code = if is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    tracing::debug!(
        target: TRACING_TARGET,
        is_healthy,
        status_code = status_code.as_u16(),
        "Health status response prepared"
    );

    (status_code, Json(response))
}

/// Returns a [`Router`] with all health monitoring routes.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/health", get(health_status))
}
