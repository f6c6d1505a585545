use axum::{extract::State, http::StatusCode};
use tracing::info;

use super::AppState;

/// Liveness check endpoint
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// Readiness: the relay can only answer when a provider key is configured.
pub async fn ready_handler(State(state): State<AppState>) -> Result<StatusCode, StatusCode> {
    if state.relay.is_ready() {
        info!("Readiness check passed");
        Ok(StatusCode::OK)
    } else {
        info!("Readiness check failed - provider API key missing");
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
