use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the configured data root is an existing directory.
    pub data_root_exists: bool,
}

/// GET /health -- returns service and data root health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let data_root_exists = state.store.root().is_dir();

    let status = if data_root_exists { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        data_root_exists,
    })
}

/// Mount health check routes at the root level.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
