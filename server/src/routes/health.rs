//! Health check endpoint.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use vaxsync_engine::Strategy;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub default_strategy: Strategy,
    pub timestamp_threshold_ms: i64,
}

/// Create health routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
}

/// Health check handler.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let config = state.resolver.config();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        default_strategy: config.default_strategy,
        timestamp_threshold_ms: config.timestamp_threshold_ms,
    })
}

/// Root handler.
async fn root() -> &'static str {
    "Vaxsync Conflict Server"
}
