//! HTTP route definitions.

mod conflicts;
mod health;
mod state;

use crate::AppState;
use axum::Router;

/// Create all application routes.
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(conflicts::routes())
        .merge(state::routes())
}
