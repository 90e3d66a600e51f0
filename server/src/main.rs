//! Vaxsync Server - conflict resolution service for offline vaccination records.
//!
//! Clients that captured records offline post their local copies together
//! with the server copies and get back the reconciled result. The server also
//! keeps the shared conflict log and sync bookkeeping.

mod config;
mod error;
mod handlers;
mod routes;
mod store;


use crate::config::Config;
use crate::store::SharedStore;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vaxsync_engine::Resolver;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
    pub store: Arc<SharedStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            resolver: Arc::new(Resolver::new(config.resolver.clone())),
            store: SharedStore::new_shared(),
            config: Arc::new(config),
        }
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vaxsync_server=debug,vaxsync_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!(
        "Starting Vaxsync Server on {}:{} (default strategy: {})",
        config.host,
        config.port,
        config.resolver.default_strategy
    );

    let addr = format!("{}:{}", config.host, config.port);
    let app = build_router(AppState::new(config));

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
