//! HTTP surface: routing, shared state and the JSON envelope.

pub mod envelope;
mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use croupier_core::config::RegistryConfig;

use crate::discovery::DiscoveryService;
use crate::protocol::{HeartbeatProtocol, RegistrationProtocol, UpdateProtocol};
use crate::storage::SharedStore;

pub use envelope::{ApiError, Envelope, ErrorBody, ErrorCode};

/// Everything a handler needs, built once around one store.
pub struct AppState {
    pub store: SharedStore,
    pub registration: RegistrationProtocol,
    pub heartbeat: HeartbeatProtocol,
    pub update: UpdateProtocol,
    pub discovery: DiscoveryService,
}

impl AppState {
    pub fn new(store: SharedStore, config: &RegistryConfig) -> Self {
        Self {
            registration: RegistrationProtocol::new(Arc::clone(&store)),
            heartbeat: HeartbeatProtocol::new(Arc::clone(&store), config.heartbeat_interval_secs),
            update: UpdateProtocol::new(Arc::clone(&store)),
            discovery: DiscoveryService::new(Arc::clone(&store), config),
            store,
        }
    }
}

/// Build the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/casinos", post(handlers::register).get(handlers::list))
        .route(
            "/casinos/by-key/{public_key}",
            get(handlers::get_by_public_key),
        )
        .route("/casinos/{id}", get(handlers::get).patch(handlers::update))
        .route("/casinos/{id}/heartbeat", post(handlers::heartbeat))
        .route("/casinos/{id}/heartbeats", get(handlers::heartbeats))
        .route("/stats", get(handlers::stats));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/health/ready", get(handlers::ready))
        .nest("/api/v1", api)
        .fallback(handlers::fallback)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
