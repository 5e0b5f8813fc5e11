//! HTTP server module

mod api;

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;

use crate::AppState;
use crate::ws::ws_handler;

pub use api::HealthResponse;

/// Create the HTTP router with all routes configured
///
/// CORS is permissive: peers may connect from any origin.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/health", get(api::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
