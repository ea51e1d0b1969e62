//! Tide API service library.

pub mod config;
pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::routing::get;
use axum::{Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/tides", get(handlers::tides::tides_handler))
        .route("/api/stations", get(handlers::stations::stations_handler))
        .route("/health", get(handlers::health::health_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
