//! `GET /health`: liveness plus cache statistics.

use std::sync::Arc;

use axum::extract::Extension;
use axum::Json;

use storage::PredictionCache;

use crate::state::AppState;

pub async fn health_handler(Extension(state): Extension<Arc<AppState>>) -> Json<serde_json::Value> {
    let stats = state.cache.stats().await;
    Json(serde_json::json!({
        "status": "ok",
        "cache": stats,
    }))
}
