//! HTTP handlers.

pub mod health;
pub mod stations;
pub mod tides;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use tide_common::TideError;

/// Error envelope shared by every endpoint.
pub fn error_response(err: &TideError) -> Response {
    error!(kind = err.kind(), error = %err, "Request failed");

    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = Json(serde_json::json!({
        "responseType": "error",
        "error": err.to_string(),
    }));

    (status, body).into_response()
}
