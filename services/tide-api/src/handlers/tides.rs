//! `GET /api/tides`: tide window by station ID or coordinates.

use std::sync::Arc;

use axum::extract::{Extension, Query};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use tide_common::TideError;

use crate::handlers::error_response;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TidesQuery {
    pub station_id: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub start_date_time: Option<String>,
    pub end_date_time: Option<String>,
}

pub async fn tides_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<TidesQuery>,
) -> Response {
    let start = params.start_date_time.as_deref();
    let end = params.end_date_time.as_deref();

    let result = match (&params.station_id, params.lat, params.lon) {
        (Some(station_id), _, _) => {
            state
                .tide_service
                .get_tide_for_station(station_id, start, end)
                .await
        }
        (None, Some(lat), Some(lon)) => state.tide_service.get_tide(lat, lon, start, end).await,
        _ => Err(TideError::InvalidCoordinates(
            "missing stationId or lat/lon parameters".to_string(),
        )),
    };

    match result {
        Ok(response) => Json(response).into_response(),
        Err(e) => error_response(&e),
    }
}
