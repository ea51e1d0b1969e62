//! `GET /api/stations`: station lookup by ID or nearest-k search.

use std::sync::Arc;

use axum::extract::{Extension, Query};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use tide_common::{Station, TideError};

use crate::handlers::error_response;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationsQuery {
    pub station_id: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationsResponse {
    pub response_type: String,
    pub stations: Vec<Station>,
}

impl StationsResponse {
    fn new(stations: Vec<Station>) -> Self {
        Self {
            response_type: "stations".to_string(),
            stations,
        }
    }
}

pub async fn stations_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<StationsQuery>,
) -> Response {
    let result = match (&params.station_id, params.lat, params.lon) {
        (Some(station_id), _, _) => state
            .finder
            .find_station(station_id)
            .await
            .map(|station| vec![station]),
        (None, Some(lat), Some(lon)) => {
            state
                .finder
                .find_nearest_stations(lat, lon, params.limit.unwrap_or(0))
                .await
        }
        _ => Err(TideError::InvalidCoordinates(
            "missing stationId or lat/lon parameters".to_string(),
        )),
    };

    match result {
        Ok(stations) => Json(StationsResponse::new(stations)).into_response(),
        Err(e) => error_response(&e),
    }
}
