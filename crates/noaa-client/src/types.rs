//! Raw wire shapes returned by the upstream endpoints.

use serde::Deserialize;

/// `GET /mdapi/prod/webapi/tidepredstations.json`
#[derive(Debug, Deserialize)]
pub struct StationListResponse {
    #[serde(rename = "stationList", default)]
    pub station_list: Vec<StationEntry>,
}

#[derive(Debug, Deserialize)]
pub struct StationEntry {
    #[serde(rename = "stationId")]
    pub station_id: String,
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub region: String,
    pub lat: f64,
    pub lon: f64,
    /// Signed hour count as a decimal string, e.g. "-8".
    #[serde(rename = "timeZoneCorr", default)]
    pub time_zone_corr: String,
    #[serde(default)]
    pub level: String,
    #[serde(rename = "stationType", default)]
    pub station_type: String,
}

/// `GET /api/prod/datagetter`. Both `interval=6` and `interval=hilo`
/// responses use this envelope; hilo entries carry a `type` discriminator.
#[derive(Debug, Deserialize)]
pub struct DataGetterResponse {
    #[serde(default)]
    pub predictions: Vec<RawPrediction>,
    pub error: Option<UpstreamErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct RawPrediction {
    /// `YYYY-MM-DD HH:MM`, station-local wall clock.
    pub t: String,
    /// Decimal height.
    pub v: String,
    /// "H" or "L" on hilo responses.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpstreamErrorBody {
    pub message: String,
}
