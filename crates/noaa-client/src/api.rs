//! Typed operations over the upstream endpoints.

use chrono::{FixedOffset, NaiveDate};
use tracing::debug;

use tide_common::{
    time, Source, Station, TideError, TideExtreme, TidePrediction, TideResult, TideType,
};

use crate::client::HttpClient;
use crate::types::{DataGetterResponse, StationListResponse};

/// Default upstream base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.tidesandcurrents.noaa.gov";

const STATIONS_PATH: &str = "/mdapi/prod/webapi/tidepredstations.json";

/// Typed NOAA CO-OPS operations.
pub struct NoaaApi {
    http: HttpClient,
}

impl NoaaApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Fetch the full station catalog.
    pub async fn station_list(&self) -> TideResult<Vec<Station>> {
        let body = self.http.get(STATIONS_PATH).await?;
        let response: StationListResponse = serde_json::from_slice(&body)?;

        let stations = response
            .station_list
            .into_iter()
            .map(|entry| Station {
                id: entry.station_id,
                name: entry.name,
                state: non_empty(entry.state),
                region: non_empty(entry.region),
                distance: 0.0,
                latitude: entry.lat,
                longitude: entry.lon,
                source: Source::Noaa,
                capabilities: vec!["WATER_LEVEL".to_string()],
                time_zone_offset: parse_time_zone_offset(&entry.time_zone_corr),
                level: non_empty(entry.level),
                station_type: non_empty(entry.station_type),
            })
            .collect::<Vec<_>>();

        debug!(station_count = stations.len(), "Fetched station catalog");
        Ok(stations)
    }

    /// Fetch the dense 6-minute prediction series for a date span.
    pub async fn predictions(
        &self,
        station_id: &str,
        begin: NaiveDate,
        end: NaiveDate,
        offset: &FixedOffset,
    ) -> TideResult<Vec<TidePrediction>> {
        let path = datagetter_path(station_id, begin, end, "6");
        let body = self.http.get(&path).await?;
        let response = decode_datagetter(&body)?;

        debug!(
            station_id,
            begin = %begin,
            end = %end,
            count = response.predictions.len(),
            "Fetched predictions"
        );

        response
            .predictions
            .into_iter()
            .map(|raw| {
                let timestamp = time::parse_noaa_time(&raw.t, offset)?;
                Ok(TidePrediction {
                    timestamp,
                    local_time: time::format_local_time(timestamp, offset),
                    height: parse_height(&raw.v)?,
                })
            })
            .collect()
    }

    /// Fetch the HIGH/LOW extremes for a date span.
    pub async fn extremes(
        &self,
        station_id: &str,
        begin: NaiveDate,
        end: NaiveDate,
        offset: &FixedOffset,
    ) -> TideResult<Vec<TideExtreme>> {
        let path = datagetter_path(station_id, begin, end, "hilo");
        let body = self.http.get(&path).await?;
        let response = decode_datagetter(&body)?;

        debug!(
            station_id,
            begin = %begin,
            end = %end,
            count = response.predictions.len(),
            "Fetched extremes"
        );

        response
            .predictions
            .into_iter()
            .map(|raw| {
                let timestamp = time::parse_noaa_time(&raw.t, offset)?;
                Ok(TideExtreme {
                    kind: match raw.kind.as_deref() {
                        Some("H") => TideType::High,
                        _ => TideType::Low,
                    },
                    timestamp,
                    local_time: time::format_local_time(timestamp, offset),
                    height: parse_height(&raw.v)?,
                })
            })
            .collect()
    }
}

fn datagetter_path(station_id: &str, begin: NaiveDate, end: NaiveDate, interval: &str) -> String {
    format!(
        "/api/prod/datagetter?station={}&begin_date={}&end_date={}\
         &product=predictions&datum=MLLW&units=english&time_zone=lst_ldt\
         &format=json&interval={}",
        station_id,
        begin.format("%Y%m%d"),
        end.format("%Y%m%d"),
        interval
    )
}

/// Decode a datagetter body.
///
/// The API returns 200 with `{"error":{"message":...}}` when a product has
/// no data, routinely the case for the dense series at subordinate
/// stations. That is an empty result, not a failure; only a body that does
/// not decode at all is an error.
fn decode_datagetter(body: &[u8]) -> TideResult<DataGetterResponse> {
    let mut response: DataGetterResponse = serde_json::from_slice(body)?;
    if let Some(error) = response.error.take() {
        debug!(message = %error.message, "Upstream reported no data for product");
        response.predictions.clear();
    }
    Ok(response)
}

fn parse_height(v: &str) -> TideResult<f64> {
    v.trim()
        .parse::<f64>()
        .map_err(|e| TideError::Decode(format!("parsing height {v:?}: {e}")))
}

/// Parse `timeZoneCorr` (signed hours) into seconds, defaulting to 0.
fn parse_time_zone_offset(tz_corr: &str) -> i32 {
    tz_corr.trim().parse::<i32>().unwrap_or(0) * 3600
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
