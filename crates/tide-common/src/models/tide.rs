//! Tide predictions, extremes and the public response shape.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{TideError, TideResult};
use crate::time::LOCAL_TIME_FORMAT;

/// Classification of a tide point.
///
/// HIGH/LOW label stored extremes; RISING/FALLING are reserved for the
/// current-tide classification in responses and never appear in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TideType {
    #[serde(rename = "RISING")]
    Rising,
    #[serde(rename = "FALLING")]
    Falling,
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "LOW")]
    Low,
}

/// A water-level prediction at a specific instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TidePrediction {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Wall clock in the station's fixed offset, `YYYY-MM-DDTHH:MM:SS`.
    pub local_time: String,
    /// Unit-agnostic decimal height.
    pub height: f64,
}

/// A labeled high- or low-water event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TideExtreme {
    #[serde(rename = "type")]
    pub kind: TideType,
    pub timestamp: i64,
    pub local_time: String,
    pub height: f64,
}

impl TidePrediction {
    pub fn validate(&self) -> TideResult<()> {
        if self.timestamp <= 0 {
            return Err(TideError::InvalidRecord(format!(
                "invalid timestamp: {}",
                self.timestamp
            )));
        }
        validate_local_time(&self.local_time, self.timestamp)
    }
}

impl TideExtreme {
    pub fn validate(&self) -> TideResult<()> {
        if self.timestamp <= 0 {
            return Err(TideError::InvalidRecord(format!(
                "invalid timestamp: {}",
                self.timestamp
            )));
        }
        validate_local_time(&self.local_time, self.timestamp)
    }
}

/// Soft guard that `local_time` belongs to the same instant as `timestamp`.
///
/// The string is parsed as a bare wall clock, so the comparison tolerates a
/// full day of skew to absorb the unknown UTC offset. Tighter checking would
/// need the station offset, which cache records do not carry.
fn validate_local_time(local_time: &str, timestamp: i64) -> TideResult<()> {
    if local_time.is_empty() {
        return Ok(());
    }

    let parsed = NaiveDateTime::parse_from_str(local_time, LOCAL_TIME_FORMAT).map_err(|_| {
        TideError::InvalidRecord(format!("invalid local time format: {local_time}"))
    })?;

    let skew_ms = (parsed.and_utc().timestamp_millis() - timestamp).abs();
    if skew_ms > 24 * 60 * 60 * 1000 {
        return Err(TideError::InvalidRecord(format!(
            "local time {local_time} does not match timestamp {timestamp}"
        )));
    }

    Ok(())
}

/// The full tide response: current level plus the filtered window of
/// predictions and extremes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedTideResponse {
    pub response_type: String,
    pub timestamp: i64,
    pub local_time: String,
    pub water_level: Option<f64>,
    pub predicted_level: Option<f64>,
    pub nearest_station: String,
    pub location: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub station_distance: f64,
    pub tide_type: Option<TideType>,
    pub calculation_method: String,
    pub extremes: Vec<TideExtreme>,
    pub predictions: Vec<TidePrediction>,
    pub time_zone_offset_seconds: Option<i32>,
}

impl ExtendedTideResponse {
    pub fn validate(&self) -> TideResult<()> {
        if self.timestamp <= 0 {
            return Err(TideError::InvalidRecord(format!(
                "invalid timestamp: {}",
                self.timestamp
            )));
        }
        if self.nearest_station.is_empty() {
            return Err(TideError::InvalidRecord(
                "nearest station is required".into(),
            ));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(TideError::InvalidRecord(format!(
                "invalid latitude: {}",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(TideError::InvalidRecord(format!(
                "invalid longitude: {}",
                self.longitude
            )));
        }
        if self.station_distance < 0.0 {
            return Err(TideError::InvalidRecord(format!(
                "invalid station distance: {}",
                self.station_distance
            )));
        }
        if let Some(offset) = self.time_zone_offset_seconds {
            if !(-43_200..=50_400).contains(&offset) {
                return Err(TideError::InvalidRecord(format!(
                    "invalid timezone offset: {offset}"
                )));
            }
        }
        for (i, prediction) in self.predictions.iter().enumerate() {
            prediction.validate().map_err(|e| {
                TideError::InvalidRecord(format!("invalid prediction at index {i}: {e}"))
            })?;
        }
        for (i, extreme) in self.extremes.iter().enumerate() {
            extreme.validate().map_err(|e| {
                TideError::InvalidRecord(format!("invalid extreme at index {i}: {e}"))
            })?;
        }
        Ok(())
    }
}
