//! The per-station per-day caching unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{TideError, TideResult};
use crate::models::tide::{TideExtreme, TidePrediction};

/// One station-day of predictions and extremes.
///
/// Records are refreshed wholesale on re-fetch, never merged, and expire
/// when `now >= ttl`. All contained points fall on the record's
/// station-local calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionDayRecord {
    pub station_id: String,
    /// Station-local calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// "R" for reference, "S" for subordinate.
    pub station_type: String,
    pub predictions: Vec<TidePrediction>,
    pub extremes: Vec<TideExtreme>,
    /// Epoch seconds of the last refresh.
    #[serde(default)]
    pub last_updated: i64,
    /// Epoch seconds after which the record is stale.
    #[serde(default)]
    pub ttl: i64,
}

impl PredictionDayRecord {
    /// Cache key shared by every prediction tier: `{stationID}:{YYYY-MM-DD}`.
    pub fn cache_key(station_id: &str, date: NaiveDate) -> String {
        format!("{}:{}", station_id, date.format("%Y-%m-%d"))
    }

    /// The record's parsed calendar date.
    pub fn parsed_date(&self) -> TideResult<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .map_err(|_| TideError::InvalidRecord(format!("invalid date format: {}", self.date)))
    }

    /// Check the record before it is written to any cache tier.
    pub fn validate(&self) -> TideResult<()> {
        if self.station_id.is_empty() {
            return Err(TideError::InvalidRecord("station ID is required".into()));
        }
        if self.date.is_empty() {
            return Err(TideError::InvalidRecord("date is required".into()));
        }
        self.parsed_date()?;

        match self.station_type.as_str() {
            "R" | "S" => {}
            other => {
                return Err(TideError::InvalidRecord(format!(
                    "invalid station type: {other}"
                )))
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
