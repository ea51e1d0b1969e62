//! Window filtering, series synthesis and response assembly.

use chrono::FixedOffset;

use tide_common::{
    time, ExtendedTideResponse, Station, TideExtreme, TidePrediction, TideType,
};

use crate::interpolation::{bracket_index, hermite_interp};

/// 6-minute grid step, milliseconds.
const PREDICTION_STEP_MS: i64 = 6 * 60 * 1000;

/// Predictions with `timestamp ∈ [start_ms, end_ms]`, both bounds inclusive.
pub fn filter_predictions(
    predictions: &[TidePrediction],
    start_ms: i64,
    end_ms: i64,
) -> Vec<TidePrediction> {
    predictions
        .iter()
        .filter(|p| p.timestamp >= start_ms && p.timestamp <= end_ms)
        .cloned()
        .collect()
}

/// Extremes with `timestamp ∈ [start_ms, end_ms]`, both bounds inclusive.
pub fn filter_extremes(extremes: &[TideExtreme], start_ms: i64, end_ms: i64) -> Vec<TideExtreme> {
    extremes
        .iter()
        .filter(|e| e.timestamp >= start_ms && e.timestamp <= end_ms)
        .cloned()
        .collect()
}

/// Synthesize a dense series on the 6-minute grid across the window by
/// Hermite interpolation over the extremes. Used for subordinate stations,
/// where upstream supplies no dense series.
pub fn synthesize_predictions(
    extremes: &[TideExtreme],
    start_ms: i64,
    end_ms: i64,
    offset: &FixedOffset,
) -> Vec<TidePrediction> {
    let mut predictions = Vec::new();
    let mut t = start_ms;
    while t <= end_ms {
        predictions.push(TidePrediction {
            timestamp: t,
            local_time: time::format_local_time(t, offset),
            height: hermite_interp(extremes, t),
        });
        t += PREDICTION_STEP_MS;
    }
    predictions
}

/// RISING/FALLING from the current level against the prediction immediately
/// preceding `now_ms`. None when fewer than two points are available or
/// `now_ms` falls outside the filtered series.
pub fn classify_tide(
    predictions: &[TidePrediction],
    now_ms: i64,
    current_level: f64,
) -> Option<TideType> {
    if predictions.len() < 2 {
        return None;
    }

    let idx = bracket_index(predictions, now_ms);
    if idx == 0 || idx >= predictions.len() {
        return None;
    }

    if current_level > predictions[idx - 1].height {
        Some(TideType::Rising)
    } else {
        Some(TideType::Falling)
    }
}

/// Build the public response from the filtered window.
#[allow(clippy::too_many_arguments)]
pub fn assemble(
    station: &Station,
    now_ms: i64,
    now_local: String,
    current_level: Option<f64>,
    tide_type: Option<TideType>,
    predictions: Vec<TidePrediction>,
    extremes: Vec<TideExtreme>,
) -> ExtendedTideResponse {
    ExtendedTideResponse {
        response_type: "tide".to_string(),
        timestamp: now_ms,
        local_time: now_local,
        water_level: current_level,
        predicted_level: current_level,
        nearest_station: station.id.clone(),
        location: Some(station.name.clone()),
        latitude: station.latitude,
        longitude: station.longitude,
        station_distance: station.distance,
        tide_type,
        calculation_method: "NOAA API".to_string(),
        extremes,
        predictions,
        time_zone_offset_seconds: Some(station.time_zone_offset),
    }
}
