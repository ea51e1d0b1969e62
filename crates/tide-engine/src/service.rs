//! The date-range prediction orchestrator.
//!
//! Decomposes a request into per-day cache probes, coalesces the missing
//! span into one upstream fetch per product, re-buckets the results by
//! station-local day, writes new day-records back through the cache tiers
//! on a detached task, and interpolates the current water level.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone};
use tracing::{debug, error};

use noaa_client::NoaaApi;
use storage::PredictionCache;
use tide_common::{
    time, Clock, ExtendedTideResponse, PredictionDayRecord, Station, TideError, TideExtreme,
    TidePrediction, TideResult,
};

use crate::finder::StationFinder;
use crate::interpolation::{hermite_interp, linear_interp};
use crate::response;

/// Maximum request window, days.
const MAX_RANGE_DAYS: i64 = 5;

/// Tide prediction service over the cache hierarchy.
pub struct TideService {
    api: Arc<NoaaApi>,
    finder: Arc<dyn StationFinder>,
    cache: Arc<dyn PredictionCache>,
    clock: Arc<dyn Clock>,
}

impl TideService {
    pub fn new(
        api: Arc<NoaaApi>,
        finder: Arc<dyn StationFinder>,
        cache: Arc<dyn PredictionCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            api,
            finder,
            cache,
            clock,
        }
    }

    /// Tide window for the station nearest to the given coordinates.
    pub async fn get_tide(
        &self,
        lat: f64,
        lon: f64,
        start: Option<&str>,
        end: Option<&str>,
    ) -> TideResult<ExtendedTideResponse> {
        let stations = self.finder.find_nearest_stations(lat, lon, 1).await?;
        let station = stations.into_iter().next().ok_or_else(|| {
            TideError::StationNotFound("no stations near coordinates".to_string())
        })?;

        self.get_tide_for_station(&station.id, start, end).await
    }

    /// Tide window for a station over `[start, end]` wall-clock strings in
    /// the station's timezone. Defaults: start = today 00:00 station-local,
    /// end = start + 24 h.
    pub async fn get_tide_for_station(
        &self,
        station_id: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> TideResult<ExtendedTideResponse> {
        let station = self.finder.find_station(station_id).await?;
        let offset = time::station_offset(station.time_zone_offset)?;
        let now = self.clock.now().with_timezone(&offset);

        let start_time = match start {
            Some(s) => time::parse_wall_clock(s, &offset)?,
            None => local_midnight(now.date_naive(), &offset),
        };
        let end_time = match end {
            Some(s) => time::parse_wall_clock(s, &offset)?,
            None => start_time + Duration::days(1),
        };

        if end_time <= start_time {
            return Err(TideError::InvalidRange(format!(
                "end {end_time} is not after start {start_time}"
            )));
        }
        if end_time - start_time > Duration::days(MAX_RANGE_DAYS) {
            return Err(TideError::InvalidRange(
                "date range cannot exceed 5 days".to_string(),
            ));
        }

        // Subordinate stations only have extremes; pull in the previous day
        // so boundary interpolation has a neighbor on each side.
        let use_extremes = station.is_subordinate();
        let query_start = if use_extremes {
            local_midnight(start_time.date_naive(), &offset) - Duration::days(1)
        } else {
            start_time
        };

        let days = enumerate_days(query_start, end_time);
        let records = self.records_for_days(&station, &days, &offset).await?;

        let mut all_predictions: Vec<TidePrediction> = Vec::new();
        let mut all_extremes: Vec<TideExtreme> = Vec::new();
        for record in &records {
            all_predictions.extend(record.predictions.iter().cloned());
            all_extremes.extend(record.extremes.iter().cloned());
        }
        all_predictions.sort_by_key(|p| p.timestamp);
        all_extremes.sort_by_key(|e| e.timestamp);

        let start_ms = start_time.timestamp_millis();
        let end_ms = end_time.timestamp_millis();
        let now_ms = now.timestamp_millis();

        let current_level;
        if all_predictions.is_empty() {
            debug!(station_id, "No dense series, synthesizing from extremes");
            all_predictions =
                response::synthesize_predictions(&all_extremes, start_ms, end_ms, &offset);
            current_level = hermite_interp(&all_extremes, now_ms);
        } else {
            current_level = linear_interp(&all_predictions, now_ms);
        }

        let predictions = response::filter_predictions(&all_predictions, start_ms, end_ms);
        let extremes = response::filter_extremes(&all_extremes, start_ms, end_ms);
        let tide_type = response::classify_tide(&predictions, now_ms, current_level);

        Ok(response::assemble(
            &station,
            now_ms,
            now.format(time::LOCAL_TIME_FORMAT).to_string(),
            Some(current_level),
            tide_type,
            predictions,
            extremes,
        ))
    }

    /// Per-day cache probe, coalesced upstream fetch for the missing span,
    /// re-bucketing and detached write-back.
    async fn records_for_days(
        &self,
        station: &Station,
        days: &[NaiveDate],
        offset: &FixedOffset,
    ) -> TideResult<Vec<PredictionDayRecord>> {
        let mut cached = Vec::new();
        let mut missing = Vec::new();

        for date in days {
            match self.cache.get_predictions(&station.id, *date).await {
                Ok(Some(record)) => cached.push(record),
                Ok(None) => missing.push(*date),
                Err(e) => {
                    error!(
                        station_id = %station.id,
                        date = %date,
                        error = %e,
                        "Error getting predictions from cache"
                    );
                    missing.push(*date);
                }
            }
        }

        if missing.is_empty() {
            debug!(
                station_id = %station.id,
                num_days = days.len(),
                "Complete cache hit for date range"
            );
            return Ok(cached);
        }

        // One coalesced span per product: the upstream API takes ranges and
        // rate-limits aggressively, so a single call beats N per-day calls
        // even when it refetches a few cached days.
        let min_date = *missing.iter().min().expect("missing is non-empty");
        let max_date = *missing.iter().max().expect("missing is non-empty");

        debug!(
            station_id = %station.id,
            min_date = %min_date,
            max_date = %max_date,
            missing_days = missing.len(),
            "Fetching missing dates from upstream"
        );

        let predictions = self
            .api
            .predictions(&station.id, min_date, max_date, offset)
            .await?;
        let extremes = self
            .api
            .extremes(&station.id, min_date, max_date, offset)
            .await?;

        let mut predictions_by_day: HashMap<NaiveDate, Vec<TidePrediction>> = HashMap::new();
        for prediction in predictions {
            predictions_by_day
                .entry(time::local_date(prediction.timestamp, offset))
                .or_default()
                .push(prediction);
        }
        let mut extremes_by_day: HashMap<NaiveDate, Vec<TideExtreme>> = HashMap::new();
        for extreme in extremes {
            extremes_by_day
                .entry(time::local_date(extreme.timestamp, offset))
                .or_default()
                .push(extreme);
        }

        // Only the missing dates become new records; refetched days that
        // were already cached are ignored to avoid cache churn.
        let station_type = station.station_type.clone().unwrap_or_else(|| "R".into());
        let new_records: Vec<PredictionDayRecord> = missing
            .iter()
            .map(|date| PredictionDayRecord {
                station_id: station.id.clone(),
                date: date.format("%Y-%m-%d").to_string(),
                station_type: station_type.clone(),
                predictions: predictions_by_day.remove(date).unwrap_or_default(),
                extremes: extremes_by_day.remove(date).unwrap_or_default(),
                last_updated: 0,
                ttl: 0,
            })
            .collect();

        // Detached write-back over a defensive copy; the request is already
        // answered from memory and must not block on remote I/O.
        let cache = Arc::clone(&self.cache);
        let records_to_save = new_records.clone();
        let station_id = station.id.clone();
        tokio::spawn(async move {
            if let Err(e) = cache.save_predictions_batch(records_to_save).await {
                error!(
                    station_id = %station_id,
                    error = %e,
                    "Error saving predictions to cache"
                );
            }
        });

        let mut records = cached;
        records.extend(new_records);
        records.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(records)
    }
}

/// Midnight at the start of `date` in the given offset.
fn local_midnight(date: NaiveDate, offset: &FixedOffset) -> DateTime<FixedOffset> {
    let naive = date.and_hms_opt(0, 0, 0).expect("midnight is always valid");
    offset
        .from_local_datetime(&naive)
        .single()
        .expect("fixed offsets have no ambiguous instants")
}

/// Station-local calendar dates touched by the half-open window
/// `[query_start, end)`. An `end` at exact local midnight therefore does
/// not pull in the following day.
fn enumerate_days(
    query_start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
) -> Vec<NaiveDate> {
    let first = query_start.date_naive();
    let last = (end - Duration::milliseconds(1)).date_naive();

    let mut days = Vec::new();
    let mut day = first;
    while day <= last {
        days.push(day);
        day = day.succ_opt().expect("date within chrono range");
    }
    days
}
