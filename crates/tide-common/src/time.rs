//! Wall-clock handling for stations with fixed UTC offsets.
//!
//! Upstream tide data is framed in station-local wall-clock time
//! (`time_zone=lst_ldt`), so all parsing and formatting here works in a
//! station's fixed offset. There is deliberately no DST awareness.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::{TideError, TideResult};

/// Format for request datetimes and the `localTime` response field.
pub const LOCAL_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Format used by the upstream prediction endpoints.
pub const NOAA_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Build a fixed offset from a station's UTC offset in seconds.
pub fn station_offset(seconds: i32) -> TideResult<FixedOffset> {
    FixedOffset::east_opt(seconds)
        .ok_or_else(|| TideError::Internal(format!("timezone offset out of range: {seconds}")))
}

/// Parse a `YYYY-MM-DDTHH:MM:SS` wall-clock string in the given offset.
pub fn parse_wall_clock(s: &str, offset: &FixedOffset) -> TideResult<DateTime<FixedOffset>> {
    let naive = NaiveDateTime::parse_from_str(s, LOCAL_TIME_FORMAT).map_err(|_| {
        TideError::InvalidRange(format!(
            "invalid datetime {s:?}: expected YYYY-MM-DDTHH:MM:SS"
        ))
    })?;
    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| TideError::InvalidRange(format!("ambiguous datetime: {s}")))
}

/// Parse an upstream `YYYY-MM-DD HH:MM` timestamp in the given offset,
/// returning epoch milliseconds.
pub fn parse_noaa_time(s: &str, offset: &FixedOffset) -> TideResult<i64> {
    let naive = NaiveDateTime::parse_from_str(s, NOAA_TIME_FORMAT)
        .map_err(|e| TideError::Decode(format!("parsing time {s:?}: {e}")))?;
    let local = offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| TideError::Decode(format!("ambiguous time: {s}")))?;
    Ok(local.timestamp_millis())
}

/// Format epoch milliseconds as a wall-clock string in the given offset.
pub fn format_local_time(timestamp_ms: i64, offset: &FixedOffset) -> String {
    utc_from_ms(timestamp_ms)
        .with_timezone(offset)
        .format(LOCAL_TIME_FORMAT)
        .to_string()
}

/// The station-local calendar date containing the given instant.
pub fn local_date(timestamp_ms: i64, offset: &FixedOffset) -> NaiveDate {
    utc_from_ms(timestamp_ms).with_timezone(offset).date_naive()
}

/// Epoch milliseconds of local midnight at the start of `date`.
pub fn day_start_ms(date: NaiveDate, offset: &FixedOffset) -> i64 {
    let naive = date.and_hms_opt(0, 0, 0).expect("midnight is always valid");
    offset
        .from_local_datetime(&naive)
        .single()
        .expect("fixed offsets have no ambiguous instants")
        .timestamp_millis()
}

fn utc_from_ms(timestamp_ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(timestamp_ms).expect("timestamp within chrono range")
}
