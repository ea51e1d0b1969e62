//! Tide station metadata.

use serde::{Deserialize, Serialize};

use crate::error::{TideError, TideResult};

/// Upstream data provider a station belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "NOAA")]
    Noaa,
    #[serde(rename = "UKHO")]
    Ukho,
    #[serde(rename = "CHS")]
    Chs,
}

/// A tide prediction station.
///
/// `distance` is transient: it is stamped onto copies returned by
/// nearest-station queries and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default)]
    pub distance: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub source: Source,
    pub capabilities: Vec<String>,
    /// UTC offset in seconds.
    pub time_zone_offset: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// "R" for reference, "S" for subordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_type: Option<String>,
}

impl Station {
    /// Whether upstream supplies only extremes for this station.
    pub fn is_subordinate(&self) -> bool {
        self.station_type.as_deref() == Some("S")
    }

    /// Check that the station's fields are within valid bounds.
    pub fn validate(&self) -> TideResult<()> {
        if self.id.is_empty() {
            return Err(TideError::InvalidRecord("station ID is required".into()));
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

        // -12h to +14h, matching the range of real UTC offsets.
        if !(-43_200..=50_400).contains(&self.time_zone_offset) {
            return Err(TideError::InvalidRecord(format!(
                "invalid timezone offset: {}",
                self.time_zone_offset
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station() -> Station {
        Station {
            id: "9447130".into(),
            name: "Seattle".into(),
            state: Some("WA".into()),
            region: Some("Puget Sound".into()),
            distance: 0.0,
            latitude: 47.6062,
            longitude: -122.3321,
            source: Source::Noaa,
            capabilities: vec!["WATER_LEVEL".into()],
            time_zone_offset: -8 * 3600,
            level: None,
            station_type: Some("R".into()),
        }
    }

    #[test]
    fn valid_station_passes() {
        assert!(station().validate().is_ok());
    }

    #[test]
    fn latitude_bounds_enforced() {
        let mut s = station();
        s.latitude = 90.01;
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("invalid latitude"));
    }

    #[test]
    fn longitude_bounds_enforced() {
        let mut s = station();
        s.longitude = -180.5;
        assert!(s.validate().unwrap_err().to_string().contains("invalid longitude"));
    }

    #[test]
    fn timezone_bounds_enforced() {
        let mut s = station();
        s.time_zone_offset = 50_401;
        assert!(s
            .validate()
            .unwrap_err()
            .to_string()
            .contains("invalid timezone offset"));
    }

    #[test]
    fn subordinate_detection() {
        let mut s = station();
        assert!(!s.is_subordinate());
        s.station_type = Some("S".into());
        assert!(s.is_subordinate());
        s.station_type = None;
        assert!(!s.is_subordinate());
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(station()).unwrap();
        assert_eq!(json["timeZoneOffset"], -28800);
        assert_eq!(json["stationType"], "R");
        assert_eq!(json["source"], "NOAA");
    }
}
