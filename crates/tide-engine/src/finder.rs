//! Station lookup and nearest-station search over the catalog tiers.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use noaa_client::NoaaApi;
use storage::{StationBlobCache, StationCatalogCache};
use tide_common::{Station, TideError, TideResult};

use crate::distance::haversine_km;

/// Result count when the caller does not specify a limit.
pub const DEFAULT_NEAREST_LIMIT: usize = 5;

/// Capability contract for station lookup.
#[async_trait]
pub trait StationFinder: Send + Sync {
    async fn find_station(&self, station_id: &str) -> TideResult<Station>;

    /// The `limit` nearest stations, distance ascending. `limit == 0`
    /// selects the default of 5.
    async fn find_nearest_stations(
        &self,
        lat: f64,
        lon: f64,
        limit: usize,
    ) -> TideResult<Vec<Station>>;
}

/// Finder over the NOAA catalog with in-process and blob cache tiers.
pub struct NoaaStationFinder {
    api: Arc<NoaaApi>,
    catalog: Arc<StationCatalogCache>,
    blob: Option<Arc<StationBlobCache>>,
}

impl NoaaStationFinder {
    pub fn new(
        api: Arc<NoaaApi>,
        catalog: Arc<StationCatalogCache>,
        blob: Option<Arc<StationBlobCache>>,
    ) -> Self {
        Self { api, catalog, blob }
    }

    /// Resolve the station list: in-process snapshot, then blob, then
    /// upstream. Upstream results refresh both cache tiers; the blob write
    /// happens off the request path.
    async fn station_list(&self) -> TideResult<Vec<Station>> {
        if let Some(stations) = self.catalog.get() {
            debug!("Memory cache hit for station list");
            return Ok(stations);
        }

        if let Some(blob) = &self.blob {
            if let Some(stations) = blob.get_stations().await {
                debug!("Blob cache hit for station list");
                self.catalog.set(stations.clone());
                return Ok(stations);
            }
        }

        debug!("Cache miss for station list, fetching from upstream");
        let stations = self.api.station_list().await?;

        self.catalog.set(stations.clone());
        if let Some(blob) = &self.blob {
            let blob = Arc::clone(blob);
            let snapshot = stations.clone();
            tokio::spawn(async move {
                if let Err(e) = blob.save_stations(&snapshot).await {
                    error!(error = %e, "Error saving station list to blob cache");
                }
            });
        }

        Ok(stations)
    }
}

#[async_trait]
impl StationFinder for NoaaStationFinder {
    async fn find_station(&self, station_id: &str) -> TideResult<Station> {
        let stations = self.station_list().await?;

        stations
            .into_iter()
            .find(|station| station.id == station_id)
            .ok_or_else(|| TideError::StationNotFound(station_id.to_string()))
    }

    async fn find_nearest_stations(
        &self,
        lat: f64,
        lon: f64,
        limit: usize,
    ) -> TideResult<Vec<Station>> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(TideError::InvalidCoordinates(format!(
                "invalid latitude: {lat}"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(TideError::InvalidCoordinates(format!(
                "invalid longitude: {lon}"
            )));
        }

        let limit = if limit == 0 {
            DEFAULT_NEAREST_LIMIT
        } else {
            limit
        };

        let mut stations = self.station_list().await?;
        for station in &mut stations {
            station.distance = haversine_km(lat, lon, station.latitude, station.longitude);
        }

        // Station ID breaks distance ties so ordering is deterministic.
        stations.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.id.cmp(&b.id))
        });
        stations.truncate(limit);

        Ok(stations)
    }
}
