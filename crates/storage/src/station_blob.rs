//! Blob-store cache for the station catalog.
//!
//! The whole catalog is one JSON object under a well-known key. A missing
//! object, an expired record or an undecodable body are all soft misses:
//! the caller refetches from upstream.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Duration;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::ObjectStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tide_common::{Clock, Station, TideError, TideResult};

/// Well-known object key for the catalog blob.
pub const CATALOG_KEY: &str = "stations.json";

/// The persisted catalog blob.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationCatalogRecord {
    pub stations: Vec<Station>,
    /// Epoch seconds of the last refresh.
    pub last_updated: i64,
    /// Epoch seconds after which the blob is stale.
    pub ttl: i64,
}

/// Connection settings for the S3-compatible blob store.
#[derive(Debug, Clone)]
pub struct BlobStoreConfig {
    pub endpoint: Option<String>,
    pub bucket: String,
    pub region: String,
    /// Allow plain HTTP (local MinIO).
    pub allow_http: bool,
}

/// Catalog cache over an object store.
pub struct StationBlobCache {
    store: Arc<dyn ObjectStore>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for StationBlobCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StationBlobCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl StationBlobCache {
    /// Wrap an existing object store (tests use `object_store::memory::InMemory`).
    pub fn new(store: Arc<dyn ObjectStore>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { store, ttl, clock }
    }

    /// Connect to an S3-compatible store from config.
    pub fn connect(
        config: &BlobStoreConfig,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> TideResult<Self> {
        if config.bucket.is_empty() {
            return Err(TideError::InvalidRecord("empty bucket name".into()));
        }

        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(&config.bucket)
            .with_region(&config.region);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.with_endpoint(endpoint);
        }
        if config.allow_http {
            builder = builder.with_allow_http(true);
        }

        let store = builder
            .build()
            .map_err(|e| TideError::Internal(format!("creating blob store client: {e}")))?;

        Ok(Self::new(Arc::new(store), ttl, clock))
    }

    /// Read the cached catalog. Any failure is a soft miss.
    pub async fn get_stations(&self) -> Option<Vec<Station>> {
        let location = Path::from(CATALOG_KEY);

        let result = match self.store.get(&location).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => {
                debug!("No station catalog blob present");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Reading station catalog blob failed, treating as miss");
                return None;
            }
        };

        let body = match result.bytes().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Reading station catalog blob body failed, treating as miss");
                return None;
            }
        };

        let record: StationCatalogRecord = match serde_json::from_slice(&body) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Station catalog blob is undecodable, treating as miss");
                return None;
            }
        };

        if self.clock.now().timestamp() > record.ttl {
            debug!("Station catalog blob expired");
            return None;
        }

        Some(record.stations)
    }

    /// Persist the catalog with a fresh TTL.
    pub async fn save_stations(&self, stations: &[Station]) -> TideResult<()> {
        let now = self.clock.now().timestamp();
        let record = StationCatalogRecord {
            stations: stations.to_vec(),
            last_updated: now,
            ttl: now + self.ttl.num_seconds(),
        };

        let body = serde_json::to_vec(&record)
            .map_err(|e| TideError::Internal(format!("encoding station catalog: {e}")))?;

        self.store
            .put(&Path::from(CATALOG_KEY), Bytes::from(body).into())
            .await
            .map_err(|e| TideError::RemoteCache(format!("saving station catalog: {e}")))?;

        debug!(station_count = stations.len(), "Saved station catalog blob");
        Ok(())
    }
}
