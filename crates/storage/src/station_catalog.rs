//! In-process snapshot cache for the station catalog.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};

use tide_common::{Clock, Station};

struct Snapshot {
    stations: Vec<Station>,
    last_updated: DateTime<Utc>,
}

/// TTL-bounded snapshot of the full station list.
///
/// Readers always receive a defensive copy so cached state cannot be
/// mutated from outside.
pub struct StationCatalogCache {
    inner: RwLock<Option<Snapshot>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl StationCatalogCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(None),
            ttl,
            clock,
        }
    }

    /// A copy of the cached catalog, or None when absent or expired.
    pub fn get(&self) -> Option<Vec<Station>> {
        let guard = self.inner.read().expect("catalog lock poisoned");
        let snapshot = guard.as_ref()?;

        if self.clock.now() - snapshot.last_updated > self.ttl {
            return None;
        }

        Some(snapshot.stations.clone())
    }

    /// Replace the snapshot atomically.
    pub fn set(&self, stations: Vec<Station>) {
        let mut guard = self.inner.write().expect("catalog lock poisoned");
        *guard = Some(Snapshot {
            stations,
            last_updated: self.clock.now(),
        });
    }
}
