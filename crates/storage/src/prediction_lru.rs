//! In-process LRU cache for prediction day-records.
//!
//! First tier of the prediction cache hierarchy. Entries expire lazily on
//! read against an injected clock; capacity overflow evicts the least
//! recently used entry. Hit/miss counters live behind their own lock so
//! stats reads never contend with the map.

use std::num::NonZeroUsize;
use std::sync::{Arc, RwLock as StdRwLock};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use lru::LruCache;
use serde::Serialize;
use tokio::sync::RwLock;

use tide_common::{Clock, PredictionDayRecord};

/// Hit/miss counters for the LRU tier.
#[derive(Debug, Default, Clone, Serialize)]
pub struct LruStats {
    pub hits: u64,
    pub misses: u64,
}

struct CachedDay {
    record: PredictionDayRecord,
    expires_at: DateTime<Utc>,
}

/// Bounded map of `{stationID}:{YYYY-MM-DD}` to day-records.
pub struct PredictionLru {
    cache: RwLock<LruCache<String, CachedDay>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    stats: StdRwLock<LruStats>,
}

enum Probe {
    Hit(PredictionDayRecord),
    Expired,
    Absent,
}

impl PredictionLru {
    pub fn new(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(capacity).expect("LRU capacity must be > 0");
        Self {
            cache: RwLock::new(LruCache::new(capacity)),
            ttl,
            clock,
            stats: StdRwLock::new(LruStats::default()),
        }
    }

    /// Get a day-record, evicting it first if it has expired.
    pub async fn get(&self, station_id: &str, date: NaiveDate) -> Option<PredictionDayRecord> {
        let key = PredictionDayRecord::cache_key(station_id, date);
        let now = self.clock.now();

        let mut cache = self.cache.write().await;
        let probe = match cache.get(&key) {
            Some(entry) if now < entry.expires_at => Probe::Hit(entry.record.clone()),
            Some(_) => Probe::Expired,
            None => Probe::Absent,
        };

        match probe {
            Probe::Hit(record) => {
                self.count_hit();
                Some(record)
            }
            Probe::Expired => {
                cache.pop(&key);
                self.count_miss();
                None
            }
            Probe::Absent => {
                self.count_miss();
                None
            }
        }
    }

    /// Insert a day-record, stamping `expires_at = now + TTL`.
    pub async fn put(&self, record: PredictionDayRecord) {
        let Ok(date) = record.parsed_date() else {
            // Keys are derived from the date; an unparseable record is
            // unreachable by get() and would only waste a slot.
            return;
        };
        let key = PredictionDayRecord::cache_key(&record.station_id, date);
        let expires_at = self.clock.now() + self.ttl;

        let mut cache = self.cache.write().await;
        cache.put(key, CachedDay { record, expires_at });
    }

    /// Whether a fresh entry exists, without touching LRU order or stats.
    pub async fn contains(&self, station_id: &str, date: NaiveDate) -> bool {
        let key = PredictionDayRecord::cache_key(station_id, date);
        let now = self.clock.now();
        let cache = self.cache.read().await;
        cache
            .peek(&key)
            .map(|entry| now < entry.expires_at)
            .unwrap_or(false)
    }

    /// Remove every entry.
    pub async fn clear(&self) {
        self.cache.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn stats(&self) -> LruStats {
        self.stats.read().expect("stats lock poisoned").clone()
    }

    fn count_hit(&self) {
        self.stats.write().expect("stats lock poisoned").hits += 1;
    }

    fn count_miss(&self) {
        self.stats.write().expect("stats lock poisoned").misses += 1;
    }
}
