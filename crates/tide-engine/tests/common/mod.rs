//! Shared harness for tide-engine tests: wiremock upstream, in-memory
//! DynamoDB double, seeded station catalog and a pinned clock.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, FixedOffset, TimeZone, Utc};
use wiremock::MockServer;

use noaa_client::{HttpClient, HttpClientOptions, NoaaApi};
use storage::{CacheConfig, DynamoDb, Item, PredictionCache, StationCatalogCache, TieredPredictionCache};
use tide_engine::{NoaaStationFinder, StationFinder, TideService};
use tide_common::{
    time, Clock, ManualClock, PredictionDayRecord, Source, Station, TideExtreme, TidePrediction,
    TideResult, TideType,
};

/// In-memory stand-in for DynamoDB with injectable failures.
#[derive(Default)]
pub struct MemoryDynamo {
    items: Mutex<HashMap<String, Item>>,
    pub get_calls: AtomicU64,
    pub batch_calls: AtomicU64,
    fail_batches: AtomicU64,
}

impl MemoryDynamo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_batches(&self, n: u64) {
        self.fail_batches.store(n, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    fn storage_key(table: &str, item_or_key: &Item) -> String {
        let station_id = item_or_key
            .get("stationId")
            .and_then(|v| v.as_s().ok().cloned())
            .unwrap_or_default();
        let date = item_or_key
            .get("date")
            .and_then(|v| v.as_s().ok().cloned())
            .unwrap_or_default();
        format!("{table}/{station_id}/{date}")
    }
}

#[async_trait]
impl DynamoDb for MemoryDynamo {
    async fn get_item(&self, table: &str, key: Item) -> TideResult<Option<Item>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let items = self.items.lock().unwrap();
        Ok(items.get(&Self::storage_key(table, &key)).cloned())
    }

    async fn put_item(&self, table: &str, item: Item) -> TideResult<()> {
        let key = Self::storage_key(table, &item);
        self.items.lock().unwrap().insert(key, item);
        Ok(())
    }

    async fn batch_write(&self, table: &str, items: Vec<Item>) -> TideResult<()> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        let failures = &self.fail_batches;
        if failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(tide_common::TideError::RemoteCache(
                "injected batch failure".into(),
            ));
        }
        let mut stored = self.items.lock().unwrap();
        for item in items {
            let key = Self::storage_key(table, &item);
            stored.insert(key, item);
        }
        Ok(())
    }
}

/// UTC-8, the offset used by all test stations.
pub fn pst() -> FixedOffset {
    FixedOffset::west_opt(8 * 3600).unwrap()
}

/// Epoch milliseconds of a PST wall-clock string.
pub fn ms(wall_clock: &str) -> i64 {
    time::parse_wall_clock(wall_clock, &pst())
        .unwrap()
        .timestamp_millis()
}

pub fn station(id: &str, name: &str, lat: f64, lon: f64, station_type: &str) -> Station {
    Station {
        id: id.to_string(),
        name: name.to_string(),
        state: Some("WA".into()),
        region: None,
        distance: 0.0,
        latitude: lat,
        longitude: lon,
        source: Source::Noaa,
        capabilities: vec!["WATER_LEVEL".into()],
        time_zone_offset: -8 * 3600,
        level: None,
        station_type: Some(station_type.to_string()),
    }
}

pub fn reference_station(id: &str) -> Station {
    station(id, "Test Reference", 47.6062, -122.3321, "R")
}

pub fn subordinate_station(id: &str) -> Station {
    station(id, "Test Subordinate", 47.6062, -122.3321, "S")
}

/// A full day of 6-minute predictions (240 points from local midnight)
/// with gently increasing heights, plus two extremes.
pub fn full_day_record(station_id: &str, date: &str) -> PredictionDayRecord {
    let base = ms(&format!("{date}T00:00:00"));
    let offset = pst();

    let predictions = (0..240)
        .map(|k| {
            let timestamp = base + k * 6 * 60 * 1000;
            TidePrediction {
                timestamp,
                local_time: time::format_local_time(timestamp, &offset),
                height: 1.0 + k as f64 * 0.01,
            }
        })
        .collect();

    let extremes = vec![
        TideExtreme {
            kind: TideType::Low,
            timestamp: base + 3 * 3600 * 1000,
            local_time: time::format_local_time(base + 3 * 3600 * 1000, &offset),
            height: 0.4,
        },
        TideExtreme {
            kind: TideType::High,
            timestamp: base + 15 * 3600 * 1000,
            local_time: time::format_local_time(base + 15 * 3600 * 1000, &offset),
            height: 2.9,
        },
    ];

    PredictionDayRecord {
        station_id: station_id.to_string(),
        date: date.to_string(),
        station_type: "R".into(),
        predictions,
        extremes,
        last_updated: 0,
        ttl: 0,
    }
}

pub struct Harness {
    pub server: MockServer,
    pub service: TideService,
    pub cache: Arc<TieredPredictionCache>,
    pub db: Arc<MemoryDynamo>,
    pub clock: Arc<ManualClock>,
    pub catalog: Arc<StationCatalogCache>,
}

impl Harness {
    /// Harness with the catalog pre-seeded; the clock starts at noon PST on
    /// 2024-01-01.
    pub async fn new(stations: Vec<Station>) -> Self {
        let server = MockServer::start().await;

        let http = HttpClient::new(HttpClientOptions {
            base_url: server.uri(),
            timeout: StdDuration::from_secs(5),
            max_retries: 0,
            initial_backoff: StdDuration::from_millis(5),
        })
        .expect("client should build");
        let api = Arc::new(NoaaApi::new(http));

        let clock: Arc<ManualClock> =
            Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap()));

        let catalog = Arc::new(StationCatalogCache::new(
            Duration::days(2),
            clock.clone() as Arc<dyn Clock>,
        ));
        catalog.set(stations);

        let finder = Arc::new(NoaaStationFinder::new(api.clone(), catalog.clone(), None));

        let db = Arc::new(MemoryDynamo::new());
        let cache = Arc::new(TieredPredictionCache::new(
            &CacheConfig::default(),
            Some(db.clone() as Arc<dyn DynamoDb>),
            clock.clone() as Arc<dyn Clock>,
        ));

        let service = TideService::new(
            api,
            finder as Arc<dyn StationFinder>,
            cache.clone() as Arc<dyn PredictionCache>,
            clock.clone() as Arc<dyn Clock>,
        );

        Self {
            server,
            service,
            cache,
            db,
            clock,
            catalog,
        }
    }

    /// Number of requests the mock upstream has received.
    pub async fn upstream_calls(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }

    /// Wait until the detached write-back lands `expected` records, or panic.
    pub async fn await_write_back(&self, expected: usize) {
        for _ in 0..200 {
            if self.db.len() >= expected {
                return;
            }
            tokio::time::sleep(StdDuration::from_millis(10)).await;
        }
        panic!(
            "write-back never landed: {} of {expected} records",
            self.db.len()
        );
    }
}
