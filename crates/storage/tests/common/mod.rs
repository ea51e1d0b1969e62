//! Shared test doubles and fixtures for storage tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use storage::{DynamoDb, Item};
use tide_common::{
    ManualClock, PredictionDayRecord, TideError, TideExtreme, TidePrediction, TideResult, TideType,
};

/// In-memory stand-in for DynamoDB with injectable failures.
#[derive(Default)]
pub struct MemoryDynamo {
    items: Mutex<HashMap<String, Item>>,
    pub get_calls: AtomicU64,
    pub put_calls: AtomicU64,
    pub batch_calls: AtomicU64,
    fail_gets: AtomicU64,
    fail_batches: AtomicU64,
}

impl MemoryDynamo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` get_item calls fail.
    #[allow(dead_code)]
    pub fn fail_next_gets(&self, n: u64) {
        self.fail_gets.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` batch_write calls fail.
    #[allow(dead_code)]
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

    fn take_failure(counter: &AtomicU64) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl DynamoDb for MemoryDynamo {
    async fn get_item(&self, table: &str, key: Item) -> TideResult<Option<Item>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.fail_gets) {
            return Err(TideError::RemoteCache("injected get failure".into()));
        }
        let items = self.items.lock().unwrap();
        Ok(items.get(&Self::storage_key(table, &key)).cloned())
    }

    async fn put_item(&self, table: &str, item: Item) -> TideResult<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        let key = Self::storage_key(table, &item);
        self.items.lock().unwrap().insert(key, item);
        Ok(())
    }

    async fn batch_write(&self, table: &str, items: Vec<Item>) -> TideResult<()> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.fail_batches) {
            return Err(TideError::RemoteCache("injected batch failure".into()));
        }
        let mut stored = self.items.lock().unwrap();
        for item in items {
            let key = Self::storage_key(table, &item);
            stored.insert(key, item);
        }
        Ok(())
    }
}

/// A clock pinned to 2024-01-01T12:00:00Z.
pub fn midday_clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
}

/// A reference-station day-record for 2024-01-01 (UTC-8 wall clock).
pub fn day_record(station_id: &str, date: &str) -> PredictionDayRecord {
    PredictionDayRecord {
        station_id: station_id.to_string(),
        date: date.to_string(),
        station_type: "R".into(),
        predictions: vec![
            TidePrediction {
                timestamp: 1_704_096_000_000,
                local_time: "2024-01-01T00:00:00".into(),
                height: 1.5,
            },
            TidePrediction {
                timestamp: 1_704_096_360_000,
                local_time: "2024-01-01T00:06:00".into(),
                height: 1.52,
            },
        ],
        extremes: vec![TideExtreme {
            kind: TideType::High,
            timestamp: 1_704_117_600_000,
            local_time: "2024-01-01T06:00:00".into(),
            height: 2.8,
        }],
        last_updated: 0,
        ttl: 0,
    }
}
