//! Tiered prediction cache: in-process LRU backed by DynamoDB.

use std::sync::{Arc, RwLock as StdRwLock};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use tide_common::{Clock, PredictionDayRecord, TideResult};

use crate::config::CacheConfig;
use crate::dynamo::DynamoDb;
use crate::prediction_lru::PredictionLru;
use crate::prediction_store::DynamoPredictionCache;

/// Combined hit/miss counters across both prediction tiers.
#[derive(Debug, Default, Clone, Serialize)]
pub struct CacheStats {
    pub lru_hits: u64,
    pub lru_misses: u64,
    pub dynamo_hits: u64,
    pub dynamo_misses: u64,
}

/// Capability contract for the prediction cache used by the orchestrator.
#[async_trait]
pub trait PredictionCache: Send + Sync {
    /// Probe the tiers for one station-day. A miss is `Ok(None)`, never an
    /// error; tier read failures are logged and demoted.
    async fn get_predictions(
        &self,
        station_id: &str,
        date: NaiveDate,
    ) -> TideResult<Option<PredictionDayRecord>>;

    /// Write one record through the tiers.
    async fn save_predictions(&self, record: PredictionDayRecord) -> TideResult<()>;

    /// Write a batch of records through the tiers.
    async fn save_predictions_batch(&self, records: Vec<PredictionDayRecord>) -> TideResult<()>;

    async fn stats(&self) -> CacheStats;

    /// Purge the in-process tier.
    async fn clear(&self);
}

/// LRU-over-DynamoDB prediction cache. Either tier can be disabled by
/// configuration; a Dynamo hit back-fills the LRU.
pub struct TieredPredictionCache {
    lru: Option<PredictionLru>,
    dynamo: Option<DynamoPredictionCache>,
    dynamo_stats: StdRwLock<(u64, u64)>,
}

impl TieredPredictionCache {
    pub fn new(config: &CacheConfig, db: Option<Arc<dyn DynamoDb>>, clock: Arc<dyn Clock>) -> Self {
        let lru = config
            .enable_lru
            .then(|| PredictionLru::new(config.lru_size, config.lru_ttl(), clock.clone()));

        let dynamo = match (config.enable_dynamo, db) {
            (true, Some(db)) => Some(DynamoPredictionCache::new(db, config.clone(), clock)),
            _ => None,
        };

        Self {
            lru,
            dynamo,
            dynamo_stats: StdRwLock::new((0, 0)),
        }
    }

    /// Direct access to the LRU tier (used by tests and admin surfaces).
    pub fn lru(&self) -> Option<&PredictionLru> {
        self.lru.as_ref()
    }

    fn count_dynamo(&self, hit: bool) {
        let mut guard = self.dynamo_stats.write().expect("stats lock poisoned");
        if hit {
            guard.0 += 1;
        } else {
            guard.1 += 1;
        }
    }
}

#[async_trait]
impl PredictionCache for TieredPredictionCache {
    async fn get_predictions(
        &self,
        station_id: &str,
        date: NaiveDate,
    ) -> TideResult<Option<PredictionDayRecord>> {
        if let Some(lru) = &self.lru {
            if let Some(record) = lru.get(station_id, date).await {
                return Ok(Some(record));
            }
        }

        let Some(dynamo) = &self.dynamo else {
            return Ok(None);
        };

        match dynamo.get_predictions(station_id, date).await {
            Ok(Some(record)) => {
                self.count_dynamo(true);
                if let Some(lru) = &self.lru {
                    lru.put(record.clone()).await;
                }
                Ok(Some(record))
            }
            Ok(None) => {
                self.count_dynamo(false);
                Ok(None)
            }
            Err(e) => {
                // A broken remote tier must not fail the request.
                warn!(station_id, date = %date, error = %e, "Durable cache read failed, treating as miss");
                self.count_dynamo(false);
                Ok(None)
            }
        }
    }

    async fn save_predictions(&self, record: PredictionDayRecord) -> TideResult<()> {
        record.validate()?;

        if let Some(lru) = &self.lru {
            lru.put(record.clone()).await;
        }
        if let Some(dynamo) = &self.dynamo {
            dynamo.save_predictions(record).await?;
        }
        Ok(())
    }

    async fn save_predictions_batch(&self, records: Vec<PredictionDayRecord>) -> TideResult<()> {
        for record in &records {
            record.validate()?;
        }

        if let Some(lru) = &self.lru {
            for record in &records {
                lru.put(record.clone()).await;
            }
        }
        if let Some(dynamo) = &self.dynamo {
            dynamo.save_predictions_batch(records).await?;
        }
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        let lru_stats = self.lru.as_ref().map(|l| l.stats()).unwrap_or_default();
        let (dynamo_hits, dynamo_misses) =
            *self.dynamo_stats.read().expect("stats lock poisoned");
        CacheStats {
            lru_hits: lru_stats.hits,
            lru_misses: lru_stats.misses,
            dynamo_hits,
            dynamo_misses,
        }
    }

    async fn clear(&self) {
        if let Some(lru) = &self.lru {
            lru.clear().await;
        }
    }
}
