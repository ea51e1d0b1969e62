//! Durable prediction cache over DynamoDB.
//!
//! Second tier of the prediction cache hierarchy. Records carry their own
//! TTL attribute (honored by the store's automatic expiry where supported)
//! and are additionally checked on read so a stale item is a miss, not an
//! error.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::debug;

use tide_common::{Clock, PredictionDayRecord, TideError, TideResult};

use crate::config::CacheConfig;
use crate::dynamo::{item_to_record, record_key, record_to_item, DynamoDb};

/// Table holding one item per (stationId, date).
pub const PREDICTIONS_TABLE: &str = "tide-predictions-cache";

const RETRY_BASE_DELAY: Duration = Duration::from_millis(100);

/// DynamoDB-backed cache of prediction day-records.
pub struct DynamoPredictionCache {
    db: Arc<dyn DynamoDb>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
}

impl DynamoPredictionCache {
    pub fn new(db: Arc<dyn DynamoDb>, config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self { db, config, clock }
    }

    /// Fetch the record for a station-day; expired records are misses.
    pub async fn get_predictions(
        &self,
        station_id: &str,
        date: NaiveDate,
    ) -> TideResult<Option<PredictionDayRecord>> {
        let date_str = date.format("%Y-%m-%d").to_string();
        let key = record_key(station_id, &date_str);

        let Some(item) = self.db.get_item(PREDICTIONS_TABLE, key).await? else {
            return Ok(None);
        };

        let record = item_to_record(&item)?;

        if self.clock.now().timestamp() >= record.ttl {
            debug!(station_id, date = %date_str, "Durable cache record expired");
            return Ok(None);
        }

        Ok(Some(record))
    }

    /// Validate, stamp and write a single record.
    pub async fn save_predictions(&self, record: PredictionDayRecord) -> TideResult<()> {
        record.validate()?;

        let record = self.stamp(record);
        self.db
            .put_item(PREDICTIONS_TABLE, record_to_item(&record))
            .await?;

        debug!(
            station_id = %record.station_id,
            date = %record.date,
            "Saved predictions to durable cache"
        );
        Ok(())
    }

    /// Validate, stamp and write records in configured batch sizes, retrying
    /// each batch with exponential backoff.
    pub async fn save_predictions_batch(
        &self,
        records: Vec<PredictionDayRecord>,
    ) -> TideResult<()> {
        for record in &records {
            record.validate()?;
        }

        for chunk in records.chunks(self.config.batch_size.max(1)) {
            let items: Vec<_> = chunk
                .iter()
                .map(|record| record_to_item(&self.stamp(record.clone())))
                .collect();

            let mut last_error: Option<TideError> = None;
            for attempt in 0..self.config.max_batch_retries {
                match self.db.batch_write(PREDICTIONS_TABLE, items.clone()).await {
                    Ok(()) => {
                        last_error = None;
                        break;
                    }
                    Err(e) => {
                        last_error = Some(e);
                        tokio::time::sleep(RETRY_BASE_DELAY * (1 << attempt)).await;
                    }
                }
            }

            if let Some(e) = last_error {
                return Err(TideError::RemoteCache(format!(
                    "batch writing predictions after {} retries: {e}",
                    self.config.max_batch_retries
                )));
            }
        }

        Ok(())
    }

    fn stamp(&self, mut record: PredictionDayRecord) -> PredictionDayRecord {
        let now = self.clock.now().timestamp();
        record.last_updated = now;
        record.ttl = now + self.config.dynamo_ttl().num_seconds();
        record
    }
}
