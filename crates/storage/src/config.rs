//! Cache configuration from environment variables.

use std::env;

use chrono::Duration;
use tracing::{debug, warn};

/// All cache-related configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Prediction LRU capacity.
    pub lru_size: usize,
    /// Prediction LRU entry TTL, minutes.
    pub lru_ttl_minutes: u64,
    /// Durable record TTL, days.
    pub dynamo_ttl_days: u64,
    /// Station catalog TTL (both tiers), days.
    pub station_list_ttl_days: u64,
    /// Batch-write group size.
    pub batch_size: usize,
    /// Batch-write retry cap.
    pub max_batch_retries: u32,
    pub enable_lru: bool,
    pub enable_dynamo: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            lru_size: 1000,
            lru_ttl_minutes: 15,
            dynamo_ttl_days: 2,
            station_list_ttl_days: 2,
            batch_size: 25,
            max_batch_retries: 3,
            enable_lru: true,
            enable_dynamo: true,
        }
    }
}

impl CacheConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults (with a warning) on unparseable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            lru_size: parse_env("CACHE_TIDE_LRU_SIZE", defaults.lru_size),
            lru_ttl_minutes: parse_env("CACHE_TIDE_LRU_TTL_MINUTES", defaults.lru_ttl_minutes),
            dynamo_ttl_days: parse_env("CACHE_DYNAMO_TTL_DAYS", defaults.dynamo_ttl_days),
            station_list_ttl_days: parse_env(
                "CACHE_STATION_LIST_TTL_DAYS",
                defaults.station_list_ttl_days,
            ),
            batch_size: parse_env("CACHE_BATCH_SIZE", defaults.batch_size),
            max_batch_retries: parse_env("CACHE_MAX_BATCH_RETRIES", defaults.max_batch_retries),
            enable_lru: parse_bool_env("CACHE_ENABLE_LRU", defaults.enable_lru),
            enable_dynamo: parse_bool_env("CACHE_ENABLE_DYNAMO", defaults.enable_dynamo),
        };

        debug!(
            lru_size = config.lru_size,
            lru_ttl_minutes = config.lru_ttl_minutes,
            dynamo_ttl_days = config.dynamo_ttl_days,
            station_list_ttl_days = config.station_list_ttl_days,
            batch_size = config.batch_size,
            max_batch_retries = config.max_batch_retries,
            enable_lru = config.enable_lru,
            enable_dynamo = config.enable_dynamo,
            "Cache configuration loaded"
        );

        config
    }

    pub fn lru_ttl(&self) -> Duration {
        Duration::minutes(self.lru_ttl_minutes as i64)
    }

    pub fn dynamo_ttl(&self) -> Duration {
        Duration::days(self.dynamo_ttl_days as i64)
    }

    pub fn station_list_ttl(&self) -> Duration {
        Duration::days(self.station_list_ttl_days as i64)
    }
}

fn parse_env<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            warn!(key, value = %value, "Invalid value in environment variable, using default");
            default
        }),
        Err(_) => default,
    }
}

fn parse_bool_env(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => match value.as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => {
                warn!(key, value = %value, "Invalid boolean in environment variable, using default");
                default
            }
        },
        Err(_) => default,
    }
}
