//! Service configuration from environment variables.

use std::env;
use std::time::Duration;

use tracing::warn;

/// Default upstream timeout for station catalog requests.
const DEFAULT_STATION_TIMEOUT: Duration = Duration::from_secs(10);
/// Default upstream timeout for tide prediction requests.
const DEFAULT_TIDE_TIMEOUT: Duration = Duration::from_secs(30);

/// Top-level service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// "local" / "development" / "production"; affects only logging format.
    pub environment: String,
    pub noaa_base_url: String,
    pub station_timeout: Duration,
    pub tide_timeout: Duration,
    /// Bucket for the station catalog blob; None disables that tier.
    pub station_list_bucket: Option<String>,
    /// Optional S3 endpoint override (local MinIO).
    pub s3_endpoint: Option<String>,
    pub s3_region: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        // HTTP_TIMEOUT (seconds) overrides both per-client defaults.
        let override_timeout = env::var("HTTP_TIMEOUT").ok().and_then(|value| {
            match value.parse::<u64>() {
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => {
                    warn!(value = %value, "Invalid HTTP_TIMEOUT, using defaults");
                    None
                }
            }
        });

        Self {
            environment: env::var("ENV").unwrap_or_else(|_| "production".to_string()),
            noaa_base_url: env::var("NOAA_BASE_URL")
                .unwrap_or_else(|_| noaa_client::api::DEFAULT_BASE_URL.to_string()),
            station_timeout: override_timeout.unwrap_or(DEFAULT_STATION_TIMEOUT),
            tide_timeout: override_timeout.unwrap_or(DEFAULT_TIDE_TIMEOUT),
            station_list_bucket: env::var("STATION_LIST_BUCKET").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            s3_region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
        }
    }

    /// Development environments log human-readable output; everything else
    /// logs JSON.
    pub fn is_development(&self) -> bool {
        matches!(self.environment.as_str(), "local" | "development")
    }
}
