//! Storage abstractions for tidecast services.
//!
//! Provides the cache tiers in front of the upstream provider:
//! - In-process LRU for prediction day-records
//! - DynamoDB for durable prediction day-records
//! - S3-compatible blob plus in-process snapshot for the station catalog

pub mod cache_service;
pub mod config;
pub mod dynamo;
pub mod prediction_lru;
pub mod prediction_store;
pub mod station_blob;
pub mod station_catalog;

pub use cache_service::{CacheStats, PredictionCache, TieredPredictionCache};
pub use config::CacheConfig;
pub use dynamo::{DynamoClient, DynamoDb, Item};
pub use prediction_lru::{LruStats, PredictionLru};
pub use prediction_store::{DynamoPredictionCache, PREDICTIONS_TABLE};
pub use station_blob::{BlobStoreConfig, StationBlobCache, StationCatalogRecord, CATALOG_KEY};
pub use station_catalog::StationCatalogCache;
