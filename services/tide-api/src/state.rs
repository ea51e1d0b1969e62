//! Application state: cache tiers, upstream clients and the tide service.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use noaa_client::{HttpClient, HttpClientOptions, NoaaApi};
use storage::{
    BlobStoreConfig, CacheConfig, DynamoClient, DynamoDb, PredictionCache, StationBlobCache,
    StationCatalogCache, TieredPredictionCache,
};
use tide_common::{Clock, SystemClock};
use tide_engine::{NoaaStationFinder, StationFinder, TideService};

use crate::config::AppConfig;

/// Long-lived shared state for the HTTP service.
pub struct AppState {
    pub config: AppConfig,
    pub finder: Arc<dyn StationFinder>,
    pub tide_service: TideService,
    pub cache: Arc<TieredPredictionCache>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let cache_config = CacheConfig::from_env();
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let station_api = Arc::new(NoaaApi::new(HttpClient::new(HttpClientOptions {
            base_url: config.noaa_base_url.clone(),
            timeout: config.station_timeout,
            ..HttpClientOptions::default()
        })?));
        let tide_api = Arc::new(NoaaApi::new(HttpClient::new(HttpClientOptions {
            base_url: config.noaa_base_url.clone(),
            timeout: config.tide_timeout,
            ..HttpClientOptions::default()
        })?));

        let blob = match &config.station_list_bucket {
            Some(bucket) => {
                let blob_config = BlobStoreConfig {
                    endpoint: config.s3_endpoint.clone(),
                    bucket: bucket.clone(),
                    region: config.s3_region.clone(),
                    allow_http: config.s3_endpoint.is_some(),
                };
                Some(Arc::new(StationBlobCache::connect(
                    &blob_config,
                    cache_config.station_list_ttl(),
                    clock.clone(),
                )?))
            }
            None => None,
        };

        let catalog = Arc::new(StationCatalogCache::new(
            cache_config.station_list_ttl(),
            clock.clone(),
        ));
        let finder = Arc::new(NoaaStationFinder::new(station_api, catalog, blob));

        let db: Option<Arc<dyn DynamoDb>> = if cache_config.enable_dynamo {
            Some(Arc::new(DynamoClient::from_env().await))
        } else {
            None
        };
        let cache = Arc::new(TieredPredictionCache::new(&cache_config, db, clock.clone()));

        let tide_service = TideService::new(
            tide_api,
            finder.clone() as Arc<dyn StationFinder>,
            cache.clone() as Arc<dyn PredictionCache>,
            clock,
        );

        info!(
            blob_tier = config.station_list_bucket.is_some(),
            lru_tier = cache_config.enable_lru,
            dynamo_tier = cache_config.enable_dynamo,
            "Tide service initialized"
        );

        Ok(Self {
            config,
            finder: finder as Arc<dyn StationFinder>,
            tide_service,
            cache,
        })
    }
}
