//! Startup wiring.
//!
//! # Responsibilities
//! - Build the cache stores, breakers, sources and orchestrator from config
//! - Hand back the pieces that need background tasks (the fallback sweep)

use std::sync::Arc;
use thiserror::Error;

use crate::cache::{BoundedFallbackStore, CacheError, CacheStore, CompositeCache, RedisStore};
use crate::config::TrackerConfig;
use crate::service::FetchOrchestrator;
use crate::sources::{build_client, PortOfLondonSource, TowerBridgeSource, UpstreamError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cache setup failed: {0}")]
    Cache(#[from] CacheError),

    #[error("http client setup failed: {0}")]
    Client(#[from] UpstreamError),
}

/// Long-lived objects shared for the life of the process.
pub struct Components {
    pub orchestrator: Arc<FetchOrchestrator>,
    pub fallback: Arc<BoundedFallbackStore>,
}

/// Wire everything from a validated config.
pub fn build_components(config: &TrackerConfig) -> Result<Components, StartupError> {
    let primary: Option<Arc<dyn CacheStore>> = if config.cache.redis_address.trim().is_empty() {
        tracing::warn!("No Redis address configured, running on the fallback cache only");
        None
    } else {
        let store = RedisStore::new(&config.cache.redis_address, config.cache.redis_timeout())?;
        tracing::info!(address = %config.cache.redis_address, "Primary cache configured");
        Some(Arc::new(store))
    };

    let cache = Arc::new(CompositeCache::new(
        primary,
        BoundedFallbackStore::new(config.cache.fallback_size, config.cache.fallback_ttl()),
    ));
    let fallback = cache.fallback().clone();

    let client = build_client(config.upstreams.request_timeout())?;
    let bridge = Arc::new(TowerBridgeSource::new(
        client.clone(),
        config.upstreams.bridge_url.clone(),
        config.upstreams.max_bridge_pages,
    ));
    let vessels = Arc::new(PortOfLondonSource::new(client, config.upstreams.vessels_url.clone()));

    let orchestrator = Arc::new(FetchOrchestrator::new(config, cache, bridge, vessels));

    Ok(Components {
        orchestrator,
        fallback,
    })
}
