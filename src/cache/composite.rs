//! Read-through cache with a networked primary and an in-process fallback.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::{BoundedFallbackStore, CacheError, CacheStore};
use crate::observability::metrics;

/// Prefers the primary store; substitutes the fallback on any primary error.
///
/// Primary errors are logged and counted here and never reach callers:
/// both `get` and `set` always return `Ok`.
pub struct CompositeCache {
    primary: Option<Arc<dyn CacheStore>>,
    fallback: Arc<BoundedFallbackStore>,
}

impl CompositeCache {
    /// Build a composite cache. `primary = None` runs fallback-only.
    pub fn new(primary: Option<Arc<dyn CacheStore>>, fallback: BoundedFallbackStore) -> Self {
        Self {
            primary,
            fallback: Arc::new(fallback),
        }
    }

    pub fn fallback(&self) -> &Arc<BoundedFallbackStore> {
        &self.fallback
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    /// Whether the primary answers a ping; `None` when running fallback-only.
    pub async fn primary_healthy(&self) -> Option<bool> {
        let primary = self.primary.as_ref()?;
        match primary.ping().await {
            Ok(()) => Some(true),
            Err(e) => {
                tracing::warn!(error = %e, "Primary cache health check failed");
                Some(false)
            }
        }
    }
}

#[async_trait]
impl CacheStore for CompositeCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        if let Some(primary) = &self.primary {
            match primary.get(key).await {
                Ok(Some(payload)) => {
                    tracing::debug!(key = %key, "Cache hit (primary)");
                    return Ok(Some(payload));
                }
                Ok(None) => {}
                Err(e) => {
                    metrics::record_primary_cache_error("get");
                    tracing::warn!(key = %key, error = %e, "Primary cache GET failed, trying fallback");
                }
            }
        }

        let found = self.fallback.lookup(key);
        if found.is_some() {
            tracing::debug!(key = %key, "Cache hit (fallback)");
        }
        Ok(found)
    }

    async fn set(&self, key: &str, payload: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        if let Some(primary) = &self.primary {
            match primary.set(key, payload.clone(), ttl).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    metrics::record_primary_cache_error("set");
                    tracing::error!(key = %key, error = %e, "Primary cache SET failed, writing to fallback");
                }
            }
        }

        self.fallback.insert(key, payload, ttl);
        Ok(())
    }
}
