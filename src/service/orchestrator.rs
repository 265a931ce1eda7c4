//! Cache-first fetching of bridge and vessel events.

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::locations::{self, LocationStats};
use super::FetchError;
use crate::cache::{keys, CacheStore, CompositeCache};
use crate::config::TrackerConfig;
use crate::filter::{self, FilterPolicy};
use crate::models::{Category, Event, VesselKind};
use crate::observability::metrics;
use crate::resilience::{CircuitBreaker, GuardedFetch};
use crate::sources::{BridgeSource, UpstreamError, VesselSource};

pub const BRIDGE_SOURCE: &str = "bridge-source";
pub const VESSEL_SOURCE: &str = "vessel-source";

/// Resolves event requests through the cache and the guarded upstreams.
///
/// Built once at startup and shared by all request handlers.
pub struct FetchOrchestrator {
    cache: Arc<CompositeCache>,
    bridge: Arc<dyn BridgeSource>,
    vessels: Arc<dyn VesselSource>,
    bridge_fetch: GuardedFetch,
    vessel_fetch: GuardedFetch,
    bridge_ttl: Duration,
    vessels_ttl: Duration,
    bridge_policy: FilterPolicy,
    vessel_policy: FilterPolicy,
}

impl FetchOrchestrator {
    pub fn new(
        config: &TrackerConfig,
        cache: Arc<CompositeCache>,
        bridge: Arc<dyn BridgeSource>,
        vessels: Arc<dyn VesselSource>,
    ) -> Self {
        let breaker = |name: &str| {
            Arc::new(CircuitBreaker::new(
                name,
                config.circuit_breaker.max_failures,
                config.circuit_breaker.cool_off(),
            ))
        };

        Self {
            cache,
            bridge,
            vessels,
            bridge_fetch: GuardedFetch::new(breaker(BRIDGE_SOURCE), config.retry.clone()),
            vessel_fetch: GuardedFetch::new(breaker(VESSEL_SOURCE), config.retry.clone()),
            bridge_ttl: config.cache.bridge_ttl(),
            vessels_ttl: config.cache.vessels_ttl(),
            bridge_policy: FilterPolicy::HybridPercentile {
                percentile: config.filter.percentile,
                max_count: config.filter.max_count,
            },
            vessel_policy: FilterPolicy::HardThreshold {
                threshold: config.filter.threshold,
            },
        }
    }

    pub fn cache(&self) -> &Arc<CompositeCache> {
        &self.cache
    }

    /// All bridge lifts; `unique` drops the most frequent vessels.
    pub async fn bridge_lifts(&self, unique: bool) -> Result<Vec<Event>, FetchError> {
        let source = self.bridge.as_ref();
        let events = self
            .read_through(&keys::bridge_lifts(), self.bridge_ttl, &self.bridge_fetch, move || {
                source.bridge_lifts()
            })
            .await?;

        Ok(self.maybe_unique(events, unique, self.bridge_policy, Category::Bridge.as_str()))
    }

    /// Vessel events of `kind`; `unique` drops vessels above the threshold.
    pub async fn vessels(&self, kind: VesselKind, unique: bool) -> Result<Vec<Event>, FetchError> {
        let events = self.raw_vessels(kind).await?;
        Ok(self.maybe_unique(events, unique, self.vessel_policy, kind.as_str()))
    }

    /// Vessel events of `kind` at `location` (matched case-insensitively
    /// against location, origin and destination).
    ///
    /// An empty location or `kind = all` is the plain [`vessels`](Self::vessels) lookup.
    pub async fn vessels_at(
        &self,
        kind: VesselKind,
        location: &str,
        unique: bool,
    ) -> Result<Vec<Event>, FetchError> {
        let location = location.trim();
        if location.is_empty() || kind == VesselKind::All {
            return self.vessels(kind, unique).await;
        }

        let key = keys::vessels_at(kind, location);
        let events = match self.cached(&key).await {
            Some(events) => events,
            None => {
                let subset: Vec<Event> = self
                    .raw_vessels(kind)
                    .await?
                    .into_iter()
                    .filter(|e| at_location(e, location))
                    .collect();
                tracing::info!(kind = %kind, location = %location, count = subset.len(), "Filtered vessels by location");
                self.populate(&key, &subset, self.vessels_ttl).await;
                subset
            }
        };

        Ok(self.maybe_unique(events, unique, self.vessel_policy, kind.as_str()))
    }

    /// Per-location counts over every vessel list.
    pub async fn locations(&self) -> Result<Vec<LocationStats>, FetchError> {
        let events = self.raw_vessels(VesselKind::All).await?;
        Ok(locations::aggregate(&events))
    }

    /// Breaker state of each upstream and reachability of the primary cache.
    pub async fn health_check(&self) -> HealthReport {
        let upstreams: Vec<UpstreamHealth> = [&self.bridge_fetch, &self.vessel_fetch]
            .into_iter()
            .map(|guarded| {
                let breaker = guarded.breaker();
                UpstreamHealth {
                    name: breaker.name().to_string(),
                    state: breaker.state().to_string(),
                    consecutive_failures: breaker.consecutive_failures(),
                    retry_after_secs: breaker.remaining_cool_off().map(|d| d.as_secs().max(1)),
                }
            })
            .collect();

        let primary_cache = match self.cache.primary_healthy().await {
            Some(true) => "ok",
            Some(false) => "unavailable",
            None => "disabled",
        };
        let healthy = upstreams.iter().all(|u| u.retry_after_secs.is_none());

        HealthReport {
            status: if healthy { "ok" } else { "degraded" },
            upstreams,
            primary_cache,
        }
    }

    async fn raw_vessels(&self, kind: VesselKind) -> Result<Vec<Event>, FetchError> {
        let source = self.vessels.as_ref();
        self.read_through(&keys::vessels(kind), self.vessels_ttl, &self.vessel_fetch, move || {
            source.vessels(kind)
        })
        .await
    }

    /// Serve `key` from the cache, or fetch through `guarded` and populate it.
    async fn read_through<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        guarded: &GuardedFetch,
        fetch: F,
    ) -> Result<Vec<Event>, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Vec<Event>, UpstreamError>>,
    {
        if let Some(events) = self.cached(key).await {
            return Ok(events);
        }

        let events = guarded
            .fetch(fetch)
            .await
            .map_err(|e| FetchError::from_breaker(guarded.breaker().name(), e))?;

        self.populate(key, &events, ttl).await;
        Ok(events)
    }

    async fn cached(&self, key: &str) -> Option<Vec<Event>> {
        let payload = match self.cache.get(key).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                metrics::record_cache_miss();
                return None;
            }
            Err(e) => {
                metrics::record_cache_miss();
                tracing::warn!(key = %key, error = %e, "Cache lookup failed");
                return None;
            }
        };

        match serde_json::from_slice(&payload) {
            Ok(events) => {
                metrics::record_cache_hit();
                Some(events)
            }
            Err(e) => {
                metrics::record_cache_miss();
                tracing::warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    async fn populate(&self, key: &str, events: &[Event], ttl: Duration) {
        let payload = match serde_json::to_vec(events) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Failed to encode events for caching");
                return;
            }
        };
        if let Err(e) = self.cache.set(key, payload, ttl).await {
            tracing::error!(key = %key, error = %e, "Failed to cache events");
        }
    }

    fn maybe_unique(
        &self,
        events: Vec<Event>,
        unique: bool,
        policy: FilterPolicy,
        label: &str,
    ) -> Vec<Event> {
        if !unique {
            return events;
        }
        let kept = filter::apply(&events, policy);
        metrics::record_filtered_events(label, events.len() - kept.len());
        kept
    }
}

fn at_location(event: &Event, location: &str) -> bool {
    [&event.location, &event.from, &event.to]
        .into_iter()
        .flatten()
        .any(|place| place.eq_ignore_ascii_case(location))
}

/// Snapshot of one upstream's breaker.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamHealth {
    pub name: String,
    pub state: String,
    pub consecutive_failures: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub upstreams: Vec<UpstreamHealth>,
    pub primary_cache: &'static str,
}

impl HealthReport {
    /// Healthy while no upstream breaker is refusing calls.
    pub fn is_healthy(&self) -> bool {
        self.status == "ok"
    }
}
