//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the tracker.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the tracker.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TrackerConfig {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// Upstream source URLs and client timeouts.
    pub upstreams: UpstreamConfig,

    /// Primary and fallback cache settings.
    pub cache: CacheConfig,

    /// Circuit breaker settings (shared by every upstream).
    pub circuit_breaker: CircuitBreakerConfig,

    /// Retry configuration.
    pub retry: RetryConfig,

    /// "Unique" filter tuning.
    pub filter: FilterConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// Upstream source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Port of London vessel API (JSON).
    pub vessels_url: String,

    /// Tower Bridge lift-times page (HTML).
    pub bridge_url: String,

    /// Per-request timeout for upstream calls in seconds.
    pub request_timeout_secs: u64,

    /// Maximum number of bridge pages followed through the pager.
    pub max_bridge_pages: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            vessels_url: String::new(),
            bridge_url: String::new(),
            request_timeout_secs: 15,
            max_bridge_pages: 10,
        }
    }
}

impl UpstreamConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Redis address (`host:port` or `redis://...`). Empty runs fallback-only.
    pub redis_address: String,

    /// Timeout for a single Redis operation in milliseconds.
    pub redis_timeout_ms: u64,

    /// Maximum number of entries in the in-process fallback store.
    pub fallback_size: usize,

    /// Fallback TTL in seconds; the expiry sweep runs every ttl/2.
    pub fallback_ttl_secs: u64,

    /// TTL for cached bridge lifts in seconds.
    pub bridge_ttl_secs: u64,

    /// TTL for cached vessel lists in seconds.
    pub vessels_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_address: "localhost:6379".to_string(),
            redis_timeout_ms: 500,
            fallback_size: 100,
            fallback_ttl_secs: 3600,
            bridge_ttl_secs: 15 * 60,
            vessels_ttl_secs: 30 * 60,
        }
    }
}

impl CacheConfig {
    pub fn redis_timeout(&self) -> Duration {
        Duration::from_millis(self.redis_timeout_ms)
    }

    pub fn fallback_ttl(&self) -> Duration {
        Duration::from_secs(self.fallback_ttl_secs)
    }

    pub fn bridge_ttl(&self) -> Duration {
        Duration::from_secs(self.bridge_ttl_secs)
    }

    pub fn vessels_ttl(&self) -> Duration {
        Duration::from_secs(self.vessels_ttl_secs)
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the breaker opens.
    pub max_failures: u32,

    /// Seconds the breaker stays open before allowing a trial call.
    pub cool_off_secs: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            cool_off_secs: 60,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn cool_off(&self) -> Duration {
        Duration::from_secs(self.cool_off_secs)
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts per guarded fetch.
    pub max_attempts: u32,

    /// Delay before the second attempt in milliseconds; doubles afterwards.
    pub initial_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 500,
        }
    }
}

impl RetryConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

/// "Unique" filter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Hard threshold: entities seen more often than this are dropped.
    pub threshold: usize,

    /// Hybrid policy: fraction of the most frequent entities to suppress.
    pub percentile: f64,

    /// Hybrid policy: absolute occurrence cap.
    pub max_count: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            threshold: 4,
            percentile: 0.10,
            max_count: 8,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
