//! Caching subsystem.
//!
//! # Data Flow
//! ```text
//! Orchestrator
//!     → composite.rs (read-through entry point, never fails)
//!         → redis.rs (primary, networked, fallible)
//!         → fallback.rs (in-process LFU + TTL, used when the primary errors)
//! keys.rs builds the `{kind}:{variant}[:location:{loc}]` keys.
//! ```
//!
//! # Design Decisions
//! - Payloads are opaque bytes; stores never inspect domain types
//! - A miss is `Ok(None)`, not an error
//! - The fallback is a substitute store, not a write-through replica
//! - Entries written to the fallback during an outage are not migrated back

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub mod composite;
pub mod fallback;
pub mod keys;
pub mod redis;

pub use composite::CompositeCache;
pub use fallback::BoundedFallbackStore;
pub use self::redis::RedisStore;

/// Errors raised by a cache backend.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("cache backend timed out after {0:?}")]
    Timeout(Duration),
}

/// A key/value store with per-entry TTL.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up `key`; `Ok(None)` is a miss.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store `payload` under `key` for `ttl`, replacing any previous value.
    async fn set(&self, key: &str, payload: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Check the backend answers. In-process stores are always reachable.
    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
