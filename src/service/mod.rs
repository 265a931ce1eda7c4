//! Read-through event service.
//!
//! # Data Flow
//! ```text
//! HTTP handler
//!     → orchestrator.rs (cache lookup by key)
//!         → hit: decode cached batch
//!         → miss: GuardedFetch (breaker → retry → source) → cache populate
//!     → filter::frequency (only for `unique` requests)
//!     → locations.rs (aggregation over the vessel batch)
//! ```
//!
//! # Design Decisions
//! - Cached batches are always unfiltered; filtering happens per request
//! - Failures are never cached
//! - Concurrent misses on the same key each fetch; the last write wins

use std::time::Duration;
use thiserror::Error;

use crate::models::InvalidVariant;
use crate::resilience::BreakerError;
use crate::sources::UpstreamError;

pub mod locations;
pub mod orchestrator;

pub use locations::LocationStats;
pub use orchestrator::{FetchOrchestrator, HealthReport, UpstreamHealth};

/// Errors surfaced by the orchestrator.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The upstream's breaker is open; the call was not attempted.
    #[error("{upstream} is temporarily unavailable, retry after {}s", .retry_after.as_secs())]
    BreakerOpen {
        upstream: String,
        retry_after: Duration,
    },

    /// The upstream failed after all retries.
    #[error("{upstream} fetch failed: {source}")]
    Upstream {
        upstream: String,
        #[source]
        source: UpstreamError,
    },

    #[error(transparent)]
    InvalidVariant(#[from] InvalidVariant),
}

impl FetchError {
    fn from_breaker(upstream: &str, err: BreakerError<UpstreamError>) -> Self {
        match err {
            BreakerError::Open {
                upstream,
                retry_after,
            } => FetchError::BreakerOpen {
                upstream,
                retry_after,
            },
            BreakerError::Inner(source) => FetchError::Upstream {
                upstream: upstream.to_string(),
                source,
            },
        }
    }
}
