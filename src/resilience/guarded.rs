//! Breaker-gated, retrying fetch for one upstream.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::resilience::backoff::retry;
use crate::resilience::circuit_breaker::{BreakerError, CircuitBreaker};

/// Combines an upstream's shared breaker with the retry policy.
///
/// The breaker sees one outcome per guarded fetch: a retry sequence that
/// exhausts its attempts counts as a single failure.
#[derive(Debug, Clone)]
pub struct GuardedFetch {
    breaker: Arc<CircuitBreaker>,
    retry: RetryConfig,
}

impl GuardedFetch {
    pub fn new(breaker: Arc<CircuitBreaker>, retry: RetryConfig) -> Self {
        Self { breaker, retry }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Run `op` with retries inside the breaker.
    pub async fn fetch<T, E, F, Fut>(&self, op: F) -> Result<T, BreakerError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let start = Instant::now();
        let result = self
            .breaker
            .call(|| retry(self.retry.max_attempts, self.retry.initial_delay(), op))
            .await;

        match &result {
            Ok(_) => metrics::record_upstream_fetch(self.breaker.name(), true, start),
            Err(BreakerError::Inner(e)) => {
                metrics::record_upstream_fetch(self.breaker.name(), false, start);
                tracing::error!(
                    upstream = %self.breaker.name(),
                    attempts = self.retry.max_attempts,
                    error = %e,
                    "Upstream fetch failed after retries"
                );
            }
            Err(BreakerError::Open { .. }) => {}
        }

        result
    }
}
