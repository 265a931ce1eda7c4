//! Circuit breaker for upstream protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: upstream assumed down, calls fail fast
//! - Half-Open: a single trial call tests whether the upstream recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures >= max_failures
//! Open → Half-Open: cool-off elapsed (checked lazily on the next call)
//! Half-Open → Closed: trial call succeeds
//! Half-Open → Open: trial call fails (cool-off restarts)
//! ```
//!
//! # Design Decisions
//! - One breaker per upstream, shared by all callers via `Arc`
//! - Transport-agnostic: only sees `Ok`/`Err`; callers classify 5xx as `Err`
//! - Single mutex around all state; the lock is never held across an await
//! - A trial call that is dropped before finishing counts as a failure, so a
//!   cancelled request cannot leave the breaker stuck in Half-Open; dropped
//!   calls admitted while Closed are not counted
//! - Outcomes of calls admitted before the breaker tripped are ignored once
//!   it has left Closed

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::observability::metrics;

/// Breaker state, exposed for health reporting and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed = 0,
    HalfOpen = 1,
    Open = 2,
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::HalfOpen => write!(f, "half_open"),
            Self::Open => write!(f, "open"),
        }
    }
}

/// Error returned by a breaker-guarded call.
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// The breaker refused the call without invoking the operation.
    #[error("circuit breaker '{upstream}' is open")]
    Open {
        upstream: String,
        /// Cool-off duration; callers surface it as a retry-after hint.
        retry_after: Duration,
    },

    /// The operation ran and failed.
    #[error("{0}")]
    Inner(#[source] E),
}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

/// A named three-state circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    max_failures: u32,
    cool_off: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, max_failures: u32, cool_off: Duration) -> Self {
        let name = name.into();
        metrics::record_breaker_state(&name, BreakerState::Closed as u8);
        Self {
            name,
            max_failures: max_failures.max(1),
            cool_off,
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                probe_in_flight: false,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cool_off(&self) -> Duration {
        self.cool_off
    }

    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    /// Time left before an open breaker admits a trial call.
    ///
    /// `None` unless the breaker is open and still cooling off.
    pub fn remaining_cool_off(&self) -> Option<Duration> {
        let inner = self.lock();
        if inner.state != BreakerState::Open {
            return None;
        }
        let elapsed = inner.opened_at?.elapsed();
        self.cool_off.checked_sub(elapsed).filter(|d| !d.is_zero())
    }

    /// Run `op` through the breaker.
    pub async fn call<T, E, F, Fut>(&self, op: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let permit = match self.acquire() {
            Some(permit) => permit,
            None => {
                metrics::record_breaker_rejection(&self.name);
                tracing::debug!(upstream = %self.name, "Circuit open, rejecting call");
                return Err(BreakerError::Open {
                    upstream: self.name.clone(),
                    retry_after: self.cool_off,
                });
            }
        };

        let result = op().await;
        permit.complete(result.is_ok());
        result.map_err(BreakerError::Inner)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn acquire(&self) -> Option<Permit<'_>> {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::Closed => Some(Permit::new(self, false)),
            BreakerState::Open => {
                let cooled = inner
                    .opened_at
                    .map_or(true, |at| at.elapsed() >= self.cool_off);
                if !cooled {
                    return None;
                }
                self.transition(&mut inner, BreakerState::HalfOpen);
                inner.probe_in_flight = true;
                Some(Permit::new(self, true))
            }
            BreakerState::HalfOpen => {
                if inner.probe_in_flight {
                    return None;
                }
                inner.probe_in_flight = true;
                Some(Permit::new(self, true))
            }
        }
    }

    fn record(&self, probe: bool, success: bool) {
        let mut inner = self.lock();

        if probe {
            inner.probe_in_flight = false;
            if success {
                inner.consecutive_failures = 0;
                inner.opened_at = None;
                self.transition(&mut inner, BreakerState::Closed);
            } else {
                inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
                inner.opened_at = Some(Instant::now());
                self.transition(&mut inner, BreakerState::Open);
            }
            return;
        }

        // Stale result from a call admitted while still closed.
        if inner.state != BreakerState::Closed {
            return;
        }

        if success {
            inner.consecutive_failures = 0;
        } else {
            inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
            if inner.consecutive_failures >= self.max_failures {
                inner.opened_at = Some(Instant::now());
                self.transition(&mut inner, BreakerState::Open);
            }
        }
    }

    fn transition(&self, inner: &mut Inner, to: BreakerState) {
        if inner.state == to {
            return;
        }
        let from = inner.state;
        inner.state = to;
        metrics::record_breaker_state(&self.name, to as u8);

        match to {
            BreakerState::Open => tracing::warn!(
                upstream = %self.name,
                from = %from,
                failures = inner.consecutive_failures,
                cool_off = ?self.cool_off,
                "Circuit breaker opened"
            ),
            _ => tracing::info!(upstream = %self.name, from = %from, to = %to, "Circuit breaker state change"),
        }
    }
}

/// Admission ticket for one call; reports the outcome exactly once.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    probe: bool,
    completed: bool,
}

impl<'a> Permit<'a> {
    fn new(breaker: &'a CircuitBreaker, probe: bool) -> Self {
        Self {
            breaker,
            probe,
            completed: false,
        }
    }

    fn complete(mut self, success: bool) {
        self.completed = true;
        self.breaker.record(self.probe, success);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.completed && self.probe {
            self.breaker.record(true, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    async fn fail(calls: &AtomicU32) -> Result<(), &'static str> {
        calls.fetch_add(1, Ordering::SeqCst);
        Err("upstream down")
    }

    async fn succeed(calls: &AtomicU32) -> Result<(), &'static str> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_trips_after_max_failures_and_recovers() {
        let breaker = CircuitBreaker::new("vessel-source", 3, Duration::from_secs(30));
        let calls = AtomicU32::new(0);

        for i in 1..=3 {
            let err = breaker.call(|| fail(&calls)).await.unwrap_err();
            assert!(matches!(err, BreakerError::Inner("upstream down")));
            assert_eq!(calls.load(Ordering::SeqCst), i);
        }
        assert_eq!(breaker.state(), BreakerState::Open);

        let err = breaker.call(|| fail(&calls)).await.unwrap_err();
        match err {
            BreakerError::Open { upstream, retry_after } => {
                assert_eq!(upstream, "vessel-source");
                assert_eq!(retry_after, Duration::from_secs(30));
            }
            other => panic!("expected open breaker, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        tokio::time::advance(Duration::from_secs(30)).await;

        breaker.call(|| succeed(&calls)).await.unwrap();
        assert_eq!(breaker.state(), BreakerState::Closed);
        assert_eq!(breaker.consecutive_failures(), 0);

        breaker.call(|| succeed(&calls)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_trial_reopens_and_restarts_cool_off() {
        let breaker = CircuitBreaker::new("bridge-source", 1, Duration::from_secs(10));
        let calls = AtomicU32::new(0);

        let _ = breaker.call(|| fail(&calls)).await;
        assert_eq!(breaker.state(), BreakerState::Open);

        tokio::time::advance(Duration::from_secs(10)).await;
        let err = breaker.call(|| fail(&calls)).await.unwrap_err();
        assert!(matches!(err, BreakerError::Inner(_)));
        assert_eq!(breaker.state(), BreakerState::Open);

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(matches!(
            breaker.call(|| succeed(&calls)).await,
            Err(BreakerError::Open { .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_cool_off() {
        let breaker = CircuitBreaker::new("bridge-source", 1, Duration::from_secs(10));
        let calls = AtomicU32::new(0);
        assert_eq!(breaker.remaining_cool_off(), None);

        let _ = breaker.call(|| fail(&calls)).await;
        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(breaker.remaining_cool_off(), Some(Duration::from_secs(6)));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(breaker.remaining_cool_off(), None);
    }

    #[tokio::test]
    async fn test_success_resets_consecutive_failures() {
        let breaker = CircuitBreaker::new("vessel-source", 3, Duration::from_secs(30));
        let calls = AtomicU32::new(0);

        let _ = breaker.call(|| fail(&calls)).await;
        let _ = breaker.call(|| fail(&calls)).await;
        breaker.call(|| succeed(&calls)).await.unwrap();
        let _ = breaker.call(|| fail(&calls)).await;
        let _ = breaker.call(|| fail(&calls)).await;

        assert_eq!(breaker.state(), BreakerState::Closed);
        assert_eq!(breaker.consecutive_failures(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_admits_a_single_trial() {
        let breaker = Arc::new(CircuitBreaker::new("bridge-source", 1, Duration::from_secs(5)));
        let calls = AtomicU32::new(0);
        let _ = breaker.call(|| fail(&calls)).await;
        tokio::time::advance(Duration::from_secs(5)).await;

        let (release, hold) = tokio::sync::oneshot::channel::<()>();
        let probe = {
            let breaker = breaker.clone();
            tokio::spawn(async move {
                breaker
                    .call(|| async move {
                        let _ = hold.await;
                        Ok::<_, &'static str>(())
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;
        assert_eq!(breaker.state(), BreakerState::HalfOpen);

        let rejected = breaker.call(|| succeed(&calls)).await;
        assert!(matches!(rejected, Err(BreakerError::Open { .. })));

        release.send(()).unwrap();
        probe.await.unwrap().unwrap();
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_trial_counts_as_failure() {
        let breaker = CircuitBreaker::new("bridge-source", 1, Duration::from_secs(5));
        let calls = AtomicU32::new(0);
        let _ = breaker.call(|| fail(&calls)).await;
        tokio::time::advance(Duration::from_secs(5)).await;

        let pending = breaker.call(|| std::future::pending::<Result<(), &'static str>>());
        let timed_out = tokio::time::timeout(Duration::from_millis(10), pending).await;
        assert!(timed_out.is_err());

        assert_eq!(breaker.state(), BreakerState::Open);
    }
}
