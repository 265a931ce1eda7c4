//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Guarded fetch (guarded.rs):
//!     → circuit_breaker.rs (fail fast if the upstream is judged unhealthy)
//!     → backoff.rs (retry the idempotent GET with exponential delay)
//!     → upstream call (timeout enforced by the HTTP client)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - Retries only wrap idempotent GETs
//! - Retry sits inside the breaker: one exhausted retry sequence is one failure
//! - Breaker-open is a distinct error so callers can answer "try again later"

pub mod backoff;
pub mod circuit_breaker;
pub mod guarded;

pub use backoff::retry;
pub use circuit_breaker::{BreakerError, BreakerState, CircuitBreaker};
pub use guarded::GuardedFetch;
