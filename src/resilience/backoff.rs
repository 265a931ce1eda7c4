//! Bounded retry with pure exponential backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Delay slept after the given failed attempt (1-based): `initial * 2^(attempt-1)`.
pub fn calculate_backoff(attempt: u32, initial: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }
    let factor = 2u32.saturating_pow(attempt - 1);
    initial.saturating_mul(factor)
}

/// Call `operation` up to `max_attempts` times, doubling the delay between
/// attempts starting at `initial_delay`.
///
/// Returns the first success, or the error of the final attempt. No sleep
/// follows the final attempt. `max_attempts == 0` still makes one call.
/// The operation must be idempotent.
pub async fn retry<T, E, F, Fut>(
    max_attempts: u32,
    initial_delay: Duration,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= max_attempts => {
                tracing::debug!(attempt, error = %e, "Retry attempts exhausted");
                return Err(e);
            }
            Err(e) => {
                let delay = calculate_backoff(attempt, initial_delay);
                tracing::warn!(attempt, delay = ?delay, error = %e, "Attempt failed, backing off");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
