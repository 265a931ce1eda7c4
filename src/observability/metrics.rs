//! Metrics collection and exposition.
//!
//! # Metrics
//! - `tracker_upstream_fetches_total` (counter): guarded fetches by upstream, outcome
//! - `tracker_upstream_fetch_duration_seconds` (histogram): fetch latency by upstream
//! - `tracker_cache_hits_total` / `tracker_cache_misses_total` (counters)
//! - `tracker_primary_cache_errors_total` (counter): primary store failures by op
//! - `tracker_fallback_entries` (gauge): entries held by the fallback store
//! - `tracker_fallback_evictions_total` (counter): LFU evictions
//! - `tracker_breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//! - `tracker_breaker_rejections_total` (counter): calls refused by an open breaker
//! - `tracker_filtered_events_total` (counter): events dropped by the unique filter
//! - `tracker_requests_total` (counter): HTTP requests by route, status

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_upstream_fetch(upstream: &str, success: bool, start: Instant) {
    let outcome = if success { "success" } else { "failure" };
    counter!("tracker_upstream_fetches_total", "upstream" => upstream.to_string(), "outcome" => outcome)
        .increment(1);
    histogram!("tracker_upstream_fetch_duration_seconds", "upstream" => upstream.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_cache_hit() {
    counter!("tracker_cache_hits_total").increment(1);
}

pub fn record_cache_miss() {
    counter!("tracker_cache_misses_total").increment(1);
}

pub fn record_primary_cache_error(op: &'static str) {
    counter!("tracker_primary_cache_errors_total", "op" => op).increment(1);
}

pub fn record_fallback_size(entries: usize) {
    gauge!("tracker_fallback_entries").set(entries as f64);
}

pub fn record_fallback_eviction() {
    counter!("tracker_fallback_evictions_total").increment(1);
}

pub fn record_breaker_state(upstream: &str, state: u8) {
    gauge!("tracker_breaker_state", "upstream" => upstream.to_string()).set(state as f64);
}

pub fn record_breaker_rejection(upstream: &str) {
    counter!("tracker_breaker_rejections_total", "upstream" => upstream.to_string()).increment(1);
}

pub fn record_filtered_events(category: &str, dropped: usize) {
    if dropped > 0 {
        counter!("tracker_filtered_events_total", "category" => category.to_string())
            .increment(dropped as u64);
    }
}

pub fn record_request(route: &str, status: u16) {
    counter!("tracker_requests_total", "route" => route.to_string(), "status" => status.to_string())
        .increment(1);
}
