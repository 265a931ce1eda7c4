//! Upstream event sources.
//!
//! # Responsibilities
//! - Fetch and decode the two upstream feeds into [`Event`]s
//! - Classify server-side faults as errors so the breaker sees them
//!
//! # Design Decisions
//! - Sources know nothing about retries, breakers or caching
//! - One shared `reqwest::Client` per process (connection pooling)
//! - Trait seams so the orchestrator can be driven by fakes in tests

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Event, VesselKind};

pub mod bridge;
pub mod client;
pub mod vessels;

pub use bridge::TowerBridgeSource;
pub use client::build_client;
pub use vessels::PortOfLondonSource;

/// Errors raised while fetching or decoding an upstream feed.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream url is not configured")]
    NotConfigured,

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("malformed upstream response: {0}")]
    Decode(String),
}

/// Source of bridge lift events.
#[async_trait]
pub trait BridgeSource: Send + Sync {
    async fn bridge_lifts(&self) -> Result<Vec<Event>, UpstreamError>;
}

/// Source of vessel movement events.
#[async_trait]
pub trait VesselSource: Send + Sync {
    async fn vessels(&self, kind: VesselKind) -> Result<Vec<Event>, UpstreamError>;
}
