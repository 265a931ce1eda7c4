//! River traffic tracker.
//!
//! Serves Tower Bridge lift times and Port of London vessel movements
//! from two unreliable upstreams, behind a Redis cache with an in-process
//! fallback, per-upstream circuit breakers and bounded retries.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ http (axum) ──▶ service::FetchOrchestrator
//!                                   │
//!                 ┌─────────────────┼──────────────────────┐
//!                 ▼                 ▼                      ▼
//!         cache::CompositeCache  resilience::GuardedFetch  filter
//!           │          │            │ breaker → retry
//!           ▼          ▼            ▼
//!         Redis    fallback LFU   sources (bridge HTML, vessel JSON)
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use river_tracker::config::{load_config, ObservabilityConfig};
use river_tracker::http::HttpServer;
use river_tracker::lifecycle::{build_components, signals, Shutdown};
use river_tracker::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "river-tracker")]
#[command(about = "River traffic tracker API server", long_about = None)]
struct Args {
    /// Path to a TOML config file; defaults and environment apply without one.
    #[arg(short, long, env = "TRACKER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };
    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "river-tracker starting");
    tracing::info!(
        bind_address = %config.server.bind_address,
        redis_address = %config.cache.redis_address,
        fallback_size = config.cache.fallback_size,
        max_failures = config.circuit_breaker.max_failures,
        cool_off_secs = config.circuit_breaker.cool_off_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let components = build_components(&config)?;

    let shutdown = Arc::new(Shutdown::new());
    let sweeper = components.fallback.spawn_sweeper(shutdown.subscribe());
    signals::spawn_signal_listener(shutdown.clone());

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(&config.server, components.orchestrator);
    server.run(listener, shutdown.subscribe()).await?;

    // The server may also stop on its own; make sure background tasks follow.
    shutdown.trigger();
    if let Some(sweeper) = sweeper {
        let _ = sweeper.await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
