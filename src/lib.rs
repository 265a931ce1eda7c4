//! River traffic tracker library.

pub mod cache;
pub mod config;
pub mod filter;
pub mod http;
pub mod lifecycle;
pub mod models;
pub mod observability;
pub mod resilience;
pub mod service;
pub mod sources;

pub use config::TrackerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use service::FetchOrchestrator;
