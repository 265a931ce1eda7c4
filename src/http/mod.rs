//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout, request metrics)
//!     → params.rs (query string → typed parameters)
//!     → handlers.rs (orchestrator call, per-request filtering)
//!     → response.rs (errors → status code + JSON body)
//! ```

pub mod handlers;
pub mod params;
pub mod response;
pub mod server;

pub use response::ApiError;
pub use server::{AppState, HttpServer};
