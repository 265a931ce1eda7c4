//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → stores → breakers + sources → orchestrator
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     Broadcast → HTTP server drains, fallback sweeper exits
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - An unreachable Redis is not a startup error; the fallback covers it
//! - Listeners start last (traffic only when ready)

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build_components, Components, StartupError};
