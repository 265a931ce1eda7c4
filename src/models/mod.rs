//! Domain model.
//!
//! Events are opaque to the cache (stored as serialized bytes) and only
//! inspected by the frequency filter and the query filters.

pub mod event;

pub use event::{Category, Event, InvalidVariant, VesselKind};
