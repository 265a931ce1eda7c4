//! Result-set filtering.
//!
//! # Responsibilities
//! - `frequency`: suppress vessels that dominate a batch (`unique` requests)
//! - `query`: narrow a batch by name, location and time window
//!
//! Both run after the cache; cached batches are always unfiltered.

pub mod frequency;
pub mod query;

pub use frequency::{apply, FilterPolicy};
pub use query::EventQuery;
