//! Derived state for display and export.
//!
//! Aggregates what the model knows into flat, serializable metrics.

mod metrics;

pub use metrics::{tracked_species, SlotStatus, SpeciesCounts, TransportMetrics};
