//! Export functionality for simulation data.
//!
//! Provides CSV time-series export and JSON snapshot export.

mod csv_export;
mod json_export;

pub use csv_export::CountsCsvExporter;
pub use json_export::{export_snapshot_json, export_snapshot_json_to, load_snapshot_json, StateExport};
