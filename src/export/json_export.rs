//! JSON export of model snapshots.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::model::{MembraneTransportModel, Snapshot};
use crate::state::TransportMetrics;

const EXPORT_VERSION: &str = "1.0.0";

/// Full state export structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateExport {
    /// Export timestamp (RFC 3339)
    pub exported_at: String,
    /// Export version for compatibility
    pub version: String,
    /// Counts and slot states at export time
    pub metrics: TransportMetrics,
    /// Everything needed to restore the model
    pub snapshot: Snapshot,
}

impl StateExport {
    fn capture(model: &MembraneTransportModel) -> Self {
        let mut metrics = TransportMetrics::new();
        metrics.update_from_model(model);
        Self {
            exported_at: Local::now().to_rfc3339(),
            version: EXPORT_VERSION.to_string(),
            metrics,
            snapshot: model.snapshot(),
        }
    }
}

/// Export the model to `exports/state_YYYYMMDD_HHMMSS.json`
///
/// Returns the path to the saved JSON file.
pub fn export_snapshot_json(model: &MembraneTransportModel) -> Result<PathBuf> {
    let dir = PathBuf::from("exports");
    std::fs::create_dir_all(&dir)?;

    let filename = format!("state_{}.json", Local::now().format("%Y%m%d_%H%M%S"));
    let path = dir.join(filename);
    export_snapshot_json_to(model, &path)?;
    Ok(path)
}

/// Export the model to a specific file
pub fn export_snapshot_json_to(model: &MembraneTransportModel, path: &Path) -> Result<()> {
    let export = StateExport::capture(model);
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, &export)?;

    log::info!("JSON state exported: {}", path.display());
    Ok(())
}

/// Read back a file written by [`export_snapshot_json_to`]
pub fn load_snapshot_json(path: &Path) -> Result<StateExport> {
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let export: StateExport = serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;
    if export.version != EXPORT_VERSION {
        log::warn!(
            "{} has export version {}, expected {}",
            path.display(),
            export.version,
            EXPORT_VERSION
        );
    }
    Ok(export)
}
