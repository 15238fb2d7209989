//! CSV time-series export of particle counts and slot states.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Local;

use crate::particle::ParticleSpecies;
use crate::proteins::ProteinState;
use crate::state::{tracked_species, TransportMetrics};

/// Column name for a species, e.g. `SodiumIon` or `Star`
fn species_column(species: ParticleSpecies) -> String {
    match species {
        ParticleSpecies::Solute(solute) => format!("{:?}", solute),
        ParticleSpecies::Ligand(ligand) => format!("{:?}", ligand),
    }
}

fn state_cell(state: Option<ProteinState>) -> String {
    match state {
        None => String::new(),
        Some(ProteinState::Leakage) => "Open".to_string(),
        Some(ProteinState::VoltageGated(s)) => format!("{:?}", s),
        Some(ProteinState::LigandGated(s)) => format!("{:?}", s),
        Some(ProteinState::Cotransporter(s)) => format!("{:?}", s),
        Some(ProteinState::Pump(s)) => format!("{:?}", s),
    }
}

/// Periodic CSV writer for [`TransportMetrics`]
///
/// One row per sample: time, potential, outside/inside count per species,
/// then the state of each slot.
pub struct CountsCsvExporter {
    writer: csv::Writer<File>,
    /// Sample interval in seconds
    sample_interval_sec: f64,
    last_sample_time: f64,
    slot_count: usize,
    path: PathBuf,
}

impl CountsCsvExporter {
    /// Create an exporter writing to `exports/counts_<timestamp>.csv`
    pub fn new(sample_interval_sec: f64, slot_count: usize) -> Result<Self> {
        let dir = PathBuf::from("exports");
        std::fs::create_dir_all(&dir)?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("counts_{}.csv", timestamp));
        Self::create(path, sample_interval_sec, slot_count)
    }

    /// Create an exporter writing to `path`
    pub fn create<P: AsRef<Path>>(path: P, sample_interval_sec: f64, slot_count: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        let mut writer = csv::Writer::from_writer(file);

        let mut header = vec!["time_sec".to_string(), "membrane_potential_mv".to_string()];
        for species in tracked_species() {
            let name = species_column(species);
            header.push(format!("{}_outside", name));
            header.push(format!("{}_inside", name));
        }
        header.extend((0..slot_count).map(|i| format!("slot{}_state", i)));
        writer.write_record(&header)?;

        log::info!("CSV export started: {}", path.display());
        Ok(Self {
            writer,
            sample_interval_sec,
            // Ensure first sample is recorded
            last_sample_time: -sample_interval_sec,
            slot_count,
            path,
        })
    }

    /// Record a sample if the interval has elapsed
    pub fn maybe_record(&mut self, metrics: &TransportMetrics) -> Result<bool> {
        if metrics.simulation_time_sec - self.last_sample_time >= self.sample_interval_sec {
            self.record(metrics)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Record a sample regardless of interval
    pub fn record(&mut self, metrics: &TransportMetrics) -> Result<()> {
        let mut row = vec![
            format!("{:.4}", metrics.simulation_time_sec),
            metrics.membrane_potential_mv.to_string(),
        ];
        for species in tracked_species() {
            let (outside, inside) = metrics
                .counts(species)
                .map_or((0, 0), |c| (c.outside, c.inside));
            row.push(outside.to_string());
            row.push(inside.to_string());
        }
        for i in 0..self.slot_count {
            row.push(state_cell(metrics.slots.get(i).and_then(|s| s.state)));
        }
        self.writer.write_record(&row)?;
        self.last_sample_time = metrics.simulation_time_sec;
        Ok(())
    }

    /// Finish writing and return the output path
    pub fn finish(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        log::info!("CSV export completed: {}", self.path.display());
        Ok(self.path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportParameters;
    use crate::geometry::Side;
    use crate::model::{MembraneTransportModel, SlotId};
    use crate::particle::SoluteType;
    use crate::proteins::TransportProteinType;

    #[test]
    fn test_rows_follow_interval() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = MembraneTransportModel::new(TransportParameters::default());
        model.add_solutes(SoluteType::Glucose, Side::Outside, 3);
        model.set_slot_contents(SlotId(6), Some(TransportProteinType::SodiumPotassiumPump));

        let mut exporter = CountsCsvExporter::create(dir.path().join("counts.csv"), 0.5, 7).unwrap();
        let mut metrics = TransportMetrics::new();
        let mut written = 0;
        for _ in 0..8 {
            model.step(0.25);
            metrics.update_from_model(&model);
            if exporter.maybe_record(&metrics).unwrap() {
                written += 1;
            }
        }
        let path = exporter.finish().unwrap();
        assert_eq!(written, 4);

        let mut reader = csv::Reader::from_path(path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "time_sec");
        assert!(headers.iter().any(|h| h == "Glucose_outside"));
        let rows: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(&rows[0][headers.len() - 1], "OpenToInsideEmpty");
        assert_eq!(&rows[0][headers.len() - 2], "");
    }
}
