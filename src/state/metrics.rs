//! Aggregate transport metrics for display and export.
//!
//! Collects per-species particle counts on each side of the membrane, the
//! state of every slot, and running crossing tallies fed from drained events.

use serde::{Deserialize, Serialize};

use crate::geometry::{CrossingDirection, Side};
use crate::model::{MembraneTransportModel, TransportEvent};
use crate::particle::{LigandType, ParticleSpecies, SoluteType};
use crate::proteins::{ProteinState, TransportProteinType};

/// Particles of one species on each side of the membrane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesCounts {
    pub species: ParticleSpecies,
    pub outside: usize,
    pub inside: usize,
    /// Crossings into the cell since the metrics were created
    pub crossed_inward: u64,
    /// Crossings out of the cell since the metrics were created
    pub crossed_outward: u64,
}

/// What a slot holds and in which state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotStatus {
    pub protein: Option<TransportProteinType>,
    pub state: Option<ProteinState>,
}

/// Every tracked species in a stable column order
pub fn tracked_species() -> impl Iterator<Item = ParticleSpecies> {
    SoluteType::ALL
        .into_iter()
        .map(ParticleSpecies::Solute)
        .chain(LigandType::ALL.into_iter().map(ParticleSpecies::Ligand))
}

/// Unified metrics struct for display and export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportMetrics {
    /// Current simulation time in seconds
    pub simulation_time_sec: f64,
    /// Number of `update_from_model` calls
    pub total_samples: u64,
    pub membrane_potential_mv: i32,
    pub species: Vec<SpeciesCounts>,
    pub slots: Vec<SlotStatus>,
    pub channel_openings: u64,
    pub channel_closings: u64,
    pub atp_hydrolyzed: u64,
}

impl Default for TransportMetrics {
    fn default() -> Self {
        Self {
            simulation_time_sec: 0.0,
            total_samples: 0,
            membrane_potential_mv: -70,
            species: tracked_species()
                .map(|species| SpeciesCounts {
                    species,
                    outside: 0,
                    inside: 0,
                    crossed_inward: 0,
                    crossed_outward: 0,
                })
                .collect(),
            slots: Vec::new(),
            channel_openings: 0,
            channel_closings: 0,
            atp_hydrolyzed: 0,
        }
    }
}

impl TransportMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh counts and slot states from the model
    pub fn update_from_model(&mut self, model: &MembraneTransportModel) {
        self.simulation_time_sec = model.time();
        self.membrane_potential_mv = model.membrane_potential().millivolts();
        self.total_samples += 1;
        for counts in self.species.iter_mut() {
            counts.outside = model.count_particles(counts.species, Side::Outside);
            counts.inside = model.count_particles(counts.species, Side::Inside);
        }
        self.slots = model
            .slots()
            .iter()
            .map(|slot| SlotStatus {
                protein: slot.protein().map(|p| p.kind()),
                state: slot.protein().map(|p| p.state()),
            })
            .collect();
    }

    /// Accumulate tallies from drained events
    pub fn record_events(&mut self, events: &[TransportEvent]) {
        for event in events {
            match *event {
                TransportEvent::ParticleCrossedMembrane {
                    species, direction, ..
                } => {
                    if let Some(counts) = self.species.iter_mut().find(|c| c.species == species) {
                        match direction {
                            CrossingDirection::Inward => counts.crossed_inward += 1,
                            CrossingDirection::Outward => counts.crossed_outward += 1,
                        }
                    }
                }
                TransportEvent::ChannelOpened { .. } => self.channel_openings += 1,
                TransportEvent::ChannelClosed { .. } => self.channel_closings += 1,
                TransportEvent::AtpHydrolyzed { .. } => self.atp_hydrolyzed += 1,
                _ => {}
            }
        }
    }

    pub fn counts(&self, species: ParticleSpecies) -> Option<&SpeciesCounts> {
        self.species.iter().find(|c| c.species == species)
    }
}
