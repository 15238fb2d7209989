//! Membrane Transport - particle and transport-protein state machines
//!
//! Solute and ligand particles random-walk on either side of a cell
//! membrane, diffuse passively, or are escorted through channels, a
//! sodium-glucose cotransporter and a sodium-potassium pump.

pub mod config;
pub mod export;
pub mod geometry;
pub mod model;
pub mod particle;
pub mod proteins;
pub mod state;

pub use config::TransportParameters;
pub use geometry::{CrossingDirection, MembraneLayout, Side};
pub use model::{MembraneTransportModel, SlotId, Snapshot, TransportEvent};
pub use particle::{LigandType, Particle, ParticleId, ParticleMode, ParticleSpecies, SoluteType};
pub use proteins::{MembranePotential, ProteinState, TransportProtein, TransportProteinType};
pub use state::TransportMetrics;
