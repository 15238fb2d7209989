//! Particles: solutes and ligands moving around the membrane.
//!
//! A particle has an immutable species and id, a position, a footprint
//! derived from its species, and a [`ParticleMode`] that decides how it moves
//! each tick and what it becomes next.

mod mode;
mod random_walk;

pub use mode::{ModeContext, ParticleMode};
pub use random_walk::{sample_straight_travel_time, RandomWalk};

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds2, Side};

/// Stable particle identity, unique within one model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleId(pub u64);

/// Hands out increasing particle ids
#[derive(Debug, Clone, Default)]
pub struct ParticleIdAllocator {
    next: u64,
}

impl ParticleIdAllocator {
    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }

    pub fn allocate(&mut self) -> ParticleId {
        let id = ParticleId(self.next);
        self.next += 1;
        id
    }

    /// Id the next call to `allocate` will return
    pub fn peek(&self) -> u64 {
        self.next
    }
}

/// Solute species that can be added to either compartment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SoluteType {
    Oxygen,
    CarbonDioxide,
    SodiumIon,
    PotassiumIon,
    Glucose,
    Atp,
    Adp,
    Phosphate,
}

impl SoluteType {
    pub const ALL: [SoluteType; 8] = [
        SoluteType::Oxygen,
        SoluteType::CarbonDioxide,
        SoluteType::SodiumIon,
        SoluteType::PotassiumIon,
        SoluteType::Glucose,
        SoluteType::Atp,
        SoluteType::Adp,
        SoluteType::Phosphate,
    ];

    /// Small nonpolar molecules cross the bilayer without a protein
    pub fn diffuses_passively(self) -> bool {
        matches!(self, SoluteType::Oxygen | SoluteType::CarbonDioxide)
    }

    /// Footprint (width, height) in model units
    pub fn footprint(self) -> DVec2 {
        match self {
            SoluteType::Oxygen => DVec2::new(4.0, 3.0),
            SoluteType::CarbonDioxide => DVec2::new(5.5, 3.0),
            SoluteType::SodiumIon => DVec2::new(3.0, 3.0),
            SoluteType::PotassiumIon => DVec2::new(3.6, 3.6),
            SoluteType::Glucose => DVec2::new(6.0, 4.0),
            SoluteType::Atp => DVec2::new(9.0, 3.0),
            SoluteType::Adp => DVec2::new(7.0, 3.0),
            SoluteType::Phosphate => DVec2::new(3.0, 3.0),
        }
    }
}

/// Ligands that open ligand-gated channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LigandType {
    /// Opens the sodium ligand-gated channel
    Star,
    /// Opens the potassium ligand-gated channel
    Triangle,
}

impl LigandType {
    pub const ALL: [LigandType; 2] = [LigandType::Star, LigandType::Triangle];

    pub fn footprint(self) -> DVec2 {
        DVec2::new(5.0, 5.0)
    }
}

/// Species tag of a particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ParticleSpecies {
    Solute(SoluteType),
    Ligand(LigandType),
}

impl ParticleSpecies {
    pub fn footprint(self) -> DVec2 {
        match self {
            ParticleSpecies::Solute(solute) => solute.footprint(),
            ParticleSpecies::Ligand(ligand) => ligand.footprint(),
        }
    }

    pub fn diffuses_passively(self) -> bool {
        matches!(self, ParticleSpecies::Solute(s) if s.diffuses_passively())
    }

    pub fn solute(self) -> Option<SoluteType> {
        match self {
            ParticleSpecies::Solute(solute) => Some(solute),
            ParticleSpecies::Ligand(_) => None,
        }
    }

    pub fn ligand(self) -> Option<LigandType> {
        match self {
            ParticleSpecies::Ligand(ligand) => Some(ligand),
            ParticleSpecies::Solute(_) => None,
        }
    }
}

/// A single solute or ligand particle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    id: ParticleId,
    species: ParticleSpecies,
    pub(crate) position: DVec2,
    pub(crate) mode: ParticleMode,
}

impl Particle {
    pub fn new(id: ParticleId, species: ParticleSpecies, position: DVec2, mode: ParticleMode) -> Self {
        Self {
            id,
            species,
            position,
            mode,
        }
    }

    pub fn id(&self) -> ParticleId {
        self.id
    }

    pub fn species(&self) -> ParticleSpecies {
        self.species
    }

    pub fn position(&self) -> DVec2 {
        self.position
    }

    pub fn mode(&self) -> &ParticleMode {
        &self.mode
    }

    pub fn footprint(&self) -> DVec2 {
        self.species.footprint()
    }

    /// Footprint rectangle at the current position
    pub fn bounds(&self) -> Bounds2 {
        Bounds2::from_center(self.position, self.footprint())
    }

    /// Side of the membrane the particle's center is on
    pub fn side(&self) -> Side {
        Side::of_y(self.position.y)
    }

    pub fn is_solute(&self, solute: SoluteType) -> bool {
        self.species == ParticleSpecies::Solute(solute)
    }
}
