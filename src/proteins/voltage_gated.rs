//! Voltage-gated channels.
//!
//! The conformation is a pure function of the membrane potential:
//!
//! | potential | sodium      | potassium |
//! |-----------|-------------|-----------|
//! | -70 mV    | Closed      | Closed    |
//! | -50 mV    | Open        | Closed    |
//! | +30 mV    | Inactivated | Open      |

use serde::{Deserialize, Serialize};

use super::{record_state_change, ChannelIon, ProteinState};
use crate::model::{SlotId, TransportEvent};
use crate::particle::ParticleSpecies;

/// The three membrane potentials the model supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MembranePotential {
    Minus70,
    Minus50,
    Plus30,
}

impl MembranePotential {
    pub const ALL: [MembranePotential; 3] = [
        MembranePotential::Minus70,
        MembranePotential::Minus50,
        MembranePotential::Plus30,
    ];

    pub fn millivolts(self) -> i32 {
        match self {
            MembranePotential::Minus70 => -70,
            MembranePotential::Minus50 => -50,
            MembranePotential::Plus30 => 30,
        }
    }

    pub fn from_millivolts(millivolts: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.millivolts() == millivolts)
    }
}

impl Default for MembranePotential {
    /// Resting potential
    fn default() -> Self {
        MembranePotential::Minus70
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoltageGatedState {
    Closed,
    Open,
    Inactivated,
}

impl VoltageGatedState {
    /// Conformation of a channel for `ion` at `potential`
    pub fn for_potential(ion: ChannelIon, potential: MembranePotential) -> Self {
        match (ion, potential) {
            (_, MembranePotential::Minus70) => VoltageGatedState::Closed,
            (ChannelIon::Sodium, MembranePotential::Minus50) => VoltageGatedState::Open,
            (ChannelIon::Sodium, MembranePotential::Plus30) => VoltageGatedState::Inactivated,
            (ChannelIon::Potassium, MembranePotential::Minus50) => VoltageGatedState::Closed,
            (ChannelIon::Potassium, MembranePotential::Plus30) => VoltageGatedState::Open,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoltageGatedChannel {
    slot: SlotId,
    ion: ChannelIon,
    position: f64,
    state: VoltageGatedState,
}

impl VoltageGatedChannel {
    pub fn new(slot: SlotId, ion: ChannelIon, position: f64, potential: MembranePotential) -> Self {
        Self {
            slot,
            ion,
            position,
            state: VoltageGatedState::for_potential(ion, potential),
        }
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn ion(&self) -> ChannelIon {
        self.ion
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn state(&self) -> VoltageGatedState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == VoltageGatedState::Open
    }

    pub fn admits(&self, species: ParticleSpecies) -> bool {
        self.is_open() && self.ion.conducts(species)
    }

    /// Move to the conformation for `potential`, emitting events on change
    pub fn set_membrane_potential(&mut self, potential: MembranePotential, events: &mut Vec<TransportEvent>) {
        let next = VoltageGatedState::for_potential(self.ion, potential);
        let previous = std::mem::replace(&mut self.state, next);
        record_state_change(
            self.slot,
            ProteinState::VoltageGated(previous),
            ProteinState::VoltageGated(next),
            events,
        );
    }
}
