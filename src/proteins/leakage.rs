//! Leakage channels: always open to their ion.

use serde::{Deserialize, Serialize};

use super::ChannelIon;
use crate::model::SlotId;
use crate::particle::ParticleSpecies;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeakageChannel {
    slot: SlotId,
    ion: ChannelIon,
    position: f64,
}

impl LeakageChannel {
    pub fn new(slot: SlotId, ion: ChannelIon, position: f64) -> Self {
        Self { slot, ion, position }
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

    pub fn admits(&self, species: ParticleSpecies) -> bool {
        self.ion.conducts(species)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::SoluteType;

    #[test]
    fn test_admits_only_its_ion() {
        let channel = LeakageChannel::new(SlotId(0), ChannelIon::Potassium, 0.0);
        assert!(channel.admits(ParticleSpecies::Solute(SoluteType::PotassiumIon)));
        assert!(!channel.admits(ParticleSpecies::Solute(SoluteType::SodiumIon)));
        assert!(!channel.admits(ParticleSpecies::Solute(SoluteType::Glucose)));
    }
}
