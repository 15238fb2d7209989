//! Transport proteins embedded in the membrane.
//!
//! Each protein is a discrete state machine:
//! - Leakage channels: always open to their ion
//! - Voltage-gated channels: conformation follows the membrane potential
//! - Ligand-gated channels: bind a ligand, open, release, close
//! - Sodium-glucose cotransporter: 2 Na+ and 1 glucose cross together
//! - Sodium-potassium pump: 3 Na+ out, 2 K+ in per ATP
//!
//! Proteins never hold particles directly. Binding sites are reserved by
//! particle modes, and protein side effects reach particles through
//! [`ProteinContext`].

pub mod leakage;
pub mod ligand_gated;
pub mod sodium_glucose;
pub mod sodium_potassium_pump;
pub mod voltage_gated;

pub use leakage::LeakageChannel;
pub use ligand_gated::{
    LigandGatedChannel, LigandGatedState, BINDING_DURATION_SEC, REBINDING_DELAY_SEC,
    STATE_TRANSITION_INTERVAL_SEC,
};
pub use sodium_glucose::{CotransporterState, SodiumGlucoseCotransporter, SodiumGlucoseSite};
pub use sodium_potassium_pump::{PumpSite, PumpState, SodiumPotassiumPump};
pub use voltage_gated::{MembranePotential, VoltageGatedChannel, VoltageGatedState};

use glam::DVec2;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::geometry::MembraneLayout;
use crate::model::{SlotId, TransportEvent};
use crate::particle::{
    Particle, ParticleIdAllocator, ParticleMode, ParticleSpecies, RandomWalk, SoluteType,
};

/// Ion a channel conducts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelIon {
    Sodium,
    Potassium,
}

impl ChannelIon {
    pub fn solute(self) -> SoluteType {
        match self {
            ChannelIon::Sodium => SoluteType::SodiumIon,
            ChannelIon::Potassium => SoluteType::PotassiumIon,
        }
    }

    pub fn conducts(self, species: ParticleSpecies) -> bool {
        species == ParticleSpecies::Solute(self.solute())
    }
}

/// Kind of protein a slot can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportProteinType {
    SodiumLeakageChannel,
    PotassiumLeakageChannel,
    SodiumVoltageGatedChannel,
    PotassiumVoltageGatedChannel,
    SodiumLigandGatedChannel,
    PotassiumLigandGatedChannel,
    SodiumGlucoseCotransporter,
    SodiumPotassiumPump,
}

impl TransportProteinType {
    pub const ALL: [TransportProteinType; 8] = [
        TransportProteinType::SodiumLeakageChannel,
        TransportProteinType::PotassiumLeakageChannel,
        TransportProteinType::SodiumVoltageGatedChannel,
        TransportProteinType::PotassiumVoltageGatedChannel,
        TransportProteinType::SodiumLigandGatedChannel,
        TransportProteinType::PotassiumLigandGatedChannel,
        TransportProteinType::SodiumGlucoseCotransporter,
        TransportProteinType::SodiumPotassiumPump,
    ];
}

/// Discrete state of any protein, as reported in events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProteinState {
    Leakage,
    VoltageGated(VoltageGatedState),
    LigandGated(LigandGatedState),
    Cotransporter(CotransporterState),
    Pump(PumpState),
}

impl ProteinState {
    /// Whether a channel conformation is open; `None` for carriers
    pub fn channel_openness(self) -> Option<bool> {
        match self {
            ProteinState::Leakage => Some(true),
            ProteinState::VoltageGated(state) => Some(state == VoltageGatedState::Open),
            ProteinState::LigandGated(state) => Some(matches!(
                state,
                LigandGatedState::LigandBoundOpen | LigandGatedState::LigandUnboundOpen
            )),
            ProteinState::Cotransporter(_) | ProteinState::Pump(_) => None,
        }
    }
}

/// Emit the state-change event, plus an opened/closed notification when the
/// channel's openness flips
pub(crate) fn record_state_change(
    slot: SlotId,
    previous: ProteinState,
    current: ProteinState,
    events: &mut Vec<TransportEvent>,
) {
    if previous == current {
        return;
    }
    log::debug!("{:?}: {:?} -> {:?}", slot, previous, current);
    events.push(TransportEvent::ProteinStateChanged {
        slot,
        previous,
        current,
    });
    match (previous.channel_openness(), current.channel_openness()) {
        (Some(false), Some(true)) => events.push(TransportEvent::ChannelOpened { slot }),
        (Some(true), Some(false)) => events.push(TransportEvent::ChannelClosed { slot }),
        _ => {}
    }
}

/// Everything a protein may read or touch during its step
pub struct ProteinContext<'a> {
    pub membrane_potential: MembranePotential,
    pub particles: &'a mut Vec<Particle>,
    pub ids: &'a mut ParticleIdAllocator,
    pub rng: &'a mut StdRng,
    pub events: &'a mut Vec<TransportEvent>,
}

impl ProteinContext<'_> {
    /// Any particle approaching, entering or moving through `slot`
    pub fn has_particles_moving_toward_or_through(&self, slot: SlotId) -> bool {
        self.particles.iter().any(|p| p.mode.is_transiting(slot))
    }

    /// Index of the particle whose mode satisfies `predicate`
    pub fn find_particle(&self, predicate: impl Fn(&ParticleMode) -> bool) -> Option<usize> {
        self.particles.iter().position(|p| predicate(&p.mode))
    }

    pub fn index_of(&self, id: crate::particle::ParticleId) -> Option<usize> {
        self.particles.iter().position(|p| p.id() == id)
    }

    /// Hand a particle a freshly sampled random walk
    pub fn release_to_random_walk(&mut self, index: usize) {
        let walk = RandomWalk::new(self.rng);
        self.particles[index].mode = ParticleMode::RandomWalk(walk);
    }

    /// Add a new particle and return its index
    pub fn spawn(&mut self, species: ParticleSpecies, position: DVec2, mode: ParticleMode) -> usize {
        let id = self.ids.allocate();
        self.particles.push(Particle::new(id, species, position, mode));
        self.particles.len() - 1
    }
}

/// A protein occupying a slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransportProtein {
    Leakage(LeakageChannel),
    VoltageGated(VoltageGatedChannel),
    LigandGated(LigandGatedChannel),
    Cotransporter(SodiumGlucoseCotransporter),
    Pump(SodiumPotassiumPump),
}

impl TransportProtein {
    /// Build a protein of `kind` at a slot
    pub fn new(
        kind: TransportProteinType,
        slot: SlotId,
        position: f64,
        layout: &MembraneLayout,
        potential: MembranePotential,
    ) -> Self {
        let half = layout.half_thickness();
        match kind {
            TransportProteinType::SodiumLeakageChannel => {
                TransportProtein::Leakage(LeakageChannel::new(slot, ChannelIon::Sodium, position))
            }
            TransportProteinType::PotassiumLeakageChannel => {
                TransportProtein::Leakage(LeakageChannel::new(slot, ChannelIon::Potassium, position))
            }
            TransportProteinType::SodiumVoltageGatedChannel => TransportProtein::VoltageGated(
                VoltageGatedChannel::new(slot, ChannelIon::Sodium, position, potential),
            ),
            TransportProteinType::PotassiumVoltageGatedChannel => TransportProtein::VoltageGated(
                VoltageGatedChannel::new(slot, ChannelIon::Potassium, position, potential),
            ),
            TransportProteinType::SodiumLigandGatedChannel => TransportProtein::LigandGated(
                LigandGatedChannel::new(slot, ChannelIon::Sodium, position, half),
            ),
            TransportProteinType::PotassiumLigandGatedChannel => TransportProtein::LigandGated(
                LigandGatedChannel::new(slot, ChannelIon::Potassium, position, half),
            ),
            TransportProteinType::SodiumGlucoseCotransporter => TransportProtein::Cotransporter(
                SodiumGlucoseCotransporter::new(slot, position, half),
            ),
            TransportProteinType::SodiumPotassiumPump => {
                TransportProtein::Pump(SodiumPotassiumPump::new(slot, position, half))
            }
        }
    }

    pub fn kind(&self) -> TransportProteinType {
        match self {
            TransportProtein::Leakage(channel) => match channel.ion() {
                ChannelIon::Sodium => TransportProteinType::SodiumLeakageChannel,
                ChannelIon::Potassium => TransportProteinType::PotassiumLeakageChannel,
            },
            TransportProtein::VoltageGated(channel) => match channel.ion() {
                ChannelIon::Sodium => TransportProteinType::SodiumVoltageGatedChannel,
                ChannelIon::Potassium => TransportProteinType::PotassiumVoltageGatedChannel,
            },
            TransportProtein::LigandGated(channel) => match channel.ion() {
                ChannelIon::Sodium => TransportProteinType::SodiumLigandGatedChannel,
                ChannelIon::Potassium => TransportProteinType::PotassiumLigandGatedChannel,
            },
            TransportProtein::Cotransporter(_) => TransportProteinType::SodiumGlucoseCotransporter,
            TransportProtein::Pump(_) => TransportProteinType::SodiumPotassiumPump,
        }
    }

    pub fn slot(&self) -> SlotId {
        match self {
            TransportProtein::Leakage(p) => p.slot(),
            TransportProtein::VoltageGated(p) => p.slot(),
            TransportProtein::LigandGated(p) => p.slot(),
            TransportProtein::Cotransporter(p) => p.slot(),
            TransportProtein::Pump(p) => p.slot(),
        }
    }

    /// X coordinate of the protein axis
    pub fn position(&self) -> f64 {
        match self {
            TransportProtein::Leakage(p) => p.position(),
            TransportProtein::VoltageGated(p) => p.position(),
            TransportProtein::LigandGated(p) => p.position(),
            TransportProtein::Cotransporter(p) => p.position(),
            TransportProtein::Pump(p) => p.position(),
        }
    }

    pub fn state(&self) -> ProteinState {
        match self {
            TransportProtein::Leakage(_) => ProteinState::Leakage,
            TransportProtein::VoltageGated(p) => ProteinState::VoltageGated(p.state()),
            TransportProtein::LigandGated(p) => ProteinState::LigandGated(p.state()),
            TransportProtein::Cotransporter(p) => ProteinState::Cotransporter(p.state()),
            TransportProtein::Pump(p) => ProteinState::Pump(p.state()),
        }
    }

    /// Whether a channel currently lets `species` start a crossing
    pub fn admits_through_channel(&self, species: ParticleSpecies) -> bool {
        match self {
            TransportProtein::Leakage(channel) => channel.admits(species),
            TransportProtein::VoltageGated(channel) => channel.admits(species),
            TransportProtein::LigandGated(channel) => channel.admits(species),
            TransportProtein::Cotransporter(_) | TransportProtein::Pump(_) => false,
        }
    }

    pub fn step(&mut self, dt: f64, ctx: &mut ProteinContext<'_>) {
        match self {
            TransportProtein::Leakage(_) => {}
            TransportProtein::VoltageGated(channel) => {
                channel.set_membrane_potential(ctx.membrane_potential, ctx.events)
            }
            TransportProtein::LigandGated(channel) => channel.step(dt, ctx),
            TransportProtein::Cotransporter(transporter) => transporter.step(dt, ctx),
            TransportProtein::Pump(pump) => pump.step(dt, ctx),
        }
    }
}
