//! Notifications produced during a tick.

use serde::{Deserialize, Serialize};

use super::{BindingSite, SlotId};
use crate::geometry::CrossingDirection;
use crate::particle::{ParticleId, ParticleSpecies};
use crate::proteins::ProteinState;

/// Event drained from the model with `drain_events`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TransportEvent {
    /// A particle's center changed side of the membrane this tick
    ParticleCrossedMembrane {
        particle: ParticleId,
        species: ParticleSpecies,
        direction: CrossingDirection,
    },
    ProteinStateChanged {
        slot: SlotId,
        previous: ProteinState,
        current: ProteinState,
    },
    ChannelOpened {
        slot: SlotId,
    },
    ChannelClosed {
        slot: SlotId,
    },
    LigandBound {
        slot: SlotId,
        ligand: ParticleId,
    },
    LigandUnbound {
        slot: SlotId,
        ligand: ParticleId,
    },
    /// A particle arrived at a carrier binding site
    SiteOccupied {
        slot: SlotId,
        site: BindingSite,
        particle: ParticleId,
    },
    /// Running count of sodium ions bound to the pump
    SodiumBoundToPump {
        slot: SlotId,
        count: usize,
    },
    AtpHydrolyzed {
        slot: SlotId,
        atp: ParticleId,
        adp: ParticleId,
        phosphate: ParticleId,
    },
    PhosphateReleased {
        slot: SlotId,
        phosphate: ParticleId,
    },
}

impl TransportEvent {
    /// Slot the event concerns, if any
    pub fn slot(&self) -> Option<SlotId> {
        match *self {
            TransportEvent::ParticleCrossedMembrane { .. } => None,
            TransportEvent::ProteinStateChanged { slot, .. }
            | TransportEvent::ChannelOpened { slot }
            | TransportEvent::ChannelClosed { slot }
            | TransportEvent::LigandBound { slot, .. }
            | TransportEvent::LigandUnbound { slot, .. }
            | TransportEvent::SiteOccupied { slot, .. }
            | TransportEvent::SodiumBoundToPump { slot, .. }
            | TransportEvent::AtpHydrolyzed { slot, .. }
            | TransportEvent::PhosphateReleased { slot, .. } => Some(slot),
        }
    }
}
