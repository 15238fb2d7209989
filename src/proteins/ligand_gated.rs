//! Ligand-gated channels.
//!
//! Closed -> LigandBoundClosed (bind) -> LigandBoundOpen (after 0.5 s)
//! -> LigandUnboundOpen (after 7 s with no particle in transit)
//! -> Closed (after 0.5 s). A closed channel accepts a new ligand only once
//! it has been closed for the rebinding delay.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::{record_state_change, ChannelIon, ProteinContext, ProteinState};
use crate::model::{SlotId, TransportEvent};
use crate::particle::{LigandType, ParticleId, ParticleMode, ParticleSpecies};

/// Minimum time closed before a ligand may bind again (s)
pub const REBINDING_DELAY_SEC: f64 = 5.0;
/// Time between the bound/unbound and open/closed conformation changes (s)
pub const STATE_TRANSITION_INTERVAL_SEC: f64 = 0.5;
/// Time the channel stays open with the ligand bound (s)
pub const BINDING_DURATION_SEC: f64 = 7.0;

/// Horizontal offset of the binding position from the channel axis
const BINDING_OFFSET_X: f64 = 7.0;
/// Height of the binding position above the membrane face
const BINDING_OFFSET_Y: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LigandGatedState {
    Closed,
    LigandBoundClosed,
    LigandBoundOpen,
    LigandUnboundOpen,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LigandGatedChannel {
    slot: SlotId,
    ion: ChannelIon,
    position: f64,
    half_thickness: f64,
    state: LigandGatedState,
    time_since_state_transition: f64,
    bound_ligand: Option<ParticleId>,
}

impl LigandGatedChannel {
    /// A new channel is idle: closed long enough to accept a ligand at once
    pub fn new(slot: SlotId, ion: ChannelIon, position: f64, half_thickness: f64) -> Self {
        Self {
            slot,
            ion,
            position,
            half_thickness,
            state: LigandGatedState::Closed,
            time_since_state_transition: REBINDING_DELAY_SEC,
            bound_ligand: None,
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

    pub fn state(&self) -> LigandGatedState {
        self.state
    }

    pub fn time_since_state_transition(&self) -> f64 {
        self.time_since_state_transition
    }

    pub fn bound_ligand(&self) -> Option<ParticleId> {
        self.bound_ligand
    }

    /// Ligand that opens this channel
    pub fn ligand_type(&self) -> LigandType {
        match self.ion {
            ChannelIon::Sodium => LigandType::Star,
            ChannelIon::Potassium => LigandType::Triangle,
        }
    }

    /// Where a bound ligand sits, just outside the membrane
    pub fn binding_position(&self) -> DVec2 {
        DVec2::new(
            self.position + BINDING_OFFSET_X,
            self.half_thickness + BINDING_OFFSET_Y,
        )
    }

    pub fn is_available_for_binding(&self) -> bool {
        self.state == LigandGatedState::Closed
            && self.bound_ligand.is_none()
            && self.time_since_state_transition >= REBINDING_DELAY_SEC
    }

    pub fn admits(&self, species: ParticleSpecies) -> bool {
        self.state == LigandGatedState::LigandBoundOpen && self.ion.conducts(species)
    }

    fn transition(&mut self, next: LigandGatedState, events: &mut Vec<TransportEvent>) {
        let previous = std::mem::replace(&mut self.state, next);
        self.time_since_state_transition = 0.0;
        record_state_change(
            self.slot,
            ProteinState::LigandGated(previous),
            ProteinState::LigandGated(next),
            events,
        );
    }

    /// Bind `ligand` to an available channel
    pub fn bind_ligand(&mut self, ligand: ParticleId, events: &mut Vec<TransportEvent>) {
        assert!(
            self.is_available_for_binding(),
            "{:?}: ligand {:?} bound to a channel that is not available",
            self.slot,
            ligand
        );
        self.bound_ligand = Some(ligand);
        events.push(TransportEvent::LigandBound {
            slot: self.slot,
            ligand,
        });
        self.transition(LigandGatedState::LigandBoundClosed, events);
    }

    /// Drop the bound ligand without touching the particle
    ///
    /// Used when the ligand is grabbed or removed. Returns the ligand that
    /// was bound.
    pub fn detach_ligand(&mut self, events: &mut Vec<TransportEvent>) -> Option<ParticleId> {
        let ligand = self.bound_ligand.take()?;
        events.push(TransportEvent::LigandUnbound {
            slot: self.slot,
            ligand,
        });
        self.transition(LigandGatedState::LigandUnboundOpen, events);
        Some(ligand)
    }

    pub fn step(&mut self, dt: f64, ctx: &mut ProteinContext<'_>) {
        self.time_since_state_transition += dt;
        let elapsed = self.time_since_state_transition;
        match self.state {
            LigandGatedState::Closed => {}
            LigandGatedState::LigandBoundClosed => {
                if elapsed >= STATE_TRANSITION_INTERVAL_SEC {
                    self.transition(LigandGatedState::LigandBoundOpen, ctx.events);
                }
            }
            LigandGatedState::LigandBoundOpen => {
                if elapsed >= BINDING_DURATION_SEC
                    && !ctx.has_particles_moving_toward_or_through(self.slot)
                {
                    let slot = self.slot;
                    let index = ctx.find_particle(|mode| *mode == ParticleMode::LigandBound { slot });
                    if let Some(ligand) = self.detach_ligand(ctx.events) {
                        match index {
                            Some(index) => ctx.release_to_random_walk(index),
                            None => panic!("{:?}: bound ligand {:?} is not in LigandBound mode", slot, ligand),
                        }
                    }
                }
            }
            LigandGatedState::LigandUnboundOpen => {
                if elapsed >= STATE_TRANSITION_INTERVAL_SEC {
                    self.transition(LigandGatedState::Closed, ctx.events);
                }
            }
        }
    }
}
