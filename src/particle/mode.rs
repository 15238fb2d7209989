//! Particle modes: the per-particle motion and interaction state machine.
//!
//! Every tick the particle's current mode moves it and may hand back the mode
//! it becomes next. Modes that interact with a protein carry the [`SlotId`]
//! of that protein; the model resets them to a random walk before the
//! protein is disposed, so a mode never outlives the protein it names.

use glam::DVec2;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Particle, RandomWalk};
use crate::config::Kinematics;
use crate::geometry::{CrossingDirection, MembraneLayout, Side};
use crate::model::{BindingSite, SiteReservations, Slot, SlotId, TransportEvent};
use crate::proteins::{
    LigandGatedChannel, PumpSite, SodiumGlucoseCotransporter, SodiumGlucoseSite,
    SodiumPotassiumPump, TransportProtein, TransportProteinType,
};

/// Fraction of the half-thickness a particle must reach before it counts as
/// inside the channel
const ENTRY_DEPTH_FRACTION: f64 = 0.5;

/// Motion/interaction state of one particle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParticleMode {
    RandomWalk(RandomWalk),
    /// Unassisted crossing through the bilayer
    PassiveDiffusion { direction: CrossingDirection },
    /// Steering to the mouth of an open channel
    MoveToCenterOfChannel { slot: SlotId, direction: CrossingDirection },
    EnteringTransportProtein { slot: SlotId, direction: CrossingDirection },
    MovingThroughTransportProtein {
        slot: SlotId,
        protein_type: TransportProteinType,
        direction: CrossingDirection,
        /// Lateral offset of the crossing lane from the protein axis
        offset: f64,
    },
    MoveToLigandBindingLocation { slot: SlotId },
    LigandBound { slot: SlotId },
    MoveToSodiumGlucoseSite { slot: SlotId, site: SodiumGlucoseSite },
    WaitingAtSodiumGlucoseSite { slot: SlotId, site: SodiumGlucoseSite },
    MoveToPumpSite {
        slot: SlotId,
        site: PumpSite,
        start_position: DVec2,
        checkpoint: DVec2,
        target_position: DVec2,
        has_reached_checkpoint: bool,
    },
    WaitingAtPumpSite { slot: SlotId, site: PumpSite },
    /// Dragged by the user
    UserControlled,
    /// Pointer hovering over the particle
    UserOver,
}

impl ParticleMode {
    /// Slot of the protein this mode refers to, if any
    pub fn slot(&self) -> Option<SlotId> {
        match *self {
            ParticleMode::MoveToCenterOfChannel { slot, .. }
            | ParticleMode::EnteringTransportProtein { slot, .. }
            | ParticleMode::MovingThroughTransportProtein { slot, .. }
            | ParticleMode::MoveToLigandBindingLocation { slot }
            | ParticleMode::LigandBound { slot }
            | ParticleMode::MoveToSodiumGlucoseSite { slot, .. }
            | ParticleMode::WaitingAtSodiumGlucoseSite { slot, .. }
            | ParticleMode::MoveToPumpSite { slot, .. }
            | ParticleMode::WaitingAtPumpSite { slot, .. } => Some(slot),
            ParticleMode::RandomWalk(_)
            | ParticleMode::PassiveDiffusion { .. }
            | ParticleMode::UserControlled
            | ParticleMode::UserOver => None,
        }
    }

    /// Binding site this mode is approaching or occupying
    pub fn targeted_site(&self) -> Option<(SlotId, BindingSite)> {
        match *self {
            ParticleMode::MoveToLigandBindingLocation { slot } | ParticleMode::LigandBound { slot } => {
                Some((slot, BindingSite::Ligand))
            }
            ParticleMode::MoveToSodiumGlucoseSite { slot, site }
            | ParticleMode::WaitingAtSodiumGlucoseSite { slot, site } => {
                Some((slot, BindingSite::SodiumGlucose(site)))
            }
            ParticleMode::MoveToPumpSite { slot, site, .. }
            | ParticleMode::WaitingAtPumpSite { slot, site } => Some((slot, BindingSite::Pump(site))),
            _ => None,
        }
    }

    /// True while heading toward or passing through the protein in `slot`
    pub fn is_transiting(&self, target: SlotId) -> bool {
        match *self {
            ParticleMode::MoveToCenterOfChannel { slot, .. }
            | ParticleMode::EnteringTransportProtein { slot, .. }
            | ParticleMode::MovingThroughTransportProtein { slot, .. } => slot == target,
            _ => false,
        }
    }

    pub fn is_random_walk(&self) -> bool {
        matches!(self, ParticleMode::RandomWalk(_))
    }

    /// Short name for logs and exports
    pub fn name(&self) -> &'static str {
        match self {
            ParticleMode::RandomWalk(_) => "randomWalk",
            ParticleMode::PassiveDiffusion { .. } => "passiveDiffusion",
            ParticleMode::MoveToCenterOfChannel { .. } => "moveToCenterOfChannel",
            ParticleMode::EnteringTransportProtein { .. } => "enteringTransportProtein",
            ParticleMode::MovingThroughTransportProtein { .. } => "movingThroughTransportProtein",
            ParticleMode::MoveToLigandBindingLocation { .. } => "moveToLigandBindingLocation",
            ParticleMode::LigandBound { .. } => "ligandBound",
            ParticleMode::MoveToSodiumGlucoseSite { .. } => "moveToSodiumGlucoseSite",
            ParticleMode::WaitingAtSodiumGlucoseSite { .. } => "waitingAtSodiumGlucoseSite",
            ParticleMode::MoveToPumpSite { .. } => "moveToPumpSite",
            ParticleMode::WaitingAtPumpSite { .. } => "waitingAtPumpSite",
            ParticleMode::UserControlled => "userControlled",
            ParticleMode::UserOver => "userOver",
        }
    }
}

/// Everything a mode may read or touch during one particle step
pub struct ModeContext<'a> {
    pub layout: &'a MembraneLayout,
    pub kinematics: &'a Kinematics,
    pub slots: &'a mut [Slot],
    pub reservations: &'a mut SiteReservations,
    pub rng: &'a mut StdRng,
    pub events: &'a mut Vec<TransportEvent>,
}

fn protein_at(slots: &[Slot], slot: SlotId) -> &TransportProtein {
    match slots.get(slot.0).and_then(Slot::protein) {
        Some(protein) => protein,
        None => panic!("particle mode refers to {:?}, which holds no transport protein", slot),
    }
}

fn protein_at_mut(slots: &mut [Slot], slot: SlotId) -> &mut TransportProtein {
    match slots.get_mut(slot.0).and_then(Slot::protein_mut) {
        Some(protein) => protein,
        None => panic!("particle mode refers to {:?}, which holds no transport protein", slot),
    }
}

fn ligand_gated(slots: &[Slot], slot: SlotId) -> &LigandGatedChannel {
    match protein_at(slots, slot) {
        TransportProtein::LigandGated(channel) => channel,
        other => panic!("{:?} holds {:?}, expected a ligand-gated channel", slot, other.kind()),
    }
}

fn cotransporter(slots: &[Slot], slot: SlotId) -> &SodiumGlucoseCotransporter {
    match protein_at(slots, slot) {
        TransportProtein::Cotransporter(transporter) => transporter,
        other => panic!("{:?} holds {:?}, expected the sodium-glucose cotransporter", slot, other.kind()),
    }
}

fn pump(slots: &[Slot], slot: SlotId) -> &SodiumPotassiumPump {
    match protein_at(slots, slot) {
        TransportProtein::Pump(pump) => pump,
        other => panic!("{:?} holds {:?}, expected the sodium-potassium pump", slot, other.kind()),
    }
}

/// Component-wise sign-stepping toward `target`
///
/// Each axis moves by at most `max_step` and snaps exactly onto the target
/// coordinate once within reach. Returns true on arrival.
pub(crate) fn step_toward(position: &mut DVec2, target: DVec2, max_step: f64) -> bool {
    let dx = target.x - position.x;
    if dx.abs() <= max_step {
        position.x = target.x;
    } else {
        position.x += dx.signum() * max_step;
    }
    let dy = target.y - position.y;
    if dy.abs() <= max_step {
        position.y = target.y;
    } else {
        position.y += dy.signum() * max_step;
    }
    *position == target
}

/// Shared directional crossing rule
///
/// Moves along `direction` with lateral jitter. With an `axis` the particle
/// stays within the lateral lane of that axis. Returns true once the
/// footprint has fully cleared the far face of the membrane.
fn step_crossing(
    position: &mut DVec2,
    footprint: DVec2,
    direction: CrossingDirection,
    axis: Option<f64>,
    dt: f64,
    layout: &MembraneLayout,
    kinematics: &Kinematics,
    rng: &mut StdRng,
) -> bool {
    let jitter = rng.gen_range(-1.0..=1.0) * kinematics.lateral_jitter_speed;
    position.x += jitter * dt;
    position.y += direction.sign() * kinematics.crossing_speed * dt;

    let half = footprint * 0.5;
    position.x = match axis {
        Some(axis) => position
            .x
            .clamp(axis - kinematics.max_lateral_offset, axis + kinematics.max_lateral_offset),
        None => position
            .x
            .clamp(layout.band.min.x + half.x, layout.band.max.x - half.x),
    };

    let face = layout.half_thickness();
    match direction {
        CrossingDirection::Inward => position.y + half.y <= -face,
        CrossingDirection::Outward => position.y - half.y >= face,
    }
}

impl Particle {
    /// Advance this particle by one tick, replacing its mode on transition
    ///
    /// A random-walking ligand that gets captured takes its first approach
    /// step in the same tick.
    pub(crate) fn step(&mut self, dt: f64, ctx: &mut ModeContext<'_>) {
        let was_walking = self.mode.is_random_walk();
        if let Some(next) = self.step_mode(dt, ctx) {
            log::trace!("{:?}: {} -> {}", self.id, self.mode.name(), next.name());
            let chained = was_walking && matches!(next, ParticleMode::MoveToLigandBindingLocation { .. });
            self.mode = next;
            if chained {
                if let Some(next) = self.step_mode(dt, ctx) {
                    log::trace!("{:?}: {} -> {}", self.id, self.mode.name(), next.name());
                    self.mode = next;
                }
            }
        }
    }

    fn step_mode(&mut self, dt: f64, ctx: &mut ModeContext<'_>) -> Option<ParticleMode> {
        let id = self.id;
        let species = self.species;
        let footprint = species.footprint();

        match self.mode {
            ParticleMode::RandomWalk(ref mut walk) => walk.step(species, &mut self.position, dt, ctx),

            ParticleMode::PassiveDiffusion { direction } => {
                let completed = step_crossing(
                    &mut self.position,
                    footprint,
                    direction,
                    None,
                    dt,
                    ctx.layout,
                    ctx.kinematics,
                    ctx.rng,
                );
                completed.then(|| ParticleMode::RandomWalk(RandomWalk::after_crossing(direction, ctx.rng)))
            }

            ParticleMode::MoveToCenterOfChannel { slot, direction } => {
                let protein = protein_at(ctx.slots, slot);
                if !protein.admits_through_channel(species) {
                    log::debug!("{:?}: channel in {:?} closed before entry", id, slot);
                    return Some(ParticleMode::RandomWalk(RandomWalk::new(ctx.rng)));
                }
                let mouth = DVec2::new(
                    protein.position(),
                    direction.origin().sign() * (ctx.layout.half_thickness() + footprint.y * 0.5),
                );
                step_toward(&mut self.position, mouth, ctx.kinematics.steering_speed * dt)
                    .then_some(ParticleMode::EnteringTransportProtein { slot, direction })
            }

            ParticleMode::EnteringTransportProtein { slot, direction } => {
                let protein = protein_at(ctx.slots, slot);
                self.position.x = protein.position();
                self.position.y += direction.sign() * ctx.kinematics.crossing_speed * dt;

                let threshold = ENTRY_DEPTH_FRACTION * ctx.layout.half_thickness();
                let passed_center = Side::of_y(self.position.y) != direction.origin();
                (self.position.y.abs() <= threshold || passed_center).then_some(
                    ParticleMode::MovingThroughTransportProtein {
                        slot,
                        protein_type: protein.kind(),
                        direction,
                        offset: 0.0,
                    },
                )
            }

            ParticleMode::MovingThroughTransportProtein {
                slot,
                protein_type,
                direction,
                offset,
            } => {
                let protein = protein_at(ctx.slots, slot);
                assert_eq!(
                    protein.kind(),
                    protein_type,
                    "{:?} moving through {:?} but the slot holds another protein",
                    id,
                    slot
                );
                let axis = protein.position() + offset;
                let completed = step_crossing(
                    &mut self.position,
                    footprint,
                    direction,
                    Some(axis),
                    dt,
                    ctx.layout,
                    ctx.kinematics,
                    ctx.rng,
                );
                if !completed {
                    return None;
                }
                if let TransportProtein::Cotransporter(transporter) = protein_at_mut(ctx.slots, slot) {
                    transporter.force_open_to_inside(ctx.events);
                }
                Some(ParticleMode::RandomWalk(RandomWalk::after_crossing(direction, ctx.rng)))
            }

            ParticleMode::MoveToLigandBindingLocation { slot } => {
                let target = ligand_gated(ctx.slots, slot).binding_position();
                if !step_toward(&mut self.position, target, ctx.kinematics.steering_speed * dt) {
                    return None;
                }
                match protein_at_mut(ctx.slots, slot) {
                    TransportProtein::LigandGated(channel) if channel.is_available_for_binding() => {
                        channel.bind_ligand(id, ctx.events);
                        self.position = target;
                        Some(ParticleMode::LigandBound { slot })
                    }
                    _ => Some(ParticleMode::RandomWalk(RandomWalk::new(ctx.rng))),
                }
            }

            ParticleMode::LigandBound { slot } => {
                self.position = ligand_gated(ctx.slots, slot).binding_position();
                None
            }

            ParticleMode::MoveToSodiumGlucoseSite { slot, site } => {
                let target = cotransporter(ctx.slots, slot).site_position(site);
                if !step_toward(&mut self.position, target, ctx.kinematics.steering_speed * dt) {
                    return None;
                }
                ctx.events.push(TransportEvent::SiteOccupied {
                    slot,
                    site: BindingSite::SodiumGlucose(site),
                    particle: id,
                });
                Some(ParticleMode::WaitingAtSodiumGlucoseSite { slot, site })
            }

            ParticleMode::WaitingAtSodiumGlucoseSite { slot, site } => {
                self.position = cotransporter(ctx.slots, slot).site_position(site);
                None
            }

            ParticleMode::MoveToPumpSite {
                slot,
                site,
                start_position,
                checkpoint,
                target_position,
                has_reached_checkpoint,
            } => {
                let max_step = ctx.kinematics.steering_speed * dt;
                if !has_reached_checkpoint {
                    return step_toward(&mut self.position, checkpoint, max_step).then_some(
                        ParticleMode::MoveToPumpSite {
                            slot,
                            site,
                            start_position,
                            checkpoint,
                            target_position,
                            has_reached_checkpoint: true,
                        },
                    );
                }
                if !step_toward(&mut self.position, target_position, max_step) {
                    return None;
                }
                let bound = match protein_at_mut(ctx.slots, slot) {
                    TransportProtein::Pump(pump) => pump.bind(site, id, species, ctx.events),
                    other => panic!("{:?} holds {:?}, expected the sodium-potassium pump", slot, other.kind()),
                };
                bound.then_some(ParticleMode::WaitingAtPumpSite { slot, site })
            }

            ParticleMode::WaitingAtPumpSite { slot, site } => {
                self.position = pump(ctx.slots, slot).site_position(site);
                None
            }

            ParticleMode::UserControlled | ParticleMode::UserOver => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_toward_moves_each_axis_independently() {
        let mut position = DVec2::new(0.0, 0.0);
        let arrived = step_toward(&mut position, DVec2::new(10.0, -0.5), 2.0);
        assert!(!arrived);
        // x moves a full step, y snaps because it is within reach
        assert_eq!(position, DVec2::new(2.0, -0.5));
    }

    #[test]
    fn test_step_toward_snaps_exactly() {
        let mut position = DVec2::new(0.1, 0.2);
        let target = DVec2::new(0.3, 0.7);
        assert!(step_toward(&mut position, target, 1.0));
        assert_eq!(position, target);
    }

    #[test]
    fn test_mode_slot_references() {
        let slot = SlotId(2);
        let mode = ParticleMode::WaitingAtPumpSite {
            slot,
            site: PumpSite::Atp,
        };
        assert_eq!(mode.slot(), Some(slot));
        assert_eq!(mode.targeted_site(), Some((slot, BindingSite::Pump(PumpSite::Atp))));
        assert!(!mode.is_transiting(slot));

        let through = ParticleMode::MovingThroughTransportProtein {
            slot,
            protein_type: TransportProteinType::SodiumLeakageChannel,
            direction: CrossingDirection::Inward,
            offset: 0.0,
        };
        assert!(through.is_transiting(slot));
        assert!(!through.is_transiting(SlotId(3)));
        assert_eq!(ParticleMode::UserOver.slot(), None);
    }
}
