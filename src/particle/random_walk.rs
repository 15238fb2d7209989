//! Smoothed random walk and the membrane-contact decisions made from it.
//!
//! The heading is a linear blend between a fixed heading and a target
//! heading. Every 1-4 s a new target is drawn and the blend restarts over a
//! 0.5-1.5 s turn. When the footprint touches the membrane the particle
//! either starts a crossing or bounces.

use std::f64::consts::TAU;

use glam::DVec2;
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use super::{LigandType, ParticleMode, ParticleSpecies, SoluteType};
use crate::geometry::{Bounds2, CrossingDirection, Side};
use crate::model::{BindingSite, SiteReservations, SlotId};
use crate::proteins::TransportProtein;

use super::mode::ModeContext;

/// Mean straight-travel time after leaving the membrane (s)
const STRAIGHT_TRAVEL_MEAN_SEC: f64 = 0.3;
/// Standard deviation of the straight-travel time (s)
const STRAIGHT_TRAVEL_STD_SEC: f64 = 0.4;
const STRAIGHT_TRAVEL_MIN_SEC: f64 = 0.01;
const STRAIGHT_TRAVEL_MAX_SEC: f64 = 2.0;

const TURN_DURATION_MIN_SEC: f64 = 0.5;
const TURN_DURATION_MAX_SEC: f64 = 1.5;
const DIRECTION_INTERVAL_MIN_SEC: f64 = 1.0;
const DIRECTION_INTERVAL_MAX_SEC: f64 = 4.0;

/// Sample how long a particle travels straight after exiting the membrane
///
/// `clamp(N(0.3, 0.4), 0.01, 2.0)` seconds.
pub fn sample_straight_travel_time<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    (STRAIGHT_TRAVEL_MEAN_SEC + STRAIGHT_TRAVEL_STD_SEC * z)
        .clamp(STRAIGHT_TRAVEL_MIN_SEC, STRAIGHT_TRAVEL_MAX_SEC)
}

fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> DVec2 {
    let angle = rng.gen_range(0.0..TAU);
    DVec2::new(angle.cos(), angle.sin())
}

/// Random-walk smoothing state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomWalk {
    /// Heading frozen at the start of the current turn
    current_direction: DVec2,
    /// Heading the turn blends toward
    target_direction: DVec2,
    turn_elapsed_sec: f64,
    turn_duration_sec: f64,
    time_until_next_direction_sec: f64,
}

impl RandomWalk {
    /// Fresh walk with random headings and timers
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            current_direction: random_unit_vector(rng),
            target_direction: random_unit_vector(rng),
            turn_elapsed_sec: 0.0,
            turn_duration_sec: rng.gen_range(TURN_DURATION_MIN_SEC..=TURN_DURATION_MAX_SEC),
            time_until_next_direction_sec: rng
                .gen_range(DIRECTION_INTERVAL_MIN_SEC..=DIRECTION_INTERVAL_MAX_SEC),
        }
    }

    /// Walk started by a particle that just left the membrane
    ///
    /// The heading points into the destination compartment and is held for a
    /// straight-travel time drawn by [`sample_straight_travel_time`].
    pub fn after_crossing<R: Rng + ?Sized>(direction: CrossingDirection, rng: &mut R) -> Self {
        let angle = rng.gen_range(0.0..std::f64::consts::PI);
        let heading = DVec2::new(angle.cos(), angle.sin().abs() * direction.sign());
        Self {
            current_direction: heading,
            target_direction: heading,
            turn_elapsed_sec: 0.0,
            turn_duration_sec: TURN_DURATION_MIN_SEC,
            time_until_next_direction_sec: sample_straight_travel_time(rng),
        }
    }

    /// Instantaneous heading: blend of fixed and target heading
    pub fn heading(&self) -> DVec2 {
        let alpha = (self.turn_elapsed_sec / self.turn_duration_sec).clamp(0.0, 1.0);
        self.current_direction.lerp(self.target_direction, alpha)
    }

    pub fn time_until_next_direction(&self) -> f64 {
        self.time_until_next_direction_sec
    }

    /// Advance the turn timers and return this tick's heading
    pub fn advance<R: Rng + ?Sized>(&mut self, dt: f64, rng: &mut R) -> DVec2 {
        self.time_until_next_direction_sec -= dt;
        if self.time_until_next_direction_sec <= 0.0 {
            self.current_direction = self.heading();
            self.target_direction = random_unit_vector(rng);
            self.turn_elapsed_sec = 0.0;
            self.turn_duration_sec = rng.gen_range(TURN_DURATION_MIN_SEC..=TURN_DURATION_MAX_SEC);
            self.time_until_next_direction_sec =
                rng.gen_range(DIRECTION_INTERVAL_MIN_SEC..=DIRECTION_INTERVAL_MAX_SEC);
        }
        self.turn_elapsed_sec += dt;
        self.heading()
    }

    fn set_x_sign(&mut self, sign: f64) {
        self.current_direction.x = self.current_direction.x.abs() * sign;
        self.target_direction.x = self.target_direction.x.abs() * sign;
    }

    fn set_y_sign(&mut self, sign: f64) {
        self.current_direction.y = self.current_direction.y.abs() * sign;
        self.target_direction.y = self.target_direction.y.abs() * sign;
    }

    /// One random-walk tick
    pub(crate) fn step(
        &mut self,
        species: ParticleSpecies,
        position: &mut DVec2,
        dt: f64,
        ctx: &mut ModeContext<'_>,
    ) -> Option<ParticleMode> {
        if let Some(ligand) = species.ligand() {
            if let Some(slot) = find_ligand_binding_target(ligand, *position, ctx) {
                ctx.reservations.reserve(slot, BindingSite::Ligand);
                log::debug!("ligand {:?} captured by channel in {:?}", ligand, slot);
                return Some(ParticleMode::MoveToLigandBindingLocation { slot });
            }
        }

        let origin = Side::of_y(position.y);
        let heading = self.advance(dt, ctx.rng);
        *position += heading * ctx.kinematics.random_walk_speed * dt;

        let half = species.footprint() * 0.5;
        let face = ctx.layout.half_thickness();
        let touches_membrane = match origin {
            Side::Outside => position.y - half.y < face,
            Side::Inside => position.y + half.y > -face,
        };
        if touches_membrane {
            if let Some(next) = crossing_opportunity(species, *position, origin, ctx) {
                return Some(next);
            }
            position.y = origin.sign() * (face + half.y);
            self.set_y_sign(origin.sign());
        }

        let compartment = *ctx.layout.compartment(origin);
        self.reflect_off_walls(position, half, &compartment, origin);
        None
    }

    fn reflect_off_walls(&mut self, position: &mut DVec2, half: DVec2, walls: &Bounds2, origin: Side) {
        if position.x - half.x < walls.min.x {
            position.x = walls.min.x + half.x;
            self.set_x_sign(1.0);
        } else if position.x + half.x > walls.max.x {
            position.x = walls.max.x - half.x;
            self.set_x_sign(-1.0);
        }
        match origin {
            Side::Outside if position.y + half.y > walls.max.y => {
                position.y = walls.max.y - half.y;
                self.set_y_sign(-1.0);
            }
            Side::Inside if position.y - half.y < walls.min.y => {
                position.y = walls.min.y + half.y;
                self.set_y_sign(1.0);
            }
            _ => {}
        }
    }
}

/// Nearest available ligand-gated channel within capture range
fn find_ligand_binding_target(
    ligand: LigandType,
    position: DVec2,
    ctx: &ModeContext<'_>,
) -> Option<SlotId> {
    let capture = ctx.kinematics.ligand_capture_distance;
    ctx.slots
        .iter()
        .filter_map(|slot| match slot.protein() {
            Some(TransportProtein::LigandGated(channel))
                if channel.ligand_type() == ligand
                    && channel.is_available_for_binding()
                    && ctx.reservations.is_open(slot.id(), BindingSite::Ligand) =>
            {
                let distance = channel.binding_position().distance(position);
                (distance <= capture).then_some((slot.id(), distance))
            }
            _ => None,
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(slot, _)| slot)
}

/// Decide whether a particle touching the membrane starts a crossing
///
/// Passive species draw against the diffusion probability. Everything else
/// looks for the nearest adjacent protein that will take it from `origin`.
fn crossing_opportunity(
    species: ParticleSpecies,
    position: DVec2,
    origin: Side,
    ctx: &mut ModeContext<'_>,
) -> Option<ParticleMode> {
    if species.diffuses_passively() {
        let draw: f64 = ctx.rng.gen();
        return (draw < ctx.kinematics.passive_diffusion_probability).then_some(
            ParticleMode::PassiveDiffusion {
                direction: CrossingDirection::leaving(origin),
            },
        );
    }
    let solute = species.solute()?;

    let capture = ctx.kinematics.channel_capture_half_width;
    let mut nearby: Vec<(f64, &TransportProtein)> = ctx
        .slots
        .iter()
        .filter_map(|slot| slot.protein().map(|p| ((p.position() - position.x).abs(), p)))
        .filter(|(distance, _)| *distance <= capture)
        .collect();
    nearby.sort_by(|a, b| a.0.total_cmp(&b.0));

    let next = nearby
        .into_iter()
        .find_map(|(_, protein)| entry_mode(protein, species, solute, position, origin, ctx.reservations))?;
    if let Some((slot, site)) = next.targeted_site() {
        ctx.reservations.reserve(slot, site);
    }
    log::debug!("{:?} entering {:?}", species, next);
    Some(next)
}

fn entry_mode(
    protein: &TransportProtein,
    species: ParticleSpecies,
    solute: SoluteType,
    position: DVec2,
    origin: Side,
    reservations: &SiteReservations,
) -> Option<ParticleMode> {
    let slot = protein.slot();
    match protein {
        TransportProtein::Leakage(_)
        | TransportProtein::VoltageGated(_)
        | TransportProtein::LigandGated(_) => protein.admits_through_channel(species).then_some(
            ParticleMode::MoveToCenterOfChannel {
                slot,
                direction: CrossingDirection::leaving(origin),
            },
        ),
        TransportProtein::Cotransporter(transporter) => {
            if origin != Side::Outside {
                return None;
            }
            let site = transporter.open_site_for(solute, position.x, |site| {
                reservations.is_open(slot, BindingSite::SodiumGlucose(site))
            })?;
            Some(ParticleMode::MoveToSodiumGlucoseSite { slot, site })
        }
        TransportProtein::Pump(pump) => {
            let site = pump.open_site_for(solute, origin, position.x, |site| {
                reservations.is_open(slot, BindingSite::Pump(site))
            })?;
            Some(ParticleMode::MoveToPumpSite {
                slot,
                site,
                start_position: position,
                checkpoint: pump.checkpoint(site),
                target_position: pump.site_position(site),
                has_reached_checkpoint: false,
            })
        }
    }
}
