//! Sodium-potassium pump.
//!
//! One cycle moves three sodium ions out and two potassium ions in, powered
//! by hydrolysis of one ATP:
//!
//! 1. `OpenToInsideEmpty`: sodium binds one ion at a time
//! 2. `OpenToInsideSodiumBound`: ATP may bind
//! 3. `OpenToInsideSodiumAndAtpBound`: ATP is split into ADP (released) and
//!    a phosphate that stays on the pump
//! 4. `OpenToOutsideAwaitingPotassium`: sodium has been released outward
//! 5. `OpenToOutsidePotassiumBound`: potassium is released inward along with
//!    the phosphate, back to step 1

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::{record_state_change, ProteinContext, ProteinState, TransportProteinType};
use crate::geometry::{CrossingDirection, Side};
use crate::model::{BindingSite, SlotId, TransportEvent};
use crate::particle::{ParticleId, ParticleMode, ParticleSpecies, RandomWalk, SoluteType};

/// Dwell time before each conformation flip (s)
pub const CONFORMATION_CHANGE_DELAY_SEC: f64 = 0.5;

const SITE_OFFSET_Y: f64 = 3.0;
const ATP_SITE_OFFSET_Y: f64 = 9.0;
/// Distance of the approach checkpoint beyond a site, away from the membrane
const CHECKPOINT_DISTANCE: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PumpSite {
    Sodium1,
    Sodium2,
    Sodium3,
    Atp,
    Potassium1,
    Potassium2,
}

impl PumpSite {
    pub const ALL: [PumpSite; 6] = [
        PumpSite::Sodium1,
        PumpSite::Sodium2,
        PumpSite::Sodium3,
        PumpSite::Atp,
        PumpSite::Potassium1,
        PumpSite::Potassium2,
    ];
    pub const SODIUM: [PumpSite; 3] = [PumpSite::Sodium1, PumpSite::Sodium2, PumpSite::Sodium3];
    pub const POTASSIUM: [PumpSite; 2] = [PumpSite::Potassium1, PumpSite::Potassium2];

    /// Solute this site binds
    pub fn solute(self) -> SoluteType {
        match self {
            PumpSite::Sodium1 | PumpSite::Sodium2 | PumpSite::Sodium3 => SoluteType::SodiumIon,
            PumpSite::Atp => SoluteType::Atp,
            PumpSite::Potassium1 | PumpSite::Potassium2 => SoluteType::PotassiumIon,
        }
    }

    /// Side of the membrane the site faces
    pub fn side(self) -> Side {
        match self {
            PumpSite::Potassium1 | PumpSite::Potassium2 => Side::Outside,
            _ => Side::Inside,
        }
    }

    /// Lateral offset from the pump axis
    pub fn offset(self) -> f64 {
        match self {
            PumpSite::Sodium1 => -6.0,
            PumpSite::Sodium2 | PumpSite::Atp => 0.0,
            PumpSite::Sodium3 => 6.0,
            PumpSite::Potassium1 => -4.0,
            PumpSite::Potassium2 => 4.0,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PumpState {
    OpenToInsideEmpty,
    OpenToInsideSodiumBound,
    OpenToInsideSodiumAndAtpBound,
    OpenToOutsideAwaitingPotassium,
    OpenToOutsidePotassiumBound,
}

impl PumpState {
    /// Whether `site` may gain an occupant in this state
    pub fn accepts(self, site: PumpSite) -> bool {
        match site.solute() {
            SoluteType::SodiumIon => self == PumpState::OpenToInsideEmpty,
            SoluteType::Atp => self == PumpState::OpenToInsideSodiumBound,
            SoluteType::PotassiumIon => self == PumpState::OpenToOutsideAwaitingPotassium,
            _ => false,
        }
    }

    /// Whether a particle may start heading for `site` in this state
    ///
    /// ATP may approach while sodium is still binding and waits at the site
    /// until the pump accepts it.
    fn allows_approach(self, site: PumpSite) -> bool {
        self.accepts(site) || (site == PumpSite::Atp && self == PumpState::OpenToInsideEmpty)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SodiumPotassiumPump {
    slot: SlotId,
    position: f64,
    half_thickness: f64,
    state: PumpState,
    time_since_state_transition: f64,
    /// Occupant of each site, indexed by `PumpSite`
    occupants: [Option<ParticleId>; 6],
    /// Set once the bound ATP has been split for this cycle
    atp_hydrolyzed: bool,
}

impl SodiumPotassiumPump {
    pub fn new(slot: SlotId, position: f64, half_thickness: f64) -> Self {
        Self {
            slot,
            position,
            half_thickness,
            state: PumpState::OpenToInsideEmpty,
            time_since_state_transition: 0.0,
            occupants: [None; 6],
            atp_hydrolyzed: false,
        }
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn state(&self) -> PumpState {
        self.state
    }

    pub fn is_atp_hydrolyzed(&self) -> bool {
        self.atp_hydrolyzed
    }

    pub fn occupant(&self, site: PumpSite) -> Option<ParticleId> {
        self.occupants[site.index()]
    }

    /// Occupied sites with their particles
    pub fn occupied_sites(&self) -> impl Iterator<Item = (PumpSite, ParticleId)> + '_ {
        PumpSite::ALL
            .into_iter()
            .filter_map(|site| self.occupant(site).map(|id| (site, id)))
    }

    pub fn bound_particle_count(&self) -> usize {
        self.occupants.iter().filter(|o| o.is_some()).count()
    }

    pub fn sodium_bound_count(&self) -> usize {
        PumpSite::SODIUM
            .iter()
            .filter(|site| self.occupant(**site).is_some())
            .count()
    }

    pub fn site_position(&self, site: PumpSite) -> DVec2 {
        let depth = match site {
            PumpSite::Atp => ATP_SITE_OFFSET_Y,
            _ => SITE_OFFSET_Y,
        };
        DVec2::new(
            self.position + site.offset(),
            site.side().sign() * (self.half_thickness + depth),
        )
    }

    /// Waypoint straight out from the site, passed before the final approach
    pub fn checkpoint(&self, site: PumpSite) -> DVec2 {
        self.site_position(site) + DVec2::new(0.0, site.side().sign() * CHECKPOINT_DISTANCE)
    }

    /// Site a `solute` arriving from `origin` at `x` may target, nearest first
    pub fn open_site_for(
        &self,
        solute: SoluteType,
        origin: Side,
        x: f64,
        is_open: impl Fn(PumpSite) -> bool,
    ) -> Option<PumpSite> {
        PumpSite::ALL
            .into_iter()
            .filter(|site| {
                site.solute() == solute
                    && site.side() == origin
                    && self.state.allows_approach(*site)
                    && self.occupant(*site).is_none()
                    && is_open(*site)
            })
            .min_by(|a, b| {
                let da = (self.site_position(*a).x - x).abs();
                let db = (self.site_position(*b).x - x).abs();
                da.total_cmp(&db)
            })
    }

    fn transition(&mut self, next: PumpState, events: &mut Vec<TransportEvent>) {
        let previous = std::mem::replace(&mut self.state, next);
        self.time_since_state_transition = 0.0;
        record_state_change(
            self.slot,
            ProteinState::Pump(previous),
            ProteinState::Pump(next),
            events,
        );
    }

    /// Bind `particle` at `site`
    ///
    /// Returns false and changes nothing when the current state does not
    /// accept the site.
    pub fn bind(
        &mut self,
        site: PumpSite,
        particle: ParticleId,
        species: ParticleSpecies,
        events: &mut Vec<TransportEvent>,
    ) -> bool {
        assert_eq!(
            species,
            ParticleSpecies::Solute(site.solute()),
            "{:?}: {:?} cannot bind at pump site {:?}",
            self.slot,
            species,
            site
        );
        if !self.state.accepts(site) {
            return false;
        }
        assert!(
            self.occupant(site).is_none(),
            "{:?}: pump site {:?} already holds {:?}",
            self.slot,
            site,
            self.occupant(site)
        );
        self.occupants[site.index()] = Some(particle);
        events.push(TransportEvent::SiteOccupied {
            slot: self.slot,
            site: BindingSite::Pump(site),
            particle,
        });

        match site.solute() {
            SoluteType::SodiumIon => {
                let count = self.sodium_bound_count();
                events.push(TransportEvent::SodiumBoundToPump {
                    slot: self.slot,
                    count,
                });
                if count == PumpSite::SODIUM.len() {
                    self.transition(PumpState::OpenToInsideSodiumBound, events);
                }
            }
            SoluteType::Atp => self.transition(PumpState::OpenToInsideSodiumAndAtpBound, events),
            _ => {
                let bound = PumpSite::POTASSIUM
                    .iter()
                    .all(|site| self.occupant(*site).is_some());
                if bound {
                    self.transition(PumpState::OpenToOutsidePotassiumBound, events);
                }
            }
        }
        true
    }

    /// Release `sites` into crossings toward the opposite side
    fn release_through(&mut self, sites: &[PumpSite], direction: CrossingDirection, ctx: &mut ProteinContext<'_>) {
        for site in sites {
            let Some(id) = self.occupants[site.index()].take() else {
                panic!("{:?}: pump releasing empty site {:?}", self.slot, site);
            };
            let index = self.index_of(id, ctx);
            ctx.particles[index].mode = ParticleMode::MovingThroughTransportProtein {
                slot: self.slot,
                protein_type: TransportProteinType::SodiumPotassiumPump,
                direction,
                offset: site.offset(),
            };
        }
    }

    fn index_of(&self, id: ParticleId, ctx: &ProteinContext<'_>) -> usize {
        match ctx.index_of(id) {
            Some(index) => index,
            None => panic!("{:?}: pump occupant {:?} is not a live particle", self.slot, id),
        }
    }

    /// Split the bound ATP into a released ADP and a phosphate held at the
    /// ATP site
    fn hydrolyze_atp(&mut self, ctx: &mut ProteinContext<'_>) {
        let Some(atp) = self.occupant(PumpSite::Atp) else {
            panic!("{:?}: pump in ATP-bound state without ATP", self.slot);
        };
        let index = self.index_of(atp, ctx);
        let atp_position = ctx.particles.remove(index).position();

        let walk = RandomWalk::new(ctx.rng);
        let adp = ctx.spawn(
            ParticleSpecies::Solute(SoluteType::Adp),
            atp_position,
            ParticleMode::RandomWalk(walk),
        );
        let adp = ctx.particles[adp].id();
        let phosphate = ctx.spawn(
            ParticleSpecies::Solute(SoluteType::Phosphate),
            self.site_position(PumpSite::Atp),
            ParticleMode::WaitingAtPumpSite {
                slot: self.slot,
                site: PumpSite::Atp,
            },
        );
        let phosphate = ctx.particles[phosphate].id();

        self.occupants[PumpSite::Atp.index()] = Some(phosphate);
        self.atp_hydrolyzed = true;
        ctx.events.push(TransportEvent::AtpHydrolyzed {
            slot: self.slot,
            atp,
            adp,
            phosphate,
        });
        log::debug!("{:?}: ATP {:?} hydrolyzed", self.slot, atp);
    }

    pub fn step(&mut self, dt: f64, ctx: &mut ProteinContext<'_>) {
        self.time_since_state_transition += dt;
        let elapsed = self.time_since_state_transition;
        match self.state {
            PumpState::OpenToInsideEmpty
            | PumpState::OpenToInsideSodiumBound
            | PumpState::OpenToOutsideAwaitingPotassium => {}
            PumpState::OpenToInsideSodiumAndAtpBound => {
                if !self.atp_hydrolyzed {
                    self.hydrolyze_atp(ctx);
                } else if elapsed >= CONFORMATION_CHANGE_DELAY_SEC {
                    self.transition(PumpState::OpenToOutsideAwaitingPotassium, ctx.events);
                    self.release_through(&PumpSite::SODIUM, CrossingDirection::Outward, ctx);
                }
            }
            PumpState::OpenToOutsidePotassiumBound => {
                if elapsed >= CONFORMATION_CHANGE_DELAY_SEC {
                    self.transition(PumpState::OpenToInsideEmpty, ctx.events);
                    self.release_through(&PumpSite::POTASSIUM, CrossingDirection::Inward, ctx);

                    let Some(phosphate) = self.occupants[PumpSite::Atp.index()].take() else {
                        panic!("{:?}: pump finished a cycle without a phosphate", self.slot);
                    };
                    let index = self.index_of(phosphate, ctx);
                    ctx.release_to_random_walk(index);
                    self.atp_hydrolyzed = false;
                    ctx.events.push(TransportEvent::PhosphateReleased {
                        slot: self.slot,
                        phosphate,
                    });
                }
            }
        }
    }
}
