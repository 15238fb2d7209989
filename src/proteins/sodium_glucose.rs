//! Sodium-glucose cotransporter.
//!
//! Two sodium ions and one glucose wait at outside sites; once all three are
//! in place the carrier turns to face the cytoplasm and moves them in
//! together.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::{record_state_change, ProteinContext, ProteinState, TransportProteinType};
use crate::geometry::CrossingDirection;
use crate::model::{SlotId, TransportEvent};
use crate::particle::{ParticleMode, SoluteType};

/// Time the carrier stays open to the inside after its last crossing (s)
pub const OPEN_TO_INSIDE_DURATION_SEC: f64 = 0.5;

/// Height of the waiting sites above the membrane face
const SITE_OFFSET_Y: f64 = 3.0;
const SODIUM_SITE_OFFSET_X: f64 = 5.0;
/// Lateral offset of the sodium crossing lanes from the axis
const SODIUM_LANE_OFFSET: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SodiumGlucoseSite {
    /// Sodium
    Left,
    /// Glucose
    Center,
    /// Sodium
    Right,
}

impl SodiumGlucoseSite {
    pub const ALL: [SodiumGlucoseSite; 3] = [
        SodiumGlucoseSite::Left,
        SodiumGlucoseSite::Center,
        SodiumGlucoseSite::Right,
    ];

    pub fn solute(self) -> SoluteType {
        match self {
            SodiumGlucoseSite::Center => SoluteType::Glucose,
            SodiumGlucoseSite::Left | SodiumGlucoseSite::Right => SoluteType::SodiumIon,
        }
    }

    fn site_offset(self) -> f64 {
        match self {
            SodiumGlucoseSite::Left => -SODIUM_SITE_OFFSET_X,
            SodiumGlucoseSite::Center => 0.0,
            SodiumGlucoseSite::Right => SODIUM_SITE_OFFSET_X,
        }
    }

    /// Lateral offset of the lane this site's occupant crosses in
    pub fn lane_offset(self) -> f64 {
        match self {
            SodiumGlucoseSite::Left => -SODIUM_LANE_OFFSET,
            SodiumGlucoseSite::Center => 0.0,
            SodiumGlucoseSite::Right => SODIUM_LANE_OFFSET,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CotransporterState {
    OpenToOutside,
    OpenToInside,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SodiumGlucoseCotransporter {
    slot: SlotId,
    position: f64,
    half_thickness: f64,
    state: CotransporterState,
    time_since_state_transition: f64,
}

impl SodiumGlucoseCotransporter {
    pub fn new(slot: SlotId, position: f64, half_thickness: f64) -> Self {
        Self {
            slot,
            position,
            half_thickness,
            state: CotransporterState::OpenToOutside,
            time_since_state_transition: 0.0,
        }
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn state(&self) -> CotransporterState {
        self.state
    }

    pub fn site_position(&self, site: SodiumGlucoseSite) -> DVec2 {
        DVec2::new(
            self.position + site.site_offset(),
            self.half_thickness + SITE_OFFSET_Y,
        )
    }

    /// Site a `solute` arriving at `x` may target, nearest first
    ///
    /// Only an outward-facing carrier accepts new occupants. `is_open` says
    /// whether no mode targets or waits at a site.
    pub fn open_site_for(
        &self,
        solute: SoluteType,
        x: f64,
        is_open: impl Fn(SodiumGlucoseSite) -> bool,
    ) -> Option<SodiumGlucoseSite> {
        if self.state != CotransporterState::OpenToOutside {
            return None;
        }
        SodiumGlucoseSite::ALL
            .into_iter()
            .filter(|site| site.solute() == solute && is_open(*site))
            .min_by(|a, b| {
                let da = (self.site_position(*a).x - x).abs();
                let db = (self.site_position(*b).x - x).abs();
                da.total_cmp(&db)
            })
    }

    fn transition(&mut self, next: CotransporterState, events: &mut Vec<TransportEvent>) {
        let previous = std::mem::replace(&mut self.state, next);
        self.time_since_state_transition = 0.0;
        record_state_change(
            self.slot,
            ProteinState::Cotransporter(previous),
            ProteinState::Cotransporter(next),
            events,
        );
    }

    /// Called when a particle finishes crossing through this carrier
    pub fn force_open_to_inside(&mut self, events: &mut Vec<TransportEvent>) {
        self.transition(CotransporterState::OpenToInside, events);
    }

    pub fn step(&mut self, dt: f64, ctx: &mut ProteinContext<'_>) {
        self.time_since_state_transition += dt;
        match self.state {
            CotransporterState::OpenToOutside => {
                let slot = self.slot;
                let waiting: Vec<(usize, SodiumGlucoseSite)> = SodiumGlucoseSite::ALL
                    .into_iter()
                    .filter_map(|site| {
                        ctx.find_particle(|mode| *mode == ParticleMode::WaitingAtSodiumGlucoseSite { slot, site })
                            .map(|index| (index, site))
                    })
                    .collect();
                if waiting.len() < SodiumGlucoseSite::ALL.len() {
                    return;
                }
                self.transition(CotransporterState::OpenToInside, ctx.events);
                for (index, site) in waiting {
                    ctx.particles[index].mode = ParticleMode::MovingThroughTransportProtein {
                        slot,
                        protein_type: TransportProteinType::SodiumGlucoseCotransporter,
                        direction: CrossingDirection::Inward,
                        offset: site.lane_offset(),
                    };
                }
                log::debug!("{:?}: cotransporter moving two sodium and one glucose inward", slot);
            }
            CotransporterState::OpenToInside => {
                if self.time_since_state_transition >= OPEN_TO_INSIDE_DURATION_SEC
                    && !ctx.has_particles_moving_toward_or_through(self.slot)
                {
                    self.transition(CotransporterState::OpenToOutside, ctx.events);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transporter() -> SodiumGlucoseCotransporter {
        SodiumGlucoseCotransporter::new(SlotId(0), 28.0, 10.0)
    }

    #[test]
    fn test_site_positions_are_outside() {
        let transporter = transporter();
        for site in SodiumGlucoseSite::ALL {
            assert!(transporter.site_position(site).y > 10.0);
        }
        assert_eq!(transporter.site_position(SodiumGlucoseSite::Left).x, 23.0);
    }

    #[test]
    fn test_sodium_picks_nearest_open_site() {
        let transporter = transporter();
        let all_open = |_| true;
        assert_eq!(
            transporter.open_site_for(SoluteType::SodiumIon, 35.0, all_open),
            Some(SodiumGlucoseSite::Right)
        );
        assert_eq!(
            transporter.open_site_for(SoluteType::SodiumIon, 35.0, |s| s != SodiumGlucoseSite::Right),
            Some(SodiumGlucoseSite::Left)
        );
        assert_eq!(
            transporter.open_site_for(SoluteType::Glucose, 0.0, all_open),
            Some(SodiumGlucoseSite::Center)
        );
        assert_eq!(transporter.open_site_for(SoluteType::PotassiumIon, 28.0, all_open), None);
    }

    #[test]
    fn test_inward_facing_carrier_accepts_nothing() {
        let mut transporter = transporter();
        let mut events = Vec::new();
        transporter.force_open_to_inside(&mut events);
        assert_eq!(transporter.state(), CotransporterState::OpenToInside);
        assert_eq!(transporter.open_site_for(SoluteType::Glucose, 28.0, |_| true), None);
        // Carriers have no openness, so only the state change is reported
        assert_eq!(events.len(), 1);
    }
}
