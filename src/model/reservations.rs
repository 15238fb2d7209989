//! Per-tick binding-site reservations.
//!
//! Rebuilt from the particle modes at the start of the particle phase. A
//! particle checks `is_open` before targeting a site and reserves it in the
//! same call, so two particles never claim one site within a tick.

use std::collections::HashSet;

use anyhow::bail;
use serde::{Deserialize, Serialize};

use super::SlotId;
use crate::particle::Particle;
use crate::proteins::{PumpSite, SodiumGlucoseSite};

/// A binding site on the protein in some slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BindingSite {
    /// The single ligand site of a ligand-gated channel
    Ligand,
    SodiumGlucose(SodiumGlucoseSite),
    Pump(PumpSite),
}

#[derive(Debug, Clone, Default)]
pub struct SiteReservations {
    taken: HashSet<(SlotId, BindingSite)>,
}

impl SiteReservations {
    /// Reservations implied by the current modes
    ///
    /// # Panics
    /// If two particles target the same site.
    pub fn from_particles(particles: &[Particle]) -> Self {
        match Self::try_from_particles(particles) {
            Ok(reservations) => reservations,
            Err(e) => panic!("{}", e),
        }
    }

    pub fn try_from_particles(particles: &[Particle]) -> anyhow::Result<Self> {
        let mut reservations = Self::default();
        for particle in particles {
            if let Some((slot, site)) = particle.mode().targeted_site() {
                if !reservations.taken.insert((slot, site)) {
                    bail!(
                        "{:?} at {:?} is claimed twice (second claim by {:?})",
                        site,
                        slot,
                        particle.id()
                    );
                }
            }
        }
        Ok(reservations)
    }

    pub fn is_open(&self, slot: SlotId, site: BindingSite) -> bool {
        !self.taken.contains(&(slot, site))
    }

    pub fn reserve(&mut self, slot: SlotId, site: BindingSite) {
        assert!(
            self.taken.insert((slot, site)),
            "{:?} at {:?} reserved while already taken",
            site,
            slot
        );
    }

    pub fn len(&self) -> usize {
        self.taken.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }
}
