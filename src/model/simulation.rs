//! The membrane transport model: slots, particles and the per-tick driver.

use glam::DVec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{SiteReservations, Slot, SlotId, TransportEvent};
use crate::config::TransportParameters;
use crate::geometry::{CrossingDirection, MembraneLayout, Side};
use crate::particle::{
    LigandType, ModeContext, Particle, ParticleId, ParticleIdAllocator, ParticleMode,
    ParticleSpecies, RandomWalk, SoluteType,
};
use crate::proteins::{MembranePotential, ProteinContext, TransportProtein, TransportProteinType};

/// Owns every slot and particle and advances them one tick at a time
#[derive(Debug)]
pub struct MembraneTransportModel {
    pub(super) params: TransportParameters,
    pub(super) layout: MembraneLayout,
    pub(super) slots: Vec<Slot>,
    pub(super) particles: Vec<Particle>,
    pub(super) ids: ParticleIdAllocator,
    pub(super) membrane_potential: MembranePotential,
    pub(super) time: f64,
    pub(super) ligands_added: bool,
    pub(super) rng: StdRng,
    pub(super) events: Vec<TransportEvent>,
}

impl MembraneTransportModel {
    /// Empty membrane seeded from `params.seed`
    pub fn new(params: TransportParameters) -> Self {
        let rng = StdRng::seed_from_u64(params.seed);
        Self::with_rng(params, rng)
    }

    /// Empty membrane driven by an injected random source
    pub fn with_rng(params: TransportParameters, rng: StdRng) -> Self {
        let layout = MembraneLayout::new(&params.geometry);
        let slots = (0..params.geometry.slot_count)
            .map(|i| Slot::new(SlotId(i), params.slot_position(i)))
            .collect();
        log::debug!(
            "membrane with {} slots, band |y| <= {}",
            params.geometry.slot_count,
            layout.half_thickness()
        );
        Self {
            params,
            layout,
            slots,
            particles: Vec::new(),
            ids: ParticleIdAllocator::default(),
            membrane_potential: MembranePotential::default(),
            time: 0.0,
            ligands_added: false,
            rng,
            events: Vec::new(),
        }
    }

    /// Advance the simulation by `dt` seconds
    ///
    /// Proteins step first, then particles. A crossing event is emitted for
    /// every particle whose center changed side during its step.
    pub fn step(&mut self, dt: f64) {
        assert!(dt.is_finite() && dt >= 0.0, "invalid time step {}", dt);
        self.time += dt;

        let mut protein_ctx = ProteinContext {
            membrane_potential: self.membrane_potential,
            particles: &mut self.particles,
            ids: &mut self.ids,
            rng: &mut self.rng,
            events: &mut self.events,
        };
        for slot in self.slots.iter_mut() {
            if let Some(protein) = slot.protein_mut() {
                protein.step(dt, &mut protein_ctx);
            }
        }

        let mut reservations = SiteReservations::from_particles(&self.particles);
        let mut mode_ctx = ModeContext {
            layout: &self.layout,
            kinematics: &self.params.kinematics,
            slots: &mut self.slots,
            reservations: &mut reservations,
            rng: &mut self.rng,
            events: &mut self.events,
        };
        for particle in self.particles.iter_mut() {
            let before = particle.side();
            particle.step(dt, &mut mode_ctx);
            if particle.side() != before {
                mode_ctx.events.push(TransportEvent::ParticleCrossedMembrane {
                    particle: particle.id(),
                    species: particle.species(),
                    direction: CrossingDirection::leaving(before),
                });
            }
        }
    }

    /// Fill or clear a slot
    ///
    /// Any particle interacting with the previous protein is returned to a
    /// random walk before the protein is dropped.
    pub fn set_slot_contents(&mut self, slot: SlotId, kind: Option<TransportProteinType>) {
        let position = self.slot(slot).position();
        if self.slot(slot).is_filled() {
            self.release_particles_of(slot);
        }
        let protein = kind.map(|kind| {
            TransportProtein::new(kind, slot, position, &self.layout, self.membrane_potential)
        });
        let previous = self.slots[slot.0].replace_protein(protein);
        log::info!(
            "{:?}: {:?} -> {:?}",
            slot,
            previous.map(|p| p.kind()),
            kind
        );
    }

    fn release_particles_of(&mut self, slot: SlotId) {
        for particle in self.particles.iter_mut() {
            if particle.mode.slot() == Some(slot) {
                log::debug!("{:?} released from {:?}", particle.id(), slot);
                particle.mode = ParticleMode::RandomWalk(RandomWalk::new(&mut self.rng));
            }
        }
    }

    /// Uniform random position inside the compartment on `side`
    fn random_position(&mut self, species: ParticleSpecies, side: Side) -> DVec2 {
        let area = self.layout.compartment(side).eroded(species.footprint() * 0.5);
        DVec2::new(
            self.rng.gen_range(area.min.x..=area.max.x),
            self.rng.gen_range(area.min.y..=area.max.y),
        )
    }

    fn spawn(&mut self, species: ParticleSpecies, position: DVec2) -> ParticleId {
        let id = self.ids.allocate();
        let walk = RandomWalk::new(&mut self.rng);
        self.particles
            .push(Particle::new(id, species, position, ParticleMode::RandomWalk(walk)));
        id
    }

    /// Add `count` solutes at random positions on `side`
    pub fn add_solutes(&mut self, solute: SoluteType, side: Side, count: usize) {
        let species = ParticleSpecies::Solute(solute);
        for _ in 0..count {
            let position = self.random_position(species, side);
            self.spawn(species, position);
        }
        log::debug!("added {} {:?} {:?}", count, solute, side);
    }

    /// Remove up to `count` free solutes from `side`, newest first
    ///
    /// Only random-walking particles are removed. Returns how many were.
    pub fn remove_solutes(&mut self, solute: SoluteType, side: Side, count: usize) -> usize {
        let mut removed = 0;
        let mut index = self.particles.len();
        while index > 0 && removed < count {
            index -= 1;
            let particle = &self.particles[index];
            if particle.is_solute(solute) && particle.side() == side && particle.mode.is_random_walk() {
                self.particles.remove(index);
                removed += 1;
            }
        }
        log::debug!("removed {} {:?} {:?}", removed, solute, side);
        removed
    }

    /// Drop one particle at `position`, kept inside the compartment it lands in
    pub fn add_particle_at(&mut self, species: ParticleSpecies, position: DVec2) -> ParticleId {
        let position = self.clamp_to_compartment(species, position);
        self.spawn(species, position)
    }

    fn clamp_to_compartment(&self, species: ParticleSpecies, position: DVec2) -> DVec2 {
        let area = self
            .layout
            .compartment(Side::of_y(position.y))
            .eroded(species.footprint() * 0.5);
        position.clamp(area.min, area.max)
    }

    /// Set the membrane potential; voltage-gated channels react at once
    pub fn set_membrane_voltage_potential(&mut self, potential: MembranePotential) {
        if potential == self.membrane_potential {
            return;
        }
        log::info!(
            "membrane potential {} mV -> {} mV",
            self.membrane_potential.millivolts(),
            potential.millivolts()
        );
        self.membrane_potential = potential;
        for slot in self.slots.iter_mut() {
            if let Some(TransportProtein::VoltageGated(channel)) = slot.protein_mut() {
                channel.set_membrane_potential(potential, &mut self.events);
            }
        }
    }

    /// Place the ligand pool in the outside compartment
    pub fn add_ligands(&mut self) {
        if self.ligands_added {
            return;
        }
        for ligand in LigandType::ALL {
            let species = ParticleSpecies::Ligand(ligand);
            for _ in 0..self.params.ligands_per_type {
                let position = self.random_position(species, Side::Outside);
                self.spawn(species, position);
            }
        }
        self.ligands_added = true;
        log::info!("added {} ligands of each type", self.params.ligands_per_type);
    }

    /// Unbind and remove every ligand
    pub fn remove_ligands(&mut self) {
        for particle in self.particles.iter() {
            if let ParticleMode::LigandBound { slot } = particle.mode {
                if let Some(TransportProtein::LigandGated(channel)) = self.slots[slot.0].protein_mut() {
                    channel.detach_ligand(&mut self.events);
                }
            }
        }
        self.particles.retain(|p| !matches!(p.species(), ParticleSpecies::Ligand(_)));
        self.ligands_added = false;
        log::info!("removed ligands");
    }

    pub fn are_ligands_added(&self) -> bool {
        self.ligands_added
    }

    fn particle_index(&self, id: ParticleId) -> Option<usize> {
        self.particles.iter().position(|p| p.id() == id)
    }

    /// Mark a particle as hovered or not
    ///
    /// Only a random-walking particle can become hovered. Returns whether
    /// the mode changed.
    pub fn set_user_over(&mut self, id: ParticleId, over: bool) -> bool {
        let Some(index) = self.particle_index(id) else {
            return false;
        };
        let particle = &mut self.particles[index];
        match (over, particle.mode) {
            (true, ParticleMode::RandomWalk(_)) => {
                particle.mode = ParticleMode::UserOver;
                true
            }
            (false, ParticleMode::UserOver) => {
                particle.mode = ParticleMode::RandomWalk(RandomWalk::new(&mut self.rng));
                true
            }
            _ => false,
        }
    }

    /// Start dragging a particle
    ///
    /// Refused for particles inside the membrane or bound to the pump. A
    /// grabbed ligand is detached from its channel.
    pub fn begin_user_control(&mut self, id: ParticleId) -> bool {
        let Some(index) = self.particle_index(id) else {
            return false;
        };
        match self.particles[index].mode {
            ParticleMode::EnteringTransportProtein { .. }
            | ParticleMode::MovingThroughTransportProtein { .. }
            | ParticleMode::WaitingAtPumpSite { .. } => return false,
            ParticleMode::LigandBound { slot } => {
                if let Some(TransportProtein::LigandGated(channel)) = self.slots[slot.0].protein_mut() {
                    channel.detach_ligand(&mut self.events);
                }
            }
            _ => {}
        }
        self.particles[index].mode = ParticleMode::UserControlled;
        true
    }

    /// Move a dragged particle, kept inside the world
    pub fn drag_particle_to(&mut self, id: ParticleId, position: DVec2) -> bool {
        let Some(index) = self.particle_index(id) else {
            return false;
        };
        if self.particles[index].mode != ParticleMode::UserControlled {
            return false;
        }
        let half = self.particles[index].footprint() * 0.5;
        let min = DVec2::new(self.layout.inside.min.x, self.layout.inside.min.y) + half;
        let max = DVec2::new(self.layout.outside.max.x, self.layout.outside.max.y) - half;
        self.particles[index].position = position.clamp(min, max);
        true
    }

    /// Drop a dragged particle; it resumes a random walk on its side
    pub fn end_user_control(&mut self, id: ParticleId) -> bool {
        let Some(index) = self.particle_index(id) else {
            return false;
        };
        if self.particles[index].mode != ParticleMode::UserControlled {
            return false;
        }
        let species = self.particles[index].species();
        let position = self.clamp_to_compartment(species, self.particles[index].position);
        let walk = RandomWalk::new(&mut self.rng);
        let particle = &mut self.particles[index];
        particle.position = position;
        particle.mode = ParticleMode::RandomWalk(walk);
        true
    }

    /// Number of particles of `species` whose center is on `side`
    pub fn count_particles(&self, species: ParticleSpecies, side: Side) -> usize {
        self.particles
            .iter()
            .filter(|p| p.species() == species && p.side() == side)
            .count()
    }

    /// Empty every slot, remove every particle and restore resting potential
    pub fn reset(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.replace_protein(None);
        }
        self.particles.clear();
        self.ids = ParticleIdAllocator::default();
        self.membrane_potential = MembranePotential::default();
        self.time = 0.0;
        self.ligands_added = false;
        self.events.clear();
        log::info!("model reset");
    }

    /// Take every event emitted since the last call
    pub fn drain_events(&mut self) -> Vec<TransportEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn params(&self) -> &TransportParameters {
        &self.params
    }

    pub fn layout(&self) -> &MembraneLayout {
        &self.layout
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// # Panics
    /// If `id` is out of range.
    pub fn slot(&self, id: SlotId) -> &Slot {
        match self.slots.get(id.0) {
            Some(slot) => slot,
            None => panic!("{:?} out of range ({} slots)", id, self.slots.len()),
        }
    }

    pub fn protein(&self, id: SlotId) -> Option<&TransportProtein> {
        self.slot(id).protein()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.iter().find(|p| p.id() == id)
    }

    pub fn membrane_potential(&self) -> MembranePotential {
        self.membrane_potential
    }

    /// Simulation time in seconds
    pub fn time(&self) -> f64 {
        self.time
    }
}
