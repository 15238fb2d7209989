//! Shared helpers for integration tests

#![allow(dead_code)]

use glam::DVec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

use membrane_transport::model::{MembraneTransportModel, SlotId, TransportEvent};
use membrane_transport::particle::{Particle, ParticleId, ParticleMode, ParticleSpecies};
use membrane_transport::proteins::{
    LigandGatedChannel, SodiumGlucoseCotransporter, SodiumPotassiumPump, TransportProtein,
    TransportProteinType,
};
use membrane_transport::TransportParameters;

/// Time step that sums exactly in binary floating point
pub const DT: f64 = 0.125;

/// Slot at x = 0 with the default layout
pub const CENTER: SlotId = SlotId(3);

pub fn model_with(proteins: &[(SlotId, TransportProteinType)]) -> MembraneTransportModel {
    let mut model = MembraneTransportModel::new(TransportParameters::default());
    for (slot, kind) in proteins {
        model.set_slot_contents(*slot, Some(*kind));
    }
    model
}

/// Rebuild `model` with extra particles in chosen modes
pub fn insert_particles(
    model: &MembraneTransportModel,
    particles: &[(ParticleSpecies, DVec2, ParticleMode)],
) -> (MembraneTransportModel, Vec<ParticleId>) {
    let mut snapshot = model.snapshot();
    let mut ids = Vec::new();
    for (species, position, mode) in particles {
        let id = ParticleId(snapshot.next_particle_id);
        snapshot.next_particle_id += 1;
        snapshot.particles.push(Particle::new(id, *species, *position, *mode));
        ids.push(id);
    }
    let restored = MembraneTransportModel::from_snapshot(snapshot, StdRng::seed_from_u64(0xabc))
        .expect("test snapshot should be valid");
    (restored, ids)
}

pub fn mode_of(model: &MembraneTransportModel, id: ParticleId) -> ParticleMode {
    *model.particle(id).expect("particle should exist").mode()
}

pub fn ligand_channel(model: &MembraneTransportModel, slot: SlotId) -> &LigandGatedChannel {
    match model.protein(slot) {
        Some(TransportProtein::LigandGated(channel)) => channel,
        other => panic!("expected a ligand-gated channel, found {:?}", other),
    }
}

pub fn cotransporter(model: &MembraneTransportModel, slot: SlotId) -> &SodiumGlucoseCotransporter {
    match model.protein(slot) {
        Some(TransportProtein::Cotransporter(transporter)) => transporter,
        other => panic!("expected the cotransporter, found {:?}", other),
    }
}

pub fn pump(model: &MembraneTransportModel, slot: SlotId) -> &SodiumPotassiumPump {
    match model.protein(slot) {
        Some(TransportProtein::Pump(pump)) => pump,
        other => panic!("expected the pump, found {:?}", other),
    }
}

/// Step once and return the events of that tick
pub fn step(model: &mut MembraneTransportModel) -> Vec<TransportEvent> {
    model.step(DT);
    model.drain_events()
}

pub fn crossings(events: &[TransportEvent]) -> Vec<ParticleId> {
    events
        .iter()
        .filter_map(|e| match e {
            TransportEvent::ParticleCrossedMembrane { particle, .. } => Some(*particle),
            _ => None,
        })
        .collect()
}
