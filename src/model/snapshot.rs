//! Serializable model state and validated restore.
//!
//! The random source is not part of a snapshot; restoring takes a fresh
//! `StdRng`. A snapshot that encodes an impossible combination is rejected
//! rather than repaired.

use std::collections::HashSet;

use anyhow::{bail, ensure, Context};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::{MembraneTransportModel, SiteReservations, Slot, SlotId};
use crate::config::TransportParameters;
use crate::geometry::MembraneLayout;
use crate::particle::{
    Particle, ParticleId, ParticleIdAllocator, ParticleMode, ParticleSpecies, SoluteType,
};
use crate::proteins::{
    CotransporterState, LigandGatedState, MembranePotential, PumpSite, PumpState,
    SodiumPotassiumPump, TransportProtein, TransportProteinType, VoltageGatedState,
};

/// Full model state without the random source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub params: TransportParameters,
    pub time: f64,
    pub membrane_potential: MembranePotential,
    pub ligands_added: bool,
    pub next_particle_id: u64,
    pub slots: Vec<Slot>,
    pub particles: Vec<Particle>,
}

impl MembraneTransportModel {
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            params: self.params.clone(),
            time: self.time,
            membrane_potential: self.membrane_potential,
            ligands_added: self.ligands_added,
            next_particle_id: self.ids.peek(),
            slots: self.slots.clone(),
            particles: self.particles.clone(),
        }
    }

    /// Rebuild a model from `snapshot`, driven by `rng` from here on
    pub fn from_snapshot(snapshot: Snapshot, rng: StdRng) -> anyhow::Result<Self> {
        validate(&snapshot).context("invalid snapshot")?;
        let layout = MembraneLayout::new(&snapshot.params.geometry);
        log::info!(
            "restored model at t = {:.3} s with {} particles",
            snapshot.time,
            snapshot.particles.len()
        );
        Ok(Self {
            layout,
            params: snapshot.params,
            slots: snapshot.slots,
            particles: snapshot.particles,
            ids: ParticleIdAllocator::starting_at(snapshot.next_particle_id),
            membrane_potential: snapshot.membrane_potential,
            time: snapshot.time,
            ligands_added: snapshot.ligands_added,
            rng,
            events: Vec::new(),
        })
    }
}

fn validate(snapshot: &Snapshot) -> anyhow::Result<()> {
    let params = &snapshot.params;
    ensure!(
        snapshot.slots.len() == params.geometry.slot_count,
        "{} slots stored, geometry has {}",
        snapshot.slots.len(),
        params.geometry.slot_count
    );
    for (index, slot) in snapshot.slots.iter().enumerate() {
        validate_slot(snapshot, index, slot)?;
    }

    let mut ids = HashSet::new();
    for particle in &snapshot.particles {
        ensure!(ids.insert(particle.id()), "duplicate {:?}", particle.id());
        ensure!(
            particle.id().0 < snapshot.next_particle_id,
            "{:?} is not below the next id {}",
            particle.id(),
            snapshot.next_particle_id
        );
        validate_mode(snapshot, particle)?;
    }

    SiteReservations::try_from_particles(&snapshot.particles)?;
    Ok(())
}

fn validate_slot(snapshot: &Snapshot, index: usize, slot: &Slot) -> anyhow::Result<()> {
    ensure!(slot.id() == SlotId(index), "slot {} stored as {:?}", index, slot.id());
    ensure!(
        slot.position() == snapshot.params.slot_position(index),
        "{:?} at x = {}, expected {}",
        slot.id(),
        slot.position(),
        snapshot.params.slot_position(index)
    );
    let Some(protein) = slot.protein() else {
        return Ok(());
    };
    ensure!(
        protein.slot() == slot.id() && protein.position() == slot.position(),
        "{:?} holds a protein placed at {:?}, x = {}",
        slot.id(),
        protein.slot(),
        protein.position()
    );

    match protein {
        TransportProtein::VoltageGated(channel) => {
            let expected = VoltageGatedState::for_potential(channel.ion(), snapshot.membrane_potential);
            ensure!(
                channel.state() == expected,
                "{:?}: voltage-gated channel is {:?} at {} mV",
                slot.id(),
                channel.state(),
                snapshot.membrane_potential.millivolts()
            );
        }
        TransportProtein::LigandGated(channel) => {
            let bound: Vec<_> = snapshot
                .particles
                .iter()
                .filter(|p| p.mode() == &ParticleMode::LigandBound { slot: slot.id() })
                .map(Particle::id)
                .collect();
            ensure!(
                bound.len() <= 1 && bound.first().copied() == channel.bound_ligand(),
                "{:?}: channel holds {:?} but ligands {:?} are bound to it",
                slot.id(),
                channel.bound_ligand(),
                bound
            );
            let holds_ligand = matches!(
                channel.state(),
                LigandGatedState::LigandBoundClosed | LigandGatedState::LigandBoundOpen
            );
            ensure!(
                holds_ligand == channel.bound_ligand().is_some(),
                "{:?}: ligand-gated channel is {:?} with bound ligand {:?}",
                slot.id(),
                channel.state(),
                channel.bound_ligand()
            );
        }
        TransportProtein::Pump(pump) => {
            for site in PumpSite::ALL {
                let waiting: Vec<_> = snapshot
                    .particles
                    .iter()
                    .filter(|p| p.mode() == &ParticleMode::WaitingAtPumpSite { slot: slot.id(), site })
                    .map(Particle::id)
                    .collect();
                ensure!(
                    bound_matches(&waiting, pump.occupant(site)),
                    "{:?}: pump site {:?} holds {:?} but {:?} wait there",
                    slot.id(),
                    site,
                    pump.occupant(site),
                    waiting
                );
            }
            validate_pump_state(slot.id(), pump)?;
        }
        TransportProtein::Cotransporter(transporter) => {
            if transporter.state() == CotransporterState::OpenToInside {
                let uses_sites = snapshot.particles.iter().any(|p| {
                    matches!(
                        p.mode(),
                        ParticleMode::MoveToSodiumGlucoseSite { slot: s, .. }
                            | ParticleMode::WaitingAtSodiumGlucoseSite { slot: s, .. } if *s == slot.id()
                    )
                });
                ensure!(
                    !uses_sites,
                    "{:?}: cotransporter faces the cytoplasm but particles still use its outside sites",
                    slot.id()
                );
            }
        }
        TransportProtein::Leakage(_) => {}
    }
    Ok(())
}

/// Occupied pump sites must match what the pump's state says has bound
fn validate_pump_state(slot: SlotId, pump: &SodiumPotassiumPump) -> anyhow::Result<()> {
    let mut sodium = 0;
    let mut potassium = 0;
    let mut atp_site = false;
    for (site, _) in pump.occupied_sites() {
        match site.solute() {
            SoluteType::SodiumIon => sodium += 1,
            SoluteType::PotassiumIon => potassium += 1,
            _ => atp_site = true,
        }
    }
    let state = pump.state();
    let hydrolyzed = pump.is_atp_hydrolyzed();
    let consistent = match state {
        PumpState::OpenToInsideEmpty => sodium < 3 && !atp_site && potassium == 0 && !hydrolyzed,
        PumpState::OpenToInsideSodiumBound => sodium == 3 && !atp_site && potassium == 0 && !hydrolyzed,
        PumpState::OpenToInsideSodiumAndAtpBound => sodium == 3 && atp_site && potassium == 0,
        PumpState::OpenToOutsideAwaitingPotassium => sodium == 0 && atp_site && potassium < 2 && hydrolyzed,
        PumpState::OpenToOutsidePotassiumBound => sodium == 0 && atp_site && potassium == 2 && hydrolyzed,
    };
    ensure!(
        consistent,
        "{:?}: pump is {:?} (ATP hydrolyzed: {}) with {} sodium, {} potassium, ATP site {}",
        slot,
        state,
        hydrolyzed,
        sodium,
        potassium,
        if atp_site { "occupied" } else { "empty" }
    );
    Ok(())
}

/// Solute allowed at a pump site given whether the bound ATP has been split
fn pump_site_solute(site: PumpSite, pump: &SodiumPotassiumPump, waiting: bool) -> SoluteType {
    if waiting && site == PumpSite::Atp && pump.is_atp_hydrolyzed() {
        SoluteType::Phosphate
    } else {
        site.solute()
    }
}

fn bound_matches(waiting: &[ParticleId], occupant: Option<ParticleId>) -> bool {
    match occupant {
        Some(id) => waiting == [id],
        None => waiting.is_empty(),
    }
}

fn validate_mode(snapshot: &Snapshot, particle: &Particle) -> anyhow::Result<()> {
    let mode = particle.mode();
    let Some(slot) = mode.slot() else {
        return Ok(());
    };
    let Some(protein) = snapshot.slots.get(slot.0).and_then(Slot::protein) else {
        bail!("{:?} is {} in {:?}, which is empty", particle.id(), mode.name(), slot);
    };
    let species = particle.species();
    let consistent = match (*mode, protein) {
        (
            ParticleMode::MoveToCenterOfChannel { .. } | ParticleMode::EnteringTransportProtein { .. },
            TransportProtein::Leakage(_) | TransportProtein::VoltageGated(_) | TransportProtein::LigandGated(_),
        ) => carries(protein.kind(), species),
        (ParticleMode::MovingThroughTransportProtein { protein_type, .. }, _) => {
            protein_type == protein.kind() && carries(protein_type, species)
        }
        (
            ParticleMode::MoveToLigandBindingLocation { .. } | ParticleMode::LigandBound { .. },
            TransportProtein::LigandGated(channel),
        ) => species == ParticleSpecies::Ligand(channel.ligand_type()),
        (
            ParticleMode::MoveToSodiumGlucoseSite { site, .. } | ParticleMode::WaitingAtSodiumGlucoseSite { site, .. },
            TransportProtein::Cotransporter(_),
        ) => species == ParticleSpecies::Solute(site.solute()),
        (ParticleMode::MoveToPumpSite { site, .. }, TransportProtein::Pump(pump)) => {
            species == ParticleSpecies::Solute(pump_site_solute(site, pump, false))
        }
        (ParticleMode::WaitingAtPumpSite { site, .. }, TransportProtein::Pump(pump)) => {
            species == ParticleSpecies::Solute(pump_site_solute(site, pump, true))
        }
        _ => false,
    };
    ensure!(
        consistent,
        "{:?} ({:?}) is {} but {:?} holds {:?}",
        particle.id(),
        species,
        mode.name(),
        slot,
        protein.kind()
    );
    Ok(())
}

/// Whether a protein of `kind` can carry `species` across the membrane
fn carries(kind: TransportProteinType, species: ParticleSpecies) -> bool {
    use crate::particle::SoluteType::*;
    let Some(solute) = species.solute() else {
        return false;
    };
    match kind {
        TransportProteinType::SodiumLeakageChannel
        | TransportProteinType::SodiumVoltageGatedChannel
        | TransportProteinType::SodiumLigandGatedChannel => solute == SodiumIon,
        TransportProteinType::PotassiumLeakageChannel
        | TransportProteinType::PotassiumVoltageGatedChannel
        | TransportProteinType::PotassiumLigandGatedChannel => solute == PotassiumIon,
        TransportProteinType::SodiumGlucoseCotransporter => matches!(solute, SodiumIon | Glucose),
        TransportProteinType::SodiumPotassiumPump => matches!(solute, SodiumIon | PotassiumIon),
    }
}
