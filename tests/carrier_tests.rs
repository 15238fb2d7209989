//! Integration tests for the sodium-glucose cotransporter and the
//! sodium-potassium pump
//!
//! Tests validate:
//! - The cotransporter flips only once all three sites are occupied
//! - All three occupants cross together and the carrier turns back outward
//! - One full pump cycle: sodium, ATP hydrolysis, sodium out, potassium in
//! - Binds refused in the wrong pump state leave everything unchanged

mod common;

use common::*;
use glam::DVec2;

use membrane_transport::geometry::CrossingDirection;
use membrane_transport::model::{BindingSite, TransportEvent};
use membrane_transport::particle::{ParticleId, ParticleMode, ParticleSpecies, SoluteType};
use membrane_transport::proteins::{
    CotransporterState, ProteinState, PumpSite, PumpState, SodiumGlucoseSite, TransportProteinType,
};
use membrane_transport::{MembraneTransportModel, Side};

const SODIUM: ParticleSpecies = ParticleSpecies::Solute(SoluteType::SodiumIon);
const POTASSIUM: ParticleSpecies = ParticleSpecies::Solute(SoluteType::PotassiumIon);
const GLUCOSE: ParticleSpecies = ParticleSpecies::Solute(SoluteType::Glucose);
const ATP: ParticleSpecies = ParticleSpecies::Solute(SoluteType::Atp);

/// Particle already past its checkpoint and sitting on the pump site
fn at_pump_site(model: &MembraneTransportModel, site: PumpSite) -> (ParticleSpecies, DVec2, ParticleMode) {
    let pump = pump(model, CENTER);
    let target_position = pump.site_position(site);
    (
        ParticleSpecies::Solute(site.solute()),
        target_position,
        ParticleMode::MoveToPumpSite {
            slot: CENTER,
            site,
            start_position: pump.checkpoint(site),
            checkpoint: pump.checkpoint(site),
            target_position,
            has_reached_checkpoint: true,
        },
    )
}

fn pump_with_sodium(with_atp: bool) -> (MembraneTransportModel, Vec<ParticleId>) {
    let model = model_with(&[(CENTER, TransportProteinType::SodiumPotassiumPump)]);
    let mut particles: Vec<_> = PumpSite::SODIUM
        .into_iter()
        .map(|site| at_pump_site(&model, site))
        .collect();
    if with_atp {
        particles.push(at_pump_site(&model, PumpSite::Atp));
    }
    insert_particles(&model, &particles)
}

#[test]
fn test_cotransporter_waits_for_all_three_sites() {
    let model = model_with(&[(CENTER, TransportProteinType::SodiumGlucoseCotransporter)]);
    let transporter = cotransporter(&model, CENTER);
    let left = transporter.site_position(SodiumGlucoseSite::Left);
    let center = transporter.site_position(SodiumGlucoseSite::Center);
    let right = transporter.site_position(SodiumGlucoseSite::Right);
    let (mut model, ids) = insert_particles(
        &model,
        &[
            (
                SODIUM,
                left,
                ParticleMode::WaitingAtSodiumGlucoseSite {
                    slot: CENTER,
                    site: SodiumGlucoseSite::Left,
                },
            ),
            (
                GLUCOSE,
                center,
                ParticleMode::WaitingAtSodiumGlucoseSite {
                    slot: CENTER,
                    site: SodiumGlucoseSite::Center,
                },
            ),
            (
                SODIUM,
                right,
                ParticleMode::MoveToSodiumGlucoseSite {
                    slot: CENTER,
                    site: SodiumGlucoseSite::Right,
                },
            ),
        ],
    );

    // Two waiting occupants are not enough; the third arrives this tick
    let events = step(&mut model);
    assert_eq!(cotransporter(&model, CENTER).state(), CotransporterState::OpenToOutside);
    assert!(events.contains(&TransportEvent::SiteOccupied {
        slot: CENTER,
        site: BindingSite::SodiumGlucose(SodiumGlucoseSite::Right),
        particle: ids[2],
    }));

    let events = step(&mut model);
    assert_eq!(cotransporter(&model, CENTER).state(), CotransporterState::OpenToInside);
    assert!(events.contains(&TransportEvent::ProteinStateChanged {
        slot: CENTER,
        previous: ProteinState::Cotransporter(CotransporterState::OpenToOutside),
        current: ProteinState::Cotransporter(CotransporterState::OpenToInside),
    }));
    for (id, site) in ids.iter().zip(SodiumGlucoseSite::ALL) {
        match mode_of(&model, *id) {
            ParticleMode::MovingThroughTransportProtein {
                slot,
                protein_type,
                direction,
                offset,
            } => {
                assert_eq!(slot, CENTER);
                assert_eq!(protein_type, TransportProteinType::SodiumGlucoseCotransporter);
                assert_eq!(direction, CrossingDirection::Inward);
                assert_eq!(offset, site.lane_offset());
            }
            other => panic!("{:?} should be moving through, found {:?}", id, other),
        }
    }
}

#[test]
fn test_cotransporter_moves_all_three_inward_then_resets() {
    let model = model_with(&[(CENTER, TransportProteinType::SodiumGlucoseCotransporter)]);
    let transporter = cotransporter(&model, CENTER);
    let particles: Vec<_> = SodiumGlucoseSite::ALL
        .into_iter()
        .map(|site| {
            (
                ParticleSpecies::Solute(site.solute()),
                transporter.site_position(site),
                ParticleMode::WaitingAtSodiumGlucoseSite { slot: CENTER, site },
            )
        })
        .collect();
    let (mut model, ids) = insert_particles(&model, &particles);

    let mut crossed = Vec::new();
    let mut reopened = false;
    for _ in 0..40 {
        let events = step(&mut model);
        crossed.extend(crossings(&events));
        if events.contains(&TransportEvent::ProteinStateChanged {
            slot: CENTER,
            previous: ProteinState::Cotransporter(CotransporterState::OpenToInside),
            current: ProteinState::Cotransporter(CotransporterState::OpenToOutside),
        }) {
            reopened = true;
            break;
        }
    }

    crossed.sort();
    assert_eq!(crossed, ids);
    assert!(reopened);
    for id in &ids {
        assert!(mode_of(&model, *id).is_random_walk());
        assert_eq!(model.particle(*id).unwrap().side(), Side::Inside);
    }
}

#[test]
fn test_potassium_at_empty_pump_is_not_bound() {
    let model = model_with(&[(CENTER, TransportProteinType::SodiumPotassiumPump)]);
    let potassium = at_pump_site(&model, PumpSite::Potassium1);
    assert_eq!(potassium.0, POTASSIUM);
    let (mut model, ids) = insert_particles(&model, &[potassium]);

    let events = step(&mut model);
    assert!(events.is_empty());
    assert!(matches!(mode_of(&model, ids[0]), ParticleMode::MoveToPumpSite { .. }));
    assert_eq!(pump(&model, CENTER).state(), PumpState::OpenToInsideEmpty);
    assert_eq!(pump(&model, CENTER).bound_particle_count(), 0);
}

#[test]
fn test_pump_without_atp_holds_sodium() {
    let (mut model, ids) = pump_with_sodium(false);
    let events = step(&mut model);
    let counts: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            TransportEvent::SodiumBoundToPump { count, .. } => Some(*count),
            _ => None,
        })
        .collect();
    assert_eq!(counts, vec![1, 2, 3]);

    for _ in 0..20 {
        step(&mut model);
    }
    assert_eq!(pump(&model, CENTER).state(), PumpState::OpenToInsideSodiumBound);
    for id in &ids {
        assert!(matches!(mode_of(&model, *id), ParticleMode::WaitingAtPumpSite { .. }));
        assert!(!model.begin_user_control(*id));
    }
}

#[test]
fn test_pump_full_cycle() {
    let (mut model, ids) = pump_with_sodium(true);
    let sodium = &ids[..3];
    let atp = ids[3];
    assert_eq!(model.particle(atp).unwrap().species(), ATP);

    // Tick 1: three sodium bind one at a time, then ATP
    let events = step(&mut model);
    assert_eq!(pump(&model, CENTER).state(), PumpState::OpenToInsideSodiumAndAtpBound);
    assert!(events.contains(&TransportEvent::SodiumBoundToPump { slot: CENTER, count: 3 }));
    assert_eq!(pump(&model, CENTER).bound_particle_count(), 4);

    // Tick 2: ATP is split on the pump's next step
    let events = step(&mut model);
    let (adp, phosphate) = events
        .iter()
        .find_map(|e| match *e {
            TransportEvent::AtpHydrolyzed { slot, atp: split, adp, phosphate } => {
                assert_eq!(slot, CENTER);
                assert_eq!(split, atp);
                Some((adp, phosphate))
            }
            _ => None,
        })
        .expect("ATP should be hydrolyzed");
    assert!(model.particle(atp).is_none());
    assert!(mode_of(&model, adp).is_random_walk());
    assert_eq!(
        model.particle(adp).unwrap().species(),
        ParticleSpecies::Solute(SoluteType::Adp)
    );
    assert_eq!(
        mode_of(&model, phosphate),
        ParticleMode::WaitingAtPumpSite {
            slot: CENTER,
            site: PumpSite::Atp
        }
    );
    assert_eq!(pump(&model, CENTER).occupant(PumpSite::Atp), Some(phosphate));

    // 0.5 s after ATP bound the pump opens outward and releases sodium
    for _ in 0..2 {
        step(&mut model);
        assert_eq!(pump(&model, CENTER).state(), PumpState::OpenToInsideSodiumAndAtpBound);
    }
    step(&mut model);
    assert_eq!(pump(&model, CENTER).state(), PumpState::OpenToOutsideAwaitingPotassium);
    for (id, site) in sodium.iter().zip(PumpSite::SODIUM) {
        match mode_of(&model, *id) {
            ParticleMode::MovingThroughTransportProtein { direction, offset, .. } => {
                assert_eq!(direction, CrossingDirection::Outward);
                assert_eq!(offset, site.offset());
            }
            other => panic!("sodium {:?} should be moving out, found {:?}", id, other),
        }
    }

    // Potassium binds from outside
    let potassium: Vec<_> = PumpSite::POTASSIUM
        .into_iter()
        .map(|site| at_pump_site(&model, site))
        .collect();
    let (mut model, potassium) = insert_particles(&model, &potassium);
    step(&mut model);
    assert_eq!(pump(&model, CENTER).state(), PumpState::OpenToOutsidePotassiumBound);

    let mut released = Vec::new();
    for _ in 0..4 {
        released.extend(step(&mut model));
    }
    assert_eq!(pump(&model, CENTER).state(), PumpState::OpenToInsideEmpty);
    assert!(released.contains(&TransportEvent::PhosphateReleased { slot: CENTER, phosphate }));
    assert!(mode_of(&model, phosphate).is_random_walk());
    assert_eq!(pump(&model, CENTER).bound_particle_count(), 0);
    assert!(!pump(&model, CENTER).is_atp_hydrolyzed());
    for id in &potassium {
        assert!(matches!(
            mode_of(&model, *id),
            ParticleMode::MovingThroughTransportProtein {
                direction: CrossingDirection::Inward,
                ..
            }
        ));
    }
}
