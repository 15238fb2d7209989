//! Integration tests for channels and passive diffusion
//!
//! Tests validate:
//! - Ligand binding on an idle ligand-gated channel and its full cycle
//! - Rebinding delay after the channel closes
//! - Voltage-gated conformations and open/close notifications
//! - Passive diffusion and channel crossings emit one crossing event

mod common;

use common::*;
use glam::DVec2;

use membrane_transport::geometry::CrossingDirection;
use membrane_transport::model::{SlotId, TransportEvent};
use membrane_transport::particle::{LigandType, ParticleMode, ParticleSpecies, SoluteType};
use membrane_transport::proteins::{
    LigandGatedState, MembranePotential, ProteinState, TransportProtein, TransportProteinType,
    VoltageGatedState,
};
use membrane_transport::Side;

const STAR: ParticleSpecies = ParticleSpecies::Ligand(LigandType::Star);
const SODIUM: ParticleSpecies = ParticleSpecies::Solute(SoluteType::SodiumIon);

fn state_changes_to(events: &[TransportEvent], state: ProteinState) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, TransportEvent::ProteinStateChanged { current, .. } if *current == state))
        .count()
}

#[test]
fn test_ligand_on_binding_position_binds_then_opens() {
    let mut model = model_with(&[(CENTER, TransportProteinType::SodiumLigandGatedChannel)]);
    let binding_position = ligand_channel(&model, CENTER).binding_position();
    let ligand = model.add_particle_at(STAR, binding_position);

    let events = step(&mut model);
    assert_eq!(mode_of(&model, ligand), ParticleMode::LigandBound { slot: CENTER });
    assert_eq!(model.particle(ligand).unwrap().position(), binding_position);
    assert!(events.contains(&TransportEvent::LigandBound { slot: CENTER, ligand }));
    assert_eq!(ligand_channel(&model, CENTER).state(), LigandGatedState::LigandBoundClosed);

    // 0.5 s bound-closed: three more ticks stay closed, the fourth opens
    for _ in 0..3 {
        let events = step(&mut model);
        assert!(!events.contains(&TransportEvent::ChannelOpened { slot: CENTER }));
        assert_eq!(ligand_channel(&model, CENTER).state(), LigandGatedState::LigandBoundClosed);
    }
    let events = step(&mut model);
    assert_eq!(ligand_channel(&model, CENTER).state(), LigandGatedState::LigandBoundOpen);
    assert_eq!(
        events
            .iter()
            .filter(|e| **e == TransportEvent::ChannelOpened { slot: CENTER })
            .count(),
        1
    );
    assert!(ligand_channel(&model, CENTER).admits(SODIUM));
}

#[test]
fn test_ligand_gated_cycle_timing_and_rebinding_delay() {
    let mut model = model_with(&[(CENTER, TransportProteinType::SodiumLigandGatedChannel)]);
    let binding_position = ligand_channel(&model, CENTER).binding_position();
    let ligand = model.add_particle_at(STAR, binding_position);

    let mut bound_at = None;
    let mut opened_at = None;
    let mut unbound_at = None;
    let mut closed_at = None;
    for _ in 0..200 {
        let events = step(&mut model);
        let now = model.time();
        if events.iter().any(|e| matches!(e, TransportEvent::LigandBound { .. })) {
            bound_at.get_or_insert(now);
        }
        if state_changes_to(&events, ProteinState::LigandGated(LigandGatedState::LigandBoundOpen)) > 0 {
            opened_at = Some(now);
        }
        if events.contains(&TransportEvent::LigandUnbound { slot: CENTER, ligand }) {
            unbound_at = Some(now);
            assert!(mode_of(&model, ligand).is_random_walk());
        }
        if state_changes_to(&events, ProteinState::LigandGated(LigandGatedState::Closed)) > 0 {
            closed_at = Some(now);
            break;
        }
    }
    let bound_at = bound_at.expect("ligand should bind");
    assert_eq!(opened_at, Some(bound_at + 0.5));
    assert_eq!(unbound_at, Some(bound_at + 7.5));
    let closed_at = closed_at.expect("channel should close");
    assert_eq!(closed_at, bound_at + 8.0);
    assert!(!ligand_channel(&model, CENTER).is_available_for_binding());

    // Hold the ligand on the binding position; it binds only after 5 s closed
    let mut rebound_at = None;
    for _ in 0..60 {
        assert!(model.begin_user_control(ligand));
        assert!(model.drag_particle_to(ligand, binding_position));
        assert!(model.end_user_control(ligand));
        let events = step(&mut model);
        if events.iter().any(|e| matches!(e, TransportEvent::LigandBound { .. })) {
            rebound_at = Some(model.time());
            break;
        }
    }
    assert_eq!(rebound_at, Some(closed_at + 5.0));
}

#[test]
fn test_grabbing_bound_ligand_releases_channel() {
    let mut model = model_with(&[(CENTER, TransportProteinType::PotassiumLigandGatedChannel)]);
    let binding_position = ligand_channel(&model, CENTER).binding_position();
    let ligand = model.add_particle_at(ParticleSpecies::Ligand(LigandType::Triangle), binding_position);
    step(&mut model);
    assert_eq!(mode_of(&model, ligand), ParticleMode::LigandBound { slot: CENTER });

    assert!(model.begin_user_control(ligand));
    let events = model.drain_events();
    assert!(events.contains(&TransportEvent::LigandUnbound { slot: CENTER, ligand }));
    assert_eq!(ligand_channel(&model, CENTER).state(), LigandGatedState::LigandUnboundOpen);
    assert_eq!(ligand_channel(&model, CENTER).bound_ligand(), None);

    assert!(model.drag_particle_to(ligand, DVec2::new(-50.0, 40.0)));
    assert!(model.end_user_control(ligand));
    assert_eq!(model.particle(ligand).unwrap().position(), DVec2::new(-50.0, 40.0));
    assert!(mode_of(&model, ligand).is_random_walk());
}

#[test]
fn test_star_ligand_ignores_potassium_channel() {
    let mut model = model_with(&[(CENTER, TransportProteinType::PotassiumLigandGatedChannel)]);
    let binding_position = ligand_channel(&model, CENTER).binding_position();
    let ligand = model.add_particle_at(STAR, binding_position);
    let events = step(&mut model);
    assert!(mode_of(&model, ligand).is_random_walk());
    assert!(events.is_empty());
}

#[test]
fn test_sodium_voltage_gated_opens_then_closes_once() {
    let mut model = model_with(&[(SlotId(0), TransportProteinType::SodiumVoltageGatedChannel)]);
    assert!(model.drain_events().is_empty());

    model.set_membrane_voltage_potential(MembranePotential::Minus50);
    let events = model.drain_events();
    assert_eq!(
        events,
        vec![
            TransportEvent::ProteinStateChanged {
                slot: SlotId(0),
                previous: ProteinState::VoltageGated(VoltageGatedState::Closed),
                current: ProteinState::VoltageGated(VoltageGatedState::Open),
            },
            TransportEvent::ChannelOpened { slot: SlotId(0) },
        ]
    );

    model.set_membrane_voltage_potential(MembranePotential::Plus30);
    for _ in 0..10 {
        model.step(DT);
    }
    let events = model.drain_events();
    let closed = events
        .iter()
        .filter(|e| matches!(e, TransportEvent::ChannelClosed { .. }))
        .count();
    assert_eq!(closed, 1);
    assert_eq!(
        model.protein(SlotId(0)).map(TransportProtein::state),
        Some(ProteinState::VoltageGated(VoltageGatedState::Inactivated))
    );
}

#[test]
fn test_potassium_voltage_gated_opens_only_at_plus_30() {
    let mut model = model_with(&[(SlotId(1), TransportProteinType::PotassiumVoltageGatedChannel)]);
    model.set_membrane_voltage_potential(MembranePotential::Minus50);
    assert!(model.drain_events().is_empty());
    model.set_membrane_voltage_potential(MembranePotential::Plus30);
    assert!(model
        .drain_events()
        .contains(&TransportEvent::ChannelOpened { slot: SlotId(1) }));
}

#[test]
fn test_passive_diffusion_crosses_once() {
    let model = model_with(&[]);
    let oxygen = ParticleSpecies::Solute(SoluteType::Oxygen);
    let (mut model, ids) = insert_particles(
        &model,
        &[(
            oxygen,
            DVec2::new(0.0, 11.5),
            ParticleMode::PassiveDiffusion {
                direction: CrossingDirection::Inward,
            },
        )],
    );
    let id = ids[0];

    let mut crossing_ticks = Vec::new();
    let mut finished = None;
    for tick in 1..=20 {
        let events = step(&mut model);
        if crossings(&events).contains(&id) {
            crossing_ticks.push(tick);
        }
        if finished.is_none() && mode_of(&model, id).is_random_walk() {
            finished = Some(tick);
        }
    }
    // 15 units/s: center passes y = 0 on tick 7, footprint clears y = -10 on tick 13
    assert_eq!(crossing_ticks, vec![7]);
    assert_eq!(finished, Some(13));
    assert_eq!(model.particle(id).unwrap().side(), Side::Inside);
}

#[test]
fn test_leakage_channel_escorts_sodium_inward() {
    let model = model_with(&[(CENTER, TransportProteinType::SodiumLeakageChannel)]);
    let (mut model, ids) = insert_particles(
        &model,
        &[(
            SODIUM,
            DVec2::new(4.0, 20.0),
            ParticleMode::MoveToCenterOfChannel {
                slot: CENTER,
                direction: CrossingDirection::Inward,
            },
        )],
    );
    let id = ids[0];

    let mut seen_entering = false;
    let mut seen_moving_through = false;
    let mut crossed = 0;
    for _ in 0..40 {
        let events = step(&mut model);
        crossed += crossings(&events).len();
        match mode_of(&model, id) {
            ParticleMode::EnteringTransportProtein { slot, .. } => {
                assert_eq!(slot, CENTER);
                seen_entering = true;
            }
            ParticleMode::MovingThroughTransportProtein { protein_type, direction, .. } => {
                assert_eq!(protein_type, TransportProteinType::SodiumLeakageChannel);
                assert_eq!(direction, CrossingDirection::Inward);
                seen_moving_through = true;
            }
            ParticleMode::RandomWalk(_) if seen_moving_through => break,
            _ => {}
        }
    }
    assert!(seen_entering && seen_moving_through);
    assert_eq!(crossed, 1);
    assert_eq!(model.particle(id).unwrap().side(), Side::Inside);
}

#[test]
fn test_closed_channel_turns_approaching_particle_away() {
    let model = model_with(&[(CENTER, TransportProteinType::SodiumVoltageGatedChannel)]);
    let (mut model, ids) = insert_particles(
        &model,
        &[(
            SODIUM,
            DVec2::new(4.0, 20.0),
            ParticleMode::MoveToCenterOfChannel {
                slot: CENTER,
                direction: CrossingDirection::Inward,
            },
        )],
    );
    step(&mut model);
    assert!(mode_of(&model, ids[0]).is_random_walk());
}

#[test]
fn test_ligand_stays_bound_while_sodium_passes_through() {
    let mut model = model_with(&[(CENTER, TransportProteinType::SodiumLigandGatedChannel)]);
    let binding_position = ligand_channel(&model, CENTER).binding_position();
    let ligand = model.add_particle_at(STAR, binding_position);

    // Run until the channel has been open for 6.5 s
    for _ in 0..200 {
        step(&mut model);
        let channel = ligand_channel(&model, CENTER);
        if channel.state() == LigandGatedState::LigandBoundOpen && channel.time_since_state_transition() >= 6.5 {
            break;
        }
    }
    assert_eq!(ligand_channel(&model, CENTER).time_since_state_transition(), 6.5);

    let (mut model, ids) = insert_particles(
        &model,
        &[(
            SODIUM,
            DVec2::new(0.0, 8.0),
            ParticleMode::MovingThroughTransportProtein {
                slot: CENTER,
                protein_type: TransportProteinType::SodiumLigandGatedChannel,
                direction: CrossingDirection::Inward,
                offset: 0.0,
            },
        )],
    );
    let sodium = ids[0];

    let mut ticks = 0;
    while !mode_of(&model, sodium).is_random_walk() {
        let events = step(&mut model);
        ticks += 1;
        assert!(ticks < 40, "sodium never finished crossing");
        assert!(!events.iter().any(|e| matches!(e, TransportEvent::LigandUnbound { .. })));
        assert_eq!(ligand_channel(&model, CENTER).state(), LigandGatedState::LigandBoundOpen);
        assert_eq!(mode_of(&model, ligand), ParticleMode::LigandBound { slot: CENTER });
    }
    // The binding duration ran out while the sodium was still inside
    assert!(ligand_channel(&model, CENTER).time_since_state_transition() > 7.0);

    let events = step(&mut model);
    assert!(events.contains(&TransportEvent::LigandUnbound { slot: CENTER, ligand }));
    assert_eq!(ligand_channel(&model, CENTER).state(), LigandGatedState::LigandUnboundOpen);
    assert!(mode_of(&model, ligand).is_random_walk());
}
