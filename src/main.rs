//! Membrane Transport - headless driver
//!
//! Builds a demo membrane with a protein in every slot, runs the
//! model for a fixed number of steps and prints a count summary.
//!
//! CLI Usage:
//!   cargo run                              # 600 steps of 1/60 s
//!   cargo run -- --steps 3000 --dt 0.02    # Custom run length
//!   cargo run -- --seed 7 --csv            # Reseed and write a CSV time series
//!   cargo run -- --json                    # Write the final state as JSON

use std::time::Instant;

use anyhow::Result;
use membrane_transport::{
    export::{export_snapshot_json, CountsCsvExporter},
    geometry::Side,
    model::{MembraneTransportModel, SlotId},
    particle::{ParticleSpecies, SoluteType},
    proteins::{MembranePotential, TransportProteinType},
    state::{tracked_species, TransportMetrics},
    TransportParameters,
};

struct RunOptions {
    steps: usize,
    dt: f64,
    seed: Option<u64>,
    csv: bool,
    json: bool,
}

/// Parse CLI arguments
fn parse_args() -> RunOptions {
    let args: Vec<String> = std::env::args().collect();
    let mut options = RunOptions {
        steps: 600,
        dt: 1.0 / 60.0,
        seed: None,
        csv: false,
        json: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-n" | "--steps" => {
                i += 1;
                if i < args.len() {
                    options.steps = args[i].parse().unwrap_or(600);
                }
            }
            "--dt" => {
                i += 1;
                if i < args.len() {
                    options.dt = args[i].parse().unwrap_or(1.0 / 60.0);
                }
            }
            "-s" | "--seed" => {
                i += 1;
                if i < args.len() {
                    options.seed = args[i].parse().ok();
                }
            }
            "--csv" => options.csv = true,
            "--json" => options.json = true,
            "--help" | "-h" => {
                println!("Membrane Transport");
                println!();
                println!("Usage: membrane-transport [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --steps N      Number of model steps (default: 600)");
                println!("  --dt SECONDS       Time step in seconds (default: 1/60)");
                println!("  -s, --seed SEED    Random seed (default: from parameters)");
                println!("  --csv              Write a CSV time series to exports/");
                println!("  --json             Write the final model state to exports/");
                println!("  --help, -h         Show this help");
                std::process::exit(0);
            }
            other => log::warn!("ignoring unknown argument {}", other),
        }
        i += 1;
    }

    options
}

/// One protein per slot, solutes on both sides, ligands added
fn build_demo(params: TransportParameters) -> MembraneTransportModel {
    let mut model = MembraneTransportModel::new(params);
    let layout = [
        TransportProteinType::SodiumLeakageChannel,
        TransportProteinType::PotassiumLeakageChannel,
        TransportProteinType::SodiumVoltageGatedChannel,
        TransportProteinType::SodiumLigandGatedChannel,
        TransportProteinType::PotassiumLigandGatedChannel,
        TransportProteinType::SodiumGlucoseCotransporter,
        TransportProteinType::SodiumPotassiumPump,
    ];
    for (i, kind) in layout.into_iter().enumerate().take(model.slots().len()) {
        model.set_slot_contents(SlotId(i), Some(kind));
    }

    model.add_solutes(SoluteType::Oxygen, Side::Outside, 12);
    model.add_solutes(SoluteType::CarbonDioxide, Side::Inside, 12);
    model.add_solutes(SoluteType::SodiumIon, Side::Outside, 20);
    model.add_solutes(SoluteType::SodiumIon, Side::Inside, 6);
    model.add_solutes(SoluteType::PotassiumIon, Side::Inside, 20);
    model.add_solutes(SoluteType::Glucose, Side::Outside, 8);
    model.add_solutes(SoluteType::Atp, Side::Inside, 4);
    model.add_ligands();
    model
}

fn main() -> Result<()> {
    env_logger::init();

    let options = parse_args();

    let mut params = TransportParameters::load_or_default("transport_parameters.json");
    if let Some(seed) = options.seed {
        params.seed = seed;
    }
    log::info!("Membrane Transport starting with seed {:#x}", params.seed);

    let mut model = build_demo(params);
    let mut metrics = TransportMetrics::new();
    let mut exporter = if options.csv {
        Some(CountsCsvExporter::new(0.5, model.slots().len())?)
    } else {
        None
    };

    println!("=== Membrane Transport ===\n");
    println!("Running {} steps of {:.4} s\n", options.steps, options.dt);

    let start_time = Instant::now();
    for step in 0..options.steps {
        // Depolarize for the middle third of the run
        let potential = if step >= options.steps / 3 && step < 2 * options.steps / 3 {
            MembranePotential::Minus50
        } else {
            MembranePotential::Minus70
        };
        model.set_membrane_voltage_potential(potential);

        model.step(options.dt);
        metrics.record_events(&model.drain_events());
        metrics.update_from_model(&model);
        if let Some(exporter) = exporter.as_mut() {
            exporter.maybe_record(&metrics)?;
        }
    }
    let elapsed = start_time.elapsed();

    println!(
        "{:<16} {:>8} {:>8} {:>8} {:>8}",
        "species", "outside", "inside", "in", "out"
    );
    for species in tracked_species() {
        if let Some(counts) = metrics.counts(species) {
            let name = match species {
                ParticleSpecies::Solute(solute) => format!("{:?}", solute),
                ParticleSpecies::Ligand(ligand) => format!("{:?} ligand", ligand),
            };
            println!(
                "{:<16} {:>8} {:>8} {:>8} {:>8}",
                name, counts.outside, counts.inside, counts.crossed_inward, counts.crossed_outward
            );
        }
    }
    println!();
    println!(
        "Channel openings: {}, closings: {}, ATP hydrolyzed: {}",
        metrics.channel_openings, metrics.channel_closings, metrics.atp_hydrolyzed
    );
    println!(
        "Simulated {:.2} s in {:.2?} ({:.0} steps/s)",
        model.time(),
        elapsed,
        options.steps as f64 / elapsed.as_secs_f64().max(1e-9)
    );

    if let Some(exporter) = exporter {
        let path = exporter.finish()?;
        println!("CSV written to {}", path.display());
    }
    if options.json {
        let path = export_snapshot_json(&model)?;
        println!("State written to {}", path.display());
    }

    Ok(())
}
