use std::path::PathBuf;

use bevy::log::LogPlugin;
use buoyancy_sim::save::{load_part_state, save_part_state};
use buoyancy_sim::scenario::Scenario;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about = "Headless drop test for inflatable buoyant parts", long_about = None)]
struct Args {
    /// Scenario file (RON). Built-in drop test when omitted.
    #[arg(short, long)]
    scenario: Option<PathBuf>,

    /// Part state file, loaded on start and written back at the end of the run.
    #[arg(long)]
    state: Option<PathBuf>,

    /// Overrides the scenario's tick count.
    #[arg(short, long)]
    ticks: Option<u32>,
}

fn main() {
    let args = Args::parse();

    let mut scenario = match &args.scenario {
        Some(path) => match Scenario::load(path) {
            Ok(scenario) => scenario,
            Err(err) => {
                eprintln!("Error loading scenario {}: {err}", path.display());
                std::process::exit(1);
            }
        },
        None => Scenario::default(),
    };
    if let Some(ticks) = args.ticks {
        scenario.ticks = ticks;
    }

    let persisted = match args.state.as_deref().map(load_part_state).transpose() {
        Ok(states) => states.flatten(),
        Err(err) => {
            eprintln!("Error loading part state: {err}");
            std::process::exit(1);
        }
    };

    let mut app = match buoyancy_sim::build_app(&scenario, persisted) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("Invalid buoyancy part: {err}");
            std::process::exit(1);
        }
    };
    app.add_plugins(LogPlugin::default());

    let report = buoyancy_sim::run(app, &scenario);

    println!("ticks:          {}", report.ticks);
    println!("final altitude: {:.3} m", report.final_altitude);
    println!("min altitude:   {:.3} m", report.min_altitude);
    println!("inflated:       {}", report.inflated);
    println!("splashes:       {}", report.splashes);
    match &report.crash {
        Some(crash) => println!(
            "destroyed:      {} ({:.1} m/s > {:.1} m/s)",
            crash.reason, crash.speed, crash.tolerance
        ),
        None => println!("destroyed:      no"),
    }

    if let Some(path) = &args.state {
        if report.destroyed() {
            return;
        }
        if let Err(err) = save_part_state(&report.persisted, path) {
            eprintln!("Error saving part state: {err}");
            std::process::exit(1);
        }
    }
}
