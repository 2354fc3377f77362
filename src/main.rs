use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use tilt_island::{
    engine::{EngineBuilder, EngineSettings},
    scenario::ScenarioLoader,
    telemetry::init_tracing,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Tilting island simulation runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/tiny_island.yaml")]
    scenario: PathBuf,

    /// Override tick count (uses scenario default when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Override snapshot interval in ticks
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "tilt_island=trace"
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| scenario.logging.level.clone());
    init_tracing(&level, cli.json_logs || scenario.logging.json);

    let mut world = scenario
        .build_world()
        .with_context(|| format!("Failed to build island for '{}'", scenario.name))?;
    let ticks = scenario.ticks(cli.ticks);
    let snapshot_interval = cli
        .snapshot_interval
        .unwrap_or(scenario.snapshot_interval_ticks);
    let snapshot_dir = cli
        .snapshot_dir
        .unwrap_or_else(|| PathBuf::from("snapshots"));

    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_ticks: snapshot_interval,
        snapshot_dir,
    };

    let mut engine = EngineBuilder::new(settings).with_island_systems().build();
    engine.run(&mut world, ticks)?;

    let island = world.island();
    info!(
        pitch = island.pitch_deg,
        roll = island.roll_deg,
        impacts = world.meteor().impacts,
        "simulation finished"
    );
    println!(
        "Scenario '{}' completed for {} ticks. Tilt: pitch {:.2} deg, roll {:.2} deg, meteor impacts: {}",
        scenario.name,
        ticks,
        island.pitch_deg,
        island.roll_deg,
        world.meteor().impacts
    );
    Ok(())
}
