use tilt_island::{
    engine::{EngineBuilder, EngineSettings},
    scenario::ScenarioLoader,
};
use tempfile::tempdir;

#[test]
fn engine_runs_hook_each_tick() {
    let loader = ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"));
    let scenario = loader
        .load("scenarios/tiny_island.yaml")
        .expect("scenario should load");
    let mut world = scenario.build_world().expect("world builds");
    let temp = tempdir().expect("tempdir");
    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_ticks: 0,
        snapshot_dir: temp.path().to_path_buf(),
    };
    let mut engine = EngineBuilder::new(settings).with_island_systems().build();

    let mut ticks = Vec::new();
    engine
        .run_with_hook(&mut world, 6, |snapshot| ticks.push(snapshot.tick))
        .expect("run succeeds");

    assert_eq!(ticks.len(), 6);
    assert_eq!(ticks.first().copied(), Some(1));
    assert_eq!(ticks.last().copied(), Some(6));
}

#[test]
fn snapshots_land_in_scenario_directory() {
    let loader = ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"));
    let scenario = loader.load("scenarios/tiny_island.yaml").expect("scenario should load");
    let mut world = scenario.build_world().expect("world builds");
    let temp = tempdir().expect("tempdir");
    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_ticks: 5,
        snapshot_dir: temp.path().to_path_buf(),
    };
    let mut engine = EngineBuilder::new(settings).with_island_systems().build();

    engine.run(&mut world, 12).expect("run succeeds");

    let dir = temp.path().join("tiny_island");
    assert!(dir.join("tick_000005.json").exists());
    assert!(dir.join("tick_000010.json").exists());
    assert!(!dir.join("tick_000012.json").exists());

    let raw = std::fs::read_to_string(dir.join("tick_000010.json"))
        .expect("snapshot file readable");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("snapshot is valid json");
    assert_eq!(value["tick"], 10);
    assert_eq!(value["width"], 5);
    assert_eq!(value["agents"].as_array().map(Vec::len), Some(2));
}
