use glam::{vec3, Vec2, Vec3};
use tilt_island::{
    command::AgentCommand,
    engine::{Engine, EngineBuilder, EngineSettings},
    grid::{TileMasses, TilePos, TileType},
    scenario::{Scenario, ScenarioLoader},
    systems::MassSystem,
    world::{MeteorPhase, World, WorldSetup},
};

fn scenario() -> Scenario {
    ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
        .load("scenarios/tiny_island.yaml")
        .expect("scenario should load")
}

fn settings(seed: u64) -> EngineSettings {
    EngineSettings {
        scenario_name: "tiny_island".into(),
        seed,
        snapshot_interval_ticks: 0,
        snapshot_dir: std::path::PathBuf::from("snapshots_dynamics_tests"),
    }
}

fn island_engine(seed: u64) -> Engine {
    EngineBuilder::new(settings(seed)).with_island_systems().build()
}

fn step_until_impact(engine: &mut Engine, world: &mut World, limit: u64) -> TilePos {
    for _ in 0..limit {
        engine.step(world).expect("tick succeeds");
        if let Some(impact) = world.meteor().last_impact {
            return impact.site;
        }
    }
    panic!("no meteor impact within {limit} ticks");
}

#[test]
fn zero_total_mass_gives_zero_offset() {
    let masses = TileMasses {
        ground: 0.0,
        ..TileMasses::default()
    };
    let mut world = World::new(WorldSetup {
        pivot: vec3(1.0, 0.0, 1.0),
        tile_masses: masses,
        ..WorldSetup::default()
    });
    world.resize(3, 3, TileType::Ground);
    let mut engine = EngineBuilder::new(settings(1))
        .with_system(MassSystem::new())
        .build();

    engine.run(&mut world, 1).expect("run succeeds");

    assert_eq!(world.island().com_offset, Vec3::ZERO);
    assert_eq!(world.island().center_of_mass, Vec3::ZERO);
}

#[test]
fn single_tile_offset_is_scaled_distance_from_pivot() {
    let mut world = World::new(WorldSetup {
        pivot: vec3(1.5, 0.0, -2.0),
        tile_masses: TileMasses {
            ground: 5.0,
            ..TileMasses::default()
        },
        ..WorldSetup::default()
    });
    world.resize(1, 1, TileType::Ground);
    world.params_mut().mass.total_multiplier = 2.0;
    let mut engine = EngineBuilder::new(settings(1))
        .with_system(MassSystem::new())
        .build();

    engine.run(&mut world, 1).expect("run succeeds");

    let island = world.island();
    assert!(island.com_offset.abs_diff_eq(vec3(-3.0, 0.0, 4.0), 1e-6));
    assert!(island.indicator.abs_diff_eq(vec3(-1.5, 0.0, 2.0), 1e-6));
}

#[test]
fn heavy_side_tilts_the_island_toward_it() {
    let mut world = World::new(WorldSetup {
        pivot: vec3(2.0, 0.0, 2.0),
        ..WorldSetup::default()
    });
    world.resize(5, 5, TileType::Ground);
    world.params_mut().meteor.enabled = false;
    for y in 0..5 {
        world.replace_tile(TilePos::new(0, y), TileType::Air).expect("tile is on the island");
    }
    let mut engine = island_engine(1);

    let mut last_roll = 0.0;
    for _ in 0..40 {
        engine.step(&mut world).expect("tick succeeds");
        let roll = world.island().roll_deg;
        assert!(roll >= last_roll);
        last_roll = roll;
    }
    let island = world.island();
    assert!(island.com_offset.x > 0.0);
    assert!(island.roll_deg > 0.0);
    assert!(island.roll_deg <= island.target_tilt.x + 1e-5);
    assert!(island.pitch_deg.abs() < 1e-5);
}

#[test]
fn meteor_mass_decays_geometrically_then_vanishes() {
    let scenario = scenario();
    let mut world = scenario.build_world().expect("world builds");
    let mut engine = island_engine(scenario.seed);

    let site = step_until_impact(&mut engine, &mut world, 200);
    world.params_mut().meteor.enabled = false;
    let tile = world.grid().get(site).expect("impact site exists");
    assert_eq!(tile.tile_type, TileType::Meteor);
    let spike = tile.extra_mass;
    assert!((spike - scenario.meteor.strength).abs() < 1e-6);

    for k in 1..=50 {
        engine.step(&mut world).expect("tick succeeds");
        let extra = world.grid().get(site).expect("impact site exists").extra_mass;
        if k < 50 {
            let expected = spike * 0.9f32.powi(k);
            assert!((extra - expected).abs() < 1e-3, "tick {k}: {extra} vs {expected}");
        } else {
            assert_eq!(extra, 0.0);
        }
    }
    assert!(world.grid().get(site).expect("impact site exists").decay.is_none());
}

#[test]
fn impact_knocks_agents_back_until_they_land() {
    let scenario = scenario();
    let mut world = scenario.build_world().expect("world builds");
    let mut engine = island_engine(scenario.seed);

    step_until_impact(&mut engine, &mut world, 200);
    world.params_mut().meteor.enabled = false;
    assert_eq!(world.meteor().phase, MeteorPhase::Idle);
    assert_eq!(world.meteor().last_impact.map(|i| i.agents_hit), Some(2));
    for agent in world.agents().iter() {
        assert!(agent.knockback.is_some());
        assert_eq!(agent.effective_mass(), 0.0);
    }

    let mut airborne_ticks = 0;
    while world.agents().iter().any(|agent| agent.knockback.is_some()) {
        engine.step(&mut world).expect("tick succeeds");
        airborne_ticks += 1;
        assert!(airborne_ticks < 200);
    }
    assert!(airborne_ticks > 1);
    for agent in world.agents().iter() {
        assert_eq!(agent.position.y, 0.0);
        assert!(agent.nav.is_navigating());
        assert_eq!(agent.effective_mass(), 1.0);
    }
}

#[test]
fn meteor_arms_then_counts_down() {
    let scenario = scenario();
    let mut world = scenario.build_world().expect("world builds");
    let mut engine = island_engine(scenario.seed);

    engine.step(&mut world).expect("tick succeeds");
    let site = world.meteor().armed_site().expect("armed on the first tick");
    assert_eq!(world.grid().get(site).expect("armed site exists").tile_type, TileType::Ground);
    let warning = world.snapshot("t").meteor_warning.expect("site is armed");
    assert_eq!(warning.remaining_fraction, 1.0);

    engine.step(&mut world).expect("tick succeeds");
    let warning = world.snapshot("t").meteor_warning.expect("site is armed");
    assert!(warning.remaining_fraction < 1.0);
    assert!(warning.intensity > 0.0);
}

#[test]
fn stamina_never_increases_during_a_run() {
    let scenario = scenario();
    let mut world = scenario.build_world().expect("world builds");
    let mut engine = island_engine(scenario.seed);

    let mut history: Vec<Vec<f32>> = Vec::new();
    engine
        .run_with_hook(&mut world, 160, |snapshot| {
            history.push(snapshot.agents.iter().map(|a| a.stamina).collect());
        })
        .expect("run succeeds");

    for pair in history.windows(2) {
        for (before, after) in pair[0].iter().zip(&pair[1]) {
            assert!(after <= before);
            assert!((0.0..=1.0).contains(after));
        }
    }
    for agent in world.agents().iter() {
        assert!(!agent.alignment.is_nan());
        assert!(agent.nav.speed_cap >= scenario.agents.motion.base_speed_floor);
    }
}

#[test]
fn box_selection_feeds_move_commands() {
    let mut scenario = scenario();
    scenario.meteor.enabled = false;
    let mut world = scenario.build_world().expect("world builds");
    let mut engine = island_engine(scenario.seed);

    let selected = world.select_agents_in(Vec2::new(3.5, 1.5), Vec2::new(4.5, 2.5));
    assert_eq!(selected.len(), 1);
    let target = world
        .tile_at_point(vec3(1.2, 0.0, 3.9))
        .map(|tile| tile.pos)
        .expect("point is on the deck");
    assert_eq!(target, TilePos::new(1, 4));

    world.issue(AgentCommand::MoveTo {
        agents: selected.clone(),
        tile: target,
    });
    engine.step(&mut world).expect("tick succeeds");

    let agent = world.agent(selected[0]).expect("agent exists");
    assert_eq!(agent.nav.destination, Some(vec3(1.0, 0.0, 4.0)));
    assert!(agent.position.x < 4.0);
}

#[test]
fn uninitialized_island_stays_idle_and_level() {
    let mut world = World::new(WorldSetup::default());
    let mut engine = island_engine(7);

    engine.run(&mut world, 30).expect("run succeeds");

    assert!(!world.grid().is_initialized());
    assert_eq!(world.meteor().phase, MeteorPhase::Idle);
    assert_eq!(world.meteor().impacts, 0);
    assert_eq!(world.island().com_offset, Vec3::ZERO);
    assert_eq!(world.island().tilt, Vec3::ZERO);
    assert!(world.pieces().is_empty());
}

#[test]
fn meteors_need_designated_sites() {
    let mut world = World::new(WorldSetup::default());
    world.resize(3, 3, TileType::Ground);
    world.params_mut().meteor.interval_secs = 0.04;
    assert!(world.params().meteor.candidate_sites.is_empty());
    let mut engine = island_engine(7);

    engine.run(&mut world, 20).expect("run succeeds");

    assert_eq!(world.meteor().phase, MeteorPhase::Idle);
    assert_eq!(world.meteor().impacts, 0);
    assert!(world
        .grid()
        .iter()
        .all(|tile| tile.tile_type == TileType::Ground));
}
