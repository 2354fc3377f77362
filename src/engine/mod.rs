use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};

use crate::{
    rng::{RngManager, SystemRng},
    snapshot::SnapshotWriter,
    systems::{MassSystem, MeteorSystem, MotionSystem, StitchSystem, TiltSystem},
    world::{World, WorldSnapshot},
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub snapshot_interval_ticks: u64,
    pub snapshot_dir: PathBuf,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn push_system(&mut self, system: impl System + 'static) {
        self.systems.push(Box::new(system));
    }

    /// The standard pipeline, in the order each stage consumes the previous
    /// one's output: mass, tilt, motion, meteor, stitching.
    pub fn with_island_systems(self) -> Self {
        self.with_system(MassSystem::new())
            .with_system(TiltSystem::new())
            .with_system(MotionSystem::new())
            .with_system(MeteorSystem::new())
            .with_system(StitchSystem::new())
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            snapshot_writer: SnapshotWriter::new(
                &self.settings.snapshot_dir,
                self.settings.snapshot_interval_ticks,
            ),
            settings: self.settings,
        }
    }
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    snapshot_writer: SnapshotWriter,
    settings: EngineSettings,
}

impl Engine {
    pub fn run(&mut self, world: &mut World, ticks: u64) -> Result<()> {
        info!(
            scenario = %self.settings.scenario_name,
            ticks,
            systems = self.systems.len(),
            "engine run starting"
        );
        for _ in 0..ticks {
            self.step(world)?;
        }
        info!(tick = world.tick(), "engine run finished");
        Ok(())
    }

    /// Like [`Engine::run`], handing the post-tick state to `hook` every tick.
    pub fn run_with_hook<F>(&mut self, world: &mut World, ticks: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(WorldSnapshot),
    {
        for _ in 0..ticks {
            self.step(world)?;
            hook(world.snapshot(&self.settings.scenario_name));
        }
        Ok(())
    }

    /// Runs every system once, advances the clock, then writes a snapshot if
    /// one is due.
    pub fn step(&mut self, world: &mut World) -> Result<()> {
        let current_tick = world.tick() + 1;
        for system in &mut self.systems {
            let mut rng_stream = self.rng.stream(system.name());
            let ctx = SystemContext {
                tick: current_tick,
                dt_secs: world.dt_secs() as f32,
                scenario_name: &self.settings.scenario_name,
            };
            system.run(&ctx, world, &mut rng_stream)?;
        }
        world.advance_time();
        if let Some(path) = self
            .snapshot_writer
            .maybe_write(world, &self.settings.scenario_name)?
        {
            debug!(path = %path.display(), "snapshot written");
        }
        Ok(())
    }
}

pub struct SystemContext<'a> {
    /// 1-based number of the tick being computed.
    pub tick: u64,
    pub dt_secs: f32,
    pub scenario_name: &'a str,
}

pub trait System {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}
