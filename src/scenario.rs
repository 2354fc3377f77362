use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use glam::Vec3;
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::{
    agent::AgentSpawn,
    grid::{GridError, TileMasses, TilePos, TileType},
    params::{KnockbackParams, MassParams, MeteorParams, MotionParams, SimParams, TiltParams},
    rng::RngManager,
    world::{World, WorldSetup},
};

fn default_dt_secs() -> f64 {
    0.02
}

fn default_snapshot_interval_ticks() -> u64 {
    50
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_fill() -> TileType {
    TileType::Ground
}

fn default_corner_height() -> f32 {
    1.0
}

fn default_agent_mass() -> f32 {
    1.0
}

fn default_stamina() -> f32 {
    1.0
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("island pivot is missing")]
    MissingPivot,
    #[error("island must be at least 1x1, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("layout has {found} rows but the island is {expected} tall")]
    LayoutHeight { expected: u32, found: usize },
    #[error("layout row {row} has {found} cells but the island is {expected} wide")]
    LayoutWidth { row: usize, expected: u32, found: usize },
    #[error("layout row {row} column {column} has unknown glyph '{glyph}'")]
    UnknownGlyph { row: usize, column: usize, glyph: char },
    #[error("tilt smoothing must be in [0, 1), got {0}")]
    Smoothing(f32),
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("agent spawn {index} at ({x}, {z}) is outside the island")]
    SpawnOutsideIsland { index: usize, x: f32, z: f32 },
    #[error("agent spawn {index} destination ({x}, {y}) is outside the island")]
    DestinationOutsideIsland { index: usize, x: u32, y: u32 },
    #[error(transparent)]
    Grid(#[from] GridError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default = "default_dt_secs")]
    pub dt_secs: f64,
    #[serde(default)]
    pub ticks: Option<u64>,
    #[serde(default = "default_snapshot_interval_ticks")]
    pub snapshot_interval_ticks: u64,
    #[serde(default)]
    pub logging: LoggingSection,
    pub island: IslandSection,
    #[serde(default)]
    pub mass: MassParams,
    #[serde(default)]
    pub tilt: TiltParams,
    #[serde(default)]
    pub agents: AgentsSection,
    #[serde(default)]
    pub knockback: KnockbackParams,
    #[serde(default)]
    pub meteor: MeteorParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IslandSection {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_fill")]
    pub fill: TileType,
    #[serde(default)]
    pub pivot: Option<Vec3>,
    /// Optional ASCII rows, one glyph per tile: `#` ground, `.` air,
    /// `^` mountain, `f` food, `m` magnet, `*` meteor.
    #[serde(default)]
    pub layout: Vec<String>,
    #[serde(default)]
    pub tile_masses: TileMasses,
    #[serde(default = "default_corner_height")]
    pub corner_height: f32,
    #[serde(default)]
    pub features: Vec<FeatureScatter>,
}

/// Turns `count` random Ground tiles into `tile`.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureScatter {
    pub tile: TileType,
    pub count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentsSection {
    #[serde(flatten)]
    pub motion: MotionParams,
    #[serde(default = "default_agent_mass")]
    pub mass: f32,
    #[serde(default = "default_stamina")]
    pub stamina: f32,
    #[serde(default)]
    pub spawns: Vec<SpawnMarker>,
}

impl Default for AgentsSection {
    fn default() -> Self {
        Self {
            motion: MotionParams::default(),
            mass: default_agent_mass(),
            stamina: default_stamina(),
            spawns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpawnMarker {
    pub position: Vec3,
    #[serde(default)]
    pub destination: Option<TilePos>,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario = Scenario::from_yaml_str(&data)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    /// Parses and validates a scenario document.
    pub fn from_yaml_str(data: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_yaml::from_str(data)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        let island = &self.island;
        let pivot = island.pivot.ok_or(ScenarioError::MissingPivot)?;
        debug!(?pivot, "validating scenario {}", self.name);

        if island.width == 0 || island.height == 0 {
            return Err(ScenarioError::InvalidDimensions {
                width: island.width,
                height: island.height,
            });
        }
        if !island.layout.is_empty() {
            if island.layout.len() != island.height as usize {
                return Err(ScenarioError::LayoutHeight {
                    expected: island.height,
                    found: island.layout.len(),
                });
            }
            for (row, line) in island.layout.iter().enumerate() {
                let cells = line.chars().count();
                if cells != island.width as usize {
                    return Err(ScenarioError::LayoutWidth {
                        row,
                        expected: island.width,
                        found: cells,
                    });
                }
                if let Some((column, glyph)) = line
                    .chars()
                    .enumerate()
                    .find(|(_, glyph)| TileType::from_glyph(*glyph).is_none())
                {
                    return Err(ScenarioError::UnknownGlyph { row, column, glyph });
                }
            }
        }

        let smoothing = self.tilt.smoothing;
        if !(0.0..1.0).contains(&smoothing) {
            return Err(ScenarioError::Smoothing(smoothing));
        }
        if self.dt_secs <= 0.0 {
            return Err(ScenarioError::NotPositive {
                field: "dt_secs",
                value: self.dt_secs,
            });
        }
        if self.knockback.gravity <= 0.0 {
            return Err(ScenarioError::NotPositive {
                field: "knockback.gravity",
                value: self.knockback.gravity as f64,
            });
        }
        if self.meteor.enabled && self.meteor.interval_secs <= 0.0 {
            return Err(ScenarioError::NotPositive {
                field: "meteor.interval_secs",
                value: self.meteor.interval_secs as f64,
            });
        }

        let max_x = island.width as f32 - 0.5;
        let max_z = island.height as f32 - 0.5;
        for (index, spawn) in self.agents.spawns.iter().enumerate() {
            let p = spawn.position;
            if p.x < -0.5 || p.x > max_x || p.z < -0.5 || p.z > max_z {
                return Err(ScenarioError::SpawnOutsideIsland { index, x: p.x, z: p.z });
            }
            if let Some(dest) = spawn.destination {
                if dest.x >= island.width || dest.y >= island.height {
                    return Err(ScenarioError::DestinationOutsideIsland {
                        index,
                        x: dest.x,
                        y: dest.y,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn sim_params(&self) -> SimParams {
        SimParams {
            mass: self.mass.clone(),
            tilt: self.tilt.clone(),
            motion: self.agents.motion.clone(),
            knockback: self.knockback.clone(),
            meteor: self.meteor.clone(),
        }
    }

    /// Lays out the island, scatters features from the seeded "terrain"
    /// stream, stitches every corner and spawns the agents.
    pub fn build_world(&self) -> Result<World, ScenarioError> {
        self.validate()?;
        let island = &self.island;
        let setup = WorldSetup {
            dt_secs: self.dt_secs,
            pivot: island.pivot.ok_or(ScenarioError::MissingPivot)?,
            corner_height: island.corner_height,
            tile_masses: island.tile_masses.clone(),
            params: self.sim_params(),
        };
        let mut world = World::new(setup);
        world.resize(island.width, island.height, island.fill);

        for (y, line) in island.layout.iter().enumerate() {
            for (x, glyph) in line.chars().enumerate() {
                if let Some(tile_type) = TileType::from_glyph(glyph) {
                    world.paint(TilePos::new(x as u32, y as u32), tile_type)?;
                }
            }
        }

        let mut rng = RngManager::new(self.seed);
        let mut terrain = rng.stream("terrain");
        let mut ground: Vec<TilePos> = world
            .grid()
            .iter()
            .filter(|tile| tile.tile_type == TileType::Ground)
            .map(|tile| tile.pos)
            .collect();
        for feature in &island.features {
            for _ in 0..feature.count {
                if ground.is_empty() {
                    break;
                }
                let pos = ground.swap_remove(terrain.gen_range(0..ground.len()));
                world.paint(pos, feature.tile)?;
            }
        }

        let spawned = world.flush_stitching();
        debug!(pieces = spawned, "island stitched");

        for spawn in &self.agents.spawns {
            world.spawn_agent(AgentSpawn {
                position: Vec3::new(spawn.position.x, 0.0, spawn.position.z),
                destination: spawn.destination.map(TilePos::world_position),
                stamina: self.agents.stamina,
                max_speed: self.agents.motion.max_speed,
                mass: self.agents.mass,
            });
        }
        Ok(world)
    }

    pub fn ticks(&self, override_ticks: Option<u64>) -> u64 {
        override_ticks.or(self.ticks).unwrap_or(500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::PieceKind;

    const MINIMAL: &str = r#"
name: minimal
seed: 3
island:
  width: 3
  height: 3
  pivot: [1.0, 0.0, 1.0]
"#;

    #[test]
    fn defaults_fill_in() {
        let scenario = Scenario::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(scenario.dt_secs, 0.02);
        assert_eq!(scenario.island.fill, TileType::Ground);
        assert_eq!(scenario.logging.level, "info");
        assert_eq!(scenario.agents.motion, MotionParams::default());
        assert_eq!(scenario.ticks(None), 500);
        assert_eq!(scenario.ticks(Some(7)), 7);
    }

    #[test]
    fn missing_pivot_is_fatal() {
        let yaml = MINIMAL.replace("  pivot: [1.0, 0.0, 1.0]\n", "");
        let err = Scenario::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ScenarioError::MissingPivot));
    }

    #[test]
    fn layout_must_match_dimensions() {
        let yaml = format!("{MINIMAL}  layout:\n    - \"###\"\n    - \"##\"\n    - \"###\"\n");
        let err = Scenario::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ScenarioError::LayoutWidth { row: 1, .. }));
    }

    #[test]
    fn smoothing_of_one_is_rejected() {
        let yaml = format!("{MINIMAL}tilt:\n  smoothing: 1.0\n");
        let err = Scenario::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ScenarioError::Smoothing(_)));
    }

    #[test]
    fn gravity_must_pull_agents_down() {
        for gravity in ["0.0", "-9.81"] {
            let yaml = format!("{MINIMAL}knockback:\n  gravity: {gravity}\n");
            let err = Scenario::from_yaml_str(&yaml).unwrap_err();
            assert!(matches!(
                err,
                ScenarioError::NotPositive {
                    field: "knockback.gravity",
                    ..
                }
            ));
        }
    }

    #[test]
    fn spawns_must_sit_on_the_island() {
        let yaml = format!("{MINIMAL}agents:\n  spawns:\n    - position: [7.0, 0.0, 1.0]\n");
        let err = Scenario::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ScenarioError::SpawnOutsideIsland { index: 0, .. }));
    }

    #[test]
    fn layout_and_features_shape_the_world() {
        let yaml = format!(
            "{MINIMAL}  layout:\n    - \"###\"\n    - \"#.#\"\n    - \"###\"\n  features:\n    - tile: food\n      count: 2\n"
        );
        let scenario = Scenario::from_yaml_str(&yaml).unwrap();
        let world = scenario.build_world().unwrap();

        assert_eq!(world.tile_at(1, 1).unwrap().tile_type, TileType::Air);
        let food = world
            .grid()
            .iter()
            .filter(|tile| tile.tile_type == TileType::Food)
            .count();
        assert_eq!(food, 2);
        assert_eq!(world.pieces().count_kind(PieceKind::Inner), 4);
        assert!(!world.stitch_pending());
    }

    #[test]
    fn feature_scatter_is_seeded() {
        let yaml = format!("{MINIMAL}  features:\n    - tile: mountain\n      count: 3\n");
        let scenario = Scenario::from_yaml_str(&yaml).unwrap();
        let a = scenario.build_world().unwrap().grid().rows();
        let b = scenario.build_world().unwrap().grid().rows();
        assert_eq!(a, b);
    }
}
