pub mod agent;
pub mod command;
pub mod corners;
pub mod engine;
pub mod grid;
pub mod navigation;
pub mod params;
pub mod pieces;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod systems;
pub mod telemetry;
pub mod world;

pub use engine::{Engine, EngineBuilder, EngineSettings, System, SystemContext};
pub use scenario::{Scenario, ScenarioError, ScenarioLoader};
pub use world::{World, WorldSetup, WorldSnapshot};
