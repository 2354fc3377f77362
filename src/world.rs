use std::collections::BTreeSet;

use glam::{EulerRot, Quat, Vec2, Vec3};
use serde::Serialize;
use tracing::debug;

use crate::agent::{Agent, AgentId, AgentRegistry, AgentSpawn, Knockback};
use crate::command::AgentCommand;
use crate::corners::{self, Neighborhood};
use crate::grid::{GridError, Tile, TileGrid, TileId, TileMasses, TilePos, TileType};
use crate::params::SimParams;
use crate::pieces::{PieceKind, PieceLedger, PieceSpawner};

/// Balance state of the island, recomputed every tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Island {
    pub total_mass: f32,
    pub center_of_mass: Vec3,
    /// Horizontal offset of the centre of mass from the pivot; `y` is always 0.
    pub com_offset: Vec3,
    pub indicator: Vec3,
    /// Capped tilt vector the damped value is chasing.
    pub target_tilt: Vec3,
    /// Damped tilt vector, in degrees per axis.
    pub tilt: Vec3,
    pub pitch_deg: f32,
    pub roll_deg: f32,
}

impl Island {
    /// Rotation of the island frame: roll about forward, then pitch about right.
    pub fn orientation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            0.0,
            self.pitch_deg.to_radians(),
            self.roll_deg.to_radians(),
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum MeteorPhase {
    #[default]
    Idle,
    SiteArmed { site: TilePos, countdown: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImpactRecord {
    pub tick: u64,
    pub site: TilePos,
    pub tile: TileId,
    pub agents_hit: usize,
}

/// What a warning marker over the armed site should show.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeteorWarning {
    pub site: TilePos,
    /// 1 when freshly armed, 0 at impact.
    pub remaining_fraction: f32,
    /// Grows and darkens the marker; 1 - remaining_fraction.
    pub intensity: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeteorState {
    pub phase: MeteorPhase,
    /// Next index into the candidate list for the round-robin search.
    pub cursor: usize,
    pub impacts: u32,
    pub last_impact: Option<ImpactRecord>,
}

impl MeteorState {
    pub fn armed_site(&self) -> Option<TilePos> {
        match self.phase {
            MeteorPhase::SiteArmed { site, .. } => Some(site),
            MeteorPhase::Idle => None,
        }
    }

    pub fn warning(&self, interval_secs: f32) -> Option<MeteorWarning> {
        let MeteorPhase::SiteArmed { site, countdown } = self.phase else {
            return None;
        };
        let remaining_fraction = if interval_secs > 0.0 {
            (countdown / interval_secs).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Some(MeteorWarning {
            site,
            remaining_fraction,
            intensity: 1.0 - remaining_fraction,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) enum StitchRequest {
    #[default]
    Clean,
    Full,
    Local(BTreeSet<Neighborhood>),
}

impl StitchRequest {
    fn mark(&mut self, hoods: Vec<Neighborhood>) {
        match self {
            StitchRequest::Full => {}
            StitchRequest::Local(pending) => pending.extend(hoods),
            StitchRequest::Clean => *self = StitchRequest::Local(hoods.into_iter().collect()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorldSetup {
    pub dt_secs: f64,
    pub pivot: Vec3,
    pub corner_height: f32,
    pub tile_masses: TileMasses,
    pub params: SimParams,
}

impl Default for WorldSetup {
    fn default() -> Self {
        Self {
            dt_secs: 0.02,
            pivot: Vec3::ZERO,
            corner_height: 1.0,
            tile_masses: TileMasses::default(),
            params: SimParams::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub position: Vec3,
    pub navigating: bool,
    pub destination: Option<Vec3>,
    pub stamina: f32,
    pub handicap: f32,
    pub speed_cap: f32,
    pub knockback: Option<Knockback>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PieceCounts {
    pub flat: usize,
    pub straight: usize,
    pub inner: usize,
    pub outer: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub scenario: String,
    pub tick: u64,
    pub elapsed_secs: f64,
    pub width: u32,
    pub height: u32,
    pub layout: Vec<String>,
    pub island: Island,
    pub agents: Vec<AgentSnapshot>,
    pub meteor: MeteorState,
    pub meteor_warning: Option<MeteorWarning>,
    pub pieces: PieceCounts,
}

pub struct World {
    tick: u64,
    elapsed_secs: f64,
    dt_secs: f64,
    pivot: Vec3,
    corner_height: f32,
    pub(crate) params: SimParams,
    pub(crate) grid: TileGrid,
    pub(crate) agents: AgentRegistry,
    pub(crate) island: Island,
    pub(crate) meteor: MeteorState,
    pub(crate) pieces: PieceLedger,
    pub(crate) commands: Vec<AgentCommand>,
    pub(crate) stitch: StitchRequest,
}

impl World {
    pub fn new(setup: WorldSetup) -> Self {
        Self {
            tick: 0,
            elapsed_secs: 0.0,
            dt_secs: setup.dt_secs,
            pivot: setup.pivot,
            corner_height: setup.corner_height,
            params: setup.params,
            grid: TileGrid::uninitialized(setup.tile_masses),
            agents: AgentRegistry::new(),
            island: Island::default(),
            meteor: MeteorState::default(),
            pieces: PieceLedger::new(),
            commands: Vec::new(),
            stitch: StitchRequest::Clean,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn dt_secs(&self) -> f64 {
        self.dt_secs
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    pub fn advance_time(&mut self) {
        self.tick += 1;
        self.elapsed_secs += self.dt_secs;
    }

    pub fn pivot(&self) -> Vec3 {
        self.pivot
    }

    pub fn corner_height(&self) -> f32 {
        self.corner_height
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut SimParams {
        &mut self.params
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn tile_at(&self, x: u32, y: u32) -> Option<&Tile> {
        self.grid.tile_at(x, y)
    }

    pub fn tile_mut(&mut self, pos: TilePos) -> Option<&mut Tile> {
        self.grid.get_mut(pos)
    }

    /// Tile under an island-plane point, used to resolve pointer picks.
    pub fn tile_at_point(&self, point: Vec3) -> Option<&Tile> {
        self.grid
            .pos_at_point(point)
            .and_then(|pos| self.grid.get(pos))
    }

    pub fn agents(&self) -> &AgentRegistry {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id)
    }

    /// The new agent's speed cap starts at what the motion model would give
    /// it standing still: the floor plus its top speed scaled by stamina.
    pub fn spawn_agent(&mut self, spawn: AgentSpawn) -> AgentId {
        let id = self.agents.spawn(spawn);
        let floor = self.params.motion.base_speed_floor;
        if let Some(agent) = self.agents.get_mut(id) {
            agent.nav.speed_cap = floor + agent.max_speed * agent.handicap;
        }
        id
    }

    pub fn select_agents_in(&self, a: Vec2, b: Vec2) -> Vec<AgentId> {
        self.agents.select_in(a, b)
    }

    /// Queued until the next motion step.
    pub fn issue(&mut self, command: AgentCommand) {
        self.commands.push(command);
    }

    pub fn island(&self) -> &Island {
        &self.island
    }

    pub fn meteor(&self) -> &MeteorState {
        &self.meteor
    }

    pub fn pieces(&self) -> &PieceLedger {
        &self.pieces
    }

    /// Rebuilds the grid at new dimensions. All pieces are released and a full
    /// restitch is queued.
    pub fn resize(&mut self, width: u32, height: u32, fill: TileType) {
        for tile in self.grid.iter_mut() {
            for handle in tile.take_all_corners() {
                self.pieces.destroy(handle);
            }
        }
        let dropped = self.grid.resize(width, height, fill);
        debug!(width, height, dropped = dropped.len(), "island resized");
        self.stitch = StitchRequest::Full;
    }

    /// Replaces the tile at `pos` with a new tile of `tile_type`. The old tile's
    /// pieces go with it and the neighborhoods around it are queued for
    /// restitching.
    pub fn replace_tile(&mut self, pos: TilePos, tile_type: TileType) -> Result<TileId, GridError> {
        let (mut old, id) = self.grid.replace(pos, tile_type)?;
        for handle in old.take_all_corners() {
            self.pieces.destroy(handle);
        }
        self.stitch.mark(Neighborhood::touching(&self.grid, pos));
        debug!(x = pos.x, y = pos.y, from = ?old.tile_type, to = ?tile_type, "tile replaced");
        Ok(id)
    }

    /// Paint-brush variant of [`World::replace_tile`]: a no-op when the tile
    /// already has the requested type.
    pub fn paint(&mut self, pos: TilePos, tile_type: TileType) -> Result<Option<TileId>, GridError> {
        match self.grid.get(pos) {
            Some(tile) if tile.tile_type == tile_type => Ok(None),
            _ => self.replace_tile(pos, tile_type).map(Some),
        }
    }

    pub fn stitch_pending(&self) -> bool {
        self.stitch != StitchRequest::Clean
    }

    /// Applies any queued restitching. Returns the number of pieces spawned.
    pub fn flush_stitching(&mut self) -> usize {
        let hoods: Vec<Neighborhood> = match std::mem::take(&mut self.stitch) {
            StitchRequest::Clean => return 0,
            StitchRequest::Full => Neighborhood::all(&self.grid).collect(),
            StitchRequest::Local(pending) => pending.into_iter().collect(),
        };
        let height = self.corner_height;
        hoods
            .into_iter()
            .map(|hood| corners::rebuild_neighborhood(&mut self.grid, &mut self.pieces, hood, height))
            .sum()
    }

    pub fn snapshot(&self, scenario: &str) -> WorldSnapshot {
        let agents = self
            .agents
            .iter()
            .map(|agent| AgentSnapshot {
                id: agent.id,
                position: agent.position,
                navigating: agent.nav.is_navigating(),
                destination: agent.nav.destination,
                stamina: agent.stamina,
                handicap: agent.handicap,
                speed_cap: agent.nav.speed_cap,
                knockback: agent.knockback,
            })
            .collect();
        WorldSnapshot {
            scenario: scenario.to_string(),
            tick: self.tick,
            elapsed_secs: self.elapsed_secs,
            width: self.grid.width(),
            height: self.grid.height(),
            layout: self.grid.rows(),
            island: self.island.clone(),
            agents,
            meteor: self.meteor.clone(),
            meteor_warning: self.meteor.warning(self.params.meteor.interval_secs),
            pieces: PieceCounts {
                flat: self.pieces.count_kind(PieceKind::Flat),
                straight: self.pieces.count_kind(PieceKind::Straight),
                inner: self.pieces.count_kind(PieceKind::Inner),
                outer: self.pieces.count_kind(PieceKind::Outer),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with_grid(width: u32, height: u32) -> World {
        let mut world = World::new(WorldSetup::default());
        world.resize(width, height, TileType::Ground);
        world.flush_stitching();
        world
    }

    #[test]
    fn resize_queues_a_full_restitch() {
        let mut world = World::new(WorldSetup::default());
        assert!(!world.stitch_pending());

        world.resize(3, 3, TileType::Ground);
        assert!(world.stitch_pending());

        assert_eq!(world.flush_stitching(), 16);
        assert!(!world.stitch_pending());
        assert_eq!(world.pieces().count_kind(PieceKind::Flat), 16);
    }

    #[test]
    fn shrinking_releases_every_old_piece() {
        let mut world = world_with_grid(4, 4);
        assert_eq!(world.pieces().len(), 36);

        world.resize(2, 2, TileType::Ground);
        assert!(world.pieces().is_empty());
        world.flush_stitching();
        assert_eq!(world.pieces().len(), 4);
    }

    #[test]
    fn replace_tile_only_restitches_touching_neighborhoods() {
        let mut world = world_with_grid(5, 5);
        let spawned_before = world.pieces().spawned_total();

        world.replace_tile(TilePos::new(2, 2), TileType::Air).unwrap();
        let spawned = world.flush_stitching();

        assert_eq!(world.pieces().spawned_total() - spawned_before, spawned as u64);
        // Four neighborhoods, each now three Flat plus one Inner.
        assert_eq!(spawned, 16);
        assert_eq!(world.pieces().count_kind(PieceKind::Inner), 4);
        assert_eq!(world.pieces().len(), 64);
    }

    #[test]
    fn paint_skips_matching_type() {
        let mut world = world_with_grid(3, 3);
        let pos = TilePos::new(1, 1);
        assert_eq!(world.paint(pos, TileType::Ground).unwrap(), None);
        assert!(world.paint(pos, TileType::Food).unwrap().is_some());
        assert_eq!(world.tile_at(1, 1).unwrap().tile_type, TileType::Food);
    }

    #[test]
    fn meteor_warning_tracks_countdown() {
        let state = MeteorState {
            phase: MeteorPhase::SiteArmed {
                site: TilePos::new(1, 1),
                countdown: 2.5,
            },
            ..MeteorState::default()
        };
        let warning = state.warning(10.0).unwrap();
        assert!((warning.remaining_fraction - 0.25).abs() < 1e-6);
        assert!((warning.intensity - 0.75).abs() < 1e-6);
        assert!(MeteorState::default().warning(10.0).is_none());
    }

    #[test]
    fn spawned_agents_start_at_the_modelled_speed_cap() {
        let mut world = World::new(WorldSetup::default());
        world.resize(3, 3, TileType::Ground);
        let floor = world.params().motion.base_speed_floor;
        let id = world.spawn_agent(AgentSpawn {
            position: Vec3::ZERO,
            destination: None,
            stamina: 0.5,
            max_speed: 2.0,
            mass: 1.0,
        });

        let agent = world.agent(id).expect("agent was spawned");
        assert!((agent.nav.speed_cap - (floor + 1.0)).abs() < 1e-6);
    }

    #[test]
    fn level_island_has_identity_orientation() {
        let island = Island::default();
        assert!(island.orientation().abs_diff_eq(Quat::IDENTITY, 1e-6));
    }
}
