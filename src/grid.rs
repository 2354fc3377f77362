//! Tile grid - the island deck

use glam::{vec3, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pieces::PieceHandle;

/// Tile position in the grid. `x` runs along world X, `y` along world Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub x: u32,
    pub y: u32,
}

impl TilePos {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Island-local position of the tile centre.
    pub fn world_position(self) -> Vec3 {
        vec3(self.x as f32, 0.0, self.y as f32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileType {
    Ground,
    Air,
    Mountain,
    Food,
    Magnet,
    Meteor,
}

impl TileType {
    /// Everything but air counts as deck for corner stitching.
    pub fn is_solid(self) -> bool {
        self != TileType::Air
    }

    /// Glyphs used by scenario layouts and snapshot dumps.
    pub fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '#' => Some(TileType::Ground),
            '.' => Some(TileType::Air),
            '^' => Some(TileType::Mountain),
            'f' => Some(TileType::Food),
            'm' => Some(TileType::Magnet),
            '*' => Some(TileType::Meteor),
            _ => None,
        }
    }

    pub fn glyph(self) -> char {
        match self {
            TileType::Ground => '#',
            TileType::Air => '.',
            TileType::Mountain => '^',
            TileType::Food => 'f',
            TileType::Magnet => 'm',
            TileType::Meteor => '*',
        }
    }
}

/// Designer-set base mass per tile type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileMasses {
    pub ground: f32,
    pub air: f32,
    pub mountain: f32,
    pub food: f32,
    pub magnet: f32,
    pub meteor: f32,
}

impl Default for TileMasses {
    fn default() -> Self {
        Self {
            ground: 1.0,
            air: 0.0,
            mountain: 0.0,
            food: 0.0,
            magnet: 0.0,
            meteor: 0.0,
        }
    }
}

impl TileMasses {
    pub fn mass_of(&self, tile_type: TileType) -> f32 {
        match tile_type {
            TileType::Ground => self.ground,
            TileType::Air => self.air,
            TileType::Mountain => self.mountain,
            TileType::Food => self.food,
            TileType::Magnet => self.magnet,
            TileType::Meteor => self.meteor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId(u64);

impl TileId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// The four corners of a single tile. Each one is shared with one 2x2
/// neighborhood, and the tile owns whatever piece that neighborhood put there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    NorthWest,
    NorthEast,
    SouthEast,
    SouthWest,
}

impl Corner {
    fn index(self) -> usize {
        match self {
            Corner::NorthWest => 0,
            Corner::NorthEast => 1,
            Corner::SouthEast => 2,
            Corner::SouthWest => 3,
        }
    }
}

/// Geometric decay of a transient mass spike, advanced once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MassDecay {
    pub ticks_remaining: u32,
    pub factor: f32,
}

#[derive(Debug, Clone)]
pub struct Tile {
    pub id: TileId,
    pub pos: TilePos,
    pub tile_type: TileType,
    pub base_mass: f32,
    pub extra_mass: f32,
    pub decay: Option<MassDecay>,
    corners: [Option<PieceHandle>; 4],
}

impl Tile {
    fn new(id: TileId, pos: TilePos, tile_type: TileType, base_mass: f32) -> Self {
        Self {
            id,
            pos,
            tile_type,
            base_mass,
            extra_mass: 0.0,
            decay: None,
            corners: [None; 4],
        }
    }

    pub fn mass(&self) -> f32 {
        self.base_mass + self.extra_mass
    }

    pub fn world_position(&self) -> Vec3 {
        self.pos.world_position()
    }

    pub fn is_solid(&self) -> bool {
        self.tile_type.is_solid()
    }

    pub fn corner(&self, corner: Corner) -> Option<PieceHandle> {
        self.corners[corner.index()]
    }

    pub fn corner_handles(&self) -> impl Iterator<Item = PieceHandle> + '_ {
        self.corners.iter().flatten().copied()
    }

    pub(crate) fn set_corner(&mut self, corner: Corner, handle: PieceHandle) {
        self.corners[corner.index()] = Some(handle);
    }

    pub(crate) fn take_corner(&mut self, corner: Corner) -> Option<PieceHandle> {
        self.corners[corner.index()].take()
    }

    pub(crate) fn take_all_corners(&mut self) -> Vec<PieceHandle> {
        self.corners.iter_mut().filter_map(Option::take).collect()
    }

    /// Adds a transient spike that then decays by `decay.factor` per tick and
    /// snaps to zero once `decay.ticks_remaining` ticks have passed.
    pub fn spike_mass(&mut self, amount: f32, decay: MassDecay) {
        self.extra_mass += amount;
        self.decay = (decay.ticks_remaining > 0).then_some(decay);
        if self.decay.is_none() {
            self.extra_mass = 0.0;
        }
    }

    /// Returns true on the tick the decay finishes.
    pub fn advance_decay(&mut self) -> bool {
        let Some(decay) = self.decay.as_mut() else {
            return false;
        };
        decay.ticks_remaining = decay.ticks_remaining.saturating_sub(1);
        if decay.ticks_remaining == 0 {
            self.extra_mass = 0.0;
            self.decay = None;
            true
        } else {
            self.extra_mass *= decay.factor;
            false
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("tile ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}

/// Row-major tile storage. A 0x0 grid is the uninitialized state.
#[derive(Debug, Clone)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
    masses: TileMasses,
    next_id: u64,
}

impl TileGrid {
    pub fn uninitialized(masses: TileMasses) -> Self {
        Self {
            width: 0,
            height: 0,
            tiles: Vec::new(),
            masses,
            next_id: 0,
        }
    }

    pub fn filled(width: u32, height: u32, fill: TileType, masses: TileMasses) -> Self {
        let mut grid = Self::uninitialized(masses);
        grid.resize(width, height, fill);
        grid
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_initialized(&self) -> bool {
        !self.tiles.is_empty()
    }

    pub fn masses(&self) -> &TileMasses {
        &self.masses
    }

    pub fn contains(&self, pos: TilePos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    fn index(&self, pos: TilePos) -> Option<usize> {
        self.contains(pos)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }

    pub fn get(&self, pos: TilePos) -> Option<&Tile> {
        self.index(pos).map(|i| &self.tiles[i])
    }

    pub fn get_mut(&mut self, pos: TilePos) -> Option<&mut Tile> {
        self.index(pos).map(move |i| &mut self.tiles[i])
    }

    pub fn tile_at(&self, x: u32, y: u32) -> Option<&Tile> {
        self.get(TilePos::new(x, y))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tile> {
        self.tiles.iter_mut()
    }

    /// Out-of-bounds cells read as air.
    pub fn is_solid(&self, pos: TilePos) -> bool {
        self.get(pos).map(Tile::is_solid).unwrap_or(false)
    }

    /// Nearest cell to an island-plane point, if the point lies on the deck.
    pub fn pos_at_point(&self, point: Vec3) -> Option<TilePos> {
        let x = point.x.round();
        let y = point.z.round();
        if x < 0.0 || y < 0.0 {
            return None;
        }
        let pos = TilePos::new(x as u32, y as u32);
        self.contains(pos).then_some(pos)
    }

    fn allocate(&mut self, pos: TilePos, tile_type: TileType) -> Tile {
        let id = TileId(self.next_id);
        self.next_id += 1;
        Tile::new(id, pos, tile_type, self.masses.mass_of(tile_type))
    }

    /// Rebuilds the cell array at new dimensions. Cells inside both the old and
    /// new bounds survive; new cells take `fill`. Dropped tiles are returned so
    /// the caller can release what they own.
    pub fn resize(&mut self, width: u32, height: u32, fill: TileType) -> Vec<Tile> {
        let old_width = self.width;
        let old_height = self.height;
        let mut old: Vec<Option<Tile>> = std::mem::take(&mut self.tiles)
            .into_iter()
            .map(Some)
            .collect();

        let mut tiles = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let pos = TilePos::new(x, y);
                let kept = if x < old_width && y < old_height {
                    old[(y * old_width + x) as usize].take()
                } else {
                    None
                };
                let tile = match kept {
                    Some(tile) => tile,
                    None => self.allocate(pos, fill),
                };
                tiles.push(tile);
            }
        }

        self.width = width;
        self.height = height;
        self.tiles = tiles;
        old.into_iter().flatten().collect()
    }

    /// Swaps the tile at `pos` for a fresh one of `tile_type`. The old tile,
    /// with its pieces and any pending mass decay, is handed back.
    pub fn replace(&mut self, pos: TilePos, tile_type: TileType) -> Result<(Tile, TileId), GridError> {
        let index = self.index(pos).ok_or(GridError::OutOfBounds {
            x: pos.x,
            y: pos.y,
            width: self.width,
            height: self.height,
        })?;
        let fresh = self.allocate(pos, tile_type);
        let id = fresh.id;
        let old = std::mem::replace(&mut self.tiles[index], fresh);
        Ok((old, id))
    }

    /// One string per row, using layout glyphs.
    pub fn rows(&self) -> Vec<String> {
        self.tiles
            .chunks(self.width.max(1) as usize)
            .map(|row| row.iter().map(|t| t.tile_type.glyph()).collect())
            .collect()
    }
}
