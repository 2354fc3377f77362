//! Corner stitching: junction pieces derived from the solid/air pattern of
//! every 2x2 tile neighborhood.

use glam::{vec3, Vec3};
use serde::Serialize;

use crate::grid::{Corner, TileGrid, TilePos};
use crate::pieces::Rotation::{Deg0, Deg180, Deg270, Deg90};
use crate::pieces::{PieceKind, PieceSpawner, Rotation};

/// Position of a piece inside its 2x2 neighborhood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Quadrant {
    NorthWest,
    NorthEast,
    SouthEast,
    SouthWest,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::NorthWest,
        Quadrant::NorthEast,
        Quadrant::SouthEast,
        Quadrant::SouthWest,
    ];

    /// Displacement from the neighborhood basis (the north-west tile centre).
    pub fn displacement(self) -> Vec3 {
        match self {
            Quadrant::NorthWest => vec3(0.5, 0.0, 0.5),
            Quadrant::NorthEast => vec3(1.0, 0.0, 0.5),
            Quadrant::SouthEast => vec3(1.0, 0.0, 1.0),
            Quadrant::SouthWest => vec3(0.5, 0.0, 1.0),
        }
    }

    /// The tile corner this quadrant covers: the north-west tile's south-east
    /// corner, and so on around the shared vertex.
    pub fn owner_corner(self) -> Corner {
        match self {
            Quadrant::NorthWest => Corner::SouthEast,
            Quadrant::NorthEast => Corner::SouthWest,
            Quadrant::SouthEast => Corner::NorthWest,
            Quadrant::SouthWest => Corner::NorthEast,
        }
    }
}

/// A 2x2 block keyed by its south-east tile; valid for x in [1, width) and
/// y in [1, height).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Neighborhood {
    pub x: u32,
    pub y: u32,
}

impl Neighborhood {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub fn tile(self, quadrant: Quadrant) -> TilePos {
        match quadrant {
            Quadrant::NorthWest => TilePos::new(self.x - 1, self.y - 1),
            Quadrant::NorthEast => TilePos::new(self.x, self.y - 1),
            Quadrant::SouthEast => TilePos::new(self.x, self.y),
            Quadrant::SouthWest => TilePos::new(self.x - 1, self.y),
        }
    }

    pub fn basis(self) -> Vec3 {
        self.tile(Quadrant::NorthWest).world_position()
    }

    pub fn all(grid: &TileGrid) -> impl Iterator<Item = Neighborhood> {
        let width = grid.width();
        let height = grid.height();
        (1..width).flat_map(move |x| (1..height).map(move |y| Neighborhood::new(x, y)))
    }

    /// The up-to-four neighborhoods that include `pos`, clamped to the grid.
    pub fn touching(grid: &TileGrid, pos: TilePos) -> Vec<Neighborhood> {
        let mut hoods = Vec::with_capacity(4);
        for x in pos.x..=pos.x.saturating_add(1) {
            for y in pos.y..=pos.y.saturating_add(1) {
                if x >= 1 && x < grid.width() && y >= 1 && y < grid.height() {
                    hoods.push(Neighborhood::new(x, y));
                }
            }
        }
        hoods
    }
}

pub type Slot = Option<(PieceKind, Rotation)>;

const NONE: Slot = None;

const fn flat(rotation: Rotation) -> Slot {
    Some((PieceKind::Flat, rotation))
}

const fn straight(rotation: Rotation) -> Slot {
    Some((PieceKind::Straight, rotation))
}

const fn inner(rotation: Rotation) -> Slot {
    Some((PieceKind::Inner, rotation))
}

const fn outer(rotation: Rotation) -> Slot {
    Some((PieceKind::Outer, rotation))
}

/// Index bits: nw = 8, ne = 4, se = 2, sw = 1. Slots are [nw, ne, se, sw].
///
/// Outward facing per quadrant is nw 90, ne 0, se 270, sw 180. An inner piece
/// faces the gap it fills: nw 270, ne 180, se 90, sw 0. Straights face the
/// empty side of the solid edge.
#[rustfmt::skip]
const JUNCTION_TABLE: [[Slot; 4]; 16] = [
    // 0000  _ _ / _ _
    [NONE, NONE, NONE, NONE],
    // 0001  sw only
    [NONE, NONE, NONE, outer(Deg180)],
    // 0010  se only
    [NONE, NONE, outer(Deg270), NONE],
    // 0011  bottom row
    [NONE, NONE, straight(Deg180), straight(Deg180)],
    // 0100  ne only
    [NONE, outer(Deg0), NONE, NONE],
    // 0101  ne + sw diagonal. Each solid reuses its own gap-facing inner
    // rotation: both cells adjacent to a diagonal solid are the gaps.
    [NONE, inner(Deg180), NONE, inner(Deg0)],
    // 0110  right column
    [NONE, straight(Deg270), straight(Deg270), NONE],
    // 0111  nw missing
    [inner(Deg270), flat(Deg0), flat(Deg270), flat(Deg180)],
    // 1000  nw only
    [outer(Deg90), NONE, NONE, NONE],
    // 1001  left column
    [straight(Deg90), NONE, NONE, straight(Deg90)],
    // 1010  nw + se diagonal, same reasoning; both open onto ne and sw.
    [inner(Deg270), NONE, inner(Deg90), NONE],
    // 1011  ne missing
    [flat(Deg90), inner(Deg180), flat(Deg270), flat(Deg180)],
    // 1100  top row
    [straight(Deg0), straight(Deg0), NONE, NONE],
    // 1101  se missing
    [flat(Deg90), flat(Deg0), inner(Deg90), flat(Deg180)],
    // 1110  sw missing
    [flat(Deg90), flat(Deg0), flat(Deg270), inner(Deg0)],
    // 1111  full
    [flat(Deg90), flat(Deg0), flat(Deg270), flat(Deg180)],
];

/// Table lookup for one neighborhood's solid flags, in [nw, ne, se, sw] order.
pub fn junction_case(nw: bool, ne: bool, se: bool, sw: bool) -> [Slot; 4] {
    let index = (usize::from(nw) << 3) | (usize::from(ne) << 2) | (usize::from(se) << 1) | usize::from(sw);
    JUNCTION_TABLE[index]
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CornerJunction {
    pub neighborhood: Neighborhood,
    pub quadrant: Quadrant,
    pub kind: PieceKind,
    pub rotation: Rotation,
    pub position: Vec3,
}

pub fn piece_position(hood: Neighborhood, quadrant: Quadrant, rotation: Rotation, height: f32) -> Vec3 {
    hood.basis() + quadrant.displacement() + rotation.pivot_offset() + Vec3::Y * height
}

pub fn stitch_neighborhood(grid: &TileGrid, hood: Neighborhood, height: f32) -> Vec<CornerJunction> {
    let solid = |quadrant| grid.is_solid(hood.tile(quadrant));
    let slots = junction_case(
        solid(Quadrant::NorthWest),
        solid(Quadrant::NorthEast),
        solid(Quadrant::SouthEast),
        solid(Quadrant::SouthWest),
    );
    Quadrant::ALL
        .iter()
        .zip(slots)
        .filter_map(|(&quadrant, slot)| {
            slot.map(|(kind, rotation)| CornerJunction {
                neighborhood: hood,
                quadrant,
                kind,
                rotation,
                position: piece_position(hood, quadrant, rotation, height),
            })
        })
        .collect()
}

/// Every junction the grid currently calls for. Pure; the grid is untouched.
pub fn stitch_grid(grid: &TileGrid, height: f32) -> Vec<CornerJunction> {
    Neighborhood::all(grid)
        .flat_map(|hood| stitch_neighborhood(grid, hood, height))
        .collect()
}

/// Destroys whatever the neighborhood currently owns, then spawns its fresh
/// pieces and hands each to the tile whose corner it covers. Returns the
/// number of pieces spawned.
pub fn rebuild_neighborhood<S: PieceSpawner>(
    grid: &mut TileGrid,
    spawner: &mut S,
    hood: Neighborhood,
    height: f32,
) -> usize {
    for quadrant in Quadrant::ALL {
        if let Some(tile) = grid.get_mut(hood.tile(quadrant)) {
            if let Some(handle) = tile.take_corner(quadrant.owner_corner()) {
                spawner.destroy(handle);
            }
        }
    }

    let junctions = stitch_neighborhood(grid, hood, height);
    for junction in &junctions {
        let handle = spawner.spawn(junction.kind, junction.rotation, junction.position);
        if let Some(tile) = grid.get_mut(hood.tile(junction.quadrant)) {
            tile.set_corner(junction.quadrant.owner_corner(), handle);
        }
    }
    junctions.len()
}
