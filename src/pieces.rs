//! Corner pieces and the spawning seam they are created through.
//!
//! Mesh instancing is not modelled here. Anything that can hand out a handle for
//! a `(kind, rotation, position)` triple and later forget it implements
//! [`PieceSpawner`]; [`PieceLedger`] is the in-memory implementation the world
//! uses by default.

use std::collections::BTreeMap;

use glam::{vec3, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PieceHandle(u64);

impl PieceHandle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PieceKind {
    Flat,
    Straight,
    Inner,
    Outer,
}

/// Quarter turns about the island's vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> f32 {
        match self {
            Rotation::Deg0 => 0.0,
            Rotation::Deg90 => 90.0,
            Rotation::Deg180 => 180.0,
            Rotation::Deg270 => 270.0,
        }
    }

    /// Shift that keeps a rotated quarter-tile mesh inside its own quadrant.
    /// Piece meshes pivot on a corner, so every quarter turn moves the body
    /// half a tile unless it is pulled back.
    pub fn pivot_offset(self) -> Vec3 {
        match self {
            Rotation::Deg0 => Vec3::ZERO,
            Rotation::Deg90 => vec3(-0.5, 0.0, 0.0),
            Rotation::Deg180 => vec3(-0.5, 0.0, 0.5),
            Rotation::Deg270 => vec3(0.0, 0.0, 0.5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PiecePlacement {
    pub kind: PieceKind,
    pub rotation: Rotation,
    pub position: Vec3,
}

pub trait PieceSpawner {
    fn spawn(&mut self, kind: PieceKind, rotation: Rotation, position: Vec3) -> PieceHandle;
    fn destroy(&mut self, handle: PieceHandle);
}

/// Live pieces keyed by handle, plus lifetime counters for diagnostics.
#[derive(Debug, Default)]
pub struct PieceLedger {
    next_handle: u64,
    live: BTreeMap<PieceHandle, PiecePlacement>,
    spawned_total: u64,
    destroyed_total: u64,
}

impl PieceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn get(&self, handle: PieceHandle) -> Option<&PiecePlacement> {
        self.live.get(&handle)
    }

    pub fn placements(&self) -> impl Iterator<Item = (PieceHandle, &PiecePlacement)> {
        self.live.iter().map(|(handle, placement)| (*handle, placement))
    }

    pub fn count_kind(&self, kind: PieceKind) -> usize {
        self.live.values().filter(|p| p.kind == kind).count()
    }

    pub fn spawned_total(&self) -> u64 {
        self.spawned_total
    }

    pub fn destroyed_total(&self) -> u64 {
        self.destroyed_total
    }
}

impl PieceSpawner for PieceLedger {
    fn spawn(&mut self, kind: PieceKind, rotation: Rotation, position: Vec3) -> PieceHandle {
        let handle = PieceHandle(self.next_handle);
        self.next_handle += 1;
        self.spawned_total += 1;
        self.live.insert(
            handle,
            PiecePlacement {
                kind,
                rotation,
                position,
            },
        );
        handle
    }

    fn destroy(&mut self, handle: PieceHandle) {
        if self.live.remove(&handle).is_some() {
            self.destroyed_total += 1;
        }
    }
}
