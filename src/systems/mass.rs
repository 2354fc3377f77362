use anyhow::Result;
use glam::Vec3;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Weighted mean of `(position, mass)` pairs. Returns the total mass and the
/// centre, which stays at the origin when the total is zero.
pub fn center_of_mass(bodies: impl IntoIterator<Item = (Vec3, f32)>) -> (f32, Vec3) {
    let (total, weighted) = bodies
        .into_iter()
        .fold((0.0_f32, Vec3::ZERO), |(total, weighted), (pos, mass)| {
            (total + mass, weighted + pos * mass)
        });
    if total != 0.0 {
        (total, weighted / total)
    } else {
        (total, Vec3::ZERO)
    }
}

/// Horizontal offset of `center` from `pivot`, scaled. Neutral when there is
/// no mass to balance.
pub fn com_offset(total_mass: f32, center: Vec3, pivot: Vec3, multiplier: f32) -> Vec3 {
    if total_mass == 0.0 {
        return Vec3::ZERO;
    }
    let mut offset = (center - pivot) * multiplier;
    offset.y = 0.0;
    offset
}

pub struct MassSystem;

impl MassSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MassSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for MassSystem {
    fn name(&self) -> &str {
        "mass"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let params = &world.params.mass;
        let tiles = world
            .grid
            .iter()
            .map(|tile| (tile.world_position(), tile.mass() * params.tile_multiplier));
        let agents = world
            .agents
            .iter()
            .map(|agent| (agent.position, agent.effective_mass() * params.agent_multiplier));
        let (total, center) = center_of_mass(tiles.chain(agents));

        let pivot = world.pivot();
        let offset = com_offset(total, center, pivot, params.total_multiplier);
        let island = &mut world.island;
        island.total_mass = total;
        island.center_of_mass = center;
        island.com_offset = offset;
        island.indicator = pivot + offset;
        Ok(())
    }
}
