use anyhow::Result;
use glam::Vec3;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Flattens the offset onto the deck plane and caps its length at `max`.
pub fn capped_target(offset: Vec3, max: f32) -> Vec3 {
    let flat = Vec3::new(offset.x, 0.0, offset.z);
    let max = max.max(0.0);
    if flat.length() > max {
        flat.normalize_or_zero() * max
    } else {
        flat
    }
}

/// One step of exponential smoothing toward `target`.
pub fn damp(current: Vec3, target: Vec3, smoothing: f32) -> Vec3 {
    let alpha = smoothing.clamp(0.0, 1.0);
    current * alpha + target * (1.0 - alpha)
}

pub struct TiltSystem;

impl TiltSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TiltSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for TiltSystem {
    fn name(&self) -> &str {
        "tilt"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let params = &world.params.tilt;
        let island = &mut world.island;
        island.target_tilt = capped_target(island.com_offset, params.max_degrees);
        island.tilt = damp(island.tilt, island.target_tilt, params.smoothing);
        island.pitch_deg = -island.tilt.z;
        island.roll_deg = island.tilt.x;
        Ok(())
    }
}
