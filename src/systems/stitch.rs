use anyhow::Result;
use tracing::debug;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Regenerates corner pieces for whatever the earlier systems changed.
pub struct StitchSystem;

impl StitchSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StitchSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for StitchSystem {
    fn name(&self) -> &str {
        "stitch"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        if !world.stitch_pending() {
            return Ok(());
        }
        let spawned = world.flush_stitching();
        debug!(tick = ctx.tick, spawned, live = world.pieces().len(), "corners restitched");
        Ok(())
    }
}
