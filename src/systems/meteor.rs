use anyhow::Result;
use glam::Vec2;
use tracing::{debug, info, warn};

use crate::{
    engine::{System, SystemContext},
    grid::{MassDecay, TileGrid, TilePos, TileType},
    rng::SystemRng,
    world::{ImpactRecord, MeteorPhase, World},
};

/// A valid strike site is an in-bounds Ground tile.
pub fn is_valid_site(grid: &TileGrid, pos: TilePos) -> bool {
    grid.get(pos)
        .is_some_and(|tile| tile.tile_type == TileType::Ground)
}

/// Round-robin search over `candidates` starting at `cursor`. Returns the
/// chosen site and the cursor for the next search, or `None` after a full
/// pass without a valid site.
pub fn find_site(grid: &TileGrid, candidates: &[TilePos], cursor: usize) -> Option<(TilePos, usize)> {
    let len = candidates.len();
    (0..len)
        .map(|step| (cursor + step) % len)
        .find(|&index| is_valid_site(grid, candidates[index]))
        .map(|index| (candidates[index], (index + 1) % len))
}

/// Upward impulse for an agent at horizontal distance `distance` from the pivot.
pub fn impact_impulse(distance: f32, impact_mult: f32, impact_min: f32) -> f32 {
    distance * impact_mult + impact_min
}

pub struct MeteorSystem;

impl MeteorSystem {
    pub fn new() -> Self {
        Self
    }

    fn advance_decay(world: &mut World) {
        for tile in world.grid.iter_mut() {
            if tile.advance_decay() {
                debug!(x = tile.pos.x, y = tile.pos.y, "impact mass decayed");
            }
        }
    }

    fn arm(world: &mut World) {
        let candidates = &world.params.meteor.candidate_sites;
        match find_site(&world.grid, candidates, world.meteor.cursor) {
            Some((site, next_cursor)) => {
                let countdown = world.params.meteor.interval_secs;
                world.meteor.cursor = next_cursor;
                world.meteor.phase = MeteorPhase::SiteArmed { site, countdown };
                info!(x = site.x, y = site.y, countdown, "meteor site armed");
            }
            None => debug!("no meteor site available"),
        }
    }

    fn strike(world: &mut World, site: TilePos, tick: u64) -> Result<()> {
        let params = world.params.meteor.clone();
        let tile = world.replace_tile(site, TileType::Meteor)?;
        if let Some(struck) = world.grid.get_mut(site) {
            struck.spike_mass(
                params.strength,
                MassDecay {
                    ticks_remaining: params.decay_ticks,
                    factor: params.decay_factor,
                },
            );
        }

        let pivot = world.pivot();
        let pivot = Vec2::new(pivot.x, pivot.z);
        let mut agents_hit = 0;
        for agent in world.agents.iter_mut() {
            let distance = Vec2::new(agent.position.x, agent.position.z).distance(pivot);
            agent.knock_back(impact_impulse(distance, params.impact_mult, params.impact_min));
            agents_hit += 1;
        }

        world.meteor.impacts += 1;
        world.meteor.last_impact = Some(ImpactRecord {
            tick,
            site,
            tile,
            agents_hit,
        });
        info!(x = site.x, y = site.y, tick, agents_hit, "meteor impact");
        Ok(())
    }
}

impl Default for MeteorSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for MeteorSystem {
    fn name(&self) -> &str {
        "meteor"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        Self::advance_decay(world);

        if !world.params.meteor.enabled || !world.grid.is_initialized() {
            return Ok(());
        }

        match world.meteor.phase {
            MeteorPhase::Idle => Self::arm(world),
            MeteorPhase::SiteArmed { site, countdown } => {
                if !is_valid_site(&world.grid, site) {
                    warn!(x = site.x, y = site.y, "armed meteor site is no longer ground");
                    world.meteor.phase = MeteorPhase::Idle;
                    return Ok(());
                }
                let countdown = countdown - ctx.dt_secs;
                if countdown <= 0.0 {
                    world.meteor.phase = MeteorPhase::Idle;
                    Self::strike(world, site, ctx.tick)?;
                } else {
                    world.meteor.phase = MeteorPhase::SiteArmed { site, countdown };
                }
            }
        }
        Ok(())
    }
}
