use anyhow::Result;
use glam::{Vec2, Vec3};
use tracing::debug;

use crate::{
    agent::Agent,
    command::AgentCommand,
    engine::{System, SystemContext},
    navigation::{DirectNavigator, Navigator},
    params::{KnockbackParams, MotionParams},
    rng::SystemRng,
    world::World,
};

const MIN_PLANAR_LENGTH: f32 = 1e-6;

/// Cosine between the deck-plane tilt and the deck-plane velocity. Positive
/// means moving downhill. Zero when either vector is degenerate.
pub fn downward_alignment(tilt: Vec3, velocity: Vec3) -> f32 {
    let tilt = Vec2::new(tilt.x, tilt.z);
    let velocity = Vec2::new(velocity.x, velocity.z);
    if tilt.length() < MIN_PLANAR_LENGTH || velocity.length() < MIN_PLANAR_LENGTH {
        return 0.0;
    }
    let alignment = tilt.normalize().dot(velocity.normalize());
    if alignment.is_finite() {
        alignment.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Stamina lost walking `moved` units; only uphill movement costs anything.
pub fn stamina_drain(alignment: f32, moved: f32, coefficient: f32) -> f32 {
    (-alignment * moved * coefficient).max(0.0)
}

pub fn handicap(stamina: f32, alignment: f32) -> f32 {
    (stamina + alignment.max(0.0)).clamp(0.0, 1.0)
}

/// Updates stamina, handicap and speed cap after the agent moved `moved`
/// units this tick with its current velocity.
pub fn apply_motion_model(agent: &mut Agent, tilt: Vec3, moved: f32, params: &MotionParams) {
    let alignment = downward_alignment(tilt, agent.nav.velocity);
    let drained = stamina_drain(alignment, moved, params.drain_coefficient);
    agent.alignment = alignment;
    agent.stamina = (agent.stamina - drained).clamp(0.0, 1.0);
    agent.handicap = handicap(agent.stamina, alignment);
    agent.nav.speed_cap = params.base_speed_floor + agent.max_speed * agent.handicap;
}

/// Integrates one tick of a knocked-back hop. Returns true when the agent
/// lands and gets navigation back.
pub fn advance_knockback(agent: &mut Agent, dt: f32, params: &KnockbackParams) -> bool {
    let Some(knockback) = agent.knockback.as_mut() else {
        return false;
    };
    knockback.vertical_velocity -= params.gravity * dt;
    agent.position.y += knockback.vertical_velocity * dt;
    knockback.ticks_airborne += 1;

    let descending = knockback.vertical_velocity <= 0.0;
    if descending && agent.position.y <= params.recovery_height {
        agent.position.y = 0.0;
        agent.knockback = None;
        agent.nav.enabled = true;
        agent.nav.velocity = Vec3::ZERO;
        true
    } else {
        false
    }
}

pub struct MotionSystem {
    navigator: Option<Box<dyn Navigator>>,
}

impl MotionSystem {
    /// Uses straight-line steering with the world's arrive distance.
    pub fn new() -> Self {
        Self { navigator: None }
    }

    pub fn with_navigator(navigator: impl Navigator + 'static) -> Self {
        Self {
            navigator: Some(Box::new(navigator)),
        }
    }
}

impl Default for MotionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for MotionSystem {
    fn name(&self) -> &str {
        "motion"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        for command in std::mem::take(&mut world.commands) {
            match command {
                AgentCommand::MoveTo { agents, tile } => {
                    let destination = tile.world_position();
                    for id in agents {
                        if let Some(agent) = world.agents.get_mut(id) {
                            agent.nav.set_destination(destination);
                        }
                    }
                }
            }
        }

        let arrive_distance = world.params.motion.arrive_distance;
        let navigator = self
            .navigator
            .get_or_insert_with(|| Box::new(DirectNavigator::new(arrive_distance)) as Box<dyn Navigator>);
        let tilt = world.island.tilt;
        let motion = &world.params.motion;
        let knockback = &world.params.knockback;

        for agent in world.agents.iter_mut() {
            if agent.knockback.is_some() {
                if advance_knockback(agent, ctx.dt_secs, knockback) {
                    debug!(agent = agent.id.raw(), tick = ctx.tick, "agent recovered from knockback");
                }
                continue;
            }
            if !agent.nav.is_navigating() {
                continue;
            }

            let before = agent.position;
            navigator.step(&mut agent.nav, &mut agent.position, ctx.dt_secs);
            let moved = Vec2::new(agent.position.x - before.x, agent.position.z - before.z).length();
            apply_motion_model(agent, tilt, moved, motion);
        }
        Ok(())
    }
}
