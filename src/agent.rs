//! Agents and the registry that owns them.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(u32);

impl AgentId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Per-agent state of the navigation primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct NavState {
    pub enabled: bool,
    pub destination: Option<Vec3>,
    pub velocity: Vec3,
    pub speed_cap: f32,
}

impl NavState {
    pub fn new(speed_cap: f32) -> Self {
        Self {
            enabled: true,
            destination: None,
            velocity: Vec3::ZERO,
            speed_cap,
        }
    }

    /// True while the agent is under autonomous navigation.
    pub fn is_navigating(&self) -> bool {
        self.enabled
    }

    /// Ignored while navigation is disabled.
    pub fn set_destination(&mut self, point: Vec3) {
        if self.enabled {
            self.destination = Some(point);
        }
    }
}

/// Ballistic hop after an impact. Navigation stays off until the agent lands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Knockback {
    pub vertical_velocity: f32,
    pub ticks_airborne: u32,
}

#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    /// `y` is height above the deck.
    pub position: Vec3,
    pub nav: NavState,
    pub stamina: f32,
    pub max_speed: f32,
    pub mass: f32,
    pub alignment: f32,
    pub handicap: f32,
    pub knockback: Option<Knockback>,
}

impl Agent {
    /// Zero while the agent is airborne or otherwise off navigation, so it
    /// drops out of the island's mass sum.
    pub fn effective_mass(&self) -> f32 {
        if self.nav.is_navigating() {
            self.mass
        } else {
            0.0
        }
    }

    /// Disables navigation and launches the agent upward.
    pub fn knock_back(&mut self, impulse: f32) {
        let vertical_velocity = if self.mass > 0.0 {
            impulse / self.mass
        } else {
            impulse
        };
        self.nav.enabled = false;
        self.nav.velocity = Vec3::ZERO;
        self.knockback = Some(Knockback {
            vertical_velocity,
            ticks_airborne: 0,
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentSpawn {
    pub position: Vec3,
    pub destination: Option<Vec3>,
    pub stamina: f32,
    pub max_speed: f32,
    pub mass: f32,
}

#[derive(Debug, Default, Clone)]
pub struct AgentRegistry {
    agents: Vec<Agent>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, spawn: AgentSpawn) -> AgentId {
        let id = AgentId(self.agents.len() as u32);
        let mut nav = NavState::new(spawn.max_speed);
        if let Some(destination) = spawn.destination {
            nav.set_destination(destination);
        }
        self.agents.push(Agent {
            id,
            position: spawn.position,
            nav,
            stamina: spawn.stamina.clamp(0.0, 1.0),
            max_speed: spawn.max_speed,
            mass: spawn.mass,
            alignment: 0.0,
            handicap: spawn.stamina.clamp(0.0, 1.0),
            knockback: None,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.agents.iter_mut()
    }

    /// Agents whose island-plane position falls inside the rectangle spanned
    /// by two corners, in either order.
    pub fn select_in(&self, a: Vec2, b: Vec2) -> Vec<AgentId> {
        let min = a.min(b);
        let max = a.max(b);
        self.agents
            .iter()
            .filter(|agent| {
                let p = Vec2::new(agent.position.x, agent.position.z);
                p.cmpge(min).all() && p.cmple(max).all()
            })
            .map(|agent| agent.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec3;

    fn spawn_at(registry: &mut AgentRegistry, position: Vec3) -> AgentId {
        registry.spawn(AgentSpawn {
            position,
            destination: None,
            stamina: 1.0,
            max_speed: 3.0,
            mass: 2.0,
        })
    }

    #[test]
    fn knocked_back_agent_has_no_effective_mass() {
        let mut registry = AgentRegistry::new();
        let id = spawn_at(&mut registry, Vec3::ZERO);
        let agent = registry.get_mut(id).unwrap();
        assert_eq!(agent.effective_mass(), 2.0);

        agent.knock_back(6.0);

        assert_eq!(agent.effective_mass(), 0.0);
        assert!(!agent.nav.is_navigating());
        assert_eq!(agent.knockback.map(|k| k.vertical_velocity), Some(3.0));
    }

    #[test]
    fn disabled_navigation_ignores_destinations() {
        let mut nav = NavState::new(1.0);
        nav.enabled = false;
        nav.set_destination(Vec3::ONE);
        assert_eq!(nav.destination, None);
    }

    #[test]
    fn box_selection_accepts_corners_in_any_order() {
        let mut registry = AgentRegistry::new();
        let inside = spawn_at(&mut registry, vec3(1.0, 0.0, 1.0));
        let _outside = spawn_at(&mut registry, vec3(5.0, 0.0, 1.0));

        let selected = registry.select_in(Vec2::new(2.0, 2.0), Vec2::new(0.0, 0.0));
        assert_eq!(selected, vec![inside]);
    }

    #[test]
    fn spawn_clamps_stamina() {
        let mut registry = AgentRegistry::new();
        let id = registry.spawn(AgentSpawn {
            position: Vec3::ZERO,
            destination: Some(Vec3::X),
            stamina: 3.0,
            max_speed: 1.0,
            mass: 1.0,
        });
        let agent = registry.get(id).unwrap();
        assert_eq!(agent.stamina, 1.0);
        assert_eq!(agent.nav.destination, Some(Vec3::X));
    }
}
