//! Navigation seam. Pathfinding is out of scope; the motion system only needs
//! something that moves an agent toward its destination at its speed cap.

use glam::Vec3;

use crate::agent::NavState;

pub trait Navigator {
    /// Moves `position` one tick toward `nav.destination` and records the
    /// resulting velocity. Must leave the agent alone while disabled.
    fn step(&mut self, nav: &mut NavState, position: &mut Vec3, dt: f32);
}

/// Straight-line steering across the deck.
#[derive(Debug, Clone)]
pub struct DirectNavigator {
    arrive_distance: f32,
}

impl DirectNavigator {
    pub fn new(arrive_distance: f32) -> Self {
        Self {
            arrive_distance: arrive_distance.max(0.0),
        }
    }
}

impl Default for DirectNavigator {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl Navigator for DirectNavigator {
    fn step(&mut self, nav: &mut NavState, position: &mut Vec3, dt: f32) {
        if !nav.enabled {
            return;
        }
        let Some(destination) = nav.destination else {
            nav.velocity = Vec3::ZERO;
            return;
        };
        if dt <= 0.0 {
            nav.velocity = Vec3::ZERO;
            return;
        }

        let mut to_target = destination - *position;
        to_target.y = 0.0;
        let distance = to_target.length();
        if distance <= self.arrive_distance {
            nav.destination = None;
            nav.velocity = Vec3::ZERO;
            return;
        }

        let travel = (nav.speed_cap.max(0.0) * dt).min(distance);
        let delta = to_target / distance * travel;
        *position += delta;
        nav.velocity = delta / dt;
    }
}
