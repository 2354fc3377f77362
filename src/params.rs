//! Tunables read by the systems. Loaded from the scenario once and stored on
//! the world, so tests can adjust them between ticks.

use serde::{Deserialize, Serialize};

use crate::grid::TilePos;

fn one() -> f32 {
    1.0
}

fn default_max_tilt() -> f32 {
    45.0
}

fn default_smoothing() -> f32 {
    0.9
}

fn default_max_speed() -> f32 {
    3.5
}

fn default_speed_floor() -> f32 {
    0.25
}

fn default_drain() -> f32 {
    0.05
}

fn default_arrive_distance() -> f32 {
    0.1
}

fn default_gravity() -> f32 {
    9.81
}

fn default_recovery_height() -> f32 {
    0.01
}

fn default_enabled() -> bool {
    true
}

fn default_interval() -> f32 {
    10.0
}

fn default_strength() -> f32 {
    25.0
}

fn default_impact_min() -> f32 {
    2.0
}

fn default_impact_mult() -> f32 {
    0.5
}

fn default_decay_factor() -> f32 {
    0.9
}

fn default_decay_ticks() -> u32 {
    50
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassParams {
    #[serde(default = "one")]
    pub agent_multiplier: f32,
    #[serde(default = "one")]
    pub tile_multiplier: f32,
    #[serde(default = "one")]
    pub total_multiplier: f32,
}

impl Default for MassParams {
    fn default() -> Self {
        Self {
            agent_multiplier: one(),
            tile_multiplier: one(),
            total_multiplier: one(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TiltParams {
    /// Cap on the tilt vector magnitude, in degrees.
    #[serde(default = "default_max_tilt")]
    pub max_degrees: f32,
    /// Exponential smoothing factor in [0, 1); higher is slower.
    #[serde(default = "default_smoothing")]
    pub smoothing: f32,
}

impl Default for TiltParams {
    fn default() -> Self {
        Self {
            max_degrees: default_max_tilt(),
            smoothing: default_smoothing(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionParams {
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,
    #[serde(default = "default_speed_floor")]
    pub base_speed_floor: f32,
    #[serde(default = "default_drain")]
    pub drain_coefficient: f32,
    #[serde(default = "default_arrive_distance")]
    pub arrive_distance: f32,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            max_speed: default_max_speed(),
            base_speed_floor: default_speed_floor(),
            drain_coefficient: default_drain(),
            arrive_distance: default_arrive_distance(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnockbackParams {
    #[serde(default = "default_gravity")]
    pub gravity: f32,
    /// Height above the deck at which a knocked agent counts as landed.
    #[serde(default = "default_recovery_height")]
    pub recovery_height: f32,
}

impl Default for KnockbackParams {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            recovery_height: default_recovery_height(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeteorParams {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_interval")]
    pub interval_secs: f32,
    /// Transient mass added to the struck tile.
    #[serde(default = "default_strength")]
    pub strength: f32,
    #[serde(default = "default_impact_min")]
    pub impact_min: f32,
    /// Extra upward impulse per unit of horizontal distance from the pivot.
    #[serde(default = "default_impact_mult")]
    pub impact_mult: f32,
    #[serde(default = "default_decay_factor")]
    pub decay_factor: f32,
    #[serde(default = "default_decay_ticks")]
    pub decay_ticks: u32,
    #[serde(default)]
    pub candidate_sites: Vec<TilePos>,
}

impl Default for MeteorParams {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_secs: default_interval(),
            strength: default_strength(),
            impact_min: default_impact_min(),
            impact_mult: default_impact_mult(),
            decay_factor: default_decay_factor(),
            decay_ticks: default_decay_ticks(),
            candidate_sites: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    #[serde(default)]
    pub mass: MassParams,
    #[serde(default)]
    pub tilt: TiltParams,
    #[serde(default)]
    pub motion: MotionParams,
    #[serde(default)]
    pub knockback: KnockbackParams,
    #[serde(default)]
    pub meteor: MeteorParams,
}
