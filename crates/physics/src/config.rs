//! # World Configuration
//!
//! Every field has a default, so a partial JSON document such as
//! `{"gravity": {"x": 0.0, "y": -1.62}}` deserializes into a full config.

use serde::{Deserialize, Serialize};

use crate::collision::{CombineRule, ContactSettings};
use crate::equations::{DEFAULT_RELAXATION, DEFAULT_STIFFNESS};
use crate::groups::CollisionGroups;
use crate::solver::DEFAULT_ITERATIONS;
use crate::types::Vec2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub gravity: Vec2,
    pub solver: SolverConfig,
    pub broadphase: BroadphaseConfig,
    pub sleep: SleepConfig,
    pub friction_rule: CombineRule,
    pub restitution_rule: CombineRule,
    /// Emit [`WorldEvent::Impact`](crate::WorldEvent::Impact) on first contact.
    pub emit_impact_events: bool,
    /// Named collision groups available to scene descriptions.
    pub groups: CollisionGroups,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -9.81),
            solver: SolverConfig::default(),
            broadphase: BroadphaseConfig::default(),
            sleep: SleepConfig::default(),
            friction_rule: CombineRule::Average,
            restitution_rule: CombineRule::Average,
            emit_impact_events: true,
            groups: CollisionGroups::default(),
        }
    }
}

impl WorldConfig {
    #[must_use]
    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    /// Let idle bodies fall asleep.
    #[must_use]
    pub fn with_sleeping(mut self, enabled: bool) -> Self {
        self.sleep.enabled = enabled;
        self
    }

    /// Row parameters for generated contacts.
    #[must_use]
    pub fn contact_settings(&self) -> ContactSettings {
        ContactSettings {
            friction_rule: self.friction_rule,
            restitution_rule: self.restitution_rule,
            stiffness: self.solver.stiffness,
            relaxation: self.solver.relaxation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub iterations: usize,
    /// SPOOK stiffness for contact and friction rows.
    pub stiffness: f32,
    /// SPOOK relaxation, in time steps.
    pub relaxation: f32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            stiffness: DEFAULT_STIFFNESS,
            relaxation: DEFAULT_RELAXATION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadphaseConfig {
    pub cell_size: f32,
    /// Bodies covering more cells than this are tested against everything.
    pub huge_cell_threshold: usize,
}

impl Default for BroadphaseConfig {
    fn default() -> Self {
        Self {
            cell_size: 4.0,
            huge_cell_threshold: 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepConfig {
    pub enabled: bool,
    /// Kinetic energy below which a body counts as idle.
    pub energy_threshold: f32,
    /// Consecutive idle steps before a body falls asleep.
    pub steps: u32,
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            energy_threshold: 0.02,
            steps: 60,
        }
    }
}
