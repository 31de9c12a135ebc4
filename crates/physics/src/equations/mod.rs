//! # Constraint Equations
//!
//! An [`Equation`] is one scalar row of the velocity-level constraint system:
//! a Jacobian `G` over the two bodies' `(v, ω)` pairs, a position error `Gq`,
//! force bounds and SPOOK stiffness/relaxation. Equations carry no solver
//! working state; accumulated impulses live in the solver and only the final
//! `multiplier` is written back.

mod pool;

pub use pool::{EquationId, EquationPool};

use crate::body::BodyHandle;
use crate::types::Vec2;

pub const DEFAULT_STIFFNESS: f32 = 1e6;
pub const DEFAULT_RELAXATION: f32 = 4.0;

/// Row-specific behaviour the solver needs when building the bias term.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EquationKind {
    /// Non-penetration along the contact normal.
    Contact {
        restitution: f32,
        /// True on the first step a shape pair touches.
        first_impact: bool,
    },
    /// Tangential friction bounded by `coefficient` times the paired contact's impulse.
    Friction { contact: EquationId, coefficient: f32 },
    /// Position-level joint row; `gq` is refreshed by the owning constraint.
    Generic,
    /// Drives `G·v` towards `target` (motors).
    Velocity { target: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Equation {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub min_force: f32,
    pub max_force: f32,
    pub kind: EquationKind,
    pub stiffness: f32,
    pub relaxation: f32,
    /// `[vA.x, vA.y, ωA, vB.x, vB.y, ωB]` coefficients.
    pub jacobian: [f32; 6],
    /// Position error. Negative means the row is violated towards `min_force`.
    pub gq: f32,
    pub enabled: bool,
    /// Constraint force from the last solve (`λ / h`).
    pub multiplier: f32,
}

impl Equation {
    #[must_use]
    pub fn new(body_a: BodyHandle, body_b: BodyHandle, min_force: f32, max_force: f32) -> Self {
        Self {
            body_a,
            body_b,
            min_force,
            max_force,
            kind: EquationKind::Generic,
            stiffness: DEFAULT_STIFFNESS,
            relaxation: DEFAULT_RELAXATION,
            jacobian: [0.0; 6],
            gq: 0.0,
            enabled: true,
            multiplier: 0.0,
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: EquationKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_spook(mut self, stiffness: f32, relaxation: f32) -> Self {
        self.stiffness = stiffness;
        self.relaxation = relaxation;
        self
    }

    /// Set `G` for a row acting along `axis` at world offsets `ri`/`rj` from
    /// each body's centre: `[-n, -ri×n, n, rj×n]`.
    pub fn set_point_jacobian(&mut self, axis: Vec2, ri: Vec2, rj: Vec2) {
        self.jacobian = [
            -axis.x,
            -axis.y,
            -ri.cross(axis),
            axis.x,
            axis.y,
            rj.cross(axis),
        ];
    }

    /// Set `G` for a relative-rotation row: `ωB - ωA`.
    pub fn set_angular_jacobian(&mut self) {
        self.jacobian = [0.0, 0.0, -1.0, 0.0, 0.0, 1.0];
    }

    /// `G·W` for the given body velocities.
    #[must_use]
    pub fn compute_gw(&self, va: Vec2, wa: f32, vb: Vec2, wb: f32) -> f32 {
        let g = &self.jacobian;
        g[0] * va.x + g[1] * va.y + g[2] * wa + g[3] * vb.x + g[4] * vb.y + g[5] * wb
    }

    /// SPOOK `(a, b, eps)` for time step `h`.
    #[must_use]
    pub fn spook_parameters(&self, h: f32) -> (f32, f32, f32) {
        spook(self.stiffness, self.relaxation, h)
    }
}

/// SPOOK `(a, b, eps)` for stiffness `k`, relaxation `d` and step `h`.
#[must_use]
pub fn spook(k: f32, d: f32, h: f32) -> (f32, f32, f32) {
    let denom = 1.0 + 4.0 * d;
    let a = 4.0 / (h * denom);
    let b = 4.0 * d / denom;
    let eps = 4.0 / (h * h * k * denom);
    (a, b, eps)
}
