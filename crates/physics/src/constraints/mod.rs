//! # Constraints
//!
//! Persistent joints between two bodies. Each constraint owns its
//! [`Equation`] rows and refreshes their Jacobians and position errors from
//! the current body state every step. The world copies the rows into the
//! step's equation pool, solves them alongside the contacts and copies the
//! resulting multipliers back.

mod distance;
mod lock;
mod revolute;

pub use distance::DistanceJoint;
pub use lock::LockJoint;
pub use revolute::{RevoluteJoint, RevoluteMotor};

use crate::body::{Body, BodyHandle};
use crate::equations::Equation;
use crate::types::Vec2;

slotmap::new_key_type! {
    /// Stable handle to a constraint owned by a [`World`](crate::World).
    pub struct ConstraintHandle;
}

/// Default bound on the force any single joint row may apply.
pub const DEFAULT_MAX_FORCE: f32 = f32::MAX;

#[derive(Clone, Debug, PartialEq)]
pub enum ConstraintKind {
    Distance(DistanceJoint),
    Revolute(RevoluteJoint),
    Lock(LockJoint),
}

#[derive(Clone, Debug)]
pub struct Constraint {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    /// When false the two bodies never produce contacts with each other.
    pub collide_connected: bool,
    kind: ConstraintKind,
    equations: Vec<Equation>,
    attached: bool,
}

impl Constraint {
    fn with_kind(body_a: BodyHandle, body_b: BodyHandle, kind: ConstraintKind) -> Self {
        let rows = match &kind {
            ConstraintKind::Distance(_) => 1,
            ConstraintKind::Revolute(_) => 5,
            ConstraintKind::Lock(_) => 3,
        };
        let max = DEFAULT_MAX_FORCE;
        Self {
            body_a,
            body_b,
            collide_connected: true,
            kind,
            equations: (0..rows)
                .map(|_| Equation::new(body_a, body_b, -max, max))
                .collect(),
            attached: false,
        }
    }

    #[must_use]
    pub fn distance(body_a: BodyHandle, body_b: BodyHandle, joint: DistanceJoint) -> Self {
        Self::with_kind(body_a, body_b, ConstraintKind::Distance(joint))
    }

    #[must_use]
    pub fn revolute(body_a: BodyHandle, body_b: BodyHandle, joint: RevoluteJoint) -> Self {
        Self::with_kind(body_a, body_b, ConstraintKind::Revolute(joint))
    }

    #[must_use]
    pub fn lock(body_a: BodyHandle, body_b: BodyHandle) -> Self {
        Self::with_kind(body_a, body_b, ConstraintKind::Lock(LockJoint::default()))
    }

    #[must_use]
    pub fn with_collide_connected(mut self, collide: bool) -> Self {
        self.collide_connected = collide;
        self
    }

    /// Set SPOOK stiffness and relaxation on every row.
    #[must_use]
    pub fn with_spook(mut self, stiffness: f32, relaxation: f32) -> Self {
        for eq in &mut self.equations {
            eq.stiffness = stiffness;
            eq.relaxation = relaxation;
        }
        self
    }

    /// Bound the force of every position row to `[-max_force, max_force]`.
    #[must_use]
    pub fn with_max_force(mut self, max_force: f32) -> Self {
        for eq in &mut self.equations {
            eq.min_force = -max_force;
            eq.max_force = max_force;
        }
        if let ConstraintKind::Distance(joint) = &mut self.kind {
            joint.max_force = max_force;
        }
        self
    }

    #[must_use]
    pub fn kind(&self) -> &ConstraintKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut ConstraintKind {
        &mut self.kind
    }

    #[must_use]
    pub fn equations(&self) -> &[Equation] {
        &self.equations
    }

    pub(crate) fn equations_mut(&mut self) -> &mut [Equation] {
        &mut self.equations
    }

    /// Capture whatever the joint measures from the initial configuration.
    /// Runs once, when the constraint enters a world.
    pub(crate) fn attach(&mut self, a: &Body, b: &Body) {
        if self.attached {
            return;
        }
        match &mut self.kind {
            ConstraintKind::Distance(joint) => joint.attach(a, b),
            ConstraintKind::Revolute(joint) => joint.attach(a, b),
            ConstraintKind::Lock(joint) => joint.attach(a, b),
        }
        self.attached = true;
    }

    /// Refresh Jacobians and position errors for the coming solve.
    pub fn update(&mut self, a: &Body, b: &Body) {
        match &mut self.kind {
            ConstraintKind::Distance(joint) => joint.update(a, b, &mut self.equations),
            ConstraintKind::Revolute(joint) => joint.update(a, b, &mut self.equations),
            ConstraintKind::Lock(joint) => joint.update(a, b, &mut self.equations),
        }
    }
}

/// Point-to-point row along `axis` between world anchors `pa` (on A) and `pb` (on B).
fn point_row(eq: &mut Equation, a: &Body, b: &Body, pa: Vec2, pb: Vec2, axis: Vec2) {
    let ri = pa - a.position;
    let rj = pb - b.position;
    eq.set_point_jacobian(axis, ri, rj);
    eq.gq = (pb - pa).dot(axis);
    eq.enabled = true;
}

/// Orthonormal axes for a pair of point rows joining `pa` (on A) and `pb` (on B).
///
/// The first axis runs along the lever arm of whichever body turns most
/// easily about the anchor, so that arm contributes no coupling between
/// the two rows. World axes are used when neither arm has any leverage.
fn pivot_axes(a: &Body, b: &Body, pa: Vec2, pb: Vec2) -> (Vec2, Vec2) {
    let ri = pa - a.position;
    let rj = pb - b.position;
    let wi = ri.length_squared() * a.inv_inertia();
    let wj = rj.length_squared() * b.inv_inertia();
    if wi.max(wj) <= f32::EPSILON {
        return (Vec2::X, Vec2::Y);
    }
    let arm = if wj >= wi { rj } else { ri };
    let u = arm.normalize();
    (u, u.perp())
}

/// Relative angle `θB - θA` of two bodies.
fn relative_angle(a: &Body, b: &Body) -> f32 {
    b.angle - a.angle
}
