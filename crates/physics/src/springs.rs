//! # Springs
//!
//! Springs are never solved. Every step each spring reads the current body
//! state and accumulates a Hookean plus damping force (or torque) onto both
//! bodies, so a stiff spring can fight the solver's hard constraints.

use crate::body::{Body, BodyHandle};
use crate::types::Vec2;

slotmap::new_key_type! {
    /// Stable handle to a spring owned by a [`World`](crate::World).
    pub struct SpringHandle;
}

#[derive(Clone, Debug, PartialEq)]
pub enum SpringKind {
    Linear {
        /// Measured from the anchors on attach when unset.
        rest_length: Option<f32>,
        local_anchor_a: Vec2,
        local_anchor_b: Vec2,
    },
    Rotational {
        /// Target `θB - θA`; measured on attach when unset.
        rest_angle: Option<f32>,
    },
}

#[derive(Clone, Debug)]
pub struct Spring {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub stiffness: f32,
    pub damping: f32,
    pub kind: SpringKind,
}

/// Forces a spring wants applied this step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpringForce {
    pub force_a: Vec2,
    pub torque_a: f32,
    pub force_b: Vec2,
    pub torque_b: f32,
}

impl Spring {
    #[must_use]
    pub fn linear(body_a: BodyHandle, body_b: BodyHandle, stiffness: f32, damping: f32) -> Self {
        Self {
            body_a,
            body_b,
            stiffness,
            damping,
            kind: SpringKind::Linear {
                rest_length: None,
                local_anchor_a: Vec2::ZERO,
                local_anchor_b: Vec2::ZERO,
            },
        }
    }

    #[must_use]
    pub fn rotational(body_a: BodyHandle, body_b: BodyHandle, stiffness: f32, damping: f32) -> Self {
        Self {
            body_a,
            body_b,
            stiffness,
            damping,
            kind: SpringKind::Rotational { rest_angle: None },
        }
    }

    #[must_use]
    pub fn with_rest_length(mut self, length: f32) -> Self {
        if let SpringKind::Linear { rest_length, .. } = &mut self.kind {
            *rest_length = Some(length);
        }
        self
    }

    #[must_use]
    pub fn with_rest_angle(mut self, angle: f32) -> Self {
        if let SpringKind::Rotational { rest_angle } = &mut self.kind {
            *rest_angle = Some(angle);
        }
        self
    }

    #[must_use]
    pub fn with_anchors(mut self, anchor_a: Vec2, anchor_b: Vec2) -> Self {
        if let SpringKind::Linear {
            local_anchor_a,
            local_anchor_b,
            ..
        } = &mut self.kind
        {
            *local_anchor_a = anchor_a;
            *local_anchor_b = anchor_b;
        }
        self
    }

    pub(crate) fn attach(&mut self, a: &Body, b: &Body) {
        match &mut self.kind {
            SpringKind::Linear {
                rest_length,
                local_anchor_a,
                local_anchor_b,
            } => {
                let pa = a.to_world_frame(*local_anchor_a);
                let pb = b.to_world_frame(*local_anchor_b);
                rest_length.get_or_insert(pa.distance(pb));
            }
            SpringKind::Rotational { rest_angle } => {
                rest_angle.get_or_insert(b.angle - a.angle);
            }
        }
    }

    /// Hookean plus damping response for the current body state.
    #[must_use]
    pub fn compute(&self, a: &Body, b: &Body) -> SpringForce {
        match &self.kind {
            SpringKind::Linear {
                rest_length,
                local_anchor_a,
                local_anchor_b,
            } => {
                let ri = local_anchor_a.rotate(a.angle);
                let rj = local_anchor_b.rotate(b.angle);
                let delta = (b.position + rj) - (a.position + ri);
                let length = delta.length();
                let rest = rest_length.unwrap_or(length);
                let dir = delta.normalize();
                let relative_velocity = b.velocity_at(rj) - a.velocity_at(ri);
                let magnitude =
                    -self.stiffness * (length - rest) - self.damping * relative_velocity.dot(dir);
                let force_b = dir * magnitude;
                SpringForce {
                    force_a: -force_b,
                    torque_a: ri.cross(-force_b),
                    force_b,
                    torque_b: rj.cross(force_b),
                }
            }
            SpringKind::Rotational { rest_angle } => {
                let angle = b.angle - a.angle;
                let rest = rest_angle.unwrap_or(angle);
                let torque = -self.stiffness * (angle - rest)
                    - self.damping * (b.angular_velocity - a.angular_velocity);
                SpringForce {
                    torque_a: -torque,
                    torque_b: torque,
                    ..SpringForce::default()
                }
            }
        }
    }
}

// Accumulated without waking: a spring at rest must not keep its bodies awake.
impl SpringForce {
    pub(crate) fn apply_to_a(&self, a: &mut Body) {
        a.force += self.force_a;
        a.torque += self.torque_a;
    }

    pub(crate) fn apply_to_b(&self, b: &mut Body) {
        b.force += self.force_b;
        b.torque += self.torque_b;
    }
}
