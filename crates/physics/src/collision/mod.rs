//! # Collision Detection
//!
//! Broadphase culling over body AABBs, followed by per-shape-pair narrowphase
//! tests that produce [`ContactPoint`]s and the contact/friction equations that
//! resolve them.
//!
//! Pair routines are grouped by geometry:
//!
//! -   `rounded`: circles, particles, lines and capsules, all treated as a
//!     segment swept by a disc.
//! -   `polygon`: SAT with reference-face clipping for anything against a
//!     convex hull.
//! -   `plane` and `heightfield`: support-point tests against half-planes and
//!     per-column terrain quads.

mod broad_phase;
mod dispatcher;
mod geometry;
mod heightfield;
mod narrow_phase;
mod plane;
mod polygon;
mod rounded;

pub use broad_phase::{BroadphaseProxy, BroadphaseStats, SpatialHash};
pub use dispatcher::CollisionDispatcher;
pub use narrow_phase::{ContactSettings, Narrowphase, ShapePair};

use serde::{Deserialize, Serialize};

use crate::shapes::Shape;
use crate::types::Vec2;

/// One point of contact between two shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    /// Deepest point of A inside B, on A's surface (world space).
    pub point_a: Vec2,
    /// Deepest point of B inside A, on B's surface (world space).
    pub point_b: Vec2,
    /// Unit normal from A towards B.
    pub normal: Vec2,
    /// Penetration depth; positive when overlapping.
    pub depth: f32,
    /// Normal impulse applied by the solver this step.
    pub impulse: f32,
}

impl ContactPoint {
    #[must_use]
    pub fn new(point_a: Vec2, point_b: Vec2, normal: Vec2, depth: f32) -> Self {
        Self {
            point_a,
            point_b,
            normal,
            depth,
            impulse: 0.0,
        }
    }

    /// Midpoint of the two surface points.
    #[must_use]
    pub fn point(&self) -> Vec2 {
        (self.point_a + self.point_b) * 0.5
    }

    pub(crate) fn flip(&mut self) {
        std::mem::swap(&mut self.point_a, &mut self.point_b);
        self.normal = -self.normal;
    }
}

/// How two shapes' surface coefficients combine into one contact value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineRule {
    #[default]
    Average,
    Min,
    Max,
    Multiply,
}

impl CombineRule {
    #[must_use]
    pub fn combine(self, a: f32, b: f32) -> f32 {
        match self {
            CombineRule::Average => (a + b) * 0.5,
            CombineRule::Min => a.min(b),
            CombineRule::Max => a.max(b),
            CombineRule::Multiply => a * b,
        }
    }
}

/// A shape placed in world space for one test.
#[derive(Debug, Clone, Copy)]
pub struct Placed<'a> {
    pub shape: &'a Shape,
    pub position: Vec2,
    pub angle: f32,
}

impl<'a> Placed<'a> {
    #[must_use]
    pub fn new(shape: &'a Shape, body_position: Vec2, body_angle: f32) -> Self {
        let (position, angle) = shape.world_transform(body_position, body_angle);
        Self {
            shape,
            position,
            angle,
        }
    }

    /// World endpoints and radius for rounded-segment kinds.
    fn rounded(&self) -> Option<(Vec2, Vec2, f32)> {
        let (half, radius) = self.shape.rounded_segment()?;
        let offset = Vec2::new(half, 0.0).rotate(self.angle);
        Some((self.position - offset, self.position + offset, radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_rules() {
        assert!((CombineRule::Average.combine(0.2, 0.4) - 0.3).abs() < 1e-7);
        assert_eq!(CombineRule::Min.combine(0.2, 0.4), 0.2);
        assert_eq!(CombineRule::Max.combine(0.2, 0.4), 0.4);
        assert!((CombineRule::Multiply.combine(0.5, 0.4) - 0.2).abs() < 1e-7);
    }

    #[test]
    fn combine_rule_serde_names() {
        let rule: CombineRule = serde_json::from_str("\"multiply\"").unwrap();
        assert_eq!(rule, CombineRule::Multiply);
    }

    #[test]
    fn flipping_swaps_points_and_normal() {
        let mut c = ContactPoint::new(Vec2::X, Vec2::Y, Vec2::X, 0.1);
        c.flip();
        assert_eq!(c.point_a, Vec2::Y);
        assert_eq!(c.normal, -Vec2::X);
    }
}
