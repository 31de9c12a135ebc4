//! Collision dispatcher that routes shape pairs to their narrowphase routine.

use std::collections::HashMap;
use std::fmt;

use super::heightfield::heightfield_any;
use super::plane::plane_any;
use super::polygon::convex_convex;
use super::rounded::{rounded_convex, rounded_rounded};
use super::{ContactPoint, Placed};
use crate::shapes::ShapeType;

/// Pair routine. Appends points with normals from the first shape to the second.
type Detector = fn(&Placed<'_>, &Placed<'_>, &mut Vec<ContactPoint>);

/// Table of detectors keyed by shape-type pair.
///
/// Each routine is written for one argument order; the mirrored key calls it
/// with swapped arguments and flips the points it produced.
pub struct CollisionDispatcher {
    detectors: HashMap<(ShapeType, ShapeType), (Detector, bool)>,
}

impl fmt::Debug for CollisionDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollisionDispatcher")
            .field("pairs", &self.detectors.len())
            .finish()
    }
}

impl Default for CollisionDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionDispatcher {
    #[must_use]
    pub fn new() -> Self {
        let mut dispatcher = Self {
            detectors: HashMap::new(),
        };
        dispatcher.register_detectors();
        dispatcher
    }

    fn register_detectors(&mut self) {
        use ShapeType::{Box, Capsule, Circle, Convex, Heightfield, Line, Particle, Plane};

        let rounded = [Circle, Particle, Line, Capsule];
        let hulls = [Box, Convex];

        for (i, &a) in rounded.iter().enumerate() {
            for &b in &rounded[i..] {
                // Measure-zero pairs never touch.
                if matches!(
                    (a, b),
                    (Particle, Particle) | (Line, Line) | (Particle, Line)
                ) {
                    continue;
                }
                self.register(a, b, rounded_rounded);
            }
            for &b in &hulls {
                self.register(a, b, rounded_convex);
            }
        }

        self.register(Box, Box, convex_convex);
        self.register(Box, Convex, convex_convex);
        self.register(Convex, Convex, convex_convex);

        for b in [Circle, Particle, Line, Capsule, Box, Convex] {
            self.register(Plane, b, plane_any);
        }
        for b in [Circle, Particle, Capsule, Box, Convex] {
            self.register(Heightfield, b, heightfield_any);
        }
    }

    /// Register `detector` for `(type_a, type_b)` and its mirror.
    fn register(&mut self, type_a: ShapeType, type_b: ShapeType, detector: Detector) {
        self.detectors.insert((type_a, type_b), (detector, false));
        if type_a != type_b {
            self.detectors.insert((type_b, type_a), (detector, true));
        }
    }

    #[must_use]
    pub fn supports(&self, type_a: ShapeType, type_b: ShapeType) -> bool {
        self.detectors.contains_key(&(type_a, type_b))
    }

    /// Test two placed shapes, appending contacts with normals from `a` to `b`.
    /// Returns how many points were added.
    pub fn collide(&self, a: &Placed<'_>, b: &Placed<'_>, out: &mut Vec<ContactPoint>) -> usize {
        let key = (a.shape.shape_type(), b.shape.shape_type());
        let Some(&(detector, mirrored)) = self.detectors.get(&key) else {
            return 0;
        };
        let before = out.len();
        if mirrored {
            detector(b, a, out);
            for contact in &mut out[before..] {
                contact.flip();
            }
        } else {
            detector(a, b, out);
        }
        out.len() - before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Shape;
    use crate::types::Vec2;

    #[test]
    fn unsupported_pairs_are_absent() {
        let d = CollisionDispatcher::new();
        assert!(!d.supports(ShapeType::Plane, ShapeType::Plane));
        assert!(!d.supports(ShapeType::Line, ShapeType::Line));
        assert!(!d.supports(ShapeType::Particle, ShapeType::Line));
        assert!(!d.supports(ShapeType::Line, ShapeType::Particle));
        assert!(!d.supports(ShapeType::Heightfield, ShapeType::Plane));
        assert!(d.supports(ShapeType::Circle, ShapeType::Heightfield));
        assert!(d.supports(ShapeType::Convex, ShapeType::Capsule));
    }

    #[test]
    fn mirrored_pair_flips_normal() {
        let d = CollisionDispatcher::new();
        let plane = Shape::plane();
        let circle = Shape::circle(1.0).unwrap();
        let mut out = Vec::new();
        let n = d.collide(
            &Placed::new(&circle, Vec2::new(0.0, 0.5), 0.0),
            &Placed::new(&plane, Vec2::ZERO, 0.0),
            &mut out,
        );
        assert_eq!(n, 1);
        assert_eq!(out[0].normal, -Vec2::Y);
        assert!(out[0].point_a.y < out[0].point_b.y);
    }
}
