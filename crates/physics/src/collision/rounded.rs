//! Circles, particles, lines and capsules: segments swept by a disc.

use super::geometry::{
    closest_between_segments, closest_on_segment, collide_hulls, point_against_hull,
    segment_hull_distance, Hull, EPSILON,
};
use super::{ContactPoint, Placed};
use crate::types::Vec2;

/// Sine of the angle below which two segments count as parallel.
const PARALLEL_TOLERANCE: f32 = 1e-3;

pub(super) fn rounded_rounded(a: &Placed<'_>, b: &Placed<'_>, out: &mut Vec<ContactPoint>) {
    let (Some((a0, a1, ra)), Some((b0, b1, rb))) = (a.rounded(), b.rounded()) else {
        return;
    };
    let total = ra + rb;

    let axis_a = a1 - a0;
    let axis_b = b1 - b0;
    let long_a = axis_a.length_squared() > EPSILON;
    let long_b = axis_b.length_squared() > EPSILON;

    // Parallel, overlapping segments rest on two points.
    if long_a && long_b {
        let dir_a = axis_a.normalize();
        let dir_b = axis_b.normalize();
        if dir_a.cross(dir_b).abs() < PARALLEL_TOLERANCE {
            let before = out.len();
            let (lo, hi) = {
                let t0 = (b0 - a0).dot(dir_a);
                let t1 = (b1 - a0).dot(dir_a);
                (t0.min(t1).max(0.0), t0.max(t1).min(axis_a.length()))
            };
            if hi - lo > EPSILON {
                for t in [lo, hi] {
                    let on_a = a0 + dir_a * t;
                    let on_b = closest_on_segment(on_a, b0, b1);
                    push_disc_pair(on_a, ra, on_b, rb, dir_a.perp(), a.position, b.position, out);
                }
                if out.len() > before {
                    return;
                }
            }
        }
    }

    let (ca, cb) = closest_between_segments(a0, a1, b0, b1);
    if ca.distance(cb) >= total && total > 0.0 {
        return;
    }
    let fallback = if long_a {
        axis_a.perp().normalize()
    } else if long_b {
        axis_b.perp().normalize()
    } else {
        Vec2::Y
    };
    push_disc_pair(ca, ra, cb, rb, fallback, a.position, b.position, out);
}

/// Contact between discs at `ca` and `cb`; `fallback` orients coincident centres.
#[allow(clippy::too_many_arguments)]
fn push_disc_pair(
    ca: Vec2,
    ra: f32,
    cb: Vec2,
    rb: f32,
    fallback: Vec2,
    body_a: Vec2,
    body_b: Vec2,
    out: &mut Vec<ContactPoint>,
) {
    let delta = cb - ca;
    let distance = delta.length();
    if distance >= ra + rb {
        return;
    }
    let normal = if distance > EPSILON {
        delta / distance
    } else if fallback.dot(body_b - body_a) < 0.0 {
        -fallback
    } else {
        fallback
    };
    out.push(ContactPoint::new(
        ca + normal * ra,
        cb - normal * rb,
        normal,
        ra + rb - distance,
    ));
}

/// Rounded segment `a` against convex hull `b`.
pub(super) fn rounded_convex(a: &Placed<'_>, b: &Placed<'_>, out: &mut Vec<ContactPoint>) {
    let (Some((a0, a1, radius)), Some(polygon)) = (a.rounded(), b.shape.polygon()) else {
        return;
    };
    let hull = Hull::Polygon {
        polygon,
        position: b.position,
        angle: b.angle,
    };

    if (a1 - a0).length_squared() <= EPSILON {
        if let Some(mut contact) = point_against_hull(a0, radius, &hull) {
            contact.flip();
            out.push(contact);
        }
        return;
    }

    // SAT over-reports near the end caps, so reject on the exact distance first.
    if radius > 0.0 && segment_hull_distance(a0, a1, &hull) >= radius {
        return;
    }
    collide_hulls(&Hull::Segment(a0, a1), radius, &hull, 0.0, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Shape;

    fn collide(
        f: fn(&Placed<'_>, &Placed<'_>, &mut Vec<ContactPoint>),
        a: &Shape,
        pa: Vec2,
        b: &Shape,
        pb: Vec2,
    ) -> Vec<ContactPoint> {
        let mut out = Vec::new();
        f(&Placed::new(a, pa, 0.0), &Placed::new(b, pb, 0.0), &mut out);
        out
    }

    #[test]
    fn overlapping_circles() {
        let c = Shape::circle(1.0).unwrap();
        let out = collide(rounded_rounded, &c, Vec2::ZERO, &c, Vec2::new(1.5, 0.0));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].normal, Vec2::X);
        assert!((out[0].depth - 0.5).abs() < 1e-6);
        assert_eq!(out[0].point_a, Vec2::new(1.0, 0.0));
        assert_eq!(out[0].point_b, Vec2::new(0.5, 0.0));
    }

    #[test]
    fn touching_circles_do_not_collide() {
        let c = Shape::circle(1.0).unwrap();
        assert!(collide(rounded_rounded, &c, Vec2::ZERO, &c, Vec2::new(2.0, 0.0)).is_empty());
    }

    #[test]
    fn parallel_capsules_rest_on_two_points() {
        let c = Shape::capsule(2.0, 0.5).unwrap();
        let out = collide(rounded_rounded, &c, Vec2::ZERO, &c, Vec2::new(0.5, 0.9));
        assert_eq!(out.len(), 2);
        for p in &out {
            assert!((p.normal.y - 1.0).abs() < 1e-5);
            assert!((p.depth - 0.1).abs() < 1e-5);
        }
    }

    #[test]
    fn circle_on_line() {
        let line = Shape::line(4.0).unwrap();
        let circle = Shape::circle(0.5).unwrap();
        let out = collide(rounded_rounded, &line, Vec2::ZERO, &circle, Vec2::new(1.0, 0.4));
        assert_eq!(out.len(), 1);
        assert!((out[0].normal.y - 1.0).abs() < 1e-6);
        assert!((out[0].depth - 0.1).abs() < 1e-6);
    }

    #[test]
    fn circle_against_box_face() {
        let circle = Shape::circle(0.5).unwrap();
        let b = Shape::rectangle(2.0, 2.0).unwrap();
        let out = collide(rounded_convex, &circle, Vec2::new(0.0, 1.4), &b, Vec2::ZERO);
        assert_eq!(out.len(), 1);
        assert!((out[0].normal.y + 1.0).abs() < 1e-6, "normal points from circle to box");
        assert!((out[0].depth - 0.1).abs() < 1e-5);
    }

    #[test]
    fn capsule_lying_on_box() {
        let capsule = Shape::capsule(1.0, 0.25).unwrap();
        let b = Shape::rectangle(4.0, 2.0).unwrap();
        let out = collide(rounded_convex, &capsule, Vec2::new(0.0, 1.2), &b, Vec2::ZERO);
        assert_eq!(out.len(), 2);
        for p in &out {
            assert!((p.normal.y + 1.0).abs() < 1e-5);
            assert!((p.depth - 0.05).abs() < 1e-5);
        }
    }

    #[test]
    fn capsule_cap_clear_of_corner() {
        let capsule = Shape::capsule(1.0, 0.25).unwrap();
        let b = Shape::rectangle(2.0, 2.0).unwrap();
        // End cap centre at (1.2, 1.2): 0.28 from the corner, just out of reach.
        let out = collide(rounded_convex, &capsule, Vec2::new(1.7, 1.2), &b, Vec2::ZERO);
        assert!(out.is_empty());
    }
}
