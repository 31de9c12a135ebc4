//! Shared 2D geometry kernels for the pair routines.

use super::ContactPoint;
use crate::shapes::Polygon;
use crate::types::Vec2;

pub(super) const EPSILON: f32 = 1e-6;

/// Closest point to `p` on segment `a -> b`.
pub(super) fn closest_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= EPSILON * EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    a + ab * t
}

/// Closest points between segments `p1 -> q1` and `p2 -> q2`.
pub(super) fn closest_between_segments(p1: Vec2, q1: Vec2, p2: Vec2, q2: Vec2) -> (Vec2, Vec2) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(r);

    let (s, t) = if a <= EPSILON && e <= EPSILON {
        (0.0, 0.0)
    } else if a <= EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if e <= EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            let mut s = if denom > EPSILON {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };
    (p1 + d1 * s, p2 + d2 * t)
}

/// A convex outline in world space: a polygon, a bare segment (two-sided) or a
/// quad built on the fly.
#[derive(Clone, Copy, Debug)]
pub(super) enum Hull<'a> {
    Polygon {
        polygon: &'a Polygon,
        position: Vec2,
        angle: f32,
    },
    Segment(Vec2, Vec2),
    Quad([Vec2; 4]),
}

impl Hull<'_> {
    pub(super) fn len(&self) -> usize {
        match self {
            Hull::Polygon { polygon, .. } => polygon.vertices().len(),
            Hull::Segment(..) => 2,
            Hull::Quad(_) => 4,
        }
    }

    pub(super) fn vertex(&self, i: usize) -> Vec2 {
        match self {
            Hull::Polygon {
                polygon,
                position,
                angle,
            } => polygon.world_vertex(i, *position, *angle),
            Hull::Segment(a, b) => {
                if i == 0 {
                    *a
                } else {
                    *b
                }
            }
            Hull::Quad(v) => v[i],
        }
    }

    /// Outward normal of edge `i -> i + 1`.
    pub(super) fn normal(&self, i: usize) -> Vec2 {
        match self {
            Hull::Polygon { polygon, angle, .. } => polygon.normals()[i].rotate(*angle),
            _ => {
                let edge = self.vertex((i + 1) % self.len()) - self.vertex(i);
                Vec2::new(edge.y, -edge.x).normalize()
            }
        }
    }

    /// Whether a world point is inside (segments contain nothing).
    pub(super) fn contains(&self, p: Vec2) -> bool {
        if matches!(self, Hull::Segment(..)) {
            return false;
        }
        (0..self.len()).all(|i| (p - self.vertex(i)).dot(self.normal(i)) <= 0.0)
    }
}

/// Edge of `a` with the largest separation from `b`'s vertices.
fn max_separation(a: &Hull<'_>, b: &Hull<'_>) -> (usize, f32) {
    let mut best = (0, f32::NEG_INFINITY);
    for i in 0..a.len() {
        let n = a.normal(i);
        let v = a.vertex(i);
        let sep = (0..b.len())
            .map(|j| (b.vertex(j) - v).dot(n))
            .fold(f32::INFINITY, f32::min);
        if sep > best.1 {
            best = (i, sep);
        }
    }
    best
}

/// Keep the part of segment `points` on the non-positive side of `normal·x = offset`.
fn clip(points: [Vec2; 2], normal: Vec2, offset: f32) -> Option<[Vec2; 2]> {
    let d0 = normal.dot(points[0]) - offset;
    let d1 = normal.dot(points[1]) - offset;
    match (d0 <= 0.0, d1 <= 0.0) {
        (true, true) => Some(points),
        (false, false) => None,
        _ => {
            let t = d0 / (d0 - d1);
            let cut = points[0] + (points[1] - points[0]) * t;
            if d0 <= 0.0 {
                Some([points[0], cut])
            } else {
                Some([cut, points[1]])
            }
        }
    }
}

/// SAT plus reference-face clipping between two hulls inflated by radii.
/// Emits up to two points with normals from `a` to `b`.
pub(super) fn collide_hulls(
    a: &Hull<'_>,
    radius_a: f32,
    b: &Hull<'_>,
    radius_b: f32,
    out: &mut Vec<ContactPoint>,
) {
    let total = radius_a + radius_b;
    let (edge_a, sep_a) = max_separation(a, b);
    if sep_a > total {
        return;
    }
    let (edge_b, sep_b) = max_separation(b, a);
    if sep_b > total {
        return;
    }

    // Prefer A as reference unless B is clearly better.
    let flip = sep_b > 0.98 * sep_a + 0.001;
    let (reference, incident, edge, r_ref, r_inc) = if flip {
        (b, a, edge_b, radius_b, radius_a)
    } else {
        (a, b, edge_a, radius_a, radius_b)
    };

    let n = reference.normal(edge);
    let v1 = reference.vertex(edge);
    let v2 = reference.vertex((edge + 1) % reference.len());

    let incident_edge = (0..incident.len())
        .min_by(|&i, &j| {
            incident
                .normal(i)
                .dot(n)
                .total_cmp(&incident.normal(j).dot(n))
        })
        .unwrap_or(0);
    let points = [
        incident.vertex(incident_edge),
        incident.vertex((incident_edge + 1) % incident.len()),
    ];

    let tangent = (v2 - v1).normalize();
    let Some(points) = clip(points, -tangent, -tangent.dot(v1)) else {
        return;
    };
    let Some(points) = clip(points, tangent, tangent.dot(v2)) else {
        return;
    };

    let mut previous: Option<Vec2> = None;
    for p in points {
        if previous.is_some_and(|q| (p - q).length_squared() < EPSILON) {
            continue;
        }
        previous = Some(p);
        let sep = (p - v1).dot(n);
        if sep > total {
            continue;
        }
        let on_reference = p - n * (sep - r_ref);
        let on_incident = p - n * r_inc;
        let mut contact = ContactPoint::new(on_reference, on_incident, n, total - sep);
        if flip {
            contact.flip();
        }
        out.push(contact);
    }
}

/// Disc of `radius` at `center` against a hull; normal from the hull to the disc.
pub(super) fn point_against_hull(
    center: Vec2,
    radius: f32,
    hull: &Hull<'_>,
) -> Option<ContactPoint> {
    let mut edge = 0;
    let mut separation = f32::NEG_INFINITY;
    for i in 0..hull.len() {
        let s = (center - hull.vertex(i)).dot(hull.normal(i));
        if s > separation {
            separation = s;
            edge = i;
        }
    }
    if separation > radius {
        return None;
    }

    let v1 = hull.vertex(edge);
    let v2 = hull.vertex((edge + 1) % hull.len());
    let (normal, on_hull) = if separation < EPSILON {
        let n = hull.normal(edge);
        (n, center - n * separation)
    } else if (center - v1).dot(v2 - v1) <= 0.0 {
        ((center - v1).normalize(), v1)
    } else if (center - v2).dot(v1 - v2) <= 0.0 {
        ((center - v2).normalize(), v2)
    } else {
        let n = hull.normal(edge);
        (n, center - n * separation)
    };
    let distance = (center - on_hull).dot(normal);
    if distance > radius {
        return None;
    }
    Some(ContactPoint::new(
        on_hull,
        center - normal * radius,
        normal,
        radius - distance,
    ))
}

/// Shortest distance from the segment `p -> q` to the hull outline, zero when they overlap.
pub(super) fn segment_hull_distance(p: Vec2, q: Vec2, hull: &Hull<'_>) -> f32 {
    if hull.contains(p) || hull.contains(q) {
        return 0.0;
    }
    let n = hull.len();
    (0..n)
        .map(|i| {
            let (c1, c2) = closest_between_segments(p, q, hull.vertex(i), hull.vertex((i + 1) % n));
            c1.distance(c2)
        })
        .fold(f32::INFINITY, f32::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Polygon {
        Polygon::rectangle(2.0, 2.0).unwrap()
    }

    #[test]
    fn closest_points_on_crossing_segments_meet() {
        let (a, b) = closest_between_segments(
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, -1.0),
            Vec2::new(0.0, 1.0),
        );
        assert!(a.distance(b) < 1e-6);
    }

    #[test]
    fn closest_points_on_parallel_segments() {
        let (a, b) = closest_between_segments(
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(3.0, 1.0),
            Vec2::new(5.0, 1.0),
        );
        assert_eq!(a, Vec2::new(2.0, 0.0));
        assert_eq!(b, Vec2::new(3.0, 1.0));
    }

    #[test]
    fn stacked_boxes_give_two_points() {
        let poly = unit_box();
        let lower = Hull::Polygon {
            polygon: &poly,
            position: Vec2::ZERO,
            angle: 0.0,
        };
        let upper = Hull::Polygon {
            polygon: &poly,
            position: Vec2::new(0.2, 1.9),
            angle: 0.0,
        };
        let mut out = Vec::new();
        collide_hulls(&lower, 0.0, &upper, 0.0, &mut out);
        assert_eq!(out.len(), 2);
        for c in &out {
            assert!((c.normal.y - 1.0).abs() < 1e-5);
            assert!((c.depth - 0.1).abs() < 1e-5);
        }
    }

    #[test]
    fn separated_boxes_give_nothing() {
        let poly = unit_box();
        let a = Hull::Polygon {
            polygon: &poly,
            position: Vec2::ZERO,
            angle: 0.0,
        };
        let b = Hull::Polygon {
            polygon: &poly,
            position: Vec2::new(2.5, 0.0),
            angle: 0.0,
        };
        let mut out = Vec::new();
        collide_hulls(&a, 0.0, &b, 0.0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn disc_near_box_corner_uses_vertex_normal() {
        let poly = unit_box();
        let hull = Hull::Polygon {
            polygon: &poly,
            position: Vec2::ZERO,
            angle: 0.0,
        };
        let c = point_against_hull(Vec2::new(1.5, 1.5), 1.0, &hull).unwrap();
        let diag = std::f32::consts::FRAC_1_SQRT_2;
        assert!((c.normal.x - diag).abs() < 1e-5 && (c.normal.y - diag).abs() < 1e-5);
        assert!(point_against_hull(Vec2::new(2.0, 2.0), 1.0, &hull).is_none());
    }

    #[test]
    fn segment_inside_hull_has_zero_distance() {
        let poly = unit_box();
        let hull = Hull::Polygon {
            polygon: &poly,
            position: Vec2::ZERO,
            angle: 0.0,
        };
        assert_eq!(segment_hull_distance(Vec2::ZERO, Vec2::X, &hull), 0.0);
        let d = segment_hull_distance(Vec2::new(-1.0, 3.0), Vec2::new(1.0, 3.0), &hull);
        assert!((d - 2.0).abs() < 1e-6);
    }
}
