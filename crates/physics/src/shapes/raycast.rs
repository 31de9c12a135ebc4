use std::ops::ControlFlow;

use super::{Polygon, Shape, ShapeKind};
use crate::types::Vec2;

/// One ray/surface crossing, reported in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Position along the ray in `[0, 1]`.
    pub fraction: f32,
    pub normal: Vec2,
    /// Edge or column index for polygonal surfaces, `-1` otherwise.
    pub face_index: i32,
}

type Report<'a> = &'a mut dyn FnMut(RayHit) -> ControlFlow<()>;

impl Shape {
    /// Cast the world-space segment `from -> to` against this shape placed at
    /// `position`/`angle`, reporting every crossing in order of discovery.
    pub fn raycast(
        &self,
        from: Vec2,
        to: Vec2,
        position: Vec2,
        angle: f32,
        report: Report<'_>,
    ) -> ControlFlow<()> {
        match &self.kind {
            ShapeKind::Circle { radius } => circle(from, to, position, *radius, report),
            ShapeKind::Particle => ControlFlow::Continue(()),
            ShapeKind::Line { length } => {
                let half = Vec2::new(length * 0.5, 0.0).rotate(angle);
                segment(from, to, position - half, position + half, -1, report)
            }
            ShapeKind::Capsule { length, radius } => {
                capsule(from, to, position, angle, *length, *radius, report)
            }
            ShapeKind::Box { polygon, .. } | ShapeKind::Convex(polygon) => {
                polygon_edges(from, to, position, angle, polygon, report)
            }
            ShapeKind::Plane => plane(from, to, position, angle, report),
            ShapeKind::Heightfield(hf) => {
                for i in 0..hf.column_count() {
                    let (a, b) = hf.segment(i);
                    let a = a.rotate(angle) + position;
                    let b = b.rotate(angle) + position;
                    if let Some(t) = segment_fraction(from, to, a, b) {
                        let normal = (b - a).perp().normalize();
                        report(RayHit {
                            fraction: t,
                            normal,
                            face_index: face(i),
                        })?;
                    }
                }
                ControlFlow::Continue(())
            }
        }
    }
}

/// Fraction along `p0 -> p1` where it crosses `q0 -> q1`.
pub(crate) fn segment_fraction(p0: Vec2, p1: Vec2, q0: Vec2, q1: Vec2) -> Option<f32> {
    let r = p1 - p0;
    let s = q1 - q0;
    let denom = r.cross(s);
    if denom.abs() < f32::EPSILON {
        return None;
    }
    let qp = q0 - p0;
    let t = qp.cross(s) / denom;
    let u = qp.cross(r) / denom;
    ((0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)).then_some(t)
}

fn circle(from: Vec2, to: Vec2, center: Vec2, radius: f32, report: Report<'_>) -> ControlFlow<()> {
    let d = to - from;
    let f = from - center;
    let a = d.dot(d);
    if a <= 0.0 {
        return ControlFlow::Continue(());
    }
    let b = 2.0 * f.dot(d);
    let c = f.dot(f) - radius * radius;
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return ControlFlow::Continue(());
    }
    let root = disc.sqrt();
    let t0 = (-b - root) / (2.0 * a);
    let t1 = (-b + root) / (2.0 * a);
    for t in [t0, t1] {
        if (0.0..=1.0).contains(&t) {
            let hit = from + d * t;
            report(RayHit {
                fraction: t,
                normal: (hit - center).normalize(),
                face_index: -1,
            })?;
        }
        if disc == 0.0 {
            break;
        }
    }
    ControlFlow::Continue(())
}

fn segment(
    from: Vec2,
    to: Vec2,
    a: Vec2,
    b: Vec2,
    face_index: i32,
    report: Report<'_>,
) -> ControlFlow<()> {
    if let Some(t) = segment_fraction(from, to, a, b) {
        let mut normal = (b - a).perp().normalize();
        if normal.dot(to - from) > 0.0 {
            normal = -normal;
        }
        report(RayHit {
            fraction: t,
            normal,
            face_index,
        })?;
    }
    ControlFlow::Continue(())
}

fn capsule(
    from: Vec2,
    to: Vec2,
    position: Vec2,
    angle: f32,
    length: f32,
    radius: f32,
    report: Report<'_>,
) -> ControlFlow<()> {
    let half = Vec2::new(length * 0.5, 0.0).rotate(angle);
    let side = Vec2::new(0.0, radius).rotate(angle);
    let a = position - half;
    let b = position + half;
    // End caps only count outside the straight section.
    let axis = (b - a).normalize();
    let mut cap = |center: Vec2, outward: f32| {
        let mut filtered = |hit: RayHit| {
            let p = from + (to - from) * hit.fraction;
            if (p - center).dot(axis) * outward >= 0.0 {
                report(hit)
            } else {
                ControlFlow::Continue(())
            }
        };
        circle(from, to, center, radius, &mut filtered)
    };
    cap(a, -1.0)?;
    cap(b, 1.0)?;
    for (s, sign) in [(side, 1.0), (-side, -1.0)] {
        if let Some(t) = segment_fraction(from, to, a + s, b + s) {
            report(RayHit {
                fraction: t,
                normal: side.normalize() * sign,
                face_index: -1,
            })?;
        }
    }
    ControlFlow::Continue(())
}

fn polygon_edges(
    from: Vec2,
    to: Vec2,
    position: Vec2,
    angle: f32,
    polygon: &Polygon,
    report: Report<'_>,
) -> ControlFlow<()> {
    let n = polygon.vertices().len();
    for i in 0..n {
        let a = polygon.world_vertex(i, position, angle);
        let b = polygon.world_vertex((i + 1) % n, position, angle);
        if let Some(t) = segment_fraction(from, to, a, b) {
            report(RayHit {
                fraction: t,
                normal: polygon.normals()[i].rotate(angle),
                face_index: face(i),
            })?;
        }
    }
    ControlFlow::Continue(())
}

fn plane(from: Vec2, to: Vec2, position: Vec2, angle: f32, report: Report<'_>) -> ControlFlow<()> {
    let normal = Vec2::Y.rotate(angle);
    let dir = to - from;
    let denom = normal.dot(dir);
    if denom.abs() < f32::EPSILON {
        return ControlFlow::Continue(());
    }
    let t = normal.dot(position - from) / denom;
    if (0.0..=1.0).contains(&t) {
        report(RayHit {
            fraction: t,
            normal,
            face_index: -1,
        })?;
    }
    ControlFlow::Continue(())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn face(i: usize) -> i32 {
    i as i32
}
