use super::geometry::{collide_hulls, point_against_hull, segment_hull_distance, Hull, EPSILON};
use super::{ContactPoint, Placed};
use crate::shapes::ShapeKind;
use crate::types::{to_local_frame, Aabb, Vec2};

/// Terrain `a` against `b`, one convex quad per column under `b`'s bounds.
///
/// Contacts whose normal faces away from the column's surface are dropped so
/// the vertical sides between columns never push.
pub(super) fn heightfield_any(a: &Placed<'_>, b: &Placed<'_>, out: &mut Vec<ContactPoint>) {
    let ShapeKind::Heightfield(field) = a.shape.kind() else {
        return;
    };

    let bounds = b.shape.compute_aabb(b.position, b.angle);
    let local = Aabb::from_points(
        [
            bounds.min,
            Vec2::new(bounds.max.x, bounds.min.y),
            bounds.max,
            Vec2::new(bounds.min.x, bounds.max.y),
        ]
        .into_iter()
        .map(|p| to_local_frame(p, a.position, a.angle)),
    );
    if local.min.y > field.max_value() {
        return;
    }

    let floor = field.min_value() - field.element_width();
    let to_world = |p: Vec2| p.rotate(a.angle) + a.position;

    for column in field.column_range(local.min.x, local.max.x) {
        let (top_left, top_right) = field.segment(column);
        let quad = Hull::Quad([
            to_world(Vec2::new(top_left.x, floor)),
            to_world(Vec2::new(top_right.x, floor)),
            to_world(top_right),
            to_world(top_left),
        ]);
        let up = quad.normal(2);

        let before = out.len();
        if let Some((p, q, radius)) = b.rounded() {
            if (q - p).length_squared() <= EPSILON {
                out.extend(point_against_hull(p, radius, &quad));
            } else if radius <= 0.0 || segment_hull_distance(p, q, &quad) < radius {
                collide_hulls(&quad, 0.0, &Hull::Segment(p, q), radius, out);
            }
        } else if let Some(polygon) = b.shape.polygon() {
            let hull = Hull::Polygon {
                polygon,
                position: b.position,
                angle: b.angle,
            };
            collide_hulls(&quad, 0.0, &hull, 0.0, out);
        }

        let mut i = before;
        while i < out.len() {
            if out[i].normal.dot(up) <= 0.0 {
                out.swap_remove(i);
            } else {
                i += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Shape;

    #[test]
    fn circle_on_flat_terrain() {
        let terrain = Shape::heightfield(vec![0.0, 0.0, 0.0, 0.0], 1.0).unwrap();
        let circle = Shape::circle(0.5).unwrap();
        let mut out = Vec::new();
        heightfield_any(
            &Placed::new(&terrain, Vec2::ZERO, 0.0),
            &Placed::new(&circle, Vec2::new(1.5, 0.4), 0.0),
            &mut out,
        );
        assert_eq!(out.len(), 1);
        assert!((out[0].normal.y - 1.0).abs() < 1e-5);
        assert!((out[0].depth - 0.1).abs() < 1e-5);
    }

    #[test]
    fn box_straddling_two_columns() {
        let terrain = Shape::heightfield(vec![0.0, 0.0, 0.0], 2.0).unwrap();
        let block = Shape::rectangle(1.0, 1.0).unwrap();
        let mut out = Vec::new();
        heightfield_any(
            &Placed::new(&terrain, Vec2::ZERO, 0.0),
            &Placed::new(&block, Vec2::new(2.0, 0.45), 0.0),
            &mut out,
        );
        assert!(!out.is_empty());
        assert!(out.iter().all(|c| c.normal.y > 0.99));
    }

    #[test]
    fn circle_far_above_is_skipped() {
        let terrain = Shape::heightfield(vec![0.0, 1.0, 0.0], 1.0).unwrap();
        let circle = Shape::circle(0.5).unwrap();
        let mut out = Vec::new();
        heightfield_any(
            &Placed::new(&terrain, Vec2::ZERO, 0.0),
            &Placed::new(&circle, Vec2::new(1.0, 3.0), 0.0),
            &mut out,
        );
        assert!(out.is_empty());
    }
}
