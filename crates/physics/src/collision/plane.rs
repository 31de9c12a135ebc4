use super::{ContactPoint, Placed};
use crate::types::Vec2;

/// Half-plane `a` against any shape with support vertices.
pub(super) fn plane_any(a: &Placed<'_>, b: &Placed<'_>, out: &mut Vec<ContactPoint>) {
    let normal = Vec2::Y.rotate(a.angle);
    let mut test = |v: Vec2, radius: f32| {
        let height = (v - a.position).dot(normal);
        if height < radius {
            out.push(ContactPoint::new(
                v - normal * height,
                v - normal * radius,
                normal,
                radius - height,
            ));
        }
    };

    if let Some((p, q, radius)) = b.rounded() {
        test(p, radius);
        if (q - p).length_squared() > 0.0 {
            test(q, radius);
        }
    } else if let Some(polygon) = b.shape.polygon() {
        for i in 0..polygon.vertices().len() {
            test(polygon.world_vertex(i, b.position, b.angle), 0.0);
        }
    }
}
