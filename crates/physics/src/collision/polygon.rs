use super::geometry::{collide_hulls, Hull};
use super::{ContactPoint, Placed};

/// Convex hull against convex hull (boxes included).
pub(super) fn convex_convex(a: &Placed<'_>, b: &Placed<'_>, out: &mut Vec<ContactPoint>) {
    let (Some(pa), Some(pb)) = (a.shape.polygon(), b.shape.polygon()) else {
        return;
    };
    let ha = Hull::Polygon {
        polygon: pa,
        position: a.position,
        angle: a.angle,
    };
    let hb = Hull::Polygon {
        polygon: pb,
        position: b.position,
        angle: b.angle,
    };
    collide_hulls(&ha, 0.0, &hb, 0.0, out);
}
