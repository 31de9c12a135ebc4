//! Convex polygon hulls shared by the `Box` and `Convex` shape kinds.

use crate::error::ShapeError;
use crate::types::Vec2;

const AREA_EPSILON: f32 = 1e-8;

/// A counter-clockwise convex hull centred on its centroid.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vec2>,
    /// Outward normal of the edge `vertices[i] -> vertices[i + 1]`.
    normals: Vec<Vec2>,
    area: f32,
}

impl Polygon {
    /// Build a hull from vertices in shape-local coordinates.
    ///
    /// Vertices may be given in either winding. They are recentred so the
    /// centroid sits at the shape origin.
    ///
    /// # Errors
    /// No vertices, too few distinct ones, or a non-convex outline.
    pub fn new(vertices: &[Vec2]) -> Result<Self, ShapeError> {
        if vertices.is_empty() {
            return Err(ShapeError::EmptyConvex);
        }
        if vertices.len() < 3 {
            return Err(ShapeError::DegenerateConvex("needs at least three vertices"));
        }
        if vertices.iter().any(|v| !v.is_finite()) {
            return Err(ShapeError::DegenerateConvex("vertices must be finite"));
        }

        let mut verts = vertices.to_vec();
        let signed = signed_area(&verts);
        if signed.abs() < AREA_EPSILON {
            return Err(ShapeError::DegenerateConvex("zero area"));
        }
        if signed < 0.0 {
            verts.reverse();
        }

        let n = verts.len();
        for i in 0..n {
            let a = verts[i];
            let b = verts[(i + 1) % n];
            let c = verts[(i + 2) % n];
            if (b - a).cross(c - b) < -AREA_EPSILON {
                return Err(ShapeError::DegenerateConvex("vertices are not convex"));
            }
        }

        let centroid = centroid(&verts, signed.abs());
        for v in &mut verts {
            *v -= centroid;
        }

        let normals = (0..n)
            .map(|i| {
                let edge = verts[(i + 1) % n] - verts[i];
                Vec2::new(edge.y, -edge.x).normalize()
            })
            .collect();

        Ok(Self {
            vertices: verts,
            normals,
            area: signed.abs(),
        })
    }

    /// Axis-aligned rectangle centred on the origin.
    ///
    /// # Errors
    /// Either extent is not positive and finite.
    pub fn rectangle(width: f32, height: f32) -> Result<Self, ShapeError> {
        for extent in [width, height] {
            if !(extent.is_finite() && extent > 0.0) {
                return Err(ShapeError::InvalidExtent(extent));
            }
        }
        let (hw, hh) = (width * 0.5, height * 0.5);
        Self::new(&[
            Vec2::new(-hw, -hh),
            Vec2::new(hw, -hh),
            Vec2::new(hw, hh),
            Vec2::new(-hw, hh),
        ])
    }

    #[must_use]
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    #[must_use]
    pub fn normals(&self) -> &[Vec2] {
        &self.normals
    }

    #[must_use]
    pub fn area(&self) -> f32 {
        self.area
    }

    #[must_use]
    pub fn bounding_radius(&self) -> f32 {
        self.vertices
            .iter()
            .map(|v| v.length())
            .fold(0.0, f32::max)
    }

    /// Moment of inertia about the centroid for the given mass.
    #[must_use]
    pub fn moment_of_inertia(&self, mass: f32) -> f32 {
        let n = self.vertices.len();
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            let cross = a.cross(b).abs();
            numerator += cross * (a.dot(a) + a.dot(b) + b.dot(b));
            denominator += cross;
        }
        if denominator <= 0.0 {
            return 0.0;
        }
        mass / 6.0 * (numerator / denominator)
    }

    /// World-space vertex `i` for a hull placed at `position` rotated by `angle`.
    #[must_use]
    pub fn world_vertex(&self, i: usize, position: Vec2, angle: f32) -> Vec2 {
        self.vertices[i].rotate(angle) + position
    }

    /// Index of the vertex furthest along a local-space direction.
    #[must_use]
    pub fn support_index(&self, local_dir: Vec2) -> usize {
        let mut best = 0;
        let mut best_dot = f32::NEG_INFINITY;
        for (i, v) in self.vertices.iter().enumerate() {
            let d = v.dot(local_dir);
            if d > best_dot {
                best_dot = d;
                best = i;
            }
        }
        best
    }

    /// Point containment in local coordinates.
    #[must_use]
    pub fn contains_local(&self, p: Vec2) -> bool {
        self.vertices
            .iter()
            .zip(&self.normals)
            .all(|(v, n)| (p - *v).dot(*n) <= 0.0)
    }
}

fn signed_area(vertices: &[Vec2]) -> f32 {
    let n = vertices.len();
    (0..n)
        .map(|i| vertices[i].cross(vertices[(i + 1) % n]))
        .sum::<f32>()
        * 0.5
}

fn centroid(vertices: &[Vec2], area: f32) -> Vec2 {
    let n = vertices.len();
    let mut c = Vec2::ZERO;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        c += (a + b) * a.cross(b);
    }
    c / (6.0 * area)
}
