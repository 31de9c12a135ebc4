//! # Collision Shapes
//!
//! Geometric primitives attached to bodies. Every shape lives in its body's
//! local frame (`local_position`, `local_angle`) and carries its own
//! collision filter and surface material.
//!
//! Conventions:
//!
//! -   `Line` and `Capsule` run along the local x axis, centred on the origin.
//! -   `Plane` passes through the shape origin; its solid side is below the
//!     local +y normal.
//! -   `Heightfield` samples start at the shape origin and extend along +x.
//! -   `Convex` vertices are recentred on their centroid at construction.

mod convex;
mod heightfield;
mod raycast;

pub use convex::Polygon;
pub use heightfield::Heightfield;
pub use raycast::RayHit;

use crate::error::ShapeError;
use crate::events::OwnerId;
use crate::types::{Aabb, Vec2};

/// Friction applied to new shapes unless overridden.
pub const DEFAULT_FRICTION: f32 = 0.3;

/// Discriminant used for narrowphase dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShapeType {
    Circle,
    Particle,
    Line,
    Capsule,
    Box,
    Convex,
    Plane,
    Heightfield,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ShapeKind {
    Circle { radius: f32 },
    Particle,
    Line { length: f32 },
    Capsule { length: f32, radius: f32 },
    Box { width: f32, height: f32, polygon: Polygon },
    Convex(Polygon),
    Plane,
    Heightfield(Heightfield),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    kind: ShapeKind,
    bounding_radius: f32,
    pub local_position: Vec2,
    pub local_angle: f32,
    pub collision_group: u32,
    pub collision_mask: u32,
    /// When false, overlaps are still reported but produce no equations.
    pub collision_response: bool,
    pub friction: f32,
    pub restitution: f32,
    pub owner: Option<OwnerId>,
}

impl Shape {
    fn from_kind(kind: ShapeKind) -> Self {
        let bounding_radius = match &kind {
            ShapeKind::Circle { radius } => *radius,
            ShapeKind::Particle => 0.0,
            ShapeKind::Line { length } => length * 0.5,
            ShapeKind::Capsule { length, radius } => length * 0.5 + radius,
            ShapeKind::Box { polygon, .. } | ShapeKind::Convex(polygon) => {
                polygon.bounding_radius()
            }
            ShapeKind::Plane => f32::INFINITY,
            ShapeKind::Heightfield(hf) => hf.bounding_radius(),
        };
        Self {
            kind,
            bounding_radius,
            local_position: Vec2::ZERO,
            local_angle: 0.0,
            collision_group: 1,
            collision_mask: u32::MAX,
            collision_response: true,
            friction: DEFAULT_FRICTION,
            restitution: 0.0,
            owner: None,
        }
    }

    /// # Errors
    /// `radius` is not positive and finite.
    pub fn circle(radius: f32) -> Result<Self, ShapeError> {
        check_radius(radius)?;
        Ok(Self::from_kind(ShapeKind::Circle { radius }))
    }

    #[must_use]
    pub fn particle() -> Self {
        Self::from_kind(ShapeKind::Particle)
    }

    /// # Errors
    /// `length` is not positive and finite.
    pub fn line(length: f32) -> Result<Self, ShapeError> {
        if !(length.is_finite() && length > 0.0) {
            return Err(ShapeError::ZeroLengthLine(length));
        }
        Ok(Self::from_kind(ShapeKind::Line { length }))
    }

    /// # Errors
    /// `length` or `radius` is not positive and finite.
    pub fn capsule(length: f32, radius: f32) -> Result<Self, ShapeError> {
        if !(length.is_finite() && length > 0.0) {
            return Err(ShapeError::ZeroLengthLine(length));
        }
        check_radius(radius)?;
        Ok(Self::from_kind(ShapeKind::Capsule { length, radius }))
    }

    /// # Errors
    /// Either extent is not positive and finite.
    pub fn rectangle(width: f32, height: f32) -> Result<Self, ShapeError> {
        let polygon = Polygon::rectangle(width, height)?;
        Ok(Self::from_kind(ShapeKind::Box {
            width,
            height,
            polygon,
        }))
    }

    /// See [`Polygon::new`].
    ///
    /// # Errors
    /// The vertices do not span a convex polygon with area.
    pub fn convex(vertices: &[Vec2]) -> Result<Self, ShapeError> {
        Ok(Self::from_kind(ShapeKind::Convex(Polygon::new(vertices)?)))
    }

    #[must_use]
    pub fn plane() -> Self {
        Self::from_kind(ShapeKind::Plane)
    }

    /// # Errors
    /// Fewer than two samples or a bad element width.
    pub fn heightfield(heights: Vec<f32>, element_width: f32) -> Result<Self, ShapeError> {
        Ok(Self::from_kind(ShapeKind::Heightfield(Heightfield::new(
            heights,
            element_width,
        )?)))
    }

    #[must_use]
    pub fn with_offset(mut self, local_position: Vec2, local_angle: f32) -> Self {
        self.local_position = local_position;
        self.local_angle = local_angle;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, group: u32, mask: u32) -> Self {
        self.collision_group = group;
        self.collision_mask = mask;
        self
    }

    #[must_use]
    pub fn with_material(mut self, friction: f32, restitution: f32) -> Self {
        self.friction = friction;
        self.restitution = restitution;
        self
    }

    #[must_use]
    pub fn with_owner(mut self, owner: OwnerId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Overlaps are reported through events but never resolved.
    #[must_use]
    pub fn sensor(mut self) -> Self {
        self.collision_response = false;
        self
    }

    #[must_use]
    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    #[must_use]
    pub fn shape_type(&self) -> ShapeType {
        match self.kind {
            ShapeKind::Circle { .. } => ShapeType::Circle,
            ShapeKind::Particle => ShapeType::Particle,
            ShapeKind::Line { .. } => ShapeType::Line,
            ShapeKind::Capsule { .. } => ShapeType::Capsule,
            ShapeKind::Box { .. } => ShapeType::Box,
            ShapeKind::Convex(_) => ShapeType::Convex,
            ShapeKind::Plane => ShapeType::Plane,
            ShapeKind::Heightfield(_) => ShapeType::Heightfield,
        }
    }

    #[must_use]
    pub fn bounding_radius(&self) -> f32 {
        self.bounding_radius
    }

    /// Hull for polygonal kinds.
    #[must_use]
    pub fn polygon(&self) -> Option<&Polygon> {
        match &self.kind {
            ShapeKind::Box { polygon, .. } | ShapeKind::Convex(polygon) => Some(polygon),
            _ => None,
        }
    }

    /// Half-length and radius for kinds that are a segment swept by a disc.
    /// Circles and particles are zero-length segments.
    #[must_use]
    pub fn rounded_segment(&self) -> Option<(f32, f32)> {
        match self.kind {
            ShapeKind::Circle { radius } => Some((0.0, radius)),
            ShapeKind::Particle => Some((0.0, 0.0)),
            ShapeKind::Line { length } => Some((length * 0.5, 0.0)),
            ShapeKind::Capsule { length, radius } => Some((length * 0.5, radius)),
            _ => None,
        }
    }

    /// Filter test between two shapes.
    #[must_use]
    pub fn can_collide_with(&self, other: &Shape) -> bool {
        (self.collision_mask & other.collision_group) != 0
            && (other.collision_mask & self.collision_group) != 0
    }

    #[must_use]
    pub fn area(&self) -> f32 {
        match &self.kind {
            ShapeKind::Circle { radius } => std::f32::consts::PI * radius * radius,
            ShapeKind::Capsule { length, radius } => {
                std::f32::consts::PI * radius * radius + 2.0 * radius * length
            }
            ShapeKind::Box { polygon, .. } | ShapeKind::Convex(polygon) => polygon.area(),
            ShapeKind::Particle
            | ShapeKind::Line { .. }
            | ShapeKind::Plane
            | ShapeKind::Heightfield(_) => 0.0,
        }
    }

    /// Moment of inertia about the shape origin for the given mass.
    #[must_use]
    pub fn moment_of_inertia(&self, mass: f32) -> f32 {
        match &self.kind {
            ShapeKind::Circle { radius } => mass * radius * radius * 0.5,
            ShapeKind::Line { length } => mass * length * length / 12.0,
            ShapeKind::Capsule { length, radius } => {
                let w = length + radius;
                let h = radius * 2.0;
                mass * (w * w + h * h) / 12.0
            }
            ShapeKind::Box { width, height, .. } => {
                mass * (width * width + height * height) / 12.0
            }
            ShapeKind::Convex(polygon) => polygon.moment_of_inertia(mass),
            ShapeKind::Particle | ShapeKind::Plane | ShapeKind::Heightfield(_) => 0.0,
        }
    }

    /// World placement of this shape for a body at `body_position`/`body_angle`.
    #[must_use]
    pub fn world_transform(&self, body_position: Vec2, body_angle: f32) -> (Vec2, f32) {
        (
            body_position + self.local_position.rotate(body_angle),
            body_angle + self.local_angle,
        )
    }

    /// Bounding box for the shape placed at `position` with `angle`.
    #[must_use]
    pub fn compute_aabb(&self, position: Vec2, angle: f32) -> Aabb {
        match &self.kind {
            ShapeKind::Circle { radius } => {
                let r = Vec2::new(*radius, *radius);
                Aabb::new(position - r, position + r)
            }
            ShapeKind::Particle => Aabb::new(position, position),
            ShapeKind::Line { length } => {
                let half = Vec2::new(length * 0.5, 0.0).rotate(angle);
                Aabb::from_points([position - half, position + half])
            }
            ShapeKind::Capsule { length, radius } => {
                let half = Vec2::new(length * 0.5, 0.0).rotate(angle);
                let r = Vec2::new(*radius, *radius);
                let core = Aabb::from_points([position - half, position + half]);
                Aabb::new(core.min - r, core.max + r)
            }
            ShapeKind::Box { polygon, .. } | ShapeKind::Convex(polygon) => {
                Aabb::from_points(polygon.vertices().iter().map(|v| v.rotate(angle) + position))
            }
            ShapeKind::Plane => plane_aabb(position, angle),
            ShapeKind::Heightfield(hf) => {
                let lo = hf.min_value();
                let hi = hf.max_value();
                let w = hf.span();
                Aabb::from_points(
                    [
                        Vec2::new(0.0, lo),
                        Vec2::new(w, lo),
                        Vec2::new(w, hi),
                        Vec2::new(0.0, hi),
                    ]
                    .into_iter()
                    .map(|p| p.rotate(angle) + position),
                )
            }
        }
    }

    /// Whether a world point lies inside the shape placed at `position`/`angle`.
    #[must_use]
    pub fn contains_point(&self, point: Vec2, position: Vec2, angle: f32) -> bool {
        let local = (point - position).rotate(-angle);
        match &self.kind {
            ShapeKind::Circle { radius } => local.length_squared() <= radius * radius,
            ShapeKind::Capsule { length, radius } => {
                let x = local.x.clamp(-length * 0.5, length * 0.5);
                (local - Vec2::new(x, 0.0)).length_squared() <= radius * radius
            }
            ShapeKind::Box { polygon, .. } | ShapeKind::Convex(polygon) => {
                polygon.contains_local(local)
            }
            ShapeKind::Plane => local.y <= 0.0,
            ShapeKind::Heightfield(hf) => {
                hf.column_range(local.x, local.x).any(|i| {
                    let (a, b) = hf.segment(i);
                    let t = ((local.x - a.x) / (b.x - a.x)).clamp(0.0, 1.0);
                    local.y <= a.y + (b.y - a.y) * t
                })
            }
            ShapeKind::Particle | ShapeKind::Line { .. } => false,
        }
    }
}

fn check_radius(radius: f32) -> Result<(), ShapeError> {
    if radius.is_finite() && radius > 0.0 {
        Ok(())
    } else {
        Err(ShapeError::InvalidRadius(radius))
    }
}

fn plane_aabb(position: Vec2, angle: f32) -> Aabb {
    const AXIS_TOLERANCE: f32 = 1e-6;
    let normal = Vec2::Y.rotate(angle);
    let inf = f32::INFINITY;
    let mut aabb = Aabb::new(Vec2::new(-inf, -inf), Vec2::new(inf, inf));
    if normal.x.abs() < AXIS_TOLERANCE {
        if normal.y > 0.0 {
            aabb.max.y = position.y;
        } else {
            aabb.min.y = position.y;
        }
    } else if normal.y.abs() < AXIS_TOLERANCE {
        if normal.x > 0.0 {
            aabb.max.x = position.x;
        } else {
            aabb.min.x = position.x;
        }
    }
    aabb
}
