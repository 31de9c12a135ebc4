//! # Rigid Bodies
//!
//! A [`Body`] owns its kinematic state, accumulated force/torque and a list
//! of [`Shape`]s placed in its local frame. Bodies are created by the caller
//! and handed to the [`World`](crate::World), which owns them from then on and
//! hands back a [`BodyHandle`].

use serde::{Deserialize, Serialize};

use crate::events::OwnerId;
use crate::shapes::Shape;
use crate::types::{to_global_frame, to_local_frame, Aabb, Vec2};

slotmap::new_key_type! {
    /// Stable handle to a body owned by a [`World`](crate::World).
    pub struct BodyHandle;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyType {
    /// Moved by forces, impulses and contacts.
    Dynamic,
    /// Never moves.
    Static,
    /// Moved only by its own velocity; pushes dynamic bodies but is never pushed.
    Kinematic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepState {
    Awake,
    /// Below the energy threshold but not for long enough yet.
    Sleepy,
    Sleeping,
}

#[derive(Clone, Debug)]
pub struct Body {
    body_type: BodyType,
    mass: f32,
    inv_mass: f32,
    inertia: f32,
    inv_inertia: f32,
    shapes: Vec<Shape>,
    aabb: Aabb,
    sleep_state: SleepState,
    idle_steps: u32,

    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub force: Vec2,
    pub torque: f32,

    /// Global switch for contact equations of every shape on this body.
    pub collision_response: bool,
    /// Linear damping fraction per second, in `[0, 1]`.
    pub damping: f32,
    pub angular_damping: f32,
    pub gravity_scale: f32,
    pub allow_sleep: bool,
    /// Overrides the world's sleep energy threshold when set.
    pub sleep_energy_threshold: Option<f32>,
    pub owner: Option<OwnerId>,

    pub previous_position: Vec2,
    pub previous_angle: f32,
    pub interpolated_position: Vec2,
    pub interpolated_angle: f32,

    fixed_rotation: bool,
    pub(crate) woke_up: bool,
    pub(crate) fell_asleep: bool,
}

impl Body {
    fn with_type(body_type: BodyType, mass: f32) -> Self {
        let mut body = Self {
            body_type,
            mass,
            inv_mass: 0.0,
            inertia: 0.0,
            inv_inertia: 0.0,
            shapes: Vec::new(),
            aabb: Aabb::default(),
            sleep_state: SleepState::Awake,
            idle_steps: 0,
            position: Vec2::ZERO,
            angle: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            force: Vec2::ZERO,
            torque: 0.0,
            collision_response: true,
            damping: 0.0,
            angular_damping: 0.0,
            gravity_scale: 1.0,
            allow_sleep: true,
            sleep_energy_threshold: None,
            owner: None,
            previous_position: Vec2::ZERO,
            previous_angle: 0.0,
            interpolated_position: Vec2::ZERO,
            interpolated_angle: 0.0,
            fixed_rotation: false,
            woke_up: false,
            fell_asleep: false,
        };
        body.update_mass_properties();
        body
    }

    /// A body moved by forces. A non-positive mass makes it immovable.
    #[must_use]
    pub fn dynamic(mass: f32) -> Self {
        Self::with_type(BodyType::Dynamic, mass.max(0.0))
    }

    #[must_use]
    pub fn new_static() -> Self {
        Self::with_type(BodyType::Static, 0.0)
    }

    #[must_use]
    pub fn kinematic() -> Self {
        Self::with_type(BodyType::Kinematic, 0.0)
    }

    #[must_use]
    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self.previous_position = position;
        self.interpolated_position = position;
        self
    }

    #[must_use]
    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self.previous_angle = angle;
        self.interpolated_angle = angle;
        self
    }

    #[must_use]
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    #[must_use]
    pub fn with_angular_velocity(mut self, angular_velocity: f32) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    #[must_use]
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.add_shape(shape);
        self
    }

    #[must_use]
    pub fn with_owner(mut self, owner: OwnerId) -> Self {
        self.owner = Some(owner);
        self
    }

    #[must_use]
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.damping = linear;
        self.angular_damping = angular;
        self
    }

    #[must_use]
    pub fn with_fixed_rotation(mut self, fixed: bool) -> Self {
        self.set_fixed_rotation(fixed);
        self
    }

    /// Append a shape and refresh mass properties. Returns the shape index.
    pub fn add_shape(&mut self, shape: Shape) -> usize {
        self.shapes.push(shape);
        self.update_mass_properties();
        self.update_aabb();
        self.shapes.len() - 1
    }

    #[must_use]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Mutable access to shape properties (filters, materials, offsets).
    pub fn shape_mut(&mut self, index: usize) -> Option<&mut Shape> {
        self.shapes.get_mut(index)
    }

    #[must_use]
    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.body_type == BodyType::Dynamic
    }

    #[must_use]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[must_use]
    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    #[must_use]
    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    #[must_use]
    pub fn inv_inertia(&self) -> f32 {
        self.inv_inertia
    }

    pub fn set_mass(&mut self, mass: f32) {
        self.mass = mass.max(0.0);
        self.update_mass_properties();
    }

    #[must_use]
    pub fn fixed_rotation(&self) -> bool {
        self.fixed_rotation
    }

    pub fn set_fixed_rotation(&mut self, fixed: bool) {
        self.fixed_rotation = fixed;
        self.update_mass_properties();
    }

    /// Recompute inverse mass and inertia from the mass and shape list.
    ///
    /// Mass is shared between shapes by area (evenly when every shape is
    /// area-less) and offsets contribute through the parallel axis theorem.
    pub fn update_mass_properties(&mut self) {
        if self.body_type != BodyType::Dynamic || self.mass <= 0.0 {
            self.inv_mass = 0.0;
            self.inertia = 0.0;
            self.inv_inertia = 0.0;
            return;
        }
        self.inv_mass = 1.0 / self.mass;

        let total_area: f32 = self.shapes.iter().map(Shape::area).sum();
        #[allow(clippy::cast_precision_loss)]
        let count = self.shapes.len() as f32;
        let mut inertia = 0.0;
        for shape in &self.shapes {
            let share = if total_area > 0.0 {
                self.mass * shape.area() / total_area
            } else {
                self.mass / count
            };
            inertia += shape.moment_of_inertia(share)
                + share * shape.local_position.length_squared();
        }
        self.inertia = inertia;
        self.inv_inertia = if inertia > 0.0 && !self.fixed_rotation {
            1.0 / inertia
        } else {
            0.0
        };
    }

    /// Bounding box cached at the last [`Body::update_aabb`].
    #[must_use]
    pub fn aabb(&self) -> Aabb {
        self.aabb
    }

    /// Union of every shape's world bounding box at the current pose.
    #[must_use]
    pub fn compute_aabb(&self) -> Aabb {
        if self.shapes.is_empty() {
            return Aabb::new(self.position, self.position);
        }
        let mut aabb = Aabb::empty();
        for shape in &self.shapes {
            let (pos, angle) = shape.world_transform(self.position, self.angle);
            aabb.extend(&shape.compute_aabb(pos, angle));
        }
        aabb
    }

    pub fn update_aabb(&mut self) {
        self.aabb = self.compute_aabb();
    }

    /// Accumulate a force through the centre of mass.
    pub fn apply_force(&mut self, force: Vec2) {
        self.force += force;
        self.wake_up();
    }

    /// Accumulate a force at `relative_point`, a world-oriented offset from the centre.
    pub fn apply_force_at(&mut self, force: Vec2, relative_point: Vec2) {
        self.force += force;
        self.torque += relative_point.cross(force);
        self.wake_up();
    }

    /// Accumulate a force given in body-local coordinates at a local point.
    pub fn apply_local_force(&mut self, local_force: Vec2, local_point: Vec2) {
        let force = self.vector_to_world_frame(local_force);
        let point = self.vector_to_world_frame(local_point);
        self.apply_force_at(force, point);
    }

    /// Instant velocity change at `relative_point` (world-oriented offset).
    pub fn apply_impulse(&mut self, impulse: Vec2, relative_point: Vec2) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        self.velocity += impulse * self.inv_mass;
        self.angular_velocity += relative_point.cross(impulse) * self.inv_inertia;
        self.wake_up();
    }

    pub fn set_zero_force(&mut self) {
        self.force = Vec2::ZERO;
        self.torque = 0.0;
    }

    #[must_use]
    pub fn to_world_frame(&self, local_point: Vec2) -> Vec2 {
        to_global_frame(local_point, self.position, self.angle)
    }

    #[must_use]
    pub fn to_local_frame(&self, world_point: Vec2) -> Vec2 {
        to_local_frame(world_point, self.position, self.angle)
    }

    #[must_use]
    pub fn vector_to_world_frame(&self, local_vector: Vec2) -> Vec2 {
        local_vector.rotate(self.angle)
    }

    /// Velocity of the material point at a world-oriented offset from the centre.
    #[must_use]
    pub fn velocity_at(&self, relative_point: Vec2) -> Vec2 {
        self.velocity + relative_point.cross_scalar(self.angular_velocity)
    }

    #[must_use]
    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.mass * self.velocity.length_squared()
            + 0.5 * self.inertia * self.angular_velocity * self.angular_velocity
    }

    #[must_use]
    pub fn sleep_state(&self) -> SleepState {
        self.sleep_state
    }

    #[must_use]
    pub fn is_sleeping(&self) -> bool {
        self.sleep_state == SleepState::Sleeping
    }

    pub fn wake_up(&mut self) {
        if self.sleep_state == SleepState::Sleeping {
            self.woke_up = true;
        }
        self.sleep_state = SleepState::Awake;
        self.idle_steps = 0;
    }

    /// Put the body to sleep immediately, zeroing its motion.
    pub fn sleep(&mut self) {
        if self.sleep_state != SleepState::Sleeping {
            self.fell_asleep = true;
        }
        self.sleep_state = SleepState::Sleeping;
        self.velocity = Vec2::ZERO;
        self.angular_velocity = 0.0;
        self.set_zero_force();
    }

    /// Advance the idle counter. Returns true when the body just fell asleep.
    pub(crate) fn sleep_tick(&mut self, energy_threshold: f32, steps_to_sleep: u32) -> bool {
        if !self.allow_sleep || self.body_type != BodyType::Dynamic || self.is_sleeping() {
            return false;
        }
        let threshold = self.sleep_energy_threshold.unwrap_or(energy_threshold);
        if self.kinetic_energy() >= threshold {
            self.sleep_state = SleepState::Awake;
            self.idle_steps = 0;
            return false;
        }
        self.idle_steps += 1;
        self.sleep_state = SleepState::Sleepy;
        if self.idle_steps >= steps_to_sleep {
            self.sleep();
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_mass_invariant() {
        assert_eq!(Body::dynamic(2.0).inv_mass(), 0.5);
        assert_eq!(Body::dynamic(0.0).inv_mass(), 0.0);
        assert_eq!(Body::new_static().inv_mass(), 0.0);
        assert_eq!(Body::kinematic().inv_inertia(), 0.0);
    }

    #[test]
    fn circle_inertia_from_shape() {
        let body = Body::dynamic(2.0).with_shape(Shape::circle(1.0).unwrap());
        assert!((body.inertia() - 1.0).abs() < 1e-6);
        assert!((body.inv_inertia() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn offset_shape_uses_parallel_axis() {
        let body = Body::dynamic(1.0)
            .with_shape(Shape::circle(1.0).unwrap().with_offset(Vec2::new(2.0, 0.0), 0.0));
        assert!((body.inertia() - (0.5 + 4.0)).abs() < 1e-5);
    }

    #[test]
    fn static_body_ignores_impulses() {
        let mut body = Body::new_static();
        body.apply_impulse(Vec2::new(10.0, 0.0), Vec2::ZERO);
        assert_eq!(body.velocity, Vec2::ZERO);
    }

    #[test]
    fn off_centre_force_produces_torque() {
        let mut body = Body::dynamic(1.0);
        body.apply_force_at(Vec2::new(0.0, 2.0), Vec2::new(1.0, 0.0));
        assert_eq!(body.torque, 2.0);
    }

    #[test]
    fn fixed_rotation_zeroes_inverse_inertia() {
        let body = Body::dynamic(1.0)
            .with_shape(Shape::rectangle(1.0, 1.0).unwrap())
            .with_fixed_rotation(true);
        assert!(body.inertia() > 0.0);
        assert_eq!(body.inv_inertia(), 0.0);
    }

    #[test]
    fn sleeps_after_idle_steps_and_wakes_on_force() {
        let mut body = Body::dynamic(1.0).with_shape(Shape::circle(1.0).unwrap());
        assert!(!body.sleep_tick(0.1, 3));
        assert!(!body.sleep_tick(0.1, 3));
        assert!(body.sleep_tick(0.1, 3));
        assert!(body.is_sleeping());
        body.apply_force(Vec2::new(1.0, 0.0));
        assert_eq!(body.sleep_state(), SleepState::Awake);
        assert!(body.woke_up);
    }

    #[test]
    fn aabb_covers_all_shapes() {
        let mut body = Body::dynamic(1.0)
            .with_shape(Shape::circle(1.0).unwrap())
            .with_shape(Shape::circle(1.0).unwrap().with_offset(Vec2::new(3.0, 0.0), 0.0))
            .with_position(Vec2::new(1.0, 1.0));
        body.update_aabb();
        assert_eq!(body.aabb().min, Vec2::new(0.0, 0.0));
        assert_eq!(body.aabb().max, Vec2::new(5.0, 2.0));
    }
}
