//! # World Builder
//!
//! Adding and removing bodies, constraints and springs. Every operation is
//! rejected with [`WorldError::Stepping`] while a step is running; listeners
//! queue their changes through [`StepCommands`](crate::StepCommands) instead.

use tracing::{debug, warn};

use crate::body::{Body, BodyHandle, BodyType};
use crate::constraints::{Constraint, ConstraintHandle};
use crate::error::WorldError;
use crate::events::WorldEvent;
use crate::springs::{Spring, SpringHandle};
use crate::world::{key_event, World};

impl World {
    fn ensure_idle(&self) -> Result<(), WorldError> {
        if self.stepping {
            warn!("mutation rejected while stepping");
            return Err(WorldError::Stepping);
        }
        Ok(())
    }

    fn ensure_pair(&self, a: BodyHandle, b: BodyHandle) -> Result<(), WorldError> {
        if a == b {
            return Err(WorldError::SameBody(a));
        }
        for handle in [a, b] {
            if !self.bodies.contains_key(handle) {
                return Err(WorldError::UnknownBody(handle));
            }
        }
        Ok(())
    }

    /// Take ownership of `body`.
    ///
    /// # Errors
    /// The world is stepping.
    pub fn add_body(&mut self, mut body: Body) -> Result<BodyHandle, WorldError> {
        self.ensure_idle()?;
        body.update_aabb();
        body.previous_position = body.position;
        body.previous_angle = body.angle;
        body.interpolated_position = body.position;
        body.interpolated_angle = body.angle;
        let body_type = body.body_type();
        let handle = self.bodies.insert(body);
        self.order.push(handle);
        match body_type {
            BodyType::Dynamic => self.dynamic.push(handle),
            BodyType::Kinematic => self.kinematic.push(handle),
            BodyType::Static => {}
        }
        debug!(?handle, ?body_type, "body added");
        Ok(handle)
    }

    /// Remove a body along with every constraint and spring attached to it.
    /// Contacts it was part of end immediately and are reported as
    /// [`WorldEvent::EndContact`].
    ///
    /// # Errors
    /// The world is stepping, or `handle` is unknown.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<Body, WorldError> {
        self.ensure_idle()?;
        if !self.bodies.contains_key(handle) {
            return Err(WorldError::UnknownBody(handle));
        }

        let attached: Vec<ConstraintHandle> = self
            .constraint_order
            .iter()
            .copied()
            .filter(|&c| {
                let c = &self.constraints[c];
                c.body_a == handle || c.body_b == handle
            })
            .collect();
        for constraint in attached {
            self.remove_constraint(constraint)?;
        }
        let attached: Vec<SpringHandle> = self
            .spring_order
            .iter()
            .copied()
            .filter(|&s| {
                let s = &self.springs[s];
                s.body_a == handle || s.body_b == handle
            })
            .collect();
        for spring in attached {
            self.remove_spring(spring)?;
        }

        let first_event = self.events.len();
        for key in self.contact_list.remove_body(handle) {
            let event = key_event(&self.bodies, &key);
            self.events.push(WorldEvent::EndContact(event));
        }

        let body = self
            .bodies
            .remove(handle)
            .ok_or(WorldError::UnknownBody(handle))?;
        self.order.retain(|&h| h != handle);
        self.dynamic.retain(|&h| h != handle);
        self.kinematic.retain(|&h| h != handle);
        debug!(?handle, "body removed");

        self.dispatch_events(first_event);
        self.apply_pending();
        Ok(body)
    }

    /// Add a joint. Whatever the joint measures from the initial pose (rest
    /// distance, relative angle) is captured now.
    ///
    /// # Errors
    /// The world is stepping, a body is unknown, or both ends are one body.
    pub fn add_constraint(&mut self, mut constraint: Constraint) -> Result<ConstraintHandle, WorldError> {
        self.ensure_idle()?;
        self.ensure_pair(constraint.body_a, constraint.body_b)?;
        constraint.attach(&self.bodies[constraint.body_a], &self.bodies[constraint.body_b]);
        let handle = self.constraints.insert(constraint);
        self.constraint_order.push(handle);
        Ok(handle)
    }

    /// # Errors
    /// The world is stepping, or `handle` is unknown.
    pub fn remove_constraint(&mut self, handle: ConstraintHandle) -> Result<Constraint, WorldError> {
        self.ensure_idle()?;
        let constraint = self
            .constraints
            .remove(handle)
            .ok_or(WorldError::UnknownConstraint(handle))?;
        self.constraint_order.retain(|&h| h != handle);
        Ok(constraint)
    }

    /// # Errors
    /// The world is stepping, a body is unknown, or both ends are one body.
    pub fn add_spring(&mut self, mut spring: Spring) -> Result<SpringHandle, WorldError> {
        self.ensure_idle()?;
        self.ensure_pair(spring.body_a, spring.body_b)?;
        spring.attach(&self.bodies[spring.body_a], &self.bodies[spring.body_b]);
        let handle = self.springs.insert(spring);
        self.spring_order.push(handle);
        Ok(handle)
    }

    /// # Errors
    /// The world is stepping, or `handle` is unknown.
    pub fn remove_spring(&mut self, handle: SpringHandle) -> Result<Spring, WorldError> {
        self.ensure_idle()?;
        let spring = self
            .springs
            .remove(handle)
            .ok_or(WorldError::UnknownSpring(handle))?;
        self.spring_order.retain(|&h| h != handle);
        Ok(spring)
    }

    /// Dynamic bodies in insertion order.
    #[must_use]
    pub fn dynamic_bodies(&self) -> &[BodyHandle] {
        &self.dynamic
    }

    /// Kinematic bodies in insertion order.
    #[must_use]
    pub fn kinematic_bodies(&self) -> &[BodyHandle] {
        &self.kinematic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::constraints::DistanceJoint;
    use crate::shapes::Shape;
    use crate::types::Vec2;

    fn world() -> World {
        World::new(WorldConfig::default().with_gravity(Vec2::ZERO))
    }

    fn ball(x: f32) -> Body {
        Body::dynamic(1.0)
            .with_position(Vec2::new(x, 0.0))
            .with_shape(Shape::circle(1.0).unwrap())
    }

    #[test]
    fn partitions_follow_body_type() {
        let mut w = world();
        let d = w.add_body(ball(0.0)).unwrap();
        let k = w.add_body(Body::kinematic()).unwrap();
        w.add_body(Body::new_static()).unwrap();
        assert_eq!(w.dynamic_bodies(), &[d]);
        assert_eq!(w.kinematic_bodies(), &[k]);
        assert_eq!(w.body_count(), 3);
    }

    #[test]
    fn unknown_removals_fail_loudly() {
        let mut w = world();
        let h = w.add_body(ball(0.0)).unwrap();
        w.remove_body(h).unwrap();
        assert_eq!(w.remove_body(h).unwrap_err(), WorldError::UnknownBody(h));
    }

    #[test]
    fn constraints_need_two_known_bodies() {
        let mut w = world();
        let a = w.add_body(ball(0.0)).unwrap();
        let b = w.add_body(ball(3.0)).unwrap();
        assert_eq!(
            w.add_constraint(Constraint::distance(a, a, DistanceJoint::new()))
                .unwrap_err(),
            WorldError::SameBody(a)
        );
        w.remove_body(b).unwrap();
        assert_eq!(
            w.add_constraint(Constraint::distance(a, b, DistanceJoint::new()))
                .unwrap_err(),
            WorldError::UnknownBody(b)
        );
    }

    #[test]
    fn removing_a_body_cascades() {
        let mut w = world();
        let a = w.add_body(ball(0.0)).unwrap();
        let b = w.add_body(ball(3.0)).unwrap();
        let c = w.add_body(ball(6.0)).unwrap();
        w.add_constraint(Constraint::distance(a, b, DistanceJoint::new()))
            .unwrap();
        w.add_spring(Spring::linear(b, c, 10.0, 0.0)).unwrap();
        w.remove_body(b).unwrap();
        assert_eq!(w.constraint_count(), 0);
        assert_eq!(w.spring_count(), 0);
    }

    #[test]
    fn removing_a_touching_body_ends_its_contacts() {
        let mut w = world();
        let a = w.add_body(ball(0.0)).unwrap();
        let b = w.add_body(ball(1.5)).unwrap();
        w.step(1.0 / 60.0).unwrap();
        assert_eq!(w.contact_list().active().len(), 1);
        w.remove_body(a).unwrap();
        assert!(w.contact_list().active().is_empty());
        let ended: Vec<_> = w
            .events()
            .iter()
            .filter_map(|e| match e {
                WorldEvent::EndContact(c) => Some(c.body_b),
                _ => None,
            })
            .collect();
        assert_eq!(ended.len(), 1);
        assert!(ended[0] == b || ended[0] == a);
    }
}
