//! # Body Integration
//!
//! Semi-implicit Euler split around the solver: forces update velocities
//! first, the solver adds its impulses, then positions advance with the
//! corrected velocities.

use crate::body::{Body, BodyType};
use crate::types::Vec2;

/// Add gravity to the accumulated force of an awake dynamic body.
pub fn apply_gravity(body: &mut Body, gravity: Vec2) {
    if body.body_type() != BodyType::Dynamic || body.is_sleeping() || body.gravity_scale == 0.0 {
        return;
    }
    let weight = gravity * (body.mass() * body.gravity_scale);
    if weight != Vec2::ZERO {
        body.force += weight;
    }
}

/// `v += F·m⁻¹·dt`, `ω += τ·I⁻¹·dt` for awake dynamic bodies.
///
/// A zero force leaves the velocity untouched, bit for bit.
pub fn integrate_velocity(body: &mut Body, dt: f32) {
    if body.body_type() != BodyType::Dynamic || body.is_sleeping() {
        return;
    }
    if body.force != Vec2::ZERO {
        body.velocity += body.force * (body.inv_mass() * dt);
    }
    if body.torque != 0.0 && !body.fixed_rotation() {
        body.angular_velocity += body.torque * body.inv_inertia() * dt;
    }
}

/// Advance the pose by the current velocity, then apply damping and clear
/// the accumulated force. Static and sleeping bodies do not move.
pub fn integrate_position(body: &mut Body, dt: f32) {
    body.previous_position = body.position;
    body.previous_angle = body.angle;
    match body.body_type() {
        BodyType::Static => {}
        BodyType::Kinematic => {
            body.position += body.velocity * dt;
            body.angle += body.angular_velocity * dt;
        }
        BodyType::Dynamic => {
            if !body.is_sleeping() {
                if body.fixed_rotation() {
                    body.angular_velocity = 0.0;
                }
                body.position += body.velocity * dt;
                body.angle += body.angular_velocity * dt;
                if body.damping > 0.0 {
                    body.velocity *= (1.0 - body.damping).powf(dt);
                }
                if body.angular_damping > 0.0 {
                    body.angular_velocity *= (1.0 - body.angular_damping).powf(dt);
                }
            }
        }
    }
    body.set_zero_force();
    body.update_aabb();
}

/// Blend between the previous and current pose for rendering. `alpha` is
/// the leftover fraction of a fixed step.
pub fn interpolate(body: &mut Body, alpha: f32) {
    body.interpolated_position = body.previous_position.lerp(body.position, alpha);
    body.interpolated_angle = body.previous_angle + (body.angle - body.previous_angle) * alpha;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Shape;

    fn ball() -> Body {
        Body::dynamic(2.0).with_shape(Shape::circle(0.5).unwrap())
    }

    #[test]
    fn free_fall_one_step() {
        let mut body = ball();
        let dt = 0.1;
        apply_gravity(&mut body, Vec2::new(0.0, -10.0));
        integrate_velocity(&mut body, dt);
        integrate_position(&mut body, dt);
        assert!((body.velocity.y + 1.0).abs() < 1e-6);
        assert!((body.position.y + 0.1).abs() < 1e-6);
        assert_eq!(body.force, Vec2::ZERO);
    }

    #[test]
    fn zero_force_keeps_velocity_bits() {
        let v = Vec2::new(0.123_456_7, -3.141_59);
        let mut body = ball().with_velocity(v);
        integrate_velocity(&mut body, 1.0 / 60.0);
        assert_eq!(body.velocity.x.to_bits(), v.x.to_bits());
        assert_eq!(body.velocity.y.to_bits(), v.y.to_bits());
    }

    #[test]
    fn kinematic_ignores_forces() {
        let mut body = Body::kinematic().with_velocity(Vec2::new(1.0, 0.0));
        body.force = Vec2::new(100.0, 0.0);
        apply_gravity(&mut body, Vec2::new(0.0, -10.0));
        integrate_velocity(&mut body, 0.5);
        integrate_position(&mut body, 0.5);
        assert_eq!(body.velocity, Vec2::new(1.0, 0.0));
        assert_eq!(body.position, Vec2::new(0.5, 0.0));
    }

    #[test]
    fn damping_is_time_scaled() {
        let mut body = ball().with_velocity(Vec2::new(1.0, 0.0)).with_damping(0.5, 0.0);
        integrate_position(&mut body, 1.0);
        assert!((body.velocity.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn sleeping_bodies_stay_put() {
        let mut body = ball().with_velocity(Vec2::new(1.0, 0.0));
        body.sleep();
        apply_gravity(&mut body, Vec2::new(0.0, -10.0));
        integrate_velocity(&mut body, 0.1);
        integrate_position(&mut body, 0.1);
        assert_eq!(body.position, Vec2::ZERO);
    }

    #[test]
    fn interpolation_blends_poses() {
        let mut body = ball().with_velocity(Vec2::new(2.0, 0.0));
        integrate_position(&mut body, 1.0);
        interpolate(&mut body, 0.25);
        assert!((body.interpolated_position.x - 0.5).abs() < 1e-6);
    }
}
