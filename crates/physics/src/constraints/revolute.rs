use super::{pivot_axes, point_row, relative_angle};
use crate::body::Body;
use crate::equations::{Equation, EquationKind};
use crate::types::Vec2;

const PIVOT_U: usize = 0;
const PIVOT_V: usize = 1;
const LOWER: usize = 2;
const UPPER: usize = 3;
const MOTOR: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RevoluteMotor {
    /// Target relative angular velocity `ωB - ωA`.
    pub speed: f32,
    pub max_torque: f32,
}

/// Pins a point of body A to a point of body B, leaving rotation free.
#[derive(Clone, Debug, PartialEq)]
pub struct RevoluteJoint {
    pub local_pivot_a: Vec2,
    pub local_pivot_b: Vec2,
    /// Shared world pivot; converted into the local pivots on attach.
    pub world_pivot: Option<Vec2>,
    /// Bounds on `θB - θA`.
    pub lower_limit: f32,
    pub upper_limit: f32,
    pub lower_limit_enabled: bool,
    pub upper_limit_enabled: bool,
    pub motor: Option<RevoluteMotor>,
    pub limit_max_force: f32,
}

impl Default for RevoluteJoint {
    fn default() -> Self {
        Self {
            local_pivot_a: Vec2::ZERO,
            local_pivot_b: Vec2::ZERO,
            world_pivot: None,
            lower_limit: 0.0,
            upper_limit: 0.0,
            lower_limit_enabled: false,
            upper_limit_enabled: false,
            motor: None,
            limit_max_force: f32::MAX,
        }
    }
}

impl RevoluteJoint {
    #[must_use]
    pub fn at_world_pivot(pivot: Vec2) -> Self {
        Self {
            world_pivot: Some(pivot),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_local_pivots(local_pivot_a: Vec2, local_pivot_b: Vec2) -> Self {
        Self {
            local_pivot_a,
            local_pivot_b,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_limits(mut self, lower: Option<f32>, upper: Option<f32>) -> Self {
        self.lower_limit_enabled = lower.is_some();
        self.lower_limit = lower.unwrap_or(0.0);
        self.upper_limit_enabled = upper.is_some();
        self.upper_limit = upper.unwrap_or(0.0);
        self
    }

    #[must_use]
    pub fn with_motor(mut self, speed: f32, max_torque: f32) -> Self {
        self.motor = Some(RevoluteMotor { speed, max_torque });
        self
    }

    pub(super) fn attach(&mut self, a: &Body, b: &Body) {
        if let Some(pivot) = self.world_pivot.take() {
            self.local_pivot_a = a.to_local_frame(pivot);
            self.local_pivot_b = b.to_local_frame(pivot);
        }
    }

    pub(super) fn update(&self, a: &Body, b: &Body, equations: &mut [Equation]) {
        let pa = a.to_world_frame(self.local_pivot_a);
        let pb = b.to_world_frame(self.local_pivot_b);
        let (u, v) = pivot_axes(a, b, pa, pb);
        point_row(&mut equations[PIVOT_U], a, b, pa, pb, u);
        point_row(&mut equations[PIVOT_V], a, b, pa, pb, v);

        let angle = relative_angle(a, b);

        let lower = &mut equations[LOWER];
        lower.set_angular_jacobian();
        lower.enabled = self.lower_limit_enabled && angle < self.lower_limit;
        lower.gq = angle - self.lower_limit;
        lower.min_force = 0.0;
        lower.max_force = self.limit_max_force;

        let upper = &mut equations[UPPER];
        upper.set_angular_jacobian();
        upper.enabled = self.upper_limit_enabled && angle > self.upper_limit;
        upper.gq = angle - self.upper_limit;
        upper.min_force = -self.limit_max_force;
        upper.max_force = 0.0;

        let motor = &mut equations[MOTOR];
        motor.set_angular_jacobian();
        motor.gq = 0.0;
        match self.motor {
            Some(RevoluteMotor { speed, max_torque }) => {
                motor.enabled = true;
                motor.kind = EquationKind::Velocity { target: speed };
                motor.min_force = -max_torque;
                motor.max_force = max_torque;
            }
            None => motor.enabled = false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyHandle;
    use slotmap::SlotMap;

    fn rows() -> Vec<Equation> {
        let mut keys: SlotMap<BodyHandle, ()> = SlotMap::with_key();
        let (ha, hb) = (keys.insert(()), keys.insert(()));
        (0..5).map(|_| Equation::new(ha, hb, -1.0, 1.0)).collect()
    }

    #[test]
    fn world_pivot_becomes_local_pivots() {
        let a = Body::dynamic(1.0);
        let b = Body::dynamic(1.0).with_position(Vec2::new(2.0, 0.0));
        let mut joint = RevoluteJoint::at_world_pivot(Vec2::new(1.0, 0.0));
        joint.attach(&a, &b);
        assert_eq!(joint.local_pivot_a, Vec2::new(1.0, 0.0));
        assert_eq!(joint.local_pivot_b, Vec2::new(-1.0, 0.0));
        let mut eqs = rows();
        joint.update(&a, &b, &mut eqs);
        assert!(eqs[PIVOT_U].gq.abs() < 1e-6);
        assert!(eqs[PIVOT_V].gq.abs() < 1e-6);
    }

    #[test]
    fn pivot_rows_follow_the_lever_arm() {
        let anchor = Body::new_static();
        let bob = Body::dynamic(1.0)
            .with_position(Vec2::new(0.0, -1.0))
            .with_shape(crate::shapes::Shape::circle(0.1).unwrap());
        let mut joint = RevoluteJoint::at_world_pivot(Vec2::ZERO);
        joint.attach(&anchor, &bob);
        let mut eqs = rows();
        joint.update(&anchor, &bob, &mut eqs);
        // Radial row pulls through the centre; only the tangential row turns the bob.
        assert!(eqs[PIVOT_U].jacobian[5].abs() < 1e-6);
        assert!((eqs[PIVOT_V].jacobian[5].abs() - 1.0).abs() < 1e-6);
        let (u, v) = (
            Vec2::new(eqs[PIVOT_U].jacobian[3], eqs[PIVOT_U].jacobian[4]),
            Vec2::new(eqs[PIVOT_V].jacobian[3], eqs[PIVOT_V].jacobian[4]),
        );
        assert!(u.dot(v).abs() < 1e-6);
    }

    #[test]
    fn limits_engage_only_when_violated() {
        let a = Body::dynamic(1.0);
        let mut b = Body::dynamic(1.0).with_angle(0.5);
        let joint = RevoluteJoint::default().with_limits(Some(-0.25), Some(0.25));
        let mut eqs = rows();
        joint.update(&a, &b, &mut eqs);
        assert!(eqs[UPPER].enabled);
        assert!(!eqs[LOWER].enabled);
        assert!((eqs[UPPER].gq - 0.25).abs() < 1e-6);

        b.angle = 0.0;
        joint.update(&a, &b, &mut eqs);
        assert!(!eqs[UPPER].enabled);
    }

    #[test]
    fn motor_row_targets_speed() {
        let a = Body::dynamic(1.0);
        let b = Body::dynamic(1.0);
        let joint = RevoluteJoint::default().with_motor(2.0, 5.0);
        let mut eqs = rows();
        joint.update(&a, &b, &mut eqs);
        assert!(eqs[MOTOR].enabled);
        assert_eq!(eqs[MOTOR].kind, EquationKind::Velocity { target: 2.0 });
        assert_eq!(eqs[MOTOR].max_force, 5.0);
    }
}
