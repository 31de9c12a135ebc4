use super::{pivot_axes, point_row, relative_angle};
use crate::body::Body;
use crate::equations::Equation;
use crate::types::Vec2;

/// Welds body B to body A at the offset and relative angle they had when the
/// joint was added.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LockJoint {
    /// Centre of B expressed in A's frame.
    pub local_offset_b: Vec2,
    pub local_angle_b: f32,
}

impl LockJoint {
    pub(super) fn attach(&mut self, a: &Body, b: &Body) {
        self.local_offset_b = a.to_local_frame(b.position);
        self.local_angle_b = relative_angle(a, b);
    }

    pub(super) fn update(&self, a: &Body, b: &Body, equations: &mut [Equation]) {
        let pa = a.to_world_frame(self.local_offset_b);
        let (u, v) = pivot_axes(a, b, pa, b.position);
        point_row(&mut equations[0], a, b, pa, b.position, u);
        point_row(&mut equations[1], a, b, pa, b.position, v);
        let rotation = &mut equations[2];
        rotation.set_angular_jacobian();
        rotation.gq = relative_angle(a, b) - self.local_angle_b;
        rotation.enabled = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyHandle;
    use slotmap::SlotMap;

    #[test]
    fn captured_pose_has_zero_error() {
        let mut keys: SlotMap<BodyHandle, ()> = SlotMap::with_key();
        let (ha, hb) = (keys.insert(()), keys.insert(()));
        let a = Body::dynamic(1.0).with_angle(0.3);
        let b = Body::dynamic(1.0)
            .with_position(Vec2::new(1.0, 2.0))
            .with_angle(1.0);
        let mut joint = LockJoint::default();
        joint.attach(&a, &b);
        let mut eqs: Vec<_> = (0..3).map(|_| Equation::new(ha, hb, -1.0, 1.0)).collect();
        joint.update(&a, &b, &mut eqs);
        for eq in &eqs {
            assert!(eq.gq.abs() < 1e-5, "gq = {}", eq.gq);
        }
    }
}
