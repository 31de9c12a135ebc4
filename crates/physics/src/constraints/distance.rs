use super::{point_row, DEFAULT_MAX_FORCE};
use crate::body::Body;
use crate::equations::Equation;
use crate::types::Vec2;

/// Keeps two anchor points at a distance, or within `[lower, upper]`.
///
/// The default is a rope: the upper limit is enabled at the distance measured
/// when the joint is added and the lower limit is disabled, so the row only
/// ever pulls. With both limits disabled the joint is a rigid rod.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceJoint {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    /// Rod length; measured from the bodies on attach when unset.
    pub distance: Option<f32>,
    pub lower_limit: f32,
    /// Defaults to the rod length when unset.
    pub upper_limit: Option<f32>,
    pub lower_limit_enabled: bool,
    pub upper_limit_enabled: bool,
    pub max_force: f32,
}

impl Default for DistanceJoint {
    fn default() -> Self {
        Self {
            local_anchor_a: Vec2::ZERO,
            local_anchor_b: Vec2::ZERO,
            distance: None,
            lower_limit: 0.0,
            upper_limit: None,
            lower_limit_enabled: false,
            upper_limit_enabled: true,
            max_force: DEFAULT_MAX_FORCE,
        }
    }
}

impl DistanceJoint {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_anchors(mut self, local_anchor_a: Vec2, local_anchor_b: Vec2) -> Self {
        self.local_anchor_a = local_anchor_a;
        self.local_anchor_b = local_anchor_b;
        self
    }

    #[must_use]
    pub fn with_distance(mut self, distance: f32) -> Self {
        self.distance = Some(distance);
        self
    }

    /// Rigid rod: both limits disabled.
    #[must_use]
    pub fn rigid(mut self) -> Self {
        self.lower_limit_enabled = false;
        self.upper_limit_enabled = false;
        self
    }

    #[must_use]
    pub fn with_limits(mut self, lower: Option<f32>, upper: Option<f32>) -> Self {
        self.lower_limit_enabled = lower.is_some();
        self.lower_limit = lower.unwrap_or(0.0);
        self.upper_limit_enabled = upper.is_some();
        self.upper_limit = upper;
        self
    }

    fn anchors(&self, a: &Body, b: &Body) -> (Vec2, Vec2) {
        (
            a.to_world_frame(self.local_anchor_a),
            b.to_world_frame(self.local_anchor_b),
        )
    }

    pub(super) fn attach(&mut self, a: &Body, b: &Body) {
        let (pa, pb) = self.anchors(a, b);
        let distance = *self.distance.get_or_insert_with(|| pa.distance(pb));
        self.upper_limit.get_or_insert(distance);
    }

    /// Current anchor separation.
    #[must_use]
    pub fn current_length(&self, a: &Body, b: &Body) -> f32 {
        let (pa, pb) = self.anchors(a, b);
        pa.distance(pb)
    }

    pub(super) fn update(&self, a: &Body, b: &Body, equations: &mut [Equation]) {
        let eq = &mut equations[0];
        let (pa, pb) = self.anchors(a, b);
        let delta = pb - pa;
        let length = delta.length();
        let distance = self.distance.unwrap_or(length);
        let upper = self.upper_limit.unwrap_or(distance);

        let target = if self.upper_limit_enabled && length > upper {
            eq.min_force = -self.max_force;
            eq.max_force = 0.0;
            upper
        } else if self.lower_limit_enabled && length < self.lower_limit {
            eq.min_force = 0.0;
            eq.max_force = self.max_force;
            self.lower_limit
        } else if self.lower_limit_enabled || self.upper_limit_enabled {
            // Slack inside the allowed range.
            eq.enabled = false;
            return;
        } else {
            eq.min_force = -self.max_force;
            eq.max_force = self.max_force;
            distance
        };

        let axis = if length > f32::EPSILON {
            delta / length
        } else {
            Vec2::X
        };
        point_row(eq, a, b, pa, pb, axis);
        eq.gq = length - target;
    }
}
