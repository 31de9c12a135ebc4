//! # Raycasting
//!
//! A [`Ray`] is a read-only query against a set of bodies. Candidates are
//! culled by body AABB, then by group/mask and collision response, and only
//! then handed to [`Shape::raycast`](crate::Shape::raycast).
//!
//! Each intersected shape contributes its nearest crossing. How those are
//! delivered depends on [`RayMode`]:
//!
//! -   `Closest` keeps the smallest fraction and calls the callback once,
//!     after every candidate has been scanned.
//! -   `Any` calls the callback for the first hit and stops.
//! -   `All` calls the callback once per intersected shape. The callback can
//!     end the scan with [`RaycastResult::stop`].

use std::fmt;
use std::ops::ControlFlow;

use crate::body::{Body, BodyHandle};
use crate::shapes::RayHit;
use crate::types::Vec2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RayMode {
    #[default]
    Closest,
    Any,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastResult {
    pub body: Option<BodyHandle>,
    pub shape: usize,
    pub normal: Vec2,
    pub fraction: f32,
    pub face_index: i32,
    stopped: bool,
}

impl Default for RaycastResult {
    fn default() -> Self {
        Self {
            body: None,
            shape: 0,
            normal: Vec2::ZERO,
            fraction: 1.0,
            face_index: -1,
            stopped: false,
        }
    }
}

impl RaycastResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn has_hit(&self) -> bool {
        self.body.is_some()
    }

    #[must_use]
    pub fn hit_point(&self, ray: &Ray<'_>) -> Vec2 {
        ray.from.lerp(ray.to, self.fraction)
    }

    #[must_use]
    pub fn hit_distance(&self, ray: &Ray<'_>) -> f32 {
        ray.length() * self.fraction
    }

    /// End the scan after the current callback returns.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn set(&mut self, body: BodyHandle, shape: usize, hit: RayHit) {
        self.body = Some(body);
        self.shape = shape;
        self.normal = hit.normal;
        self.fraction = hit.fraction;
        self.face_index = hit.face_index;
    }
}

type Callback<'a> = Box<dyn FnMut(&mut RaycastResult) + 'a>;

pub struct Ray<'a> {
    pub from: Vec2,
    pub to: Vec2,
    pub mode: RayMode,
    pub collision_group: u32,
    pub collision_mask: u32,
    /// Ignore crossings where the surface faces along the ray.
    pub skip_backfaces: bool,
    /// Ignore shapes and bodies with collision response disabled.
    pub check_collision_response: bool,
    callback: Option<Callback<'a>>,
    shape_tests: usize,
}

impl fmt::Debug for Ray<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ray")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("mode", &self.mode)
            .field("shape_tests", &self.shape_tests)
            .finish_non_exhaustive()
    }
}

impl<'a> Ray<'a> {
    #[must_use]
    pub fn new(from: Vec2, to: Vec2) -> Self {
        Self {
            from,
            to,
            mode: RayMode::Closest,
            collision_group: u32::MAX,
            collision_mask: u32::MAX,
            skip_backfaces: false,
            check_collision_response: true,
            callback: None,
            shape_tests: 0,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: RayMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, group: u32, mask: u32) -> Self {
        self.collision_group = group;
        self.collision_mask = mask;
        self
    }

    #[must_use]
    pub fn skip_backfaces(mut self, skip: bool) -> Self {
        self.skip_backfaces = skip;
        self
    }

    #[must_use]
    pub fn with_callback(mut self, callback: impl FnMut(&mut RaycastResult) + 'a) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn length(&self) -> f32 {
        (self.to - self.from).length()
    }

    #[must_use]
    pub fn direction(&self) -> Vec2 {
        (self.to - self.from).normalize()
    }

    /// Narrow shape tests run since the ray was built.
    #[must_use]
    pub fn shape_tests(&self) -> usize {
        self.shape_tests
    }

    /// Scan `bodies` in order, updating `result` as configured by the mode.
    /// Returns whether anything was hit.
    pub fn intersect_bodies<'b>(
        &mut self,
        result: &mut RaycastResult,
        bodies: impl IntoIterator<Item = (BodyHandle, &'b Body)>,
    ) -> bool {
        let mut any = false;
        for (handle, body) in bodies {
            if result.stopped {
                break;
            }
            // Poses may have been edited since the last step.
            if body.compute_aabb().overlaps_segment(self.from, self.to).is_none() {
                continue;
            }
            any |= self.intersect_body(result, handle, body);
        }
        if self.mode == RayMode::Closest && result.has_hit() {
            self.report(result);
        }
        any
    }

    fn intersect_body(&mut self, result: &mut RaycastResult, handle: BodyHandle, body: &Body) -> bool {
        if self.check_collision_response && !body.collision_response {
            return false;
        }
        let direction = self.to - self.from;
        let mut any = false;
        for (index, shape) in body.shapes().iter().enumerate() {
            if result.stopped {
                break;
            }
            if (shape.collision_group & self.collision_mask) == 0
                || (self.collision_group & shape.collision_mask) == 0
                || (self.check_collision_response && !shape.collision_response)
            {
                continue;
            }
            let (position, angle) = shape.world_transform(body.position, body.angle);

            self.shape_tests += 1;
            let skip_backfaces = self.skip_backfaces;
            let stop_at_first = self.mode == RayMode::Any;
            let mut nearest: Option<RayHit> = None;
            let _ = shape.raycast(self.from, self.to, position, angle, &mut |hit| {
                if skip_backfaces && hit.normal.dot(direction) > 0.0 {
                    return ControlFlow::Continue(());
                }
                match nearest {
                    Some(n) if n.fraction <= hit.fraction => {}
                    _ => nearest = Some(hit),
                }
                if stop_at_first {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            });
            let Some(hit) = nearest else {
                continue;
            };
            any = true;

            match self.mode {
                RayMode::Closest => {
                    if !result.has_hit() || hit.fraction < result.fraction {
                        result.set(handle, index, hit);
                    }
                }
                RayMode::Any => {
                    result.set(handle, index, hit);
                    self.report(result);
                    result.stop();
                }
                RayMode::All => {
                    result.set(handle, index, hit);
                    self.report(result);
                }
            }
        }
        any
    }

    fn report(&mut self, result: &mut RaycastResult) {
        if let Some(callback) = &mut self.callback {
            callback(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Shape;
    use slotmap::SlotMap;

    fn bodies(xs: &[f32]) -> SlotMap<BodyHandle, Body> {
        let mut map = SlotMap::with_key();
        for &x in xs {
            let mut body = Body::new_static()
                .with_position(Vec2::new(x, 0.0))
                .with_shape(Shape::circle(1.0).unwrap());
            body.update_aabb();
            map.insert(body);
        }
        map
    }

    #[test]
    fn closest_reports_once_with_the_nearest_hit() {
        let map = bodies(&[6.0, 3.0]);
        let mut calls = 0;
        let mut ray = Ray::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)).with_callback(|_| calls += 1);
        let mut result = RaycastResult::new();
        assert!(ray.intersect_bodies(&mut result, map.iter()));
        assert!((result.fraction - 0.2).abs() < 1e-5);
        assert!((result.hit_distance(&ray) - 2.0).abs() < 1e-4);
        assert!((result.normal.x + 1.0).abs() < 1e-5);
        drop(ray);
        assert_eq!(calls, 1);
    }

    #[test]
    fn any_stops_after_the_first_shape() {
        let map = bodies(&[3.0, 6.0]);
        let mut ray = Ray::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)).with_mode(RayMode::Any);
        let mut result = RaycastResult::new();
        ray.intersect_bodies(&mut result, map.iter());
        assert!(result.has_hit());
        assert!(result.is_stopped());
        assert_eq!(ray.shape_tests(), 1);
    }

    #[test]
    fn all_reports_each_shape_once() {
        let map = bodies(&[3.0, 6.0]);
        let mut fractions = Vec::new();
        let mut ray = Ray::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0))
            .with_mode(RayMode::All)
            .with_callback(|r| fractions.push(r.fraction));
        let mut result = RaycastResult::new();
        ray.intersect_bodies(&mut result, map.iter());
        drop(ray);
        assert_eq!(fractions.len(), 2);
    }

    #[test]
    fn all_mode_callback_can_stop() {
        let map = bodies(&[3.0, 6.0]);
        let mut ray = Ray::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0))
            .with_mode(RayMode::All)
            .with_callback(RaycastResult::stop);
        let mut result = RaycastResult::new();
        ray.intersect_bodies(&mut result, map.iter());
        assert_eq!(ray.shape_tests(), 1);
    }

    #[test]
    fn backfaces_are_skipped_from_inside() {
        let map = bodies(&[0.0]);
        let mut ray = Ray::new(Vec2::ZERO, Vec2::new(5.0, 0.0)).skip_backfaces(true);
        let mut result = RaycastResult::new();
        assert!(!ray.intersect_bodies(&mut result, map.iter()));

        let mut ray = Ray::new(Vec2::ZERO, Vec2::new(5.0, 0.0));
        let mut result = RaycastResult::new();
        assert!(ray.intersect_bodies(&mut result, map.iter()));
        assert!((result.hit_point(&ray).x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn mask_filters_shapes() {
        let map = bodies(&[3.0]);
        let mut ray = Ray::new(Vec2::ZERO, Vec2::new(10.0, 0.0)).with_filter(u32::MAX, 0);
        let mut result = RaycastResult::new();
        assert!(!ray.intersect_bodies(&mut result, map.iter()));
        assert_eq!(ray.shape_tests(), 0);
    }
}
