//! Narrowphase: exact shape tests for broadphase candidates, producing contact
//! points and the contact/friction rows that resolve them.

use std::ops::Range;

use tracing::trace;

use super::{CollisionDispatcher, CombineRule, ContactPoint, Placed};
use crate::body::{Body, BodyHandle};
use crate::contact_list::{ContactKey, ContactList};
use crate::equations::{Equation, EquationId, EquationKind, EquationPool, DEFAULT_RELAXATION, DEFAULT_STIFFNESS};

/// Material and row parameters for generated contacts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactSettings {
    pub friction_rule: CombineRule,
    pub restitution_rule: CombineRule,
    pub stiffness: f32,
    pub relaxation: f32,
}

impl Default for ContactSettings {
    fn default() -> Self {
        Self {
            friction_rule: CombineRule::Average,
            restitution_rule: CombineRule::Average,
            stiffness: DEFAULT_STIFFNESS,
            relaxation: DEFAULT_RELAXATION,
        }
    }
}

/// One touching shape pair from the current step.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapePair {
    pub key: ContactKey,
    /// Bodies and shapes in test order; contact normals point from A to B.
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub shape_a: usize,
    pub shape_b: usize,
    /// Range into [`Narrowphase::points`].
    pub points: Range<usize>,
    /// Range into the step's equation id list, alternating contact and friction.
    pub equations: Range<usize>,
    pub friction: f32,
    pub restitution: f32,
    /// Whether rows were generated. Sensor pairs are reported without rows.
    pub response: bool,
    pub first_impact: bool,
}

#[derive(Debug, Default)]
pub struct Narrowphase {
    dispatcher: CollisionDispatcher,
    points: Vec<ContactPoint>,
    pairs: Vec<ShapePair>,
    by_key: Vec<usize>,
}

impl Narrowphase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.pairs.clear();
        self.by_key.clear();
    }

    #[must_use]
    pub fn dispatcher(&self) -> &CollisionDispatcher {
        &self.dispatcher
    }

    #[must_use]
    pub fn pairs(&self) -> &[ShapePair] {
        &self.pairs
    }

    #[must_use]
    pub fn points(&self) -> &[ContactPoint] {
        &self.points
    }

    #[must_use]
    pub fn points_of(&self, pair: &ShapePair) -> &[ContactPoint] {
        &self.points[pair.points.clone()]
    }

    /// Pair recorded under `key` this step. Valid after [`Narrowphase::finish`].
    #[must_use]
    pub fn find(&self, key: &ContactKey) -> Option<&ShapePair> {
        self.by_key
            .binary_search_by(|&i| self.pairs[i].key.cmp(key))
            .ok()
            .map(|i| &self.pairs[self.by_key[i]])
    }

    /// Test every shape of `a` against every shape of `b`.
    ///
    /// Pairs already present in `contacts` are not first impacts. Rows are
    /// taken from `pool` and their ids appended to `ids`. Returns the number
    /// of touching shape pairs found.
    #[allow(clippy::too_many_arguments)]
    pub fn collide_bodies(
        &mut self,
        handle_a: BodyHandle,
        a: &Body,
        handle_b: BodyHandle,
        b: &Body,
        settings: &ContactSettings,
        contacts: &ContactList,
        pool: &mut EquationPool,
        ids: &mut Vec<EquationId>,
    ) -> usize {
        let before = self.pairs.len();
        for (i, shape_a) in a.shapes().iter().enumerate() {
            let placed_a = Placed::new(shape_a, a.position, a.angle);
            let aabb_a = shape_a.compute_aabb(placed_a.position, placed_a.angle);
            for (j, shape_b) in b.shapes().iter().enumerate() {
                if !shape_a.can_collide_with(shape_b) {
                    continue;
                }
                let placed_b = Placed::new(shape_b, b.position, b.angle);
                if !aabb_a.overlaps(&shape_b.compute_aabb(placed_b.position, placed_b.angle)) {
                    continue;
                }
                let start = self.points.len();
                if self.dispatcher.collide(&placed_a, &placed_b, &mut self.points) == 0 {
                    continue;
                }

                let key = ContactKey::new(handle_a, i, handle_b, j);
                let response = shape_a.collision_response
                    && shape_b.collision_response
                    && a.collision_response
                    && b.collision_response;
                let mut pair = ShapePair {
                    key,
                    body_a: handle_a,
                    body_b: handle_b,
                    shape_a: i,
                    shape_b: j,
                    points: start..self.points.len(),
                    equations: ids.len()..ids.len(),
                    friction: settings.friction_rule.combine(shape_a.friction, shape_b.friction),
                    restitution: settings
                        .restitution_rule
                        .combine(shape_a.restitution, shape_b.restitution),
                    response,
                    first_impact: !contacts.contains(&key),
                };
                if response {
                    for point in &self.points[pair.points.clone()] {
                        push_rows(handle_a, a, handle_b, b, point, &pair, settings, pool, ids);
                    }
                    pair.equations.end = ids.len();
                }
                self.pairs.push(pair);
            }
        }
        self.pairs.len() - before
    }

    /// Index the step's pairs by key and log the totals.
    pub fn finish(&mut self) {
        self.by_key.clear();
        self.by_key.extend(0..self.pairs.len());
        let pairs = &self.pairs;
        self.by_key.sort_unstable_by(|&x, &y| pairs[x].key.cmp(&pairs[y].key));
        trace!(
            pairs = self.pairs.len(),
            points = self.points.len(),
            "narrowphase done"
        );
    }

    /// Copy solved contact impulses (`multiplier · h`) onto the contact points.
    pub fn record_impulses(&mut self, h: f32, pool: &EquationPool, ids: &[EquationId]) {
        for pair in &self.pairs {
            if !pair.response {
                continue;
            }
            let rows = &ids[pair.equations.clone()];
            for (point, row) in self.points[pair.points.clone()].iter_mut().zip(rows.chunks(2)) {
                point.impulse = pool[row[0]].multiplier * h;
            }
        }
    }
}

/// Acquire one contact row and its friction row for `point`.
#[allow(clippy::too_many_arguments)]
fn push_rows(
    handle_a: BodyHandle,
    a: &Body,
    handle_b: BodyHandle,
    b: &Body,
    point: &ContactPoint,
    pair: &ShapePair,
    settings: &ContactSettings,
    pool: &mut EquationPool,
    ids: &mut Vec<EquationId>,
) {
    let ri = point.point_a - a.position;
    let rj = point.point_b - b.position;

    let mut contact = Equation::new(handle_a, handle_b, 0.0, f32::MAX)
        .with_kind(EquationKind::Contact {
            restitution: pair.restitution,
            first_impact: pair.first_impact,
        })
        .with_spook(settings.stiffness, settings.relaxation);
    contact.set_point_jacobian(point.normal, ri, rj);
    contact.gq = -point.depth;
    let contact_id = pool.acquire(contact);
    ids.push(contact_id);

    let mut friction = Equation::new(handle_a, handle_b, -f32::MAX, f32::MAX)
        .with_kind(EquationKind::Friction {
            contact: contact_id,
            coefficient: pair.friction,
        })
        .with_spook(settings.stiffness, settings.relaxation);
    friction.set_point_jacobian(point.normal.perp(), ri, rj);
    ids.push(pool.acquire(friction));
}
