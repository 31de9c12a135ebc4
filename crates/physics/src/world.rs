//! # World
//!
//! The [`World`] owns every body, constraint and spring, and advances them
//! with [`World::step`]. One step runs, in order:
//!
//! 1.  spring forces and gravity,
//! 2.  broadphase over fresh body AABBs,
//! 3.  joint rows, then narrowphase contact rows,
//! 4.  begin/end contact diffing,
//! 5.  velocity integration, the Gauss-Seidel solve, position integration,
//! 6.  sleep bookkeeping,
//! 7.  event emission to the queue and to listeners.
//!
//! Removals and wakes requested by listeners are applied after the step.
//! Add/remove operations live in `builder.rs`.

use std::collections::HashMap;

use slotmap::SlotMap;
use tracing::{debug, trace_span, warn};

use crate::body::{Body, BodyHandle, BodyType};
use crate::collision::{BroadphaseProxy, Narrowphase, ShapePair, SpatialHash};
use crate::config::WorldConfig;
use crate::constraints::{Constraint, ConstraintHandle};
use crate::contact_list::{ContactKey, ContactList};
use crate::context::{NullProfiler, Phase, StepContext, StepStats};
use crate::equations::{EquationId, EquationPool};
use crate::error::WorldError;
use crate::events::{ContactEvent, OwnerId, StepCommand, StepCommands, WorldEvent, WorldListener};
use crate::integrator;
use crate::ray::{Ray, RaycastResult};
use crate::solver::GsSolver;
use crate::springs::{Spring, SpringHandle};
use crate::types::{BodyState, Vec2};

pub struct World {
    pub(crate) config: WorldConfig,
    pub(crate) bodies: SlotMap<BodyHandle, Body>,
    /// Every body in insertion order; broadphase indices refer to this.
    pub(crate) order: Vec<BodyHandle>,
    pub(crate) dynamic: Vec<BodyHandle>,
    pub(crate) kinematic: Vec<BodyHandle>,
    pub(crate) constraints: SlotMap<ConstraintHandle, Constraint>,
    pub(crate) constraint_order: Vec<ConstraintHandle>,
    pub(crate) springs: SlotMap<SpringHandle, Spring>,
    pub(crate) spring_order: Vec<SpringHandle>,
    pub(crate) contact_list: ContactList,
    pub(crate) listeners: Vec<Box<dyn WorldListener>>,
    pub(crate) events: Vec<WorldEvent>,
    pub(crate) pending: StepCommands,
    pub(crate) stepping: bool,
    broadphase: SpatialHash,
    narrowphase: Narrowphase,
    solver: GsSolver,
    pool: EquationPool,
    rows: Vec<EquationId>,
    joint_rows: Vec<(ConstraintHandle, usize, EquationId)>,
    proxies: Vec<BroadphaseProxy>,
    no_collide: Vec<(BodyHandle, BodyHandle)>,
    touching: Vec<ContactKey>,
    /// Last narrowphase event of each record, replayed while the pair sleeps.
    touching_events: HashMap<ContactKey, ContactEvent>,
    time: f64,
    step_count: u64,
    accumulator: f32,
    last_stats: StepStats,
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("bodies", &self.bodies.len())
            .field("constraints", &self.constraints.len())
            .field("springs", &self.springs.len())
            .field("time", &self.time)
            .field("stepping", &self.stepping)
            .finish_non_exhaustive()
    }
}

impl World {
    #[must_use]
    pub fn new(config: WorldConfig) -> Self {
        Self {
            broadphase: SpatialHash::new(&config.broadphase),
            solver: GsSolver::new(config.solver.iterations),
            config,
            bodies: SlotMap::with_key(),
            order: Vec::new(),
            dynamic: Vec::new(),
            kinematic: Vec::new(),
            constraints: SlotMap::with_key(),
            constraint_order: Vec::new(),
            springs: SlotMap::with_key(),
            spring_order: Vec::new(),
            contact_list: ContactList::new(),
            listeners: Vec::new(),
            events: Vec::new(),
            pending: StepCommands::default(),
            stepping: false,
            narrowphase: Narrowphase::new(),
            pool: EquationPool::new(),
            rows: Vec::new(),
            joint_rows: Vec::new(),
            proxies: Vec::new(),
            no_collide: Vec::new(),
            touching: Vec::new(),
            touching_events: HashMap::new(),
            time: 0.0,
            step_count: 0,
            accumulator: 0.0,
            last_stats: StepStats::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    #[must_use]
    pub fn gravity(&self) -> Vec2 {
        self.config.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.config.gravity = gravity;
    }

    /// True only while [`World::step`] runs.
    #[must_use]
    pub fn is_stepping(&self) -> bool {
        self.stepping
    }

    /// Simulated seconds so far.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    #[must_use]
    pub fn last_stats(&self) -> StepStats {
        self.last_stats
    }

    #[must_use]
    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle)
    }

    /// Direct access for external edits between steps. Positions and
    /// velocities may be overwritten freely; AABBs are rebuilt every step.
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(handle)
    }

    /// Bodies in insertion order.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &Body)> + '_ {
        self.order.iter().map(move |&h| (h, &self.bodies[h]))
    }

    /// Mutable access to every body, in no particular order.
    pub fn bodies_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut Body)> + '_ {
        self.bodies.iter_mut()
    }

    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    #[must_use]
    pub fn constraint(&self, handle: ConstraintHandle) -> Option<&Constraint> {
        self.constraints.get(handle)
    }

    pub fn constraint_mut(&mut self, handle: ConstraintHandle) -> Option<&mut Constraint> {
        self.constraints.get_mut(handle)
    }

    #[must_use]
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    #[must_use]
    pub fn spring(&self, handle: SpringHandle) -> Option<&Spring> {
        self.springs.get(handle)
    }

    pub fn spring_mut(&mut self, handle: SpringHandle) -> Option<&mut Spring> {
        self.springs.get_mut(handle)
    }

    #[must_use]
    pub fn spring_count(&self) -> usize {
        self.springs.len()
    }

    #[must_use]
    pub fn contact_list(&self) -> &ContactList {
        &self.contact_list
    }

    /// Shape pairs and points from the last step's narrowphase.
    #[must_use]
    pub fn narrowphase(&self) -> &Narrowphase {
        &self.narrowphase
    }

    /// Wake a body now.
    ///
    /// # Errors
    /// `handle` is not in this world.
    pub fn wake_up(&mut self, handle: BodyHandle) -> Result<(), WorldError> {
        let body = self
            .bodies
            .get_mut(handle)
            .ok_or(WorldError::UnknownBody(handle))?;
        body.wake_up();
        Ok(())
    }

    /// Register a listener that sees every event of every step.
    pub fn add_listener(&mut self, listener: impl WorldListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Events recorded since the last step began.
    #[must_use]
    pub fn events(&self) -> &[WorldEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, WorldEvent> {
        self.events.drain(..)
    }

    /// Position, angle and sleep flag of every body in insertion order.
    #[must_use]
    pub fn snapshot_states(&self) -> Vec<BodyState> {
        self.bodies()
            .map(|(_, body)| BodyState {
                position: body.position,
                angle: body.angle,
                sleeping: u32::from(body.is_sleeping()),
            })
            .collect()
    }

    /// [`World::snapshot_states`] as raw bytes for upload to a renderer.
    #[must_use]
    pub fn snapshot_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.snapshot_states()).to_vec()
    }

    /// Cast `ray` against every body. See [`Ray`] for mode semantics.
    pub fn raycast(&self, ray: &mut Ray<'_>, result: &mut RaycastResult) -> bool {
        ray.intersect_bodies(result, self.bodies())
    }

    /// Every `(body, shape)` whose shape contains `point`.
    #[must_use]
    pub fn hit_test(&self, point: Vec2) -> Vec<(BodyHandle, usize)> {
        let mut hits = Vec::new();
        for (handle, body) in self.bodies() {
            if !body.compute_aabb().contains_point(point) {
                continue;
            }
            for (index, shape) in body.shapes().iter().enumerate() {
                let (position, angle) = shape.world_transform(body.position, body.angle);
                if shape.contains_point(point, position, angle) {
                    hits.push((handle, index));
                }
            }
        }
        hits
    }

    /// Advance by `dt` seconds.
    ///
    /// # Errors
    /// `dt` is not positive and finite.
    pub fn step(&mut self, dt: f32) -> Result<StepStats, WorldError> {
        let mut profiler = NullProfiler;
        let mut ctx = StepContext::new(&mut profiler);
        self.step_with_context(dt, &mut ctx)
    }

    /// Fixed-rate stepping: accumulate `elapsed` and run as many `fixed_dt`
    /// steps as fit, at most `max_sub_steps`. Interpolated poses are updated
    /// with the leftover fraction. Returns the number of steps taken.
    ///
    /// # Errors
    /// `fixed_dt` is not positive and finite.
    pub fn step_fixed(
        &mut self,
        fixed_dt: f32,
        elapsed: f32,
        max_sub_steps: u32,
    ) -> Result<u32, WorldError> {
        if !(fixed_dt > 0.0 && fixed_dt.is_finite()) {
            return Err(WorldError::InvalidTimeStep(fixed_dt));
        }
        self.accumulator += elapsed.max(0.0);
        let mut taken = 0;
        while self.accumulator >= fixed_dt && taken < max_sub_steps {
            self.step(fixed_dt)?;
            self.accumulator -= fixed_dt;
            taken += 1;
        }
        if self.accumulator >= fixed_dt {
            // Behind by more than the sub-step budget; drop the backlog.
            self.accumulator %= fixed_dt;
        }
        let alpha = self.accumulator / fixed_dt;
        for body in self.bodies.values_mut() {
            integrator::interpolate(body, alpha);
        }
        Ok(taken)
    }

    /// Advance by `dt`, reporting phase boundaries to `ctx.profiler` and
    /// counters into `ctx.stats`.
    ///
    /// # Errors
    /// `dt` is not positive and finite.
    pub fn step_with_context(
        &mut self,
        dt: f32,
        ctx: &mut StepContext<'_>,
    ) -> Result<StepStats, WorldError> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(WorldError::InvalidTimeStep(dt));
        }
        if self.stepping {
            return Err(WorldError::Stepping);
        }
        let _span = trace_span!("step", n = self.step_count).entered();
        self.stepping = true;
        self.events.clear();
        ctx.stats = StepStats::default();

        ctx.begin(Phase::Forces);
        self.apply_forces();
        ctx.end(Phase::Forces);

        ctx.begin(Phase::Broadphase);
        self.run_broadphase();
        ctx.stats.broadphase = self.broadphase.stats();
        ctx.end(Phase::Broadphase);

        ctx.begin(Phase::Narrowphase);
        self.rows.clear();
        self.collect_joint_rows();
        self.run_narrowphase();
        self.wake_touched_bodies();
        self.update_contact_list();
        ctx.stats.shape_pairs = self.narrowphase.pairs().len();
        ctx.stats.contact_points = self.narrowphase.points().len();
        ctx.stats.began = self.contact_list.began().len();
        ctx.stats.ended = self.contact_list.ended().len();
        ctx.end(Phase::Narrowphase);

        ctx.begin(Phase::Solve);
        for &handle in &self.dynamic {
            integrator::integrate_velocity(&mut self.bodies[handle], dt);
        }
        let solved = self.solver.solve(dt, &mut self.bodies, &mut self.pool, &self.rows);
        for &(constraint, index, id) in &self.joint_rows {
            if let Some(c) = self.constraints.get_mut(constraint) {
                c.equations_mut()[index].multiplier = self.pool[id].multiplier;
            }
        }
        self.narrowphase.record_impulses(dt, &self.pool, &self.rows);
        self.pool.release_all(&mut self.rows);
        ctx.stats.equations = solved.rows;
        ctx.stats.solver_bodies = solved.bodies;
        ctx.end(Phase::Solve);

        ctx.begin(Phase::Integrate);
        for &handle in &self.order {
            integrator::integrate_position(&mut self.bodies[handle], dt);
        }
        ctx.end(Phase::Integrate);

        ctx.begin(Phase::Sleep);
        if self.config.sleep.enabled {
            let sleep = self.config.sleep;
            for &handle in &self.dynamic {
                self.bodies[handle].sleep_tick(sleep.energy_threshold, sleep.steps);
            }
        }
        self.collect_sleep_events(&mut ctx.stats);
        ctx.end(Phase::Sleep);

        self.time += f64::from(dt);
        self.step_count += 1;

        ctx.begin(Phase::Events);
        self.push_touching_events();
        self.events.push(WorldEvent::PostStep {
            step: self.step_count,
            time: self.time,
        });
        self.dispatch_events(0);
        ctx.end(Phase::Events);

        self.stepping = false;
        self.apply_pending();

        self.last_stats = ctx.stats;
        debug!(
            step = self.step_count,
            bodies = self.bodies.len(),
            pairs = ctx.stats.shape_pairs,
            equations = ctx.stats.equations,
            began = ctx.stats.began,
            ended = ctx.stats.ended,
            "step complete"
        );
        Ok(ctx.stats)
    }

    fn apply_forces(&mut self) {
        for &handle in &self.spring_order {
            let spring = &self.springs[handle];
            let (Some(a), Some(b)) = (self.bodies.get(spring.body_a), self.bodies.get(spring.body_b))
            else {
                continue;
            };
            if a.is_sleeping() && b.is_sleeping() {
                continue;
            }
            let force = spring.compute(a, b);
            force.apply_to_a(&mut self.bodies[spring.body_a]);
            force.apply_to_b(&mut self.bodies[spring.body_b]);
        }
        let gravity = self.config.gravity;
        for &handle in &self.dynamic {
            integrator::apply_gravity(&mut self.bodies[handle], gravity);
        }
    }

    fn run_broadphase(&mut self) {
        self.proxies.clear();
        for &handle in &self.order {
            let body = &mut self.bodies[handle];
            body.update_aabb();
            self.proxies.push(BroadphaseProxy {
                aabb: body.aabb(),
                body_type: body.body_type(),
                sleeping: body.is_sleeping(),
            });
        }
        self.broadphase.update(&self.proxies);
    }

    /// Refresh every joint and copy its enabled rows into the pool.
    fn collect_joint_rows(&mut self) {
        self.joint_rows.clear();
        self.no_collide.clear();
        for &handle in &self.constraint_order {
            let constraint = &mut self.constraints[handle];
            let (ha, hb) = (constraint.body_a, constraint.body_b);
            if !constraint.collide_connected {
                self.no_collide.push(ordered(ha, hb));
            }
            let (Some(a), Some(b)) = (self.bodies.get(ha), self.bodies.get(hb)) else {
                continue;
            };
            if !is_awake_mover(a) && !is_awake_mover(b) {
                continue;
            }
            constraint.update(a, b);
            for (index, equation) in constraint.equations().iter().enumerate() {
                if equation.enabled {
                    let id = self.pool.acquire(*equation);
                    self.rows.push(id);
                    self.joint_rows.push((handle, index, id));
                }
            }
        }
        self.no_collide.sort_unstable();
        self.no_collide.dedup();
    }

    fn run_narrowphase(&mut self) {
        self.narrowphase.clear();
        let settings = self.config.contact_settings();
        for &(i, j) in self.broadphase.pairs() {
            let (ha, hb) = (self.order[i], self.order[j]);
            if self.no_collide.binary_search(&ordered(ha, hb)).is_ok() {
                continue;
            }
            self.narrowphase.collide_bodies(
                ha,
                &self.bodies[ha],
                hb,
                &self.bodies[hb],
                &settings,
                &self.contact_list,
                &mut self.pool,
                &mut self.rows,
            );
        }
        self.narrowphase.finish();
    }

    /// Sleeping bodies touched by something moving wake before the solve.
    fn wake_touched_bodies(&mut self) {
        let threshold = self.config.sleep.energy_threshold;
        let mut wake = Vec::new();
        for pair in self.narrowphase.pairs() {
            if !pair.response {
                continue;
            }
            let (a, b) = (&self.bodies[pair.body_a], &self.bodies[pair.body_b]);
            if a.is_sleeping() && is_moving(b, threshold) {
                wake.push(pair.body_a);
            }
            if b.is_sleeping() && is_moving(a, threshold) {
                wake.push(pair.body_b);
            }
        }
        for handle in wake {
            self.bodies[handle].wake_up();
        }
    }

    /// Diff this step's touching pairs against the last step's and queue
    /// begin, impact and end events.
    fn update_contact_list(&mut self) {
        self.touching.clear();
        self.touching
            .extend(self.narrowphase.pairs().iter().map(|pair| pair.key));
        // Pairs the broadphase skipped only because they are asleep stay touching.
        for key in self.contact_list.active() {
            if let (Some(a), Some(b)) = (self.bodies.get(key.body_a), self.bodies.get(key.body_b)) {
                if is_dormant(a, b) {
                    self.touching.push(*key);
                }
            }
        }
        self.contact_list.update(self.touching.iter().copied());

        for key in self.contact_list.began() {
            let Some(pair) = self.narrowphase.find(key) else {
                continue;
            };
            let event = self.pair_event(pair);
            if self.config.emit_impact_events && pair.response && pair.first_impact {
                self.events.push(WorldEvent::BeginContact(event.clone()));
                self.events.push(WorldEvent::Impact(event));
            } else {
                self.events.push(WorldEvent::BeginContact(event));
            }
        }
        for key in self.contact_list.ended() {
            let event = key_event(&self.bodies, key);
            self.events.push(WorldEvent::EndContact(event));
        }
    }

    fn collect_sleep_events(&mut self, stats: &mut StepStats) {
        for &handle in &self.order {
            let body = &mut self.bodies[handle];
            if body.woke_up {
                body.woke_up = false;
                stats.woke_up += 1;
                self.events.push(WorldEvent::Wake(handle));
            }
            if body.fell_asleep {
                body.fell_asleep = false;
                stats.fell_asleep += 1;
                self.events.push(WorldEvent::Sleep(handle));
            }
        }
    }

    /// One "still touching" event per active record. Dormant records the
    /// narrowphase skipped repeat the points they last reported.
    fn push_touching_events(&mut self) {
        let contact_list = &self.contact_list;
        self.touching_events.retain(|key, _| contact_list.contains(key));
        for key in self.contact_list.active() {
            let event = match self.narrowphase.find(key) {
                Some(pair) => {
                    let event = self.pair_event(pair);
                    self.touching_events.insert(*key, event.clone());
                    event
                }
                None => match self.touching_events.get(key) {
                    Some(last) => ContactEvent {
                        owner_a: owner_of(&self.bodies, last.body_a, last.shape_a),
                        owner_b: owner_of(&self.bodies, last.body_b, last.shape_b),
                        ..last.clone()
                    },
                    None => key_event(&self.bodies, key),
                },
            };
            self.events.push(WorldEvent::Contact(event));
        }
    }

    fn pair_event(&self, pair: &ShapePair) -> ContactEvent {
        ContactEvent {
            body_a: pair.body_a,
            body_b: pair.body_b,
            shape_a: pair.shape_a,
            shape_b: pair.shape_b,
            owner_a: owner_of(&self.bodies, pair.body_a, pair.shape_a),
            owner_b: owner_of(&self.bodies, pair.body_b, pair.shape_b),
            contacts: self.narrowphase.points_of(pair).to_vec(),
        }
    }

    /// Hand events from `start` onwards to every listener.
    pub(crate) fn dispatch_events(&mut self, start: usize) {
        if self.listeners.is_empty() {
            return;
        }
        for event in &self.events[start..] {
            for listener in &mut self.listeners {
                listener.on_event(event, &mut self.pending);
            }
        }
    }

    /// Apply commands queued by listeners. Removals can queue more end
    /// events and therefore more commands; those run in the same loop.
    pub(crate) fn apply_pending(&mut self) {
        while !self.pending.is_empty() {
            let commands: Vec<StepCommand> = self.pending.drain().collect();
            for command in commands {
                let result = match command {
                    StepCommand::RemoveBody(handle) => self.remove_body(handle).map(drop),
                    StepCommand::RemoveConstraint(handle) => {
                        self.remove_constraint(handle).map(drop)
                    }
                    StepCommand::RemoveSpring(handle) => self.remove_spring(handle).map(drop),
                    StepCommand::WakeUp(handle) => self.wake_up(handle),
                };
                if let Err(err) = result {
                    warn!(?command, %err, "deferred command skipped");
                }
            }
        }
    }
}

pub(crate) fn ordered(a: BodyHandle, b: BodyHandle) -> (BodyHandle, BodyHandle) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Shape owner, falling back to the body owner.
pub(crate) fn owner_of(
    bodies: &SlotMap<BodyHandle, Body>,
    handle: BodyHandle,
    shape: usize,
) -> Option<OwnerId> {
    let body = bodies.get(handle)?;
    body.shapes()
        .get(shape)
        .and_then(|s| s.owner)
        .or(body.owner)
}

/// Event for a record with no points.
pub(crate) fn key_event(bodies: &SlotMap<BodyHandle, Body>, key: &ContactKey) -> ContactEvent {
    ContactEvent {
        body_a: key.body_a,
        body_b: key.body_b,
        shape_a: key.shape_a,
        shape_b: key.shape_b,
        owner_a: owner_of(bodies, key.body_a, key.shape_a),
        owner_b: owner_of(bodies, key.body_b, key.shape_b),
        contacts: Vec::new(),
    }
}

fn is_awake_mover(body: &Body) -> bool {
    body.body_type() != BodyType::Static && !body.is_sleeping()
}

fn is_moving(body: &Body, energy_threshold: f32) -> bool {
    match body.body_type() {
        BodyType::Static => false,
        BodyType::Kinematic => body.velocity != Vec2::ZERO || body.angular_velocity != 0.0,
        BodyType::Dynamic => !body.is_sleeping() && body.kinetic_energy() >= energy_threshold,
    }
}

/// Neither body can move and at least one is asleep.
fn is_dormant(a: &Body, b: &Body) -> bool {
    let still = |body: &Body| body.body_type() == BodyType::Static || body.is_sleeping();
    still(a) && still(b) && (a.is_sleeping() || b.is_sleeping())
}
