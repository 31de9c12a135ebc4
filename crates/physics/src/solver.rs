//! # Gauss-Seidel Solver
//!
//! Sequential impulse solver over pooled [`Equation`] rows. All working state
//! (accumulated `λ`, bias, inverse effective mass, per-body velocity deltas)
//! lives in [`SolverRow`] and [`BodyDelta`] buffers owned by the solver and
//! reused between steps. The public `Equation` and `Body` types expose none of it.
//!
//! Every solve starts from `λ = 0`; impulses are not carried between steps.

use slotmap::{SecondaryMap, SlotMap};
use tracing::trace;

use crate::body::{Body, BodyHandle};
use crate::equations::{EquationId, EquationKind, EquationPool};
use crate::types::Vec2;

pub const DEFAULT_ITERATIONS: usize = 10;

const NO_ROW: usize = usize::MAX;

/// Per-row working state.
#[derive(Clone, Copy, Debug)]
pub struct SolverRow {
    id: EquationId,
    body_a: usize,
    body_b: usize,
    g: [f32; 6],
    bias: f32,
    inv_c: f32,
    eps: f32,
    lambda: f32,
    min_impulse: f32,
    max_impulse: f32,
    /// Paired contact row and friction coefficient for friction rows.
    friction: Option<(usize, f32)>,
}

/// Per-body working state: inverse mass and the velocity change accumulated
/// from every row touching the body.
#[derive(Clone, Copy, Debug)]
pub struct BodyDelta {
    handle: BodyHandle,
    inv_mass: f32,
    inv_inertia: f32,
    velocity: Vec2,
    angular_velocity: f32,
}

/// Counters from the most recent solve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SolveStats {
    pub rows: usize,
    pub bodies: usize,
    pub iterations: usize,
}

#[derive(Debug)]
pub struct GsSolver {
    pub iterations: usize,
    rows: Vec<SolverRow>,
    deltas: Vec<BodyDelta>,
    body_slot: SecondaryMap<BodyHandle, usize>,
    row_of: Vec<usize>,
}

impl Default for GsSolver {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}

impl GsSolver {
    #[must_use]
    pub fn new(iterations: usize) -> Self {
        Self {
            iterations,
            rows: Vec::new(),
            deltas: Vec::new(),
            body_slot: SecondaryMap::new(),
            row_of: Vec::new(),
        }
    }

    /// Solve the rows `ids` for step `h`, then add the resulting velocity
    /// changes to every body that had at least one enabled row.
    pub fn solve(
        &mut self,
        h: f32,
        bodies: &mut SlotMap<BodyHandle, Body>,
        pool: &mut EquationPool,
        ids: &[EquationId],
    ) -> SolveStats {
        self.rows.clear();
        self.deltas.clear();
        self.body_slot.clear();
        self.row_of.clear();
        self.row_of.resize(pool.capacity(), NO_ROW);

        for &id in ids {
            self.prepare_row(h, bodies, pool, id);
        }

        for _ in 0..self.iterations {
            for r in 0..self.rows.len() {
                self.iterate_row(r);
            }
        }

        for row in &self.rows {
            pool[row.id].multiplier = row.lambda / h;
        }
        for delta in &self.deltas {
            if let Some(body) = bodies.get_mut(delta.handle) {
                body.velocity += delta.velocity;
                body.angular_velocity += delta.angular_velocity;
            }
        }

        let stats = SolveStats {
            rows: self.rows.len(),
            bodies: self.deltas.len(),
            iterations: self.iterations,
        };
        trace!(rows = stats.rows, bodies = stats.bodies, "solved");
        stats
    }

    fn slot_for(&mut self, handle: BodyHandle, body: &Body) -> usize {
        if let Some(&slot) = self.body_slot.get(handle) {
            return slot;
        }
        let movable = body.is_dynamic() && !body.is_sleeping();
        let slot = self.deltas.len();
        self.deltas.push(BodyDelta {
            handle,
            inv_mass: if movable { body.inv_mass() } else { 0.0 },
            inv_inertia: if movable { body.inv_inertia() } else { 0.0 },
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
        });
        self.body_slot.insert(handle, slot);
        slot
    }

    fn prepare_row(
        &mut self,
        h: f32,
        bodies: &SlotMap<BodyHandle, Body>,
        pool: &EquationPool,
        id: EquationId,
    ) {
        let eq = &pool[id];
        if !eq.enabled {
            return;
        }
        let (Some(body_a), Some(body_b)) = (bodies.get(eq.body_a), bodies.get(eq.body_b)) else {
            return;
        };
        let a = self.slot_for(eq.body_a, body_a);
        let b = self.slot_for(eq.body_b, body_b);
        let (da, db) = (self.deltas[a], self.deltas[b]);

        let g = eq.jacobian;
        let gimgt = da.inv_mass * (g[0] * g[0] + g[1] * g[1])
            + da.inv_inertia * g[2] * g[2]
            + db.inv_mass * (g[3] * g[3] + g[4] * g[4])
            + db.inv_inertia * g[5] * g[5];
        let (spook_a, spook_b, eps) = eq.spook_parameters(h);
        if gimgt + eps <= 0.0 || !(gimgt + eps).is_finite() {
            return;
        }

        let gw = eq.compute_gw(
            body_a.velocity,
            body_a.angular_velocity,
            body_b.velocity,
            body_b.angular_velocity,
        );
        let mut friction = None;
        let bias = match eq.kind {
            EquationKind::Contact {
                restitution,
                first_impact,
            } if first_impact && restitution > 0.0 => -(1.0 + restitution) * gw,
            EquationKind::Contact { .. } | EquationKind::Generic => {
                -spook_a * eq.gq - spook_b * gw
            }
            EquationKind::Friction {
                contact,
                coefficient,
            } => {
                let row = self.row_of.get(contact.index()).copied().unwrap_or(NO_ROW);
                if row != NO_ROW {
                    friction = Some((row, coefficient));
                }
                -spook_b * gw
            }
            EquationKind::Velocity { target } => target - gw,
        };

        self.row_of[id.index()] = self.rows.len();
        self.rows.push(SolverRow {
            id,
            body_a: a,
            body_b: b,
            g,
            bias,
            inv_c: 1.0 / (gimgt + eps),
            eps,
            lambda: 0.0,
            min_impulse: eq.min_force * h,
            max_impulse: eq.max_force * h,
            friction,
        });
    }

    fn iterate_row(&mut self, r: usize) {
        let mut row = self.rows[r];
        if let Some((contact, mu)) = row.friction {
            let limit = (mu * self.rows[contact].lambda).max(0.0);
            row.min_impulse = -limit;
            row.max_impulse = limit;
        }

        let da = self.deltas[row.body_a];
        let db = self.deltas[row.body_b];
        let g = &row.g;
        let g_dv = g[0] * da.velocity.x
            + g[1] * da.velocity.y
            + g[2] * da.angular_velocity
            + g[3] * db.velocity.x
            + g[4] * db.velocity.y
            + g[5] * db.angular_velocity;

        let mut delta = row.inv_c * (row.bias - g_dv - row.eps * row.lambda);
        let next = (row.lambda + delta).clamp(row.min_impulse, row.max_impulse);
        delta = next - row.lambda;
        row.lambda = next;
        self.rows[r] = row;

        if delta != 0.0 {
            let a = &mut self.deltas[row.body_a];
            a.velocity += Vec2::new(g[0], g[1]) * (a.inv_mass * delta);
            a.angular_velocity += g[2] * a.inv_inertia * delta;
            let b = &mut self.deltas[row.body_b];
            b.velocity += Vec2::new(g[3], g[4]) * (b.inv_mass * delta);
            b.angular_velocity += g[5] * b.inv_inertia * delta;
        }
    }
}
