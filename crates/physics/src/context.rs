//! # Step Context
//!
//! Per-call state threaded through [`World::step_with_context`](crate::World::step_with_context):
//! a [`Profiler`] that sees phase boundaries and the [`StepStats`] counters
//! filled in as the step runs.

use std::time::{Duration, Instant};

use crate::collision::BroadphaseStats;

/// Stages of one step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Forces,
    Broadphase,
    Narrowphase,
    Solve,
    Integrate,
    Sleep,
    Events,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::Forces,
        Phase::Broadphase,
        Phase::Narrowphase,
        Phase::Solve,
        Phase::Integrate,
        Phase::Sleep,
        Phase::Events,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Phase::Forces => "forces",
            Phase::Broadphase => "broadphase",
            Phase::Narrowphase => "narrowphase",
            Phase::Solve => "solve",
            Phase::Integrate => "integrate",
            Phase::Sleep => "sleep",
            Phase::Events => "events",
        }
    }
}

pub trait Profiler {
    fn begin(&mut self, phase: Phase);
    fn end(&mut self, phase: Phase);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullProfiler;

impl Profiler for NullProfiler {
    fn begin(&mut self, _: Phase) {}
    fn end(&mut self, _: Phase) {}
}

/// Wall-clock time per phase, accumulated over every step it profiles.
#[derive(Debug, Default, Clone)]
pub struct PhaseTimings {
    totals: [Duration; 7],
    started: Option<(Phase, Instant)>,
    steps: u32,
}

impl PhaseTimings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn total(&self, phase: Phase) -> Duration {
        self.totals[phase as usize]
    }

    /// Number of completed steps (ends of the `Events` phase) recorded.
    #[must_use]
    pub fn steps(&self) -> u32 {
        self.steps
    }

    #[must_use]
    pub fn average(&self, phase: Phase) -> Duration {
        if self.steps == 0 {
            Duration::ZERO
        } else {
            self.total(phase) / self.steps
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Profiler for PhaseTimings {
    fn begin(&mut self, phase: Phase) {
        self.started = Some((phase, Instant::now()));
    }

    fn end(&mut self, phase: Phase) {
        if let Some((started_phase, at)) = self.started.take() {
            if started_phase == phase {
                self.totals[phase as usize] += at.elapsed();
            }
        }
        if phase == Phase::Events {
            self.steps += 1;
        }
    }
}

/// Counters for one step.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StepStats {
    pub broadphase: BroadphaseStats,
    pub shape_pairs: usize,
    pub contact_points: usize,
    pub equations: usize,
    pub solver_bodies: usize,
    pub began: usize,
    pub ended: usize,
    pub fell_asleep: usize,
    pub woke_up: usize,
}

pub struct StepContext<'a> {
    pub profiler: &'a mut dyn Profiler,
    pub stats: StepStats,
}

impl<'a> StepContext<'a> {
    #[must_use]
    pub fn new(profiler: &'a mut dyn Profiler) -> Self {
        Self {
            profiler,
            stats: StepStats::default(),
        }
    }

    pub(crate) fn begin(&mut self, phase: Phase) {
        tracing::trace!(phase = phase.name(), "phase begin");
        self.profiler.begin(phase);
    }

    pub(crate) fn end(&mut self, phase: Phase) {
        self.profiler.end(phase);
    }
}
