#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # runtime
//!
//! Headless fixed-timestep driver for [`physics2d`] worlds.
//!
//! A [`Driver`] owns a [`World`], steps it at a constant `dt` and hands the
//! world to every registered [`StepObserver`] after each step. Observers may
//! inspect or edit bodies between steps; the next step recomputes bounds from
//! whatever state they leave behind.

pub mod scenes;

use std::path::Path;

use anyhow::{bail, Context, Result};
use physics2d::{PhaseTimings, StepContext, StepStats, World, WorldConfig};
use tracing::{debug, info};

/// Called after every completed step with mutable access to the world.
pub trait StepObserver {
    /// # Errors
    /// Any error stops the run and is returned from [`Driver::step`].
    fn after_step(&mut self, world: &mut World, stats: &StepStats) -> Result<()>;
}

impl<F> StepObserver for F
where
    F: FnMut(&mut World, &StepStats) -> Result<()>,
{
    fn after_step(&mut self, world: &mut World, stats: &StepStats) -> Result<()> {
        self(world, stats)
    }
}

/// Fails the run as soon as any body reaches a non-finite pose or velocity.
#[derive(Debug, Default, Clone, Copy)]
pub struct FiniteStateCheck;

impl StepObserver for FiniteStateCheck {
    fn after_step(&mut self, world: &mut World, _: &StepStats) -> Result<()> {
        for (handle, body) in world.bodies() {
            if !(body.position.is_finite()
                && body.angle.is_finite()
                && body.velocity.is_finite()
                && body.angular_velocity.is_finite())
            {
                bail!(
                    "body {handle:?} diverged at step {}: position {:?}, velocity {:?}",
                    world.step_count(),
                    body.position,
                    body.velocity
                );
            }
        }
        Ok(())
    }
}

/// Logs a one-line world summary every `every` steps.
#[derive(Debug, Clone, Copy)]
pub struct ProgressLog {
    pub every: u64,
}

impl StepObserver for ProgressLog {
    fn after_step(&mut self, world: &mut World, stats: &StepStats) -> Result<()> {
        if self.every == 0 || world.step_count() % self.every != 0 {
            return Ok(());
        }
        let summary = RunSummary::of(world);
        info!(
            step = world.step_count(),
            time = world.time(),
            awake = summary.bodies - summary.sleeping,
            contacts = summary.contacts,
            pairs = stats.shape_pairs,
            equations = stats.equations,
            energy = summary.kinetic_energy,
            "progress"
        );
        Ok(())
    }
}

/// End-of-run numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub steps: u64,
    pub time: f64,
    pub bodies: usize,
    pub sleeping: usize,
    pub contacts: usize,
    pub kinetic_energy: f32,
}

impl RunSummary {
    #[must_use]
    pub fn of(world: &World) -> Self {
        let mut sleeping = 0;
        let mut kinetic_energy = 0.0;
        for (_, body) in world.bodies() {
            if body.is_sleeping() {
                sleeping += 1;
            }
            kinetic_energy += body.kinetic_energy();
        }
        Self {
            steps: world.step_count(),
            time: world.time(),
            bodies: world.body_count(),
            sleeping,
            contacts: world.contact_list().active().len(),
            kinetic_energy,
        }
    }
}

pub struct Driver {
    world: World,
    dt: f32,
    observers: Vec<Box<dyn StepObserver>>,
    timings: PhaseTimings,
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("world", &self.world)
            .field("dt", &self.dt)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl Driver {
    /// # Errors
    /// `dt` is not positive and finite.
    pub fn new(world: World, dt: f32) -> Result<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            bail!("time step must be positive and finite, got {dt}");
        }
        Ok(Self {
            world,
            dt,
            observers: Vec::new(),
            timings: PhaseTimings::new(),
        })
    }

    #[must_use]
    pub fn with_observer(mut self, observer: impl StepObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    #[must_use]
    pub fn into_world(self) -> World {
        self.world
    }

    #[must_use]
    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Per-phase wall-clock totals over every step taken so far.
    #[must_use]
    pub fn timings(&self) -> &PhaseTimings {
        &self.timings
    }

    /// One step followed by every observer, in registration order.
    ///
    /// # Errors
    /// The world rejected the step, or an observer failed.
    pub fn step(&mut self) -> Result<StepStats> {
        let stats = {
            let mut ctx = StepContext::new(&mut self.timings);
            self.world.step_with_context(self.dt, &mut ctx)?
        };
        for observer in &mut self.observers {
            observer
                .after_step(&mut self.world, &stats)
                .with_context(|| format!("observer failed after step {}", self.world.step_count()))?;
        }
        Ok(stats)
    }

    /// # Errors
    /// See [`Driver::step`].
    pub fn run(&mut self, steps: u64) -> Result<RunSummary> {
        debug!(steps, dt = self.dt, "run started");
        for _ in 0..steps {
            self.step()?;
        }
        Ok(RunSummary::of(&self.world))
    }
}

/// Read a [`WorldConfig`] from a JSON file. Missing fields take defaults.
///
/// # Errors
/// The file cannot be read or is not a valid config document.
pub fn load_config(path: &Path) -> Result<WorldConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}
