#![deny(clippy::all, clippy::pedantic)]

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use physics2d::{Phase, World, WorldConfig};
use runtime::scenes::Scene;
use runtime::{load_config, Driver, FiniteStateCheck, ProgressLog};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "runtime_main", about = "Run a 2D physics scene headless")]
struct Args {
    /// World configuration as JSON; defaults apply to missing fields.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Scene::Pile)]
    scene: Scene,
    #[arg(long, default_value_t = 600)]
    steps: u64,
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,
    /// Log a progress line every N steps (0 disables).
    #[arg(long, default_value_t = 120)]
    report_every: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => WorldConfig::default().with_sleeping(true),
    };

    let mut world = World::new(config);
    args.scene.build(&mut world)?;
    tracing::info!(
        scene = ?args.scene,
        bodies = world.body_count(),
        constraints = world.constraint_count(),
        "scene built"
    );

    let mut driver = Driver::new(world, args.dt)?
        .with_observer(FiniteStateCheck)
        .with_observer(ProgressLog {
            every: args.report_every,
        });
    let summary = driver.run(args.steps)?;

    for phase in Phase::ALL {
        tracing::debug!(
            phase = phase.name(),
            average_us = driver.timings().average(phase).as_micros(),
            "phase timing"
        );
    }
    tracing::info!(
        steps = summary.steps,
        time = summary.time,
        bodies = summary.bodies,
        sleeping = summary.sleeping,
        contacts = summary.contacts,
        energy = summary.kinetic_energy,
        "simulation finished"
    );
    Ok(())
}
