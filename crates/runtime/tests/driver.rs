use std::cell::Cell;
use std::rc::Rc;

use anyhow::bail;
use physics2d::{Body, Shape, StepStats, Vec2, World, WorldConfig};
use runtime::{Driver, FiniteStateCheck, RunSummary};

fn ball_world() -> anyhow::Result<World> {
    let mut world = World::new(WorldConfig::default());
    world.add_body(Body::new_static().with_shape(Shape::plane()))?;
    world.add_body(
        Body::dynamic(1.0)
            .with_position(Vec2::new(0.0, 3.0))
            .with_shape(Shape::circle(0.5)?),
    )?;
    Ok(world)
}

#[test]
fn observers_run_after_every_step() -> anyhow::Result<()> {
    let calls = Rc::new(Cell::new(0_u64));
    let seen = Rc::clone(&calls);
    let mut driver = Driver::new(ball_world()?, 1.0 / 60.0)?.with_observer(
        move |world: &mut World, _: &StepStats| -> anyhow::Result<()> {
            seen.set(seen.get() + 1);
            assert_eq!(world.step_count(), seen.get());
            Ok(())
        },
    );
    let summary = driver.run(90)?;
    assert_eq!(calls.get(), 90);
    assert_eq!(summary.steps, 90);
    assert_eq!(driver.timings().steps(), 90);
    Ok(())
}

#[test]
fn observers_may_edit_the_world_between_steps() -> anyhow::Result<()> {
    let mut driver = Driver::new(ball_world()?, 1.0 / 60.0)?.with_observer(
        |world: &mut World, _: &StepStats| -> anyhow::Result<()> {
            for (_, body) in world.bodies_mut() {
                if body.is_dynamic() && body.position.y < 1.0 {
                    body.position = Vec2::new(5.0, 3.0);
                    body.velocity = Vec2::ZERO;
                }
            }
            Ok(())
        },
    );
    driver.run(120)?;
    let ball = driver
        .world()
        .bodies()
        .find(|(_, b)| b.is_dynamic())
        .map(|(_, b)| b.position)
        .expect("ball");
    assert!(ball.x > 4.9, "ball stayed where the observer put it: {ball:?}");
    assert!(ball.y >= 1.0);
    Ok(())
}

#[test]
fn failing_observer_stops_the_run() -> anyhow::Result<()> {
    let mut driver = Driver::new(ball_world()?, 1.0 / 60.0)?.with_observer(
        |world: &mut World, _: &StepStats| -> anyhow::Result<()> {
            if world.step_count() == 5 {
                bail!("stop here");
            }
            Ok(())
        },
    );
    let err = driver.run(10).unwrap_err();
    assert!(format!("{err:#}").contains("stop here"));
    assert_eq!(driver.world().step_count(), 5);
    Ok(())
}

#[test]
fn finite_check_flags_diverged_bodies() -> anyhow::Result<()> {
    let mut driver = Driver::new(ball_world()?, 1.0 / 60.0)?
        .with_observer(|world: &mut World, _: &StepStats| -> anyhow::Result<()> {
            if world.step_count() == 3 {
                for (_, body) in world.bodies_mut() {
                    if body.is_dynamic() {
                        body.velocity = Vec2::new(f32::NAN, 0.0);
                    }
                }
            }
            Ok(())
        })
        .with_observer(FiniteStateCheck);
    assert!(driver.run(10).is_err());
    Ok(())
}

#[test]
fn bad_time_steps_are_rejected() -> anyhow::Result<()> {
    assert!(Driver::new(World::default(), 0.0).is_err());
    assert!(Driver::new(World::default(), f32::NAN).is_err());
    let summary = RunSummary::of(&ball_world()?);
    assert_eq!(summary.bodies, 2);
    assert_eq!(summary.steps, 0);
    Ok(())
}

#[test]
fn configs_load_from_json_files() -> anyhow::Result<()> {
    let path = std::env::temp_dir().join(format!("runtime-config-{}.json", std::process::id()));
    std::fs::write(&path, r#"{"gravity": {"x": 0.0, "y": -1.62}, "solver": {"iterations": 20}}"#)?;
    let config = runtime::load_config(&path)?;
    std::fs::remove_file(&path)?;
    assert_eq!(config.gravity, Vec2::new(0.0, -1.62));
    assert_eq!(config.solver.iterations, 20);
    assert!(runtime::load_config(&path).is_err());
    Ok(())
}
