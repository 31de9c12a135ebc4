//! Demo scenes for the headless driver.

use anyhow::Result;
use clap::ValueEnum;
use physics2d::{Body, Constraint, RevoluteJoint, Shape, Vec2, World};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Scene {
    /// Circles and boxes dropped in a grid onto a plane.
    #[default]
    Pile,
    /// A chain of links hanging from a fixed pivot.
    Chain,
    /// Frictionless balls in a walled box, zero gravity.
    Billiards,
}

impl Scene {
    /// Populate `world`.
    ///
    /// # Errors
    /// A shape or body was rejected by the world.
    pub fn build(self, world: &mut World) -> Result<()> {
        match self {
            Scene::Pile => pile(world, 10, 10),
            Scene::Chain => chain(world, 8),
            Scene::Billiards => billiards(world),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn pile(world: &mut World, columns: usize, rows: usize) -> Result<()> {
    world.add_body(Body::new_static().with_shape(Shape::plane()))?;
    for row in 0..rows {
        for column in 0..columns {
            let x = (column as f32 - columns as f32 * 0.5) * 1.2;
            let y = 0.6 + row as f32 * 1.2;
            let shape = if (row + column) % 2 == 0 {
                Shape::circle(0.5)?
            } else {
                Shape::rectangle(1.0, 1.0)?
            };
            world.add_body(Body::dynamic(1.0).with_position(Vec2::new(x, y)).with_shape(shape))?;
        }
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn chain(world: &mut World, links: usize) -> Result<()> {
    let length = 1.0;
    let mut previous = world.add_body(Body::new_static().with_position(Vec2::new(0.0, 10.0)))?;
    for i in 0..links {
        let x = (i as f32 + 0.5) * length;
        let link = world.add_body(
            Body::dynamic(0.5)
                .with_position(Vec2::new(x, 10.0))
                .with_shape(Shape::capsule(length, 0.1)?),
        )?;
        let pivot = Vec2::new(i as f32 * length, 10.0);
        world.add_constraint(
            Constraint::revolute(previous, link, RevoluteJoint::at_world_pivot(pivot))
                .with_collide_connected(false),
        )?;
        previous = link;
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn billiards(world: &mut World) -> Result<()> {
    world.set_gravity(Vec2::ZERO);
    let (width, height) = (20.0, 10.0);
    for (position, size) in [
        (Vec2::new(0.0, -height * 0.5), Vec2::new(width, 1.0)),
        (Vec2::new(0.0, height * 0.5), Vec2::new(width, 1.0)),
        (Vec2::new(-width * 0.5, 0.0), Vec2::new(1.0, height)),
        (Vec2::new(width * 0.5, 0.0), Vec2::new(1.0, height)),
    ] {
        world.add_body(
            Body::new_static()
                .with_position(position)
                .with_shape(Shape::rectangle(size.x, size.y)?.with_material(0.0, 1.0)),
        )?;
    }

    let ball = |position: Vec2, velocity: Vec2| -> Result<Body> {
        Ok(Body::dynamic(1.0)
            .with_position(position)
            .with_velocity(velocity)
            .with_damping(0.1, 0.1)
            .with_shape(Shape::circle(0.4)?.with_material(0.0, 0.95)))
    };
    world.add_body(ball(Vec2::new(-6.0, 0.0), Vec2::new(12.0, 0.3))?)?;
    for row in 0..4 {
        for k in 0..=row {
            let x = 3.0 + row as f32 * 0.75;
            let y = (k as f32 - row as f32 * 0.5) * 0.85;
            world.add_body(ball(Vec2::new(x, y), Vec2::ZERO)?)?;
        }
    }
    Ok(())
}
