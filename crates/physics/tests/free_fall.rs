use physics2d::{Body, Shape, Vec2, World, WorldConfig};

#[test]
fn circle_free_fall_matches_discrete_euler() -> anyhow::Result<()> {
    let mut world = World::new(WorldConfig::default());
    let ball = world.add_body(
        Body::dynamic(1.0)
            .with_position(Vec2::new(0.0, 10.0))
            .with_shape(Shape::circle(0.5)?),
    )?;

    let dt = 0.01_f32;
    let steps = 100_u16;
    for _ in 0..steps {
        world.step(dt)?;
    }

    // Semi-implicit Euler: y_n = y0 - g·dt²·n(n+1)/2
    let n = f32::from(steps);
    let expected = 10.0 - 9.81 * dt * dt * n * (n + 1.0) * 0.5;
    let body = world.body(ball).expect("ball is in the world");
    let diff = (body.position.y - expected).abs();
    assert!(diff < 1e-3, "diff={diff}");
    assert!((body.velocity.y + 9.81).abs() < 1e-3);
    Ok(())
}

#[test]
fn gravity_scale_zero_floats() -> anyhow::Result<()> {
    let mut world = World::new(WorldConfig::default());
    let mut body = Body::dynamic(1.0)
        .with_position(Vec2::new(0.0, 5.0))
        .with_shape(Shape::circle(0.5)?);
    body.gravity_scale = 0.0;
    body.allow_sleep = false;
    let handle = world.add_body(body)?;
    for _ in 0..60 {
        world.step(1.0 / 60.0)?;
    }
    assert_eq!(world.body(handle).unwrap().position, Vec2::new(0.0, 5.0));
    Ok(())
}
