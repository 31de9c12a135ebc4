use physics2d::{Body, Shape, Vec2, World, WorldConfig};

#[test]
fn ball_settles_on_plane_and_sleeps() -> anyhow::Result<()> {
    let mut world = World::new(WorldConfig::default().with_sleeping(true));
    world.add_body(Body::new_static().with_shape(Shape::plane()))?;
    let ball = world.add_body(
        Body::dynamic(1.0)
            .with_position(Vec2::new(0.0, 0.5))
            .with_shape(Shape::circle(0.5)?),
    )?;

    for _ in 0..1000 {
        world.step(1.0 / 60.0)?;
        let y = world.body(ball).unwrap().position.y;
        assert!(y > 0.45, "sank to {y}");
    }
    let body = world.body(ball).unwrap();
    assert!((body.position.y - 0.5).abs() < 0.02, "y={}", body.position.y);
    assert!(body.is_sleeping(), "a resting ball falls asleep");
    Ok(())
}

#[test]
fn dropped_box_does_not_tunnel() -> anyhow::Result<()> {
    let mut world = World::new(WorldConfig::default());
    world.add_body(Body::new_static().with_shape(Shape::plane()))?;
    let crate_ = world.add_body(
        Body::dynamic(2.0)
            .with_position(Vec2::new(0.0, 4.0))
            .with_shape(Shape::rectangle(1.0, 1.0)?.with_material(0.5, 0.0)),
    )?;
    for _ in 0..600 {
        world.step(1.0 / 60.0)?;
        let y = world.body(crate_).unwrap().position.y;
        assert!(y > 0.3, "tunnelled to {y}");
    }
    let body = world.body(crate_).unwrap();
    assert!((body.position.y - 0.5).abs() < 0.05, "y={}", body.position.y);
    assert!(body.angle.abs() < 0.05);
    Ok(())
}

#[test]
fn short_stack_stays_upright() -> anyhow::Result<()> {
    let mut world = World::new(WorldConfig::default());
    world.add_body(Body::new_static().with_shape(Shape::plane()))?;
    let mut boxes = Vec::new();
    for level in 0..3_u8 {
        let y = 0.5 + f32::from(level);
        boxes.push(world.add_body(
            Body::dynamic(1.0)
                .with_position(Vec2::new(0.0, y))
                .with_shape(Shape::rectangle(1.0, 1.0)?),
        )?);
    }
    for _ in 0..600 {
        world.step(1.0 / 60.0)?;
    }
    for (level, handle) in boxes.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let expected = 0.5 + level as f32;
        let p = world.body(*handle).unwrap().position;
        assert!((p.y - expected).abs() < 0.1, "box {level} at {p:?}");
        assert!(p.x.abs() < 0.05, "box {level} slid to {p:?}");
    }
    Ok(())
}

#[test]
fn ball_rests_on_heightfield() -> anyhow::Result<()> {
    let mut world = World::new(WorldConfig::default());
    world.add_body(
        Body::new_static()
            .with_position(Vec2::new(-5.0, 0.0))
            .with_shape(Shape::heightfield(vec![0.0; 11], 1.0)?),
    )?;
    let ball = world.add_body(
        Body::dynamic(1.0)
            .with_position(Vec2::new(0.3, 2.0))
            .with_shape(Shape::circle(0.5)?),
    )?;
    for _ in 0..300 {
        world.step(1.0 / 60.0)?;
    }
    let y = world.body(ball).unwrap().position.y;
    assert!((y - 0.5).abs() < 0.05, "y={y}");
    Ok(())
}
