use physics2d::{Body, CollisionGroups, Shape, Vec2, World, WorldConfig, WorldEvent};

fn zero_g() -> World {
    World::new(WorldConfig::default().with_gravity(Vec2::ZERO))
}

#[test]
fn filtered_groups_pass_through() -> anyhow::Result<()> {
    let groups = CollisionGroups::new(["Player", "Ghost", "Terrain"])?;
    let player = groups.bit("Player")?;
    let ghost = groups.bit("Ghost")?;
    let everything_but_ghosts = groups.mask(["Player", "Terrain"])?;

    let mut world = zero_g();
    let a = world.add_body(
        Body::dynamic(1.0)
            .with_position(Vec2::new(-2.0, 0.0))
            .with_velocity(Vec2::new(3.0, 0.0))
            .with_shape(Shape::circle(0.5)?.with_filter(player, everything_but_ghosts)),
    )?;
    let b = world.add_body(
        Body::dynamic(1.0)
            .with_position(Vec2::new(2.0, 0.0))
            .with_velocity(Vec2::new(-3.0, 0.0))
            .with_shape(Shape::circle(0.5)?.with_filter(ghost, groups.mask(["Ghost"])?)),
    )?;

    for _ in 0..120 {
        world.step(1.0 / 60.0)?;
        assert!(world.events().iter().all(|e| !matches!(e, WorldEvent::BeginContact(_))));
    }
    assert_eq!(world.body(a).unwrap().velocity, Vec2::new(3.0, 0.0));
    assert_eq!(world.body(b).unwrap().velocity, Vec2::new(-3.0, 0.0));
    assert!(world.body(a).unwrap().position.x > 3.0);
    Ok(())
}

#[test]
fn kinematic_bodies_push_but_are_not_pushed() -> anyhow::Result<()> {
    let mut world = zero_g();
    let pusher = world.add_body(
        Body::kinematic()
            .with_position(Vec2::new(-2.0, 0.0))
            .with_velocity(Vec2::new(2.0, 0.0))
            .with_shape(Shape::rectangle(1.0, 2.0)?),
    )?;
    let ball = world.add_body(
        Body::dynamic(1.0)
            .with_position(Vec2::new(0.0, 0.0))
            .with_shape(Shape::circle(0.5)?.with_material(0.0, 0.0)),
    )?;

    for _ in 0..90 {
        world.step(1.0 / 60.0)?;
    }
    let pusher = world.body(pusher).unwrap();
    let ball = world.body(ball).unwrap();
    assert_eq!(pusher.velocity, Vec2::new(2.0, 0.0));
    assert!(ball.velocity.x > 1.5, "ball velocity {:?}", ball.velocity);
    assert!(ball.position.x > pusher.position.x);
    Ok(())
}

#[test]
fn capsule_and_polygon_collide() -> anyhow::Result<()> {
    let mut world = World::new(WorldConfig::default());
    // Convex hulls are re-centred on their centroid; the body places the top at y = 1.
    let slab = Shape::convex(&[
        Vec2::new(-3.0, -0.5),
        Vec2::new(3.0, -0.5),
        Vec2::new(3.0, 0.5),
        Vec2::new(-3.0, 0.5),
    ])?;
    world.add_body(
        Body::new_static()
            .with_position(Vec2::new(0.0, 0.5))
            .with_shape(slab),
    )?;
    let capsule = world.add_body(
        Body::dynamic(1.0)
            .with_position(Vec2::new(0.0, 3.0))
            .with_shape(Shape::capsule(1.0, 0.25)?),
    )?;

    let mut touched = false;
    for _ in 0..180 {
        world.step(1.0 / 60.0)?;
        touched |= world
            .events()
            .iter()
            .any(|e| matches!(e, WorldEvent::BeginContact(_)));
        let y = world.body(capsule).unwrap().position.y;
        assert!(y > 1.0, "capsule sank into the slab: {y}");
    }
    assert!(touched);
    let y = world.body(capsule).unwrap().position.y;
    assert!(y < 1.8, "capsule came to rest on the slab: {y}");
    Ok(())
}

#[test]
fn sleeping_bodies_wake_when_hit() -> anyhow::Result<()> {
    let mut world = World::new(WorldConfig::default().with_sleeping(true));
    world.add_body(Body::new_static().with_shape(Shape::plane()))?;
    let sleeper = world.add_body(
        Body::dynamic(1.0)
            .with_position(Vec2::new(0.0, 0.5))
            .with_shape(Shape::rectangle(1.0, 1.0)?),
    )?;
    for _ in 0..200 {
        world.step(1.0 / 60.0)?;
    }
    assert!(world.body(sleeper).unwrap().is_sleeping());

    let hammer = world.add_body(
        Body::dynamic(1.0)
            .with_position(Vec2::new(0.0, 3.0))
            .with_velocity(Vec2::new(0.0, -5.0))
            .with_shape(Shape::circle(0.25)?),
    )?;
    let mut woke = false;
    for _ in 0..60 {
        world.step(1.0 / 60.0)?;
        woke |= world
            .events()
            .iter()
            .any(|e| matches!(e, WorldEvent::Wake(h) if *h == sleeper));
    }
    assert!(woke, "the impact woke the sleeper");
    assert!(world.body(hammer).unwrap().position.y > 1.0);
    Ok(())
}
