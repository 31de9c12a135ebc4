use std::cell::RefCell;
use std::rc::Rc;

use physics2d::{
    BeginContactHandler, Body, BodyHandle, ContactEvent, EndContactHandler, HandlerTable,
    OwnerHandlers, OwnerId, Shape, StepCommands, Vec2, World, WorldConfig, WorldEvent,
};

fn head_on() -> anyhow::Result<(World, BodyHandle, BodyHandle)> {
    let mut world = World::new(WorldConfig::default().with_gravity(Vec2::ZERO));
    let ball = |x: f32, vx: f32, owner: u64| -> anyhow::Result<Body> {
        Ok(Body::dynamic(1.0)
            .with_position(Vec2::new(x, 0.0))
            .with_velocity(Vec2::new(vx, 0.0))
            .with_owner(OwnerId(owner))
            .with_shape(Shape::circle(1.0)?.with_material(0.0, 1.0)))
    };
    let a = world.add_body(ball(-3.0, 4.0, 1)?)?;
    let b = world.add_body(ball(3.0, -4.0, 2)?)?;
    Ok((world, a, b))
}

#[test]
fn begin_and_end_fire_exactly_once() -> anyhow::Result<()> {
    let (mut world, _, _) = head_on()?;
    let (mut begins, mut ends, mut impacts, mut touching) = (0, 0, 0, 0);
    let mut first_begin = None;
    let mut last_end = None;

    for step in 0..240 {
        world.step(1.0 / 60.0)?;
        for event in world.drain_events() {
            match event {
                WorldEvent::BeginContact(_) => {
                    begins += 1;
                    first_begin.get_or_insert(step);
                }
                WorldEvent::EndContact(_) => {
                    ends += 1;
                    last_end = Some(step);
                }
                WorldEvent::Impact(e) => {
                    impacts += 1;
                    assert!(!e.contacts.is_empty());
                }
                WorldEvent::Contact(_) => touching += 1,
                _ => {}
            }
        }
    }

    assert_eq!(begins, 1, "begin contact must fire once");
    assert_eq!(ends, 1, "end contact must fire once");
    assert_eq!(impacts, 1);
    assert!(touching >= 1);
    assert!(first_begin < last_end);
    Ok(())
}

#[derive(Clone, Default)]
struct Log(Rc<RefCell<Vec<String>>>);

impl BeginContactHandler for Log {
    fn begin_contact(&mut self, _: &ContactEvent, other: Option<OwnerId>, _: &mut StepCommands) {
        self.0.borrow_mut().push(format!("begin {other:?}"));
    }
}

impl EndContactHandler for Log {
    fn end_contact(&mut self, _: &ContactEvent, other: Option<OwnerId>, _: &mut StepCommands) {
        self.0.borrow_mut().push(format!("end {other:?}"));
    }
}

#[test]
fn owner_handlers_see_the_other_side() -> anyhow::Result<()> {
    let (mut world, _, _) = head_on()?;
    let log = Log::default();
    let mut table = HandlerTable::new();
    table.attach(
        OwnerId(1),
        OwnerHandlers::new()
            .on_begin_contact(log.clone())
            .on_end_contact(log.clone()),
    );
    world.add_listener(table);

    for _ in 0..240 {
        world.step(1.0 / 60.0)?;
    }
    let seen = log.0.borrow().clone();
    assert_eq!(seen, vec!["begin Some(OwnerId(2))", "end Some(OwnerId(2))"]);
    Ok(())
}

#[test]
fn listeners_defer_removal_until_the_step_ends() -> anyhow::Result<()> {
    let (mut world, a, b) = head_on()?;
    world.add_listener(move |event: &WorldEvent, commands: &mut StepCommands| {
        if let WorldEvent::BeginContact(contact) = event {
            commands.remove_body(contact.body_a);
        }
    });

    let mut removed = false;
    for _ in 0..120 {
        world.step(1.0 / 60.0)?;
        assert!(!world.is_stepping());
        let alive = usize::from(world.body(a).is_some()) + usize::from(world.body(b).is_some());
        if alive == 1 && !removed {
            removed = true;
            let ended = world
                .events()
                .iter()
                .filter(|e| matches!(e, WorldEvent::EndContact(_)))
                .count();
            assert_eq!(ended, 1, "removal ends the contact");
        }
    }
    assert!(removed);
    assert_eq!(world.body_count(), 1);
    assert!(world.contact_list().active().is_empty());
    Ok(())
}

#[test]
fn sensors_report_but_do_not_push() -> anyhow::Result<()> {
    let mut world = World::new(WorldConfig::default().with_gravity(Vec2::ZERO));
    let mover = world.add_body(
        Body::dynamic(1.0)
            .with_position(Vec2::new(-3.0, 0.0))
            .with_velocity(Vec2::new(3.0, 0.0))
            .with_shape(Shape::circle(0.5)?),
    )?;
    world.add_body(Body::new_static().with_shape(Shape::rectangle(2.0, 2.0)?.sensor()))?;

    let mut begins = 0;
    for _ in 0..120 {
        world.step(1.0 / 60.0)?;
        begins += world
            .drain_events()
            .filter(|e| matches!(e, WorldEvent::BeginContact(_)))
            .count();
    }
    assert_eq!(begins, 1);
    let body = world.body(mover).unwrap();
    assert!(body.position.x > 2.0, "passed through the sensor");
    assert_eq!(body.velocity, Vec2::new(3.0, 0.0));
    Ok(())
}

#[test]
fn sleeping_contacts_keep_reporting_touch() -> anyhow::Result<()> {
    let mut world = World::new(WorldConfig::default().with_sleeping(true));
    world.add_body(Body::new_static().with_shape(Shape::plane()))?;
    let ball = world.add_body(
        Body::dynamic(1.0)
            .with_position(Vec2::new(0.0, 0.5))
            .with_shape(Shape::circle(0.5)?),
    )?;
    for _ in 0..400 {
        world.step(1.0 / 60.0)?;
    }
    assert!(world.body(ball).unwrap().is_sleeping());

    for _ in 0..10 {
        world.step(1.0 / 60.0)?;
        let touching: Vec<&ContactEvent> = world
            .events()
            .iter()
            .filter_map(|e| match e {
                WorldEvent::Contact(event) => Some(event),
                _ => None,
            })
            .collect();
        assert_eq!(touching.len(), 1);
        assert!(touching[0].body_a == ball || touching[0].body_b == ball);
        assert!(!touching[0].contacts.is_empty(), "resting points are kept");
    }
    Ok(())
}
