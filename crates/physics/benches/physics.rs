use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use physics2d::{Body, Ray, RaycastResult, Shape, Vec2, World, WorldConfig};

fn pile(count: usize) -> World {
    let mut world = World::new(WorldConfig::default());
    world
        .add_body(Body::new_static().with_shape(Shape::plane()))
        .expect("plane");
    let mut rng = fastrand::Rng::with_seed(42);
    let columns = 20;
    for i in 0..count {
        #[allow(clippy::cast_precision_loss)]
        let (x, y) = ((i % columns) as f32 * 1.1 - 11.0, (i / columns) as f32 * 1.1 + 0.6);
        let shape = if rng.bool() {
            Shape::circle(0.5)
        } else {
            Shape::rectangle(1.0, 1.0)
        }
        .expect("shape");
        world
            .add_body(Body::dynamic(1.0).with_position(Vec2::new(x, y)).with_shape(shape))
            .expect("body");
    }
    world
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");
    for count in [100, 400, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut world = pile(count);
            b.iter(|| world.step(black_box(1.0 / 60.0)).expect("step"));
        });
    }
    group.finish();
}

fn bench_raycast(c: &mut Criterion) {
    let mut world = pile(400);
    for _ in 0..120 {
        world.step(1.0 / 60.0).expect("step");
    }
    c.bench_function("raycast_closest", |b| {
        b.iter(|| {
            let mut ray = Ray::new(Vec2::new(-20.0, 5.0), Vec2::new(20.0, 5.0));
            let mut result = RaycastResult::new();
            black_box(world.raycast(&mut ray, &mut result))
        });
    });
}

criterion_group!(benches, bench_step, bench_raycast);
criterion_main!(benches);
