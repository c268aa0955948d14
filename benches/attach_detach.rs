use criterion::*;
use scenec::system::{self, Spec};
use scenec::test_util::{Frozen, Health, Position, Velocity};
use scenec::world::{Builder, Config, World};

fn world(min_store_capacity: usize) -> World {
    let mut builder = Builder::new();
    builder.config(Config { min_store_capacity });
    builder.register::<Health>();
    builder.schedule(system::from_fn(
        Spec::new("movement").require::<Position>().require::<Velocity>().exclude::<Frozen>(),
        |_| {},
    ));
    builder.build()
}

fn attach_detach(c: &mut Criterion) {
    let mut group = c.benchmark_group("attach then detach");

    for log_entities in (0..=12).step_by(4) {
        let entities = 1 << log_entities;
        for min_store_capacity in [1, entities as usize] {
            group.throughput(Throughput::Elements(entities));
            group.bench_with_input(
                BenchmarkId::new(
                    format!("min capacity {min_store_capacity}"),
                    format!("{entities} entities"),
                ),
                &entities,
                |b, &entities| {
                    b.iter_batched(
                        || world(min_store_capacity),
                        |mut world| {
                            let spawned: Vec<_> = (0..entities).map(|_| world.spawn()).collect();
                            for &entity in &spawned {
                                world.attach(entity, Position::new(0.0, 0.0));
                                world.attach(entity, Velocity { dx: 1.0, dy: 1.0 });
                                world.attach(entity, Health(1));
                            }
                            for &entity in spawned.iter().step_by(2) {
                                world.detach::<Velocity>(entity);
                            }
                            world.execute_without_draw(0.016);
                            world
                        },
                        BatchSize::SmallInput,
                    );
                },
            );
        }
    }
}

criterion_group!(benches, attach_detach);
criterion_main!(benches);
