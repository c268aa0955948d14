use std::sync::Arc;

use parking_lot::Mutex;

use super::{from_fn, Spec};
use crate::test_util::{self, Frozen, Health, Position, Velocity};
use crate::world::Builder;
use crate::Entity;

#[test]
fn test_spec_builder_collects_requests() {
    let spec = Spec::new("movement")
        .priority(3)
        .require::<Position>()
        .require::<Velocity>()
        .exclude::<Frozen>()
        .uses::<Health>();

    assert_eq!(spec.priority, 3);
    assert!(spec.has_view());
    assert!(!spec.has_only_negative_filters());

    let mut names = Vec::new();
    spec.for_each_request(|request| names.push(request.name));
    assert_eq!(
        names,
        vec![
            std::any::type_name::<Position>(),
            std::any::type_name::<Velocity>(),
            std::any::type_name::<Frozen>(),
            std::any::type_name::<Health>(),
        ]
    );

    assert!(!Spec::new("plain").has_view());
    assert!(Spec::new("negative").exclude::<Frozen>().has_only_negative_filters());
}

#[test]
fn test_for_each_mut_moves_matching_entities() {
    test_util::init();

    let mut builder = Builder::new();
    builder.schedule(from_fn(
        Spec::new("movement").require::<Position>().require::<Velocity>().exclude::<Frozen>(),
        |ctx| {
            let velocities: Vec<(Entity, Velocity)> = ctx
                .entities()
                .into_iter()
                .filter_map(|entity| ctx.get::<Velocity>(entity).map(|&v| (entity, v)))
                .collect();
            let delta = ctx.frame().delta;
            let mut velocities = velocities.into_iter();
            ctx.for_each_mut::<Position>(|entity, position| {
                let (owner, velocity) = velocities.next().expect("one velocity per row");
                assert_eq!(owner, entity);
                position.x += velocity.dx * delta;
                position.y += velocity.dy * delta;
            });
        },
    ));
    let mut world = builder.build();

    let moving = world.spawn();
    world.attach(moving, Position::new(0.0, 0.0));
    world.attach(moving, Velocity { dx: 2.0, dy: -4.0 });

    let frozen = world.spawn();
    world.attach(frozen, Position::new(1.0, 1.0));
    world.attach(frozen, Velocity { dx: 2.0, dy: 2.0 });
    world.attach(frozen, Frozen);

    let still = world.spawn();
    world.attach(still, Position::new(5.0, 5.0));

    world.execute_without_draw(0.5);

    assert_eq!(world.get::<Position>(moving), Some(&Position::new(1.0, -2.0)));
    assert_eq!(world.get::<Position>(frozen), Some(&Position::new(1.0, 1.0)));
    assert_eq!(world.get::<Position>(still), Some(&Position::new(5.0, 5.0)));
}

#[test]
fn test_for_each_reads_through_view() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in_system = Arc::clone(&seen);

    let mut builder = Builder::new();
    builder.schedule(from_fn(Spec::new("reader").require::<Health>(), move |ctx| {
        ctx.for_each::<Health>(|entity, health| seen_in_system.lock().push((entity.id(), health.0)));
    }));
    let mut world = builder.build();

    for hp in [30, 10, 20] {
        let entity = world.spawn();
        world.attach(entity, Health(hp));
    }
    let removed = world.entities().nth(1).expect("three entities");
    world.detach::<Health>(removed);

    world.execute_without_draw(0.1);
    assert_eq!(*seen.lock(), vec![(1, 30), (3, 20)]);
}

#[test]
#[should_panic = "has no view"]
fn test_view_without_requirements_panics() {
    let mut builder = Builder::new();
    builder.schedule(from_fn(Spec::new("blind").uses::<Health>(), |ctx| {
        ctx.view();
    }));
    builder.build().execute_without_draw(0.1);
}

#[test]
#[should_panic = "The system movement is scheduled twice"]
fn test_duplicate_system_name_panics() {
    let mut builder = Builder::new();
    builder.schedule(from_fn(Spec::new("movement"), |_| {}));
    builder.schedule(from_fn(Spec::new("movement"), |_| {}));
}

#[test]
#[should_panic = "excludes components without requiring any"]
fn test_negative_only_filter_panics() {
    let mut builder = Builder::new();
    builder.schedule(from_fn(Spec::new("negative").exclude::<Frozen>(), |_| {}));
    builder.build();
}

#[test]
#[should_panic = "undeclared flag group \"nothing\""]
fn test_unknown_group_panics() {
    let mut builder = Builder::new();
    builder.schedule(from_fn(Spec::new("grouped").any_group("nothing"), |_| {}));
    builder.build();
}
