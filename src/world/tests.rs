use std::any::Any;

use super::{Builder, Bundle, Config, State, World};
use crate::test_util::{self, Frozen, Health, Position, Velocity};
use crate::{Entity, Global};

#[derive(Default)]
struct DetachLog(Vec<(u32, bool)>);
impl Global for DetachLog {}

fn record_health_detach(state: &mut State, entity: Entity) {
    let still_has = state.has::<Health>(entity);
    state.global_mut::<DetachLog>().0.push((entity.id(), still_has));
}

fn simple_world() -> World {
    let mut builder = Builder::new();
    builder.register::<Health>();
    builder.register::<Position>();
    builder.register::<Frozen>();
    builder.global(DetachLog::default());
    builder.on_detach::<Health>(record_health_detach);
    builder.build()
}

#[test]
fn test_attach_get_detach() {
    test_util::init();

    let mut world = simple_world();
    let entity = world.spawn();

    assert_eq!(world.attach(entity, Health(3)), None);
    assert_eq!(world.attach(entity, Health(4)), Some(Health(3)));
    assert_eq!(world.get::<Health>(entity), Some(&Health(4)));
    assert!(world.has::<Health>(entity));
    assert!(!world.has::<Position>(entity));

    world.get_mut::<Health>(entity).expect("attached").0 += 1;
    assert_eq!(world.detach::<Health>(entity), Some(Health(5)));
    assert_eq!(world.detach::<Health>(entity), None);
    assert!(world.mask_of(entity).is_empty());
}

#[test]
fn test_entities_are_never_reused() {
    let mut world = simple_world();
    let first = world.spawn();
    world.attach(first, Health(1));
    world.despawn(first);

    let second = world.spawn();
    assert_ne!(first, second);
    assert!(second > first);

    // a despawned entity can still receive components
    world.attach(first, Health(2));
    assert_eq!(world.get::<Health>(first), Some(&Health(2)));
}

#[test]
fn test_ids_stay_valid_across_resizes() {
    let mut builder = Builder::new();
    builder.config(Config { min_store_capacity: 1 });
    builder.register::<Health>();
    let mut world = builder.build();

    let entities: Vec<_> = (0..100).map(|_| world.spawn()).collect();
    for (i, &entity) in entities.iter().enumerate().rev() {
        world.attach(entity, Health(i as i32));
    }

    assert_eq!(world.store::<Health>().capacity(), 128);
    for (i, &entity) in entities.iter().enumerate() {
        assert_eq!(world.get::<Health>(entity), Some(&Health(i as i32)));
    }
    assert!(world.iter::<Health>().map(|(entity, _)| entity).eq(entities.iter().copied()));
}

#[test]
fn test_despawn_detaches_everything_and_runs_hooks_after_views() {
    let mut world = simple_world();
    let entity = world.spawn();
    world.attach(entity, Health(1));
    world.attach(entity, Position::new(1.0, 2.0));
    world.attach(entity, Frozen);

    world.despawn(entity);

    assert!(world.mask_of(entity).is_empty());
    assert_eq!(world.entities().count(), 0);
    assert_eq!(world.global::<DetachLog>().0, vec![(entity.id(), false)]);
}

#[test]
fn test_attach_boxed_and_detach_flag() {
    let mut world = simple_world();
    let entity = world.spawn();
    let flag = world.flag_of::<Position>();

    assert!(world.attach_boxed(entity, flag, Box::new(Position::new(3.0, 4.0))));
    assert!(!world.attach_boxed(entity, flag, Box::new(Position::new(5.0, 6.0))));
    assert!(world.mask_of(entity).has(flag));

    let removed: Box<dyn Any> = world.detach_flag(entity, flag).expect("attached");
    assert_eq!(removed.downcast_ref::<Position>(), Some(&Position::new(5.0, 6.0)));
    assert!(!world.mask_of(entity).has(flag));
}

#[test]
#[should_panic = "Cannot attach a value of the wrong kind"]
fn test_attach_boxed_wrong_kind_panics() {
    let mut world = simple_world();
    let entity = world.spawn();
    let flag = world.flag_of::<Position>();
    world.attach_boxed(entity, flag, Box::new(Health(1)));
}

#[test]
#[should_panic = "cannot be used because it was not registered"]
fn test_unregistered_component_panics() {
    let mut world = simple_world();
    let entity = world.spawn();
    world.attach(entity, Velocity { dx: 0.0, dy: 0.0 });
}

#[test]
#[should_panic = "was not allocated by this world"]
fn test_foreign_entity_panics() {
    let mut world = simple_world();
    world.attach(test_util::entity(42), Health(1));
}

#[test]
#[should_panic = "is registered twice"]
fn test_duplicate_registration_panics() {
    let mut builder = Builder::new();
    builder.register::<Health>();
    builder.register::<Health>();
}

#[test]
#[should_panic = "is initialized twice"]
fn test_duplicate_global_panics() {
    let mut builder = Builder::new();
    builder.global(DetachLog::default());
    builder.global(DetachLog::default());
}

#[test]
#[should_panic = "cannot be retrieved because it was not provided"]
fn test_missing_global_panics() {
    let world = Builder::new().build();
    world.global::<DetachLog>();
}

struct Seeded;

impl Bundle for Seeded {
    fn register(&self, builder: &mut Builder) {
        builder.register::<Health>();
        builder.global(DetachLog::default());
    }

    fn populate(&self, world: &mut World) {
        for hp in 1..=3 {
            let entity = world.spawn();
            world.attach(entity, Health(hp));
        }
    }
}

#[test]
fn test_bundles_register_then_populate() {
    let world = super::new([&Seeded as &dyn Bundle]);
    assert_eq!(world.iter::<Health>().map(|(_, health)| health.0).sum::<i32>(), 6);
    assert!(world.try_global::<DetachLog>().is_some());
}
