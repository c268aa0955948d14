use glam::Vec2;

use super::{Compositor, Registry, GROUP};
use crate::layer::{DrawLayer, LayerId, ZIndex};
use crate::test_util::{self, label_factory, sprite_factory, Canvas, Label, Recorder, Sprite};
use crate::transform::{self, Transform};
use crate::world::{self, Builder, Bundle, World};
use crate::{layer, Entity};

fn scene(builder: Builder) -> World {
    world::new_with_builder(
        builder,
        [&transform::Bundle as &dyn Bundle, &layer::Bundle, &super::Bundle],
    )
}

fn builder() -> Builder {
    let mut builder = Builder::new();
    builder.register::<Sprite>();
    builder.register::<Label>();
    builder.drawable(test_util::LABEL_GROUP, label_factory);
    builder.drawable(GROUP, sprite_factory);
    builder
}

fn spawn_at(world: &mut World, layer: i32, z: i64, position: Option<(f32, f32)>) -> Entity {
    let entity = world.spawn();
    world.attach(entity, DrawLayer::new(LayerId(layer), ZIndex::At(z)));
    if let Some((x, y)) = position {
        world.attach(entity, Transform::new(x, y));
    }
    entity
}

fn drawn(canvas: &Canvas) -> Vec<(&str, Vec2)> {
    canvas.calls.iter().map(|(text, position)| (text.as_str(), *position)).collect()
}

#[test]
fn test_compositor_draws_in_layer_order_with_world_positions() {
    test_util::init();

    let mut world = scene(builder());

    let parent = spawn_at(&mut world, 0, 1, Some((1.0, 1.0)));
    world.attach(parent, Sprite("a"));

    let child = spawn_at(&mut world, 0, 0, Some((2.0, 0.0)));
    world.attach(child, Label("b"));
    transform::set_parent(&mut world, child, Some(parent)).expect("no cycle");

    // not placed in any layer
    let unplaced = world.spawn();
    world.attach(unplaced, Sprite("c"));
    world.attach(unplaced, Transform::new(9.0, 9.0));

    // placed but not drawable
    spawn_at(&mut world, 0, 2, Some((8.0, 8.0)));

    let untransformed = spawn_at(&mut world, -1, 0, None);
    world.attach(untransformed, Sprite("d"));

    let mut canvas = Canvas::default();
    world.execute(0.016, &mut canvas);

    assert_eq!(
        drawn(&canvas),
        vec![
            ("sprite:d", Vec2::ZERO),
            ("label:b", Vec2::new(3.0, 1.0)),
            ("sprite:a", Vec2::new(1.0, 1.0)),
        ]
    );
}

#[test]
fn test_first_registered_group_decides_the_drawable() {
    let mut world = scene(builder());
    let both = spawn_at(&mut world, 0, 0, None);
    world.attach(both, Sprite("s"));
    world.attach(both, Label("l"));
    let bare = world.spawn();

    let registry = world.global::<Registry>();
    assert_eq!(registry.groups().collect::<Vec<_>>(), vec![test_util::LABEL_GROUP, GROUP]);
    assert!(registry.build(&world, both).is_some());
    assert!(registry.build(&world, bare).is_none());

    let mut canvas = Canvas::default();
    world.execute(0.016, &mut canvas);
    assert_eq!(drawn(&canvas), vec![("label:l", Vec2::ZERO)]);
}

#[test]
fn test_foreign_targets_and_skipped_draws_are_ignored() {
    let recorder = Recorder::default();
    let mut builder = builder();
    builder.tracer(recorder.clone());
    let mut world = scene(builder);

    let entity = spawn_at(&mut world, 0, 0, Some((1.0, 2.0)));
    world.attach(entity, Sprite("s"));

    let mut unrelated = String::from("not a canvas");
    world.execute(0.016, &mut unrelated);
    assert_eq!(unrelated, "not a canvas");

    recorder.clear();
    let frame = world.execute_without_draw(0.016);
    assert!(frame.draw_skipped);
    assert!(recorder.events().contains(&format!("skip draw {}", frame.index)));
    assert!(!recorder.events().iter().any(|event| event.contains(Compositor::NAME)
        && event.starts_with("start Draw")));
}

#[test]
fn test_disabled_compositor_draws_nothing() {
    let mut world = scene(builder());
    let entity = spawn_at(&mut world, 0, 0, None);
    world.attach(entity, Sprite("s"));

    world.set_enabled(Compositor::NAME, false);
    let mut canvas = Canvas::default();
    world.execute(0.016, &mut canvas);
    assert!(canvas.calls.is_empty());

    world.set_enabled(Compositor::NAME, true);
    world.execute(0.016, &mut canvas);
    assert_eq!(drawn(&canvas), vec![("sprite:s", Vec2::ZERO)]);
}

#[test]
#[should_panic = "The drawable group \"drawable\" is registered twice"]
fn test_duplicate_group_panics() {
    let mut builder = builder();
    builder.drawable(GROUP, label_factory);
}
