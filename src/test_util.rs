#![allow(missing_docs)]

use std::any::Any;
use std::sync::Arc;

use glam::{Affine2, Vec2};
use parking_lot::{Mutex, Once};

use crate::drawable::{self, Drawable};
use crate::scheduler::{Frame, Pass};
use crate::storage::Resize;
use crate::tracer::Tracer;
use crate::world::State;
use crate::{Component, Entity};

pub fn init() {
    static SET_LOGGER_ONCE: Once = Once::new();
    SET_LOGGER_ONCE.call_once(env_logger::init);
}

/// Constructs an entity from its raw id without an allocator.
pub fn entity(id: u32) -> Entity {
    match Entity::from_raw(id) {
        Some(entity) => entity,
        None => panic!("Entity id 0 is reserved"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health(pub i32);
impl Component for Health {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}
impl Component for Position {}

impl Position {
    pub fn new(x: f32, y: f32) -> Self { Self { x, y } }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}
impl Component for Velocity {}

/// A marker component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frozen;
impl Component for Frozen {}

/// A drawable test component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite(pub &'static str);
impl Component for Sprite {
    const GROUPS: &'static [&'static str] = &[drawable::GROUP];
}

/// Another drawable test component in its own group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label(pub &'static str);
impl Component for Label {
    const GROUPS: &'static [&'static str] = &[drawable::GROUP, LABEL_GROUP];
}

pub const LABEL_GROUP: &str = "label";

/// A render target that records draw calls.
#[derive(Debug, Default)]
pub struct Canvas {
    pub calls: Vec<(String, Vec2)>,
}

struct TextDrawable {
    text: String,
}

impl Drawable for TextDrawable {
    fn draw(&self, world: Affine2, target: &mut dyn Any) {
        if let Some(canvas) = target.downcast_mut::<Canvas>() {
            canvas.calls.push((self.text.clone(), world.translation));
        }
    }
}

pub fn sprite_factory(state: &State, entity: Entity) -> Option<Box<dyn Drawable>> {
    let sprite = state.get::<Sprite>(entity)?;
    Some(Box::new(TextDrawable { text: format!("sprite:{}", sprite.0) }))
}

pub fn label_factory(state: &State, entity: Entity) -> Option<Box<dyn Drawable>> {
    let label = state.get::<Label>(entity)?;
    Some(Box::new(TextDrawable { text: format!("label:{}", label.0) }))
}

/// A tracer that records events as strings.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<String> { self.events.lock().clone() }

    pub fn clear(&self) { self.events.lock().clear(); }

    fn push(&self, event: String) { self.events.lock().push(event); }
}

impl Tracer for Recorder {
    fn start_frame(&self, frame: &Frame) { self.push(format!("start frame {}", frame.index)); }

    fn end_frame(&self, frame: &Frame) { self.push(format!("end frame {}", frame.index)); }

    fn start_system(&self, name: &str, pass: Pass) { self.push(format!("start {pass:?} {name}")); }

    fn end_system(&self, name: &str, pass: Pass) { self.push(format!("end {pass:?} {name}")); }

    fn skip_system(&self, name: &str, pass: Pass) { self.push(format!("skip {pass:?} {name}")); }

    fn skip_draw(&self, frame: &Frame) { self.push(format!("skip draw {}", frame.index)); }

    fn drain_events(&self, count: usize) { self.push(format!("drain {count}")); }

    fn will_resize(&self, _kind: &str, resize: &Resize) {
        self.push(format!(
            "will_resize {} {}->{}",
            resize.flag.index(),
            resize.old_capacity,
            resize.new_capacity
        ));
    }

    fn resized(&self, _kind: &str, resize: &Resize) {
        self.push(format!(
            "resized {} {}->{}",
            resize.flag.index(),
            resize.old_capacity,
            resize.new_capacity
        ));
    }

    fn view_insert(&self, system: &str, entity: Entity) {
        self.push(format!("{system} + {}", entity.id()));
    }

    fn view_remove(&self, system: &str, entity: Entity) {
        self.push(format!("{system} - {}", entity.id()));
    }
}
