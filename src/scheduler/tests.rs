use std::sync::Arc;

use parking_lot::Mutex;

use super::{Frame, Pass};
use crate::system::{Context, DrawContext, Spec, System};
use crate::test_util::{self, Canvas, Health, Recorder};
use crate::world::Builder;

type Log = Arc<Mutex<Vec<String>>>;

struct Probe {
    name:     &'static str,
    priority: i32,
    log:      Log,
}

impl System for Probe {
    fn spec(&self) -> Spec { Spec::new(self.name).priority(self.priority).require::<Health>() }

    fn before(&mut self, pass: Pass, _frame: &Frame) {
        self.log.lock().push(format!("before {pass:?} {}", self.name));
    }

    fn update(&mut self, ctx: &mut Context<'_>) {
        self.log.lock().push(format!("update {} frame {}", self.name, ctx.frame().index));
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) {
        self.log.lock().push(format!("draw {} skipped={}", self.name, ctx.frame.draw_skipped));
    }

    fn after(&mut self, pass: Pass, _frame: &Frame) {
        self.log.lock().push(format!("after {pass:?} {}", self.name));
    }
}

fn probes(log: &Log) -> Builder {
    let mut builder = Builder::new();
    for (name, priority) in [("late", 10), ("early", -5), ("middle", 0), ("middle2", 0)] {
        builder.schedule(Box::new(Probe { name, priority, log: Arc::clone(log) }));
    }
    builder
}

fn updates(log: &Log) -> Vec<String> {
    log.lock().iter().filter(|entry| entry.starts_with("update")).cloned().collect()
}

#[test]
fn test_priority_order_with_registration_tie_break() {
    test_util::init();

    let log = Log::default();
    let mut world = probes(&log).build();
    assert_eq!(world.systems().collect::<Vec<_>>(), vec!["early", "middle", "middle2", "late"]);

    world.execute_without_draw(0.5);
    assert_eq!(
        updates(&log),
        vec![
            "update early frame 0",
            "update middle frame 0",
            "update middle2 frame 0",
            "update late frame 0",
        ]
    );
}

#[test]
fn test_hooks_wrap_both_passes() {
    let log = Log::default();
    let mut builder = Builder::new();
    builder.schedule(Box::new(Probe { name: "only", priority: 0, log: Arc::clone(&log) }));
    let mut world = builder.build();

    let mut canvas = Canvas::default();
    let frame = world.execute(0.25, &mut canvas);
    assert_eq!(frame, Frame { delta: 0.25, index: 0, draw_skipped: false });

    assert_eq!(
        *log.lock(),
        vec![
            "before Update only",
            "update only frame 0",
            "after Update only",
            "before Draw only",
            "draw only skipped=false",
            "after Draw only",
        ]
    );
}

#[test]
fn test_skipped_draw_runs_no_draw_pass() {
    let log = Log::default();
    let recorder = Recorder::default();
    let mut builder = Builder::new();
    builder.tracer(recorder.clone());
    builder.schedule(Box::new(Probe { name: "only", priority: 0, log: Arc::clone(&log) }));
    let mut world = builder.build();

    let frame = world.execute_without_draw(0.1);
    assert!(frame.draw_skipped);
    assert!(log.lock().iter().all(|entry| !entry.contains("Draw") && !entry.starts_with("draw")));
    assert!(recorder.events().contains(&"skip draw 0".to_string()));
}

#[test]
fn test_disabled_systems_skip_hooks_and_body() {
    let log = Log::default();
    let recorder = Recorder::default();
    let mut builder = probes(&log);
    builder.tracer(recorder.clone());
    let mut world = builder.build();

    world.set_enabled("middle", false);
    assert!(!world.is_enabled("middle"));
    world.execute_without_draw(0.1);

    let middle: Vec<_> = log
        .lock()
        .iter()
        .filter(|entry| entry.split(' ').any(|word| word == "middle"))
        .cloned()
        .collect();
    assert!(middle.is_empty(), "disabled system ran: {middle:?}");
    assert!(recorder.events().contains(&"skip Update middle".to_string()));

    world.set_enabled("middle", true);
    log.lock().clear();
    world.execute_without_draw(0.1);
    assert_eq!(updates(&log).len(), 4);
    assert!(updates(&log).contains(&"update middle frame 1".to_string()));
}

#[test]
#[should_panic = "Cannot toggle system missing because it was not scheduled"]
fn test_toggle_unknown_system_panics() {
    let log = Log::default();
    let mut world = probes(&log).build();
    world.set_enabled("missing", false);
}

#[test]
fn test_frames_count_and_tick_advances_per_update() {
    let log = Log::default();
    let mut world = probes(&log).build();
    let tick = world.tick();

    for index in 0..3 {
        let frame = world.execute_without_draw(1.0 / 60.0);
        assert_eq!(frame.index, index);
    }

    assert_eq!(world.frames(), 3);
    assert_eq!(world.tick(), tick + 3);
}

#[test]
fn test_tracer_frame_sequence() {
    let recorder = Recorder::default();
    let mut builder = Builder::new();
    builder.tracer(recorder.clone());
    builder.schedule(Box::new(Probe { name: "only", priority: 0, log: Log::default() }));
    let mut world = builder.build();

    let mut canvas = Canvas::default();
    world.execute(0.1, &mut canvas);

    assert_eq!(
        recorder.events(),
        vec![
            "start frame 0",
            "start Update only",
            "end Update only",
            "drain 0",
            "start Draw only",
            "end Draw only",
            "end frame 0",
        ]
    );
}
