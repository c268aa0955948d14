//! The scheduler manages the execution of systems.
//!
//! Systems run one at a time, ordered by [priority](crate::system::Spec::priority)
//! with ties broken by scheduling order.
//! Each frame consists of the update pass, an event drain and the draw pass:
//!
//! 1. A new tick starts, invalidating the per-tick caches of the transform hierarchy.
//! 2. Every enabled system runs [`update`](crate::System::update).
//! 3. Queued events are delivered.
//! 4. Unless the host skipped drawing this frame,
//!    every enabled system runs [`draw`](crate::System::draw) in the same order.
//!
//! Disabled systems are skipped entirely:
//! their views are not refreshed and their hooks are not called.

use std::any::Any;

use crate::event::Bus;
use crate::system::{Context, DrawContext, System};
use crate::world::State;

#[cfg(test)]
mod tests;

/// The per-frame context passed to systems.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// The time elapsed since the previous frame, in seconds.
    pub delta:        f32,
    /// The number of frames executed before this one.
    pub index:        u64,
    /// Whether the host skips drawing this frame.
    pub draw_skipped: bool,
}

/// A pass within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    /// Systems mutate the world.
    Update,
    /// Systems read the world and write to the render target.
    Draw,
}

pub(crate) struct Entry {
    name:     String,
    priority: i32,
    enabled:  bool,
    view:     Option<usize>,
    system:   Box<dyn System>,
}

impl Entry {
    pub(crate) fn new(
        name: String,
        priority: i32,
        view: Option<usize>,
        system: Box<dyn System>,
    ) -> Self {
        Self { name, priority, enabled: true, view, system }
    }
}

pub(crate) struct Scheduler {
    /// Sorted by priority, stable over scheduling order.
    entries: Vec<Entry>,
    frames:  u64,
}

impl Scheduler {
    pub(crate) fn new(mut entries: Vec<Entry>) -> Self {
        entries.sort_by_key(|entry| entry.priority);
        Self { entries, frames: 0 }
    }

    /// Executes a full frame.
    pub(crate) fn execute(
        &mut self,
        state: &mut State,
        bus: &mut Bus,
        delta: f32,
        target: Option<&mut dyn Any>,
    ) -> Frame {
        let frame = Frame { delta, index: self.frames, draw_skipped: target.is_none() };
        self.frames += 1;

        state.tracer.start_frame(&frame);

        state.advance_tick();
        self.run_update(state, &frame);

        let drained = bus.drain(state);
        state.tracer.drain_events(drained);

        match target {
            Some(target) => self.run_draw(state, &frame, target),
            None => state.tracer.skip_draw(&frame),
        }

        state.tracer.end_frame(&frame);

        frame
    }

    fn run_update(&mut self, state: &mut State, frame: &Frame) {
        for entry in &mut self.entries {
            if !entry.enabled {
                state.tracer.skip_system(&entry.name, Pass::Update);
                continue;
            }

            if let Some(view) = entry.view {
                state.refresh_view(view);
            }

            entry.system.before(Pass::Update, frame);
            state.tracer.start_system(&entry.name, Pass::Update);
            entry.system.update(&mut Context::new(state, *frame, entry.view));
            state.tracer.end_system(&entry.name, Pass::Update);
            entry.system.after(Pass::Update, frame);
        }
    }

    fn run_draw(&mut self, state: &mut State, frame: &Frame, target: &mut dyn Any) {
        for entry in &mut self.entries {
            if !entry.enabled {
                state.tracer.skip_system(&entry.name, Pass::Draw);
                continue;
            }

            if let Some(view) = entry.view {
                state.refresh_view(view);
            }

            entry.system.before(Pass::Draw, frame);
            state.tracer.start_system(&entry.name, Pass::Draw);
            entry.system.draw(&mut DrawContext::new(state, &mut *target, *frame, entry.view));
            state.tracer.end_system(&entry.name, Pass::Draw);
            entry.system.after(Pass::Draw, frame);
        }
    }

    /// Enables or disables a system by its debug name.
    ///
    /// # Panics
    /// Panics if no system has the name.
    pub(crate) fn set_enabled(&mut self, name: &str, enabled: bool) {
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => {
                log::debug!("{} system {name}", if enabled { "Enabling" } else { "Disabling" });
                entry.enabled = enabled;
            }
            None => panic!("Cannot toggle system {name} because it was not scheduled"),
        }
    }

    /// Returns whether a system is enabled.
    ///
    /// # Panics
    /// Panics if no system has the name.
    pub(crate) fn is_enabled(&self, name: &str) -> bool {
        match self.entries.iter().find(|entry| entry.name == name) {
            Some(entry) => entry.enabled,
            None => panic!("Cannot query system {name} because it was not scheduled"),
        }
    }

    /// The debug names of all systems in execution order.
    pub(crate) fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// The number of frames executed.
    pub(crate) fn frames(&self) -> u64 { self.frames }
}
