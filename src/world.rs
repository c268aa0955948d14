//! The world stores the states of the scene.

use std::any::Any;
use std::ops::{Deref, DerefMut};

use crate::event::Bus;
use crate::scheduler::{Frame, Scheduler};

mod builder;
pub use builder::Builder;

mod config;
pub use config::Config;

pub(crate) mod state;
pub use state::{DetachHook, State};

#[cfg(test)]
mod tests;

/// A bundle encapsulates the systems and resources for a specific feature.
/// This can be used by library crates to expose their features as a single API.
pub trait Bundle {
    /// Registers the components, systems and global states used by this bundle.
    fn register(&self, _builder: &mut Builder) {}

    /// Populates the world with entities and global states.
    fn populate(&self, _world: &mut World) {}
}

/// Creates a world from bundles.
pub fn new<'t>(bundles: impl IntoIterator<Item = &'t dyn Bundle> + Copy) -> World {
    new_with_builder(Builder::new(), bundles)
}

/// Creates a world from bundles, starting from a preconfigured builder.
pub fn new_with_builder<'t>(
    mut builder: Builder,
    bundles: impl IntoIterator<Item = &'t dyn Bundle> + Copy,
) -> World {
    for bundle in bundles {
        bundle.register(&mut builder);
    }

    let mut world = builder.build();

    for bundle in bundles {
        bundle.populate(&mut world);
    }

    world
}

/// The data structure that stores all states in the scene.
///
/// Dereferences to [`State`] for component, entity and global operations.
pub struct World {
    state:     State,
    /// Stores the systems and the execution order.
    scheduler: Scheduler,
    /// Stores event handlers and the event queue.
    bus:       Bus,
}

impl World {
    /// Executes a full frame: the update pass, the event drain and the draw pass.
    ///
    /// `delta` is the time elapsed since the previous frame, in seconds.
    /// `target` is passed to draw systems as the render target.
    pub fn execute(&mut self, delta: f32, target: &mut dyn Any) -> Frame {
        self.scheduler.execute(&mut self.state, &mut self.bus, delta, Some(target))
    }

    /// Executes a frame whose drawing is skipped by the host.
    ///
    /// The update pass and the event drain run as usual,
    /// but the draw pass is not run at all.
    pub fn execute_without_draw(&mut self, delta: f32) -> Frame {
        self.scheduler.execute(&mut self.state, &mut self.bus, delta, None)
    }

    /// Delivers all queued events now, returning the number delivered.
    pub fn drain_events(&mut self) -> usize {
        let count = self.bus.drain(&mut self.state);
        self.state.tracer.drain_events(count);
        count
    }

    /// Enables or disables a system by its debug name.
    ///
    /// # Panics
    /// Panics if no system has the name.
    pub fn set_enabled(&mut self, system: &str, enabled: bool) {
        self.scheduler.set_enabled(system, enabled);
    }

    /// Returns whether a system is enabled.
    ///
    /// # Panics
    /// Panics if no system has the name.
    pub fn is_enabled(&self, system: &str) -> bool { self.scheduler.is_enabled(system) }

    /// The debug names of all systems in execution order.
    pub fn systems(&self) -> impl Iterator<Item = &str> + '_ { self.scheduler.names() }

    /// The number of frames executed.
    pub fn frames(&self) -> u64 { self.scheduler.frames() }
}

impl Deref for World {
    type Target = State;

    fn deref(&self) -> &State { &self.state }
}

impl DerefMut for World {
    fn deref_mut(&mut self) -> &mut State { &mut self.state }
}
