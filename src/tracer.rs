//! Exposes testing, profiling and tracing capabilities.

use crate::scheduler::{Frame, Pass};
use crate::storage::Resize;
use crate::Entity;

/// A handler that receives scheduling- and storage-related events in scenec.
///
/// All methods have empty default implementations,
/// so implementors only override the events they are interested in.
pub trait Tracer {
    /// A frame starts.
    fn start_frame(&self, _frame: &Frame) {}

    /// A frame ends.
    fn end_frame(&self, _frame: &Frame) {}

    /// A system starts running in `pass`.
    fn start_system(&self, _name: &str, _pass: Pass) {}

    /// A system stops running in `pass`.
    fn end_system(&self, _name: &str, _pass: Pass) {}

    /// A disabled system is skipped in `pass`.
    fn skip_system(&self, _name: &str, _pass: Pass) {}

    /// The draw pass of a frame is skipped because the host did not draw.
    fn skip_draw(&self, _frame: &Frame) {}

    /// The event queue has been drained.
    fn drain_events(&self, _count: usize) {}

    /// A component store is about to reallocate.
    fn will_resize(&self, _kind: &str, _resize: &Resize) {}

    /// A component store has reallocated.
    fn resized(&self, _kind: &str, _resize: &Resize) {}

    /// An entity starts matching the view of a system.
    fn view_insert(&self, _system: &str, _entity: Entity) {}

    /// An entity stops matching the view of a system.
    fn view_remove(&self, _system: &str, _entity: Entity) {}
}

/// An empty tracer.
pub struct Noop;

impl Tracer for Noop {}

/// A tracer that logs all events.
pub struct Log(
    /// The log level to log events with.
    pub log::Level,
);

impl Tracer for Log {
    fn start_frame(&self, frame: &Frame) {
        log::log!(self.0, "start frame {} (delta {}s)", frame.index, frame.delta);
    }

    fn end_frame(&self, frame: &Frame) { log::log!(self.0, "end frame {}", frame.index); }

    fn start_system(&self, name: &str, pass: Pass) {
        log::log!(self.0, "start {pass:?} of system {name}");
    }

    fn end_system(&self, name: &str, pass: Pass) {
        log::log!(self.0, "end {pass:?} of system {name}");
    }

    fn skip_system(&self, name: &str, pass: Pass) {
        log::log!(self.0, "skip {pass:?} of disabled system {name}");
    }

    fn skip_draw(&self, frame: &Frame) {
        log::log!(self.0, "skip draw pass of frame {}", frame.index);
    }

    fn drain_events(&self, count: usize) { log::log!(self.0, "drained {count} events"); }

    fn will_resize(&self, kind: &str, resize: &Resize) {
        log::log!(
            self.0,
            "store of {kind} will resize from {} to {}",
            resize.old_capacity,
            resize.new_capacity
        );
    }

    fn resized(&self, kind: &str, resize: &Resize) {
        log::log!(
            self.0,
            "store of {kind} resized from {} to {}",
            resize.old_capacity,
            resize.new_capacity
        );
    }

    fn view_insert(&self, system: &str, entity: Entity) {
        log::log!(self.0, "{entity:?} joins the view of {system}");
    }

    fn view_remove(&self, system: &str, entity: Entity) {
        log::log!(self.0, "{entity:?} leaves the view of {system}");
    }
}

/// Groups multiple tracers into a tuple and dispatches each call to them in serial.
pub struct Aggregate<T>(
    /// A tuple of child tracers to execute in serial.
    pub T,
);

macro_rules! impl_aggregate {
    ($($ty:ident $field:tt),*) => {
        impl<$($ty: Tracer),*> Tracer for Aggregate<($($ty,)*)> {
            fn start_frame(&self, frame: &Frame) { $(self.0.$field.start_frame(frame);)* }
            fn end_frame(&self, frame: &Frame) { $(self.0.$field.end_frame(frame);)* }
            fn start_system(&self, name: &str, pass: Pass) {
                $(self.0.$field.start_system(name, pass);)*
            }
            fn end_system(&self, name: &str, pass: Pass) {
                $(self.0.$field.end_system(name, pass);)*
            }
            fn skip_system(&self, name: &str, pass: Pass) {
                $(self.0.$field.skip_system(name, pass);)*
            }
            fn skip_draw(&self, frame: &Frame) { $(self.0.$field.skip_draw(frame);)* }
            fn drain_events(&self, count: usize) { $(self.0.$field.drain_events(count);)* }
            fn will_resize(&self, kind: &str, resize: &Resize) {
                $(self.0.$field.will_resize(kind, resize);)*
            }
            fn resized(&self, kind: &str, resize: &Resize) {
                $(self.0.$field.resized(kind, resize);)*
            }
            fn view_insert(&self, system: &str, entity: Entity) {
                $(self.0.$field.view_insert(system, entity);)*
            }
            fn view_remove(&self, system: &str, entity: Entity) {
                $(self.0.$field.view_remove(system, entity);)*
            }
        }
    };
}

impl_aggregate!(A 0, B 1);
impl_aggregate!(A 0, B 1, C 2);
impl_aggregate!(A 0, B 1, C 2, D 3);
