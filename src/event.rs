//! Synchronous event dispatch.
//!
//! Events are queued by [`Emitter`]s and delivered to handlers subscribed through
//! [`Builder::subscribe`](crate::world::Builder::subscribe).
//!
//! # Ordering
//! - The queue is drained once per frame, after the update pass and before the draw pass,
//!   or on demand through [`World::drain_events`](crate::World::drain_events).
//! - Events are delivered in the order they were emitted, across all event types.
//! - Handlers of the same event type run in subscription order.
//! - Events emitted by handlers during a drain are appended to the queue
//!   and delivered in the same drain.
//!
//! [`Emitter`] is cheaply cloneable and can be sent to other threads;
//! events emitted from other threads join the queue in the order the lock is acquired.

use std::any::{self, Any, TypeId};
use std::collections::VecDeque;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::world::State;


type Queue = Arc<Mutex<VecDeque<Box<dyn Any + Send>>>>;

/// A handle that queues events for the owning world.
#[derive(Clone, Default)]
pub struct Emitter {
    queue: Queue,
}

impl Emitter {
    /// Queues an event.
    pub fn emit<E: Send + 'static>(&self, event: E) {
        log::trace!("Queued event {}", any::type_name::<E>());
        self.queue.lock().push_back(Box::new(event));
    }

    /// Returns the number of queued events.
    pub fn pending(&self) -> usize { self.queue.lock().len() }
}

type Handler = Box<dyn FnMut(&dyn Any, &mut State)>;

/// Subscribed handlers and the queue they consume.
#[derive(Default)]
pub(crate) struct Bus {
    emitter:  Emitter,
    handlers: IndexMap<TypeId, Vec<Handler>>,
}

impl Bus {
    pub(crate) fn emitter(&self) -> &Emitter { &self.emitter }

    pub(crate) fn subscribe<E: 'static>(
        &mut self,
        mut handler: impl FnMut(&E, &mut State) + 'static,
    ) {
        let handler: Handler = Box::new(move |event, state| {
            let event = event.downcast_ref::<E>().expect("TypeId mismatch");
            handler(event, state)
        });
        self.handlers.entry(TypeId::of::<E>()).or_default().push(handler);
    }

    /// Delivers all queued events, returning the number of events delivered.
    pub(crate) fn drain(&mut self, state: &mut State) -> usize {
        let mut count = 0;

        loop {
            // the lock must be released before handlers run, since they may emit more events
            let next = self.emitter.queue.lock().pop_front();
            let event = match next {
                Some(event) => event,
                None => break,
            };
            count += 1;

            let event: &dyn Any = &*event;
            match self.handlers.get_mut(&Any::type_id(event)) {
                Some(handlers) => {
                    for handler in handlers {
                        handler(event, state);
                    }
                }
                None => log::trace!("Dropped event without handlers"),
            }
        }

        count
    }
}
