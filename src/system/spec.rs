//! Specifies the requirements for a system.

use std::any::{self, TypeId};

use crate::storage::{self, AnyBuilder};
use crate::Component;

/// Identifies a component kind requested by a system.
///
/// Requested kinds are registered automatically when the system is scheduled.
#[derive(Debug, Clone, Copy)]
pub struct Request {
    pub(crate) type_id: TypeId,
    pub(crate) name:    &'static str,
    pub(crate) groups:  &'static [&'static str],
    pub(crate) builder: AnyBuilder,
}

impl Request {
    /// Requests the component kind `C`.
    pub fn of<C: Component>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name:    any::type_name::<C>(),
            groups:  C::GROUPS,
            builder: storage::builder::<C>(),
        }
    }
}

/// Describes an instance of system.
///
/// There may be multiple instances of the same implementor type,
/// but each must have a distinct debug name.
#[derive(Debug, Clone)]
pub struct Spec {
    /// The debug name of the system. Also used to enable or disable it at runtime.
    pub debug_name: String,
    /// Systems run from low to high priority. Ties run in scheduling order.
    pub priority:   i32,
    /// Kinds that an entity must have to match the view.
    pub require:    Vec<Request>,
    /// Kinds that an entity must not have to match the view.
    pub exclude:    Vec<Request>,
    /// Flag groups of which an entity must have at least one member to match the view.
    pub any_group:  Vec<&'static str>,
    /// Kinds used by the system without affecting its view.
    pub uses:       Vec<Request>,
}

impl Spec {
    /// Creates the spec of a system with no view and priority 0.
    pub fn new(debug_name: impl Into<String>) -> Self {
        Self {
            debug_name: debug_name.into(),
            priority:   0,
            require:    Vec::new(),
            exclude:    Vec::new(),
            any_group:  Vec::new(),
            uses:       Vec::new(),
        }
    }

    /// Sets the priority.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Only matches entities with the component `C`.
    pub fn require<C: Component>(mut self) -> Self {
        self.require.push(Request::of::<C>());
        self
    }

    /// Only matches entities without the component `C`.
    pub fn exclude<C: Component>(mut self) -> Self {
        self.exclude.push(Request::of::<C>());
        self
    }

    /// Only matches entities with at least one component in the group `tag`.
    ///
    /// Calling this multiple times widens the group filter to the union of all groups.
    pub fn any_group(mut self, tag: &'static str) -> Self {
        self.any_group.push(tag);
        self
    }

    /// Registers the component `C` without affecting the view.
    pub fn uses<C: Component>(mut self) -> Self {
        self.uses.push(Request::of::<C>());
        self
    }

    /// Returns whether the system maintains a view.
    pub fn has_view(&self) -> bool { !self.require.is_empty() || !self.any_group.is_empty() }

    /// Returns whether the spec declares view filters without any positive term.
    pub(crate) fn has_only_negative_filters(&self) -> bool {
        !self.has_view() && !self.exclude.is_empty()
    }

    /// Executes the given function on each requested kind.
    pub fn for_each_request(&self, mut f: impl FnMut(&Request)) {
        self.require.iter().chain(&self.exclude).chain(&self.uses).for_each(|request| f(request));
    }
}
