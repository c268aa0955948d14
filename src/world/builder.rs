use std::any::{self, TypeId};

use indexmap::IndexSet;
use itertools::Itertools;

use super::{Config, DetachHook, State, World};
use crate::drawable;
use crate::entity::Ealloc;
use crate::event::Bus;
use crate::flag::{Flag, Mask, Registry};
use crate::global::Globals;
use crate::scheduler::{self, Scheduler};
use crate::sorted::SortedIndex;
use crate::storage::AnyBuilder;
use crate::system::spec::Request;
use crate::system::{Spec, System};
use crate::tracer::{self, Tracer};
use crate::view::{Matcher, View};
use crate::{Component, Global};

/// This type is used to build a world.
/// No more components or systems can be registered after the builder is built.
pub struct Builder {
    config:   Config,
    tracer:   Box<dyn Tracer>,
    registry: Registry,
    /// Store constructors, indexed by flag.
    builders: Vec<AnyBuilder>,
    /// Detach hooks, indexed by flag.
    hooks:    Vec<Vec<DetachHook>>,
    /// Kinds registered through [`Builder::register`].
    explicit: IndexSet<TypeId>,
    systems:  Vec<(Spec, Box<dyn System>)>,
    globals:  Globals,
    bus:      Bus,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            config:   Config::default(),
            tracer:   Box::new(tracer::Noop),
            registry: Registry::default(),
            builders: Vec::new(),
            hooks:    Vec::new(),
            explicit: IndexSet::new(),
            systems:  Vec::new(),
            globals:  Globals::default(),
            bus:      Bus::default(),
        }
    }
}

impl Builder {
    /// Creates an empty builder.
    pub fn new() -> Self { Self::default() }

    /// Sets the world configuration.
    pub fn config(&mut self, config: Config) -> &mut Self {
        self.config = config;
        self
    }

    /// Sets the tracer receiving scheduling and storage events.
    pub fn tracer(&mut self, tracer: impl Tracer + 'static) -> &mut Self {
        self.tracer = Box::new(tracer);
        self
    }

    /// Registers the component kind `C`, joining the groups in [`Component::GROUPS`].
    ///
    /// # Panics
    /// Panics if `C` was already registered through this method.
    pub fn register<C: Component>(&mut self) -> Flag {
        if !self.explicit.insert(TypeId::of::<C>()) {
            panic!("The component {} is registered twice", any::type_name::<C>());
        }
        self.flag::<C>()
    }

    /// Returns the flag of `C`, registering it if necessary.
    pub fn flag<C: Component>(&mut self) -> Flag { self.register_request(&Request::of::<C>()) }

    fn register_request(&mut self, request: &Request) -> Flag {
        let flag = self.registry.register(request.type_id, request.name);
        if flag.index() == self.builders.len() {
            self.builders.push(request.builder);
            self.hooks.push(Vec::new());
        }

        for &tag in request.groups {
            self.registry.join_group(tag, flag);
        }

        flag
    }

    /// Declares a flag group, which may have no members.
    pub fn declare_group(&mut self, tag: &'static str) -> &mut Self {
        self.registry.declare_group(tag);
        self
    }

    /// Adds the component kind `C` to the flag group `tag`.
    pub fn join_group<C: Component>(&mut self, tag: &'static str) -> &mut Self {
        let flag = self.flag::<C>();
        self.registry.join_group(tag, flag);
        self
    }

    /// Schedules a system, registering all component kinds its spec requests.
    ///
    /// # Panics
    /// Panics if another system with the same debug name was scheduled.
    pub fn schedule(&mut self, system: Box<dyn System>) -> &mut Self {
        let spec = system.spec();
        if self.systems.iter().any(|(other, _)| other.debug_name == spec.debug_name) {
            panic!("The system {} is scheduled twice", spec.debug_name);
        }

        spec.for_each_request(|request| {
            self.register_request(request);
        });
        log::debug!(
            "Scheduled system {} with priority {} requiring [{}]",
            spec.debug_name,
            spec.priority,
            spec.require.iter().map(|request| request.name).join(", ")
        );

        self.systems.push((spec, system));
        self
    }

    /// Provides a global state.
    ///
    /// # Panics
    /// Panics if the global state was already provided.
    pub fn global<G: Global>(&mut self, value: G) -> &mut Self {
        self.globals.insert(value);
        self
    }

    /// Gets a global state mutably, providing the default value if it was not provided yet.
    pub fn global_mut_or_default<G: Global + Default>(&mut self) -> &mut G {
        self.globals.get_or_default::<G>()
    }

    /// Returns whether the global state `G` was provided.
    pub fn has_global<G: Global>(&self) -> bool { self.globals.contains::<G>() }

    /// Calls `hook` whenever a `C` is detached from an entity,
    /// after the views have been updated.
    pub fn on_detach<C: Component>(&mut self, hook: DetachHook) -> &mut Self {
        let flag = self.flag::<C>();
        self.hooks[flag.index()].push(hook);
        self
    }

    /// Subscribes to events of type `E`.
    pub fn subscribe<E: 'static>(
        &mut self,
        handler: impl FnMut(&E, &mut State) + 'static,
    ) -> &mut Self {
        self.bus.subscribe(handler);
        self
    }

    /// Draws entities with a component in the flag group `group`
    /// with drawables built by `factory`.
    ///
    /// Groups are tried in registration order;
    /// the first group an entity is a member of decides its drawable.
    pub fn drawable(&mut self, group: &'static str, factory: drawable::Factory) -> &mut Self {
        self.declare_group(group);
        self.global_mut_or_default::<drawable::Registry>().insert(group, factory);
        self
    }

    /// Constructs the world from the builder.
    ///
    /// # Panics
    /// Panics if a system refers to an undeclared flag group
    /// or only excludes components without requiring any.
    pub fn build(self) -> World {
        let Self { config, tracer, registry, builders, hooks, systems, globals, bus, .. } = self;

        let stores = builders
            .iter()
            .enumerate()
            .map(|(index, builder)| builder(Flag::from_index(index), config.min_store_capacity))
            .collect();

        let mut views = Vec::new();
        let mut entries = Vec::with_capacity(systems.len());

        for (spec, system) in systems {
            if spec.has_only_negative_filters() {
                panic!(
                    "The system {} excludes components without requiring any component or group",
                    spec.debug_name
                );
            }

            let view = if spec.has_view() {
                views.push(build_view(&registry, &spec));
                Some(views.len() - 1)
            } else {
                None
            };

            entries.push(scheduler::Entry::new(spec.debug_name, spec.priority, view, system));
        }

        log::debug!(
            "Built world with {} component kinds, {} systems and {} views",
            registry.len(),
            entries.len(),
            views.len()
        );

        let emitter = bus.emitter().clone();
        let state = State {
            registry,
            stores,
            masks: SortedIndex::new(),
            views,
            hooks,
            globals,
            ealloc: Ealloc::default(),
            emitter,
            tracer,
            tick: 1,
        };

        World { state, scheduler: Scheduler::new(entries), bus }
    }
}

fn build_view(registry: &Registry, spec: &Spec) -> View {
    let flag_of = |request: &Request| {
        registry.flag_of(request.type_id).expect("requested kinds are registered on schedule")
    };

    let all: Mask = spec.require.iter().map(flag_of).collect();
    let none: Mask = spec.exclude.iter().map(flag_of).collect();
    let any = (!spec.any_group.is_empty()).then(|| {
        spec.any_group.iter().fold(Mask::new(), |union, &tag| match registry.group(tag) {
            Some(group) => union.union(&group),
            None => panic!(
                "The system {} refers to the undeclared flag group {tag:?}",
                spec.debug_name
            ),
        })
    });

    let columns = spec.require.iter().map(flag_of).collect();
    View::new(spec.debug_name.clone(), Matcher { all, none, any }, columns)
}
