use std::any::{self, Any, TypeId};

use crate::entity::Ealloc;
use crate::event::Emitter;
use crate::flag::{Flag, Mask, Registry};
use crate::global::Globals;
use crate::sorted::SortedIndex;
use crate::storage::{self, AnyStore, ComponentStore};
use crate::tracer::Tracer;
use crate::view::{View, ViewListener};
use crate::{Component, Entity, Global};

/// A function called after a component of some kind is detached from an entity.
pub type DetachHook = fn(&mut State, Entity);

/// Stores the entities, components and global states of a world.
///
/// [`World`](super::World) and [`Context`](crate::system::Context) dereference to this type,
/// so component operations are uniform between the host and systems.
pub struct State {
    pub(crate) registry: Registry,
    /// Type-erased component stores, indexed by flag.
    pub(crate) stores:   Vec<Box<dyn AnyStore>>,
    /// The flags of the components attached to each entity.
    /// Entities without components have no entry.
    pub(crate) masks:    SortedIndex<Entity, Mask>,
    pub(crate) views:    Vec<View>,
    /// Detach hooks, indexed by flag.
    pub(crate) hooks:    Vec<Vec<DetachHook>>,
    pub(crate) globals:  Globals,
    pub(crate) ealloc:   Ealloc,
    pub(crate) emitter:  Emitter,
    pub(crate) tracer:   Box<dyn Tracer>,
    pub(crate) tick:     u64,
}

impl State {
    /// Allocates a new entity without components.
    pub fn spawn(&mut self) -> Entity { self.ealloc.allocate() }

    /// Detaches all components from `entity`.
    ///
    /// The entity id is never reused and components may be attached to it again.
    pub fn despawn(&mut self, entity: Entity) {
        let mask = self.mask_of(entity);
        for flag in mask.flags() {
            self.detach_flag(entity, flag);
        }
        log::trace!("Despawned {entity:?}");
    }

    /// Attaches `value` to `entity`, returning the replaced value if the entity already had one.
    ///
    /// # Panics
    /// Panics if `C` is not registered or `entity` was not allocated by this world.
    pub fn attach<C: Component>(&mut self, entity: Entity, value: C) -> Option<C> {
        self.assert_allocated(entity);
        let flag = self.flag_of::<C>();

        let store = storage::downcast_mut::<C>(self.stores[flag.index()].as_mut());
        let mut listener =
            ViewListener { views: &mut self.views, tracer: &*self.tracer, kind: any::type_name::<C>() };
        let replaced = store.upsert_with(entity, value, &mut listener);

        if replaced.is_none() {
            self.on_attached(entity, flag);
        }
        replaced
    }

    /// Attaches a type-erased component of the kind with `flag`,
    /// returning whether the entity did not have one before.
    ///
    /// # Panics
    /// Panics if `value` is not of the kind with `flag`.
    pub fn attach_boxed(&mut self, entity: Entity, flag: Flag, value: Box<dyn Any>) -> bool {
        self.assert_allocated(entity);

        let store = self.stores[flag.index()].as_mut();
        let kind = store.type_name();
        let mut listener = ViewListener { views: &mut self.views, tracer: &*self.tracer, kind };
        let inserted = store.upsert_boxed(entity, value, &mut listener);

        if inserted {
            self.on_attached(entity, flag);
        }
        inserted
    }

    /// Detaches the component `C` from `entity`, returning it.
    pub fn detach<C: Component>(&mut self, entity: Entity) -> Option<C> {
        let flag = self.flag_of::<C>();
        let value = storage::downcast_mut::<C>(self.stores[flag.index()].as_mut()).remove(entity)?;
        self.on_detached(entity, flag);
        Some(value)
    }

    /// Detaches the component of the kind with `flag` from `entity`, returning it boxed.
    pub fn detach_flag(&mut self, entity: Entity, flag: Flag) -> Option<Box<dyn Any>> {
        let value = self.stores[flag.index()].remove_boxed(entity)?;
        self.on_detached(entity, flag);
        Some(value)
    }

    fn assert_allocated(&self, entity: Entity) {
        assert!(
            self.ealloc.is_allocated(entity),
            "Cannot attach components to {entity:?} because it was not allocated by this world"
        );
    }

    fn on_attached(&mut self, entity: Entity, flag: Flag) {
        let mut mask = self.mask_of(entity);
        mask.insert(flag);
        self.masks.upsert(entity, mask);
        log::trace!("Attached {} to {entity:?}", self.registry.kind(flag).name);

        self.update_views(entity, &mask);
    }

    fn on_detached(&mut self, entity: Entity, flag: Flag) {
        let mut mask = self.mask_of(entity);
        mask.remove(flag);
        if mask.is_empty() {
            self.masks.delete(&entity);
        } else {
            self.masks.upsert(entity, mask);
        }
        log::trace!("Detached {} from {entity:?}", self.registry.kind(flag).name);

        self.update_views(entity, &mask);

        for index in 0..self.hooks[flag.index()].len() {
            let hook = self.hooks[flag.index()][index];
            hook(self, entity);
        }
    }

    fn update_views(&mut self, entity: Entity, mask: &Mask) {
        for view in &mut self.views {
            view.update_membership(entity, mask, &self.stores, &*self.tracer);
        }
    }

    pub(crate) fn refresh_view(&mut self, index: usize) { self.views[index].refresh(&self.stores); }

    /// Gets the component `C` of `entity`.
    pub fn get<C: Component>(&self, entity: Entity) -> Option<&C> { self.store::<C>().get(entity) }

    /// Gets the component `C` of `entity` mutably.
    ///
    /// Mutating a component in place is not a structural change,
    /// so it does not affect views or cached slots.
    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        self.store_mut::<C>().get_mut(entity)
    }

    /// Returns whether `entity` has the component `C`.
    pub fn has<C: Component>(&self, entity: Entity) -> bool { self.store::<C>().contains(entity) }

    /// Returns the flags of the components attached to `entity`.
    pub fn mask_of(&self, entity: Entity) -> Mask {
        self.masks.get(&entity).copied().unwrap_or_default()
    }

    /// Iterates over the entities with at least one component, in ascending order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ { self.masks.keys().copied() }

    /// Returns the store of `C`.
    pub fn store<C: Component>(&self) -> &ComponentStore<C> {
        storage::downcast_ref::<C>(self.store_by_flag(self.flag_of::<C>()))
    }

    /// Returns the store of `C` mutably.
    ///
    /// Structural changes must go through [`attach`](Self::attach) and [`detach`](Self::detach),
    /// so only in-place access is exposed.
    fn store_mut<C: Component>(&mut self) -> &mut ComponentStore<C> {
        let flag = self.flag_of::<C>();
        storage::downcast_mut::<C>(self.stores[flag.index()].as_mut())
    }

    pub(crate) fn store_by_flag(&self, flag: Flag) -> &dyn AnyStore { &*self.stores[flag.index()] }

    /// Iterates over all components of kind `C` in ascending entity order.
    pub fn iter<C: Component>(&self) -> impl Iterator<Item = (Entity, &C)> + '_ {
        self.store::<C>().iter()
    }

    /// Iterates mutably over all components of kind `C` in ascending entity order.
    pub fn iter_mut<C: Component>(&mut self) -> impl Iterator<Item = (Entity, &mut C)> + '_ {
        self.store_mut::<C>().iter_mut()
    }

    /// Returns the flag of `C`.
    ///
    /// # Panics
    /// Panics if `C` is not registered.
    pub fn flag_of<C: Component>(&self) -> Flag {
        match self.try_flag_of::<C>() {
            Some(flag) => flag,
            None => panic!(
                "The component {} cannot be used because it was not registered",
                any::type_name::<C>()
            ),
        }
    }

    /// Returns the flag of `C`, if it is registered.
    pub fn try_flag_of<C: Component>(&self) -> Option<Flag> {
        self.registry.flag_of(TypeId::of::<C>())
    }

    /// The flag registry of this world.
    pub fn registry(&self) -> &Registry { &self.registry }

    /// Gets a global state.
    ///
    /// # Panics
    /// Panics if the global state was not provided.
    pub fn global<G: Global>(&self) -> &G { self.globals.get::<G>() }

    /// Gets a global state mutably.
    ///
    /// # Panics
    /// Panics if the global state was not provided.
    pub fn global_mut<G: Global>(&mut self) -> &mut G { self.globals.get_mut::<G>() }

    /// Gets a global state if it was provided.
    pub fn try_global<G: Global>(&self) -> Option<&G> { self.globals.try_get::<G>() }

    /// Gets a global state mutably if it was provided.
    pub fn try_global_mut<G: Global>(&mut self) -> Option<&mut G> {
        self.globals.try_get_mut::<G>()
    }

    /// Borrows the store of `C` and the global state `G` mutably at the same time.
    pub(crate) fn store_and_global_mut<C: Component, G: Global + Default>(
        &mut self,
    ) -> (&mut ComponentStore<C>, &mut G) {
        let flag = self.flag_of::<C>();
        let store = storage::downcast_mut::<C>(self.stores[flag.index()].as_mut());
        (store, self.globals.get_or_default::<G>())
    }

    /// Queues an event for the next drain.
    pub fn emit<E: Send + 'static>(&self, event: E) { self.emitter.emit(event); }

    /// Returns a handle that queues events from anywhere, including other threads.
    pub fn emitter(&self) -> Emitter { self.emitter.clone() }

    /// The current tick.
    ///
    /// A new tick starts with every update pass.
    pub fn tick(&self) -> u64 { self.tick }

    /// Starts a new tick, invalidating per-tick caches.
    pub fn advance_tick(&mut self) {
        self.tick += 1;
        log::trace!("Advanced to tick {}", self.tick);
    }

    /// Returns the view of the system named `system`, if it has one.
    pub fn view(&self, system: &str) -> Option<&View> {
        self.views.iter().find(|view| view.system() == system)
    }

    /// Iterates over the views of all systems.
    pub fn views(&self) -> impl Iterator<Item = &View> + '_ { self.views.iter() }

    /// The tracer receiving storage and scheduling events.
    pub fn tracer(&self) -> &dyn Tracer { &*self.tracer }
}
