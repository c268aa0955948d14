//! A storage is the data structure where components of the same kind for all entities are stored.
//!
//! Records are kept in an array sorted by entity id.
//! Capacity is managed explicitly so that reallocation of the array
//! is an observable event: before the array grows,
//! [`ResizeListener::will_resize`] is called so that consumers drop cached slots,
//! and afterwards [`ResizeListener::resized`] is called so that they can re-resolve them.
//!
//! Every structural change (inserting a new entity or removing one) advances the store's
//! [epoch](ComponentStore::epoch),
//! which lets consumers detect that a cached slot index may have shifted.

use std::any::{self, Any};

use crate::comp::Component;
use crate::flag::Flag;
use crate::sorted::SortedIndex;
use crate::Entity;


/// The default minimum capacity of a store, allocated on first insertion.
pub const DEFAULT_MIN_CAPACITY: usize = 4;

/// Describes a capacity change of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resize {
    /// The flag of the resized store.
    pub flag:         Flag,
    /// The capacity before the resize.
    pub old_capacity: usize,
    /// The capacity after the resize.
    pub new_capacity: usize,
}

/// Receives the two phases of a store resize.
pub trait ResizeListener {
    /// The backing array of the store is about to be reallocated.
    /// Any cached slot into the store must be dropped.
    fn will_resize(&mut self, resize: &Resize);

    /// The backing array has been reallocated and the pending record inserted.
    /// Cached slots may be re-resolved from `store`.
    fn resized(&mut self, resize: &Resize, store: &dyn AnyStore);
}

impl ResizeListener for () {
    fn will_resize(&mut self, _: &Resize) {}
    fn resized(&mut self, _: &Resize, _: &dyn AnyStore) {}
}

/// Stores the components of kind `C` for all entities.
pub struct ComponentStore<C> {
    flag:         Flag,
    records:      SortedIndex<Entity, C>,
    capacity:     usize,
    min_capacity: usize,
    epoch:        u64,
}

impl<C: Component> ComponentStore<C> {
    /// Creates an empty store for the kind with `flag`.
    ///
    /// No memory is allocated until the first insertion,
    /// which allocates `min_capacity` records.
    pub fn new(flag: Flag, min_capacity: usize) -> Self {
        Self {
            flag,
            records: SortedIndex::new(),
            capacity: 0,
            min_capacity: min_capacity.max(1),
            epoch: 0,
        }
    }

    /// The flag of the component kind stored.
    pub fn flag(&self) -> Flag { self.flag }

    /// Returns the number of records.
    pub fn len(&self) -> usize { self.records.len() }

    /// Returns whether the store has no records.
    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    /// Returns the number of records the store can hold before the next resize.
    pub fn capacity(&self) -> usize { self.capacity }

    /// Returns the structural epoch of the store.
    ///
    /// The epoch changes whenever a slot index may have shifted.
    pub fn epoch(&self) -> u64 { self.epoch }

    /// Gets the component for `entity`.
    pub fn get(&self, entity: Entity) -> Option<&C> { self.records.get(&entity) }

    /// Gets the component for `entity` mutably.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut C> { self.records.get_mut(&entity) }

    /// Returns whether `entity` has a component in this store.
    pub fn contains(&self, entity: Entity) -> bool { self.records.contains_key(&entity) }

    /// Returns the array position of the record for `entity`.
    ///
    /// The position is only meaningful until the [epoch](Self::epoch) changes.
    pub fn slot_of(&self, entity: Entity) -> Option<usize> { self.records.position_of(&entity) }

    /// Returns the record at array position `slot`.
    pub fn get_at(&self, slot: usize) -> Option<(Entity, &C)> {
        self.records.get_index(slot).map(|(&entity, value)| (entity, value))
    }

    /// Returns the record at array position `slot` mutably.
    pub fn get_at_mut(&mut self, slot: usize) -> Option<(Entity, &mut C)> {
        self.records.get_index_mut(slot).map(|(&entity, value)| (entity, value))
    }

    /// Inserts or replaces the component for `entity`, returning the replaced value.
    pub fn upsert(&mut self, entity: Entity, value: C) -> Option<C> {
        self.upsert_with(entity, value, &mut ())
    }

    /// Inserts or replaces the component for `entity`,
    /// notifying `listener` if the insertion reallocates the backing array.
    ///
    /// Replacing an existing component never reallocates or shifts records.
    pub fn upsert_with(
        &mut self,
        entity: Entity,
        value: C,
        listener: &mut dyn ResizeListener,
    ) -> Option<C> {
        if let Some(slot) = self.records.get_mut(&entity) {
            return Some(std::mem::replace(slot, value));
        }

        let resize = (self.records.len() >= self.capacity).then(|| Resize {
            flag:         self.flag,
            old_capacity: self.capacity,
            new_capacity: (self.capacity * 2).max(self.min_capacity),
        });

        if let Some(resize) = &resize {
            log::trace!(
                "Resizing store of {} from {} to {}",
                any::type_name::<C>(),
                resize.old_capacity,
                resize.new_capacity
            );
            listener.will_resize(resize);
            self.records.reserve_exact(resize.new_capacity - self.records.len());
            self.capacity = resize.new_capacity;
        }

        let replaced = self.records.upsert(entity, value);
        debug_assert!(replaced.is_none(), "entity was checked to be absent");
        self.epoch += 1;

        if let Some(resize) = &resize {
            listener.resized(resize, self);
        }

        None
    }

    /// Removes the component for `entity`, returning it.
    ///
    /// Later records are shifted down to keep the array contiguous and sorted.
    pub fn remove(&mut self, entity: Entity) -> Option<C> {
        let value = self.records.remove(&entity)?;
        self.epoch += 1;
        Some(value)
    }

    /// Iterates over all records in ascending entity order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &C)> + '_ {
        self.records.iter().map(|(&entity, value)| (entity, value))
    }

    /// Iterates over all records in ascending entity order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut C)> + '_ {
        self.records.iter_mut().map(|(&entity, value)| (entity, value))
    }
}

/// Constructs a type-erased store for a kind.
pub(crate) type AnyBuilder = fn(Flag, usize) -> Box<dyn AnyStore>;

/// Returns the [`AnyBuilder`] for `C`.
pub(crate) fn builder<C: Component>() -> AnyBuilder {
    |flag, min_capacity| Box::new(ComponentStore::<C>::new(flag, min_capacity))
}

/// Type-erased access to a [`ComponentStore`].
pub trait AnyStore {
    /// The flag of the stored kind.
    fn flag(&self) -> Flag;

    /// The type name of the stored kind.
    fn type_name(&self) -> &'static str;

    /// The number of records.
    fn len(&self) -> usize;

    /// The capacity before the next resize.
    fn capacity(&self) -> usize;

    /// The structural epoch.
    fn epoch(&self) -> u64;

    /// Returns whether `entity` has a record.
    fn contains(&self, entity: Entity) -> bool;

    /// Returns the array position of the record for `entity`.
    fn slot_of(&self, entity: Entity) -> Option<usize>;

    /// Returns the entity of the record at `slot`.
    fn entity_at(&self, slot: usize) -> Option<Entity>;

    /// Inserts or replaces a boxed component,
    /// returning whether a new record was inserted.
    ///
    /// # Panics
    /// Panics if `value` is not of the stored kind.
    fn upsert_boxed(
        &mut self,
        entity: Entity,
        value: Box<dyn Any>,
        listener: &mut dyn ResizeListener,
    ) -> bool;

    /// Removes the record for `entity`, returning the boxed component.
    fn remove_boxed(&mut self, entity: Entity) -> Option<Box<dyn Any>>;

    /// Upcasts to [`Any`] for downcasting to the concrete store.
    fn as_any(&self) -> &dyn Any;

    /// Upcasts to [`Any`] for downcasting to the concrete store.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<C: Component> AnyStore for ComponentStore<C> {
    fn flag(&self) -> Flag { self.flag }

    fn type_name(&self) -> &'static str { any::type_name::<C>() }

    fn len(&self) -> usize { self.records.len() }

    fn capacity(&self) -> usize { self.capacity }

    fn epoch(&self) -> u64 { self.epoch }

    fn contains(&self, entity: Entity) -> bool { self.records.contains_key(&entity) }

    fn slot_of(&self, entity: Entity) -> Option<usize> { self.records.position_of(&entity) }

    fn entity_at(&self, slot: usize) -> Option<Entity> {
        self.records.get_index(slot).map(|(&entity, _)| entity)
    }

    fn upsert_boxed(
        &mut self,
        entity: Entity,
        value: Box<dyn Any>,
        listener: &mut dyn ResizeListener,
    ) -> bool {
        let value = match value.downcast::<C>() {
            Ok(value) => *value,
            Err(_) => panic!(
                "Cannot attach a value of the wrong kind to the store of {}",
                any::type_name::<C>()
            ),
        };
        self.upsert_with(entity, value, listener).is_none()
    }

    fn remove_boxed(&mut self, entity: Entity) -> Option<Box<dyn Any>> {
        self.remove(entity).map(|value| Box::new(value) as Box<dyn Any>)
    }

    fn as_any(&self) -> &dyn Any { self }

    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}

/// Downcasts a type-erased store to the store of `C`.
pub(crate) fn downcast_ref<C: Component>(store: &dyn AnyStore) -> &ComponentStore<C> {
    match store.as_any().downcast_ref::<ComponentStore<C>>() {
        Some(store) => store,
        None => panic!("Store of {} does not hold {}", store.type_name(), any::type_name::<C>()),
    }
}

/// Downcasts a type-erased store to the store of `C` mutably.
pub(crate) fn downcast_mut<C: Component>(store: &mut dyn AnyStore) -> &mut ComponentStore<C> {
    let type_name = store.type_name();
    match store.as_any_mut().downcast_mut::<ComponentStore<C>>() {
        Some(store) => store,
        None => panic!("Store of {} does not hold {}", type_name, any::type_name::<C>()),
    }
}
