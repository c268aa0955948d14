//! A view is the cached, incrementally maintained list of entities matching a system's filter.
//!
//! Each row of a view caches the slot index of the entity's record
//! in every store the system requires.
//! Slot indices are handles, not references:
//! a column of cached slots is only trusted while the epoch recorded for the column
//! equals the current epoch of its store.
//! Otherwise the slot is looked up again by binary search,
//! so a stale slot can never be observed.
//!
//! Store reallocations are handled in two phases.
//! On [`will_resize`](crate::storage::ResizeListener::will_resize),
//! every view that caches slots into the store nulls out that column;
//! on [`resized`](crate::storage::ResizeListener::resized), the column is re-resolved.
//! Columns of other stores are untouched.
//! Other structural changes only mark a column stale;
//! stale columns are re-resolved lazily before the owning system runs.

use crate::flag::{Flag, Mask};
use crate::sorted::SortedIndex;
use crate::storage::{self, AnyStore, Resize, ResizeListener};
use crate::tracer::Tracer;
use crate::world::State;
use crate::{Component, Entity};


/// A membership predicate over the flag mask of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matcher {
    /// Flags that must all be present.
    pub all:  Mask,
    /// Flags that must all be absent.
    pub none: Mask,
    /// If set, at least one of these flags must be present.
    pub any:  Option<Mask>,
}

impl Matcher {
    /// Tests whether an entity with `mask` matches.
    pub fn matches(&self, mask: &Mask) -> bool {
        mask.contains(&self.all)
            && !mask.intersects(&self.none)
            && self.any.map_or(true, |any| mask.intersects(&any))
    }
}

/// The state of a cached column, as observed against its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnStatus {
    /// Cached slots are valid for the current epoch of the store.
    Fresh,
    /// The store changed structurally since the column was resolved.
    Stale,
    /// The store is being reallocated and the column has been cleared.
    Invalidated,
}

#[derive(Debug)]
struct Column {
    flag:  Flag,
    /// The store epoch at which the column was resolved. `None` while invalidated.
    epoch: Option<u64>,
}

/// The cached entity list of a system.
#[derive(Debug)]
pub struct View {
    system:      String,
    matcher:     Matcher,
    columns:     Vec<Column>,
    rows:        SortedIndex<Entity, Vec<Option<usize>>>,
    resolutions: u64,
}

impl View {
    pub(crate) fn new(system: String, matcher: Matcher, flags: Vec<Flag>) -> Self {
        Self {
            system,
            matcher,
            columns: flags.into_iter().map(|flag| Column { flag, epoch: Some(0) }).collect(),
            rows: SortedIndex::new(),
            resolutions: 0,
        }
    }

    /// The debug name of the system owning this view.
    pub fn system(&self) -> &str { &self.system }

    /// The membership predicate of this view.
    pub fn matcher(&self) -> &Matcher { &self.matcher }

    /// Returns the number of matching entities.
    pub fn len(&self) -> usize { self.rows.len() }

    /// Returns whether no entity matches.
    pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    /// Returns whether `entity` matches.
    pub fn contains(&self, entity: Entity) -> bool { self.rows.contains_key(&entity) }

    /// Iterates over the matching entities in ascending order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ { self.rows.keys().copied() }

    /// Returns the number of times a column has been re-resolved.
    pub fn resolutions(&self) -> u64 { self.resolutions }

    /// Returns the status of the cached column for `flag`,
    /// or `None` if the view does not cache that kind.
    pub fn column_status(&self, flag: Flag, state: &State) -> Option<ColumnStatus> {
        let column = self.columns.get(self.column_index(flag)?)?;
        let store = state.store_by_flag(flag);
        Some(match column.epoch {
            None => ColumnStatus::Invalidated,
            Some(epoch) if epoch == store.epoch() => ColumnStatus::Fresh,
            Some(_) => ColumnStatus::Stale,
        })
    }

    /// Returns the cached slot of `entity` for `flag` without validating it.
    ///
    /// This is only useful for diagnostics; use [`get`](Self::get) to read components.
    pub fn cached_slot(&self, entity: Entity, flag: Flag) -> Option<usize> {
        let index = self.column_index(flag)?;
        self.rows.get(&entity).and_then(|slots| slots[index])
    }

    /// Reads the component `C` of a matching entity through the cached slot.
    pub fn get<'s, C: Component>(&self, state: &'s State, entity: Entity) -> Option<&'s C> {
        let flag = state.flag_of::<C>();
        let store = state.store_by_flag(flag);
        let slot = self.slot(entity, flag, store)?;
        storage::downcast_ref::<C>(store).get_at(slot).map(|(_, value)| value)
    }

    pub(crate) fn column_index(&self, flag: Flag) -> Option<usize> {
        self.columns.iter().position(|column| column.flag == flag)
    }

    pub(crate) fn rows(&self) -> impl Iterator<Item = (Entity, &[Option<usize>])> + '_ {
        self.rows.iter().map(|(&entity, slots)| (entity, slots.as_slice()))
    }

    /// Finds the slot of `entity` in `store`, using the cache when it is valid.
    pub(crate) fn slot(&self, entity: Entity, flag: Flag, store: &dyn AnyStore) -> Option<usize> {
        if let Some(index) = self.column_index(flag) {
            if self.columns[index].epoch == Some(store.epoch()) {
                if let Some(slots) = self.rows.get(&entity) {
                    let slot = slots[index];
                    debug_assert_eq!(slot.and_then(|slot| store.entity_at(slot)), slot.map(|_| entity));
                    return slot;
                }
            }
        }

        store.slot_of(entity)
    }

    /// Re-evaluates the membership of `entity`, whose flag mask is now `mask`.
    pub(crate) fn update_membership(
        &mut self,
        entity: Entity,
        mask: &Mask,
        stores: &[Box<dyn AnyStore>],
        tracer: &dyn Tracer,
    ) {
        let matches = self.matcher.matches(mask);
        let present = self.rows.contains_key(&entity);

        if matches && !present {
            let slots =
                self.columns.iter().map(|column| stores[column.flag.index()].slot_of(entity)).collect();
            self.rows.upsert(entity, slots);
            tracer.view_insert(&self.system, entity);
        } else if !matches && present {
            self.rows.delete(&entity);
            tracer.view_remove(&self.system, entity);
        }
    }

    /// Re-resolves every column whose store changed since it was last resolved.
    pub(crate) fn refresh(&mut self, stores: &[Box<dyn AnyStore>]) {
        for index in 0..self.columns.len() {
            let store = &*stores[self.columns[index].flag.index()];
            if self.columns[index].epoch != Some(store.epoch()) {
                self.resolve_column(index, store);
            }
        }
    }

    /// Nulls out the column for `flag`.
    fn invalidate(&mut self, flag: Flag) {
        if let Some(index) = self.column_index(flag) {
            self.columns[index].epoch = None;
            for slots in self.rows.values_mut() {
                slots[index] = None;
            }
        }
    }

    fn resolve_column(&mut self, index: usize, store: &dyn AnyStore) {
        // both the rows and the store are sorted by entity, so a single merge pass suffices
        let mut cursor = 0;
        for (&entity, slots) in self.rows.iter_mut() {
            while matches!(store.entity_at(cursor), Some(other) if other < entity) {
                cursor += 1;
            }
            slots[index] = (store.entity_at(cursor) == Some(entity)).then_some(cursor);
        }

        self.columns[index].epoch = Some(store.epoch());
        self.resolutions += 1;
    }
}

/// Forwards the resize protocol of one store to all views.
pub(crate) struct ViewListener<'t> {
    pub(crate) views:  &'t mut [View],
    pub(crate) tracer: &'t dyn Tracer,
    pub(crate) kind:   &'static str,
}

impl<'t> ResizeListener for ViewListener<'t> {
    fn will_resize(&mut self, resize: &Resize) {
        self.tracer.will_resize(self.kind, resize);
        for view in self.views.iter_mut() {
            view.invalidate(resize.flag);
        }
    }

    fn resized(&mut self, resize: &Resize, store: &dyn AnyStore) {
        for view in self.views.iter_mut() {
            if let Some(index) = view.column_index(resize.flag) {
                view.resolve_column(index, store);
            }
        }
        self.tracer.resized(self.kind, resize);
    }
}
