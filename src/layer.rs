//! Draw layers order drawables for compositing.
//!
//! Every entity with a [`DrawLayer`] is placed in one layer of the [`Index`],
//! at a z-index within that layer.
//! Layers composite in ascending [`LayerId`] order,
//! and entities within a layer in ascending z-index order,
//! with ties broken by the order in which they were placed.
//!
//! The z-index may be requested as [`ZIndex::Top`] or [`ZIndex::Bottom`],
//! which resolve to one above the current topmost or one below the current bottommost
//! entity of the layer when placed.
//! The resolved value then replaces the sentinel on the component.
//!
//! The [`LayerSystem`] synchronizes the index with the components in each update pass.
//! Re-placing is skipped for components whose layer and z-index did not change.

use std::collections::BTreeMap;

use crate::sorted::SortedIndex;
use crate::system::{self, Context, Spec};
use crate::world::{self, Builder, State};
use crate::{Component, Entity, Global};


/// The priority of [`LayerSystem`],
/// which runs after [`TransformSystem`](crate::transform::TransformSystem)
/// and before ordinary systems.
pub const LAYER_PRIORITY: i32 = -900;

/// Identifies a draw layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerId(pub i32);

/// The requested z-index of a drawable within its layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZIndex {
    /// An explicit z-index.
    At(i64),
    /// One above the topmost entity of the layer, or 0 if the layer is empty.
    ///
    /// Saturates at `i64::MAX`, where the entity ties with the topmost one and is placed after it.
    Top,
    /// One below the bottommost entity of the layer, or 0 if the layer is empty.
    ///
    /// Saturates at `i64::MIN`, where the entity ties with the bottommost one and is placed after it.
    Bottom,
}

/// Places an entity in the draw order.
///
/// Two components are equal if they request the same layer and z-index,
/// regardless of where they were last placed.
#[derive(Debug, Clone)]
pub struct DrawLayer {
    /// The layer of the entity.
    pub layer: LayerId,
    /// The z-index within the layer.
    pub z:     ZIndex,
    /// The `(layer, z)` at which the entity was last placed.
    placed:    Option<(LayerId, i64)>,
}

impl Component for DrawLayer {}

impl PartialEq for DrawLayer {
    fn eq(&self, other: &Self) -> bool { self.layer == other.layer && self.z == other.z }
}

impl Eq for DrawLayer {}

impl DrawLayer {
    /// Creates a draw layer component.
    pub fn new(layer: LayerId, z: ZIndex) -> Self { Self { layer, z, placed: None } }

    /// Places the entity on top of `layer`.
    pub fn top(layer: LayerId) -> Self { Self::new(layer, ZIndex::Top) }

    /// Requests a new z-index.
    pub fn set_z(&mut self, z: ZIndex) { self.z = z; }

    /// Moves the entity to another layer, keeping the requested z-index.
    pub fn set_layer(&mut self, layer: LayerId) { self.layer = layer; }

    /// The resolved z-index, if the entity was placed with its current request.
    pub fn resolved_z(&self) -> Option<i64> {
        match self.z {
            ZIndex::At(z) => Some(z),
            ZIndex::Top | ZIndex::Bottom => None,
        }
    }

    /// The `(layer, z)` at which the entity was last placed.
    pub fn placed(&self) -> Option<(LayerId, i64)> { self.placed }
}

/// The position of an entity in the [`Index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// The layer of the entity.
    pub layer: LayerId,
    /// The resolved z-index.
    pub z:     i64,
    /// Breaks ties between equal z-indices; increases with every placement.
    seq:       u64,
}

type Bucket = SortedIndex<(i64, u64), Entity>;

/// The compositing order of all placed entities.
#[derive(Debug, Default)]
pub struct Index {
    buckets:    BTreeMap<LayerId, Bucket>,
    placements: SortedIndex<Entity, Placement>,
    next_seq:   u64,
}

impl Global for Index {}

impl Index {
    /// Returns the number of placed entities.
    pub fn len(&self) -> usize { self.placements.len() }

    /// Returns whether no entity is placed.
    pub fn is_empty(&self) -> bool { self.placements.is_empty() }

    /// Returns the placement of `entity`.
    pub fn placement(&self, entity: Entity) -> Option<Placement> {
        self.placements.get(&entity).copied()
    }

    /// Places `entity` in `layer`, removing it from its previous position.
    ///
    /// Returns the resolved z-index.
    pub fn place(&mut self, entity: Entity, layer: LayerId, z: ZIndex) -> i64 {
        self.remove(entity);

        let bucket = self.buckets.entry(layer).or_default();
        let z = match z {
            ZIndex::At(z) => z,
            ZIndex::Top => bucket.last().map_or(0, |(&(z, _), _)| z.saturating_add(1)),
            ZIndex::Bottom => bucket.first().map_or(0, |(&(z, _), _)| z.saturating_sub(1)),
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        bucket.upsert((z, seq), entity);
        self.placements.upsert(entity, Placement { layer, z, seq });

        log::trace!("Placed {entity:?} in layer {} at z {z}", layer.0);
        z
    }

    /// Removes `entity` from the index, returning its placement.
    pub fn remove(&mut self, entity: Entity) -> Option<Placement> {
        let placement = self.placements.remove(&entity)?;

        if let Some(bucket) = self.buckets.get_mut(&placement.layer) {
            bucket.delete(&(placement.z, placement.seq));
            if bucket.is_empty() {
                self.buckets.remove(&placement.layer);
            }
        }

        Some(placement)
    }

    /// Places `entity` according to its component,
    /// replacing a `Top` or `Bottom` request with the resolved z-index.
    ///
    /// Returns whether the entity was re-placed.
    /// Entities already placed at the requested layer and z-index are skipped.
    pub fn sync(&mut self, entity: Entity, layer: &mut DrawLayer) -> bool {
        if let (ZIndex::At(z), Some(placement)) = (layer.z, self.placements.get(&entity)) {
            if placement.layer == layer.layer && placement.z == z {
                layer.placed = Some((placement.layer, placement.z));
                return false;
            }
        }

        let z = self.place(entity, layer.layer, layer.z);
        layer.z = ZIndex::At(z);
        layer.placed = Some((layer.layer, z));
        true
    }

    /// Iterates over the entities of one layer in ascending z-index order.
    pub fn layer(&self, layer: LayerId) -> impl Iterator<Item = (i64, Entity)> + '_ {
        self.buckets
            .get(&layer)
            .into_iter()
            .flat_map(|bucket| bucket.iter().map(|(&(z, _), &entity)| (z, entity)))
    }

    /// The layers with at least one entity, in ascending order.
    pub fn layers(&self) -> impl Iterator<Item = LayerId> + '_ { self.buckets.keys().copied() }

    /// Iterates over all placed entities in compositing order.
    pub fn iter(&self) -> impl Iterator<Item = (LayerId, i64, Entity)> + '_ {
        self.buckets.iter().flat_map(|(&layer, bucket)| {
            bucket.iter().map(move |(&(z, _), &entity)| (layer, z, entity))
        })
    }

    /// Calls `f` on every placed entity in compositing order.
    pub fn each_in_order(&self, mut f: impl FnMut(LayerId, i64, Entity)) {
        for (layer, z, entity) in self.iter() {
            f(layer, z, entity);
        }
    }
}

/// Places the entity immediately instead of waiting for the next [`LayerSystem`] update.
///
/// Returns the resolved z-index, or `None` if the entity has no [`DrawLayer`].
pub fn sync(state: &mut State, entity: Entity) -> Option<i64> {
    let (store, index) = state.store_and_global_mut::<DrawLayer, Index>();
    let layer = store.get_mut(entity)?;
    index.sync(entity, layer);
    layer.resolved_z()
}

fn remove_from_index(state: &mut State, entity: Entity) {
    if let Some(index) = state.try_global_mut::<Index>() {
        index.remove(entity);
    }
}

/// Synchronizes the [`Index`] with [`DrawLayer`] components in each update pass.
pub struct LayerSystem;

impl LayerSystem {
    /// The debug name of the system.
    pub const NAME: &'static str = "scenec::layer::LayerSystem";
}

impl system::System for LayerSystem {
    fn spec(&self) -> Spec { Spec::new(Self::NAME).priority(LAYER_PRIORITY).uses::<DrawLayer>() }

    fn update(&mut self, ctx: &mut Context<'_>) {
        let (store, index) = ctx.store_and_global_mut::<DrawLayer, Index>();
        let mut moved = 0;
        for (entity, layer) in store.iter_mut() {
            if index.sync(entity, layer) {
                moved += 1;
            }
        }
        if moved > 0 {
            log::trace!("Re-placed {moved} entities in the draw order");
        }
    }
}

/// Registers [`DrawLayer`], the [`Index`] and the [`LayerSystem`].
pub struct Bundle;

impl world::Bundle for Bundle {
    fn register(&self, builder: &mut Builder) {
        builder.register::<DrawLayer>();
        builder.on_detach::<DrawLayer>(remove_from_index);
        builder.global_mut_or_default::<Index>();
        builder.schedule(Box::new(LayerSystem));
    }
}
