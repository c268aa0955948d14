//! Hierarchical 2D transforms.
//!
//! A [`Transform`] holds the local pose of an entity and an optional parent entity.
//! The world matrix of an entity is `parent_world * local`,
//! where `local` applies scale, then rotation, then translation to a point.
//! Entities without a parent, or whose parent has no transform, use the identity as `parent_world`.
//!
//! World matrices are memoized per [tick](crate::world::State::tick):
//! within one tick, each transform in a chain is evaluated at most once,
//! regardless of how many descendants are resolved.
//! The [`TransformSystem`] resolves every transform early in each update pass,
//! so later systems read the cached matrices.
//!
//! Parent links form a forest.
//! [`set_parent`] rejects links that would create a cycle,
//! and detaching the transform of a parent clears the links of its children.

use glam::{Affine2, Vec2};

use crate::system::{self, Context, Spec};
use crate::world::{self, Builder, State};
use crate::{Component, Entity, Global};


/// The priority of [`TransformSystem`], which runs before ordinary systems.
pub const TRANSFORM_PRIORITY: i32 = -1000;

/// The local pose of an entity and its cached world matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The local translation along the x axis.
    pub x:         f32,
    /// The local translation along the y axis.
    pub y:         f32,
    /// The local rotation in radians, counterclockwise.
    pub rotation:  f32,
    /// The local scale along the x axis.
    pub scale_x:   f32,
    /// The local scale along the y axis.
    pub scale_y:   f32,
    parent:        Option<Entity>,
    world:         Affine2,
    resolved_tick: u64,
}

impl Component for Transform {}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x:             0.0,
            y:             0.0,
            rotation:      0.0,
            scale_x:       1.0,
            scale_y:       1.0,
            parent:        None,
            world:         Affine2::IDENTITY,
            resolved_tick: 0,
        }
    }
}

impl Transform {
    /// Creates a transform translated to `(x, y)` without a parent.
    pub fn new(x: f32, y: f32) -> Self { Self { x, y, ..Self::default() } }

    /// Sets the rotation.
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Sets the scale.
    pub fn with_scale(mut self, scale_x: f32, scale_y: f32) -> Self {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self
    }

    /// Moves the local position to `(x, y)`.
    pub fn set_position(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    /// Sets the local rotation in radians.
    pub fn set_rotation(&mut self, rotation: f32) { self.rotation = rotation; }

    /// Sets the local scale.
    pub fn set_scale(&mut self, scale_x: f32, scale_y: f32) {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
    }

    /// Moves the local position by `(dx, dy)`.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    /// The parent entity.
    pub fn parent(&self) -> Option<Entity> { self.parent }

    /// The local matrix, applying scale, rotation and translation in that order.
    pub fn local_matrix(&self) -> Affine2 {
        Affine2::from_scale_angle_translation(
            Vec2::new(self.scale_x, self.scale_y),
            self.rotation,
            Vec2::new(self.x, self.y),
        )
    }

    /// The world matrix cached at [`resolved_tick`](Self::resolved_tick).
    pub fn cached_world(&self) -> Affine2 { self.world }

    /// The tick at which the world matrix was last resolved, or 0 if never.
    pub fn resolved_tick(&self) -> u64 { self.resolved_tick }
}

/// A recoverable error when editing the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    /// The entity has no [`Transform`].
    #[error("{0:?} has no transform")]
    MissingTransform(Entity),
    /// The parent is the child itself or one of its descendants.
    #[error("{parent:?} cannot become the parent of {child:?} because it descends from it")]
    Cycle {
        /// The entity whose parent was being set.
        child:  Entity,
        /// The requested parent.
        parent: Entity,
    },
}

/// Counts the work done by the resolver.
#[derive(Debug, Default)]
pub struct Resolver {
    evaluations: u64,
}

impl Global for Resolver {}

impl Resolver {
    /// The number of world matrices computed so far, excluding cache hits.
    pub fn evaluations(&self) -> u64 { self.evaluations }
}

/// Sets the parent of `child`.
///
/// # Errors
/// - [`HierarchyError::MissingTransform`] if `child` or `parent` has no transform.
/// - [`HierarchyError::Cycle`] if `parent` is `child` or one of its descendants.
pub fn set_parent(
    state: &mut State,
    child: Entity,
    parent: Option<Entity>,
) -> Result<(), HierarchyError> {
    let store = state.store::<Transform>();
    if !store.contains(child) {
        return Err(HierarchyError::MissingTransform(child));
    }

    if let Some(parent) = parent {
        if !store.contains(parent) {
            return Err(HierarchyError::MissingTransform(parent));
        }

        let mut cursor = Some(parent);
        while let Some(ancestor) = cursor {
            if ancestor == child {
                return Err(HierarchyError::Cycle { child, parent });
            }
            cursor = store.get(ancestor).and_then(|transform| transform.parent);
        }
    }

    let transform = state.get_mut::<Transform>(child).expect("checked above");
    transform.parent = parent;
    log::trace!("Set parent of {child:?} to {parent:?}");
    Ok(())
}

/// Returns the parent of `entity`.
pub fn parent_of(state: &State, entity: Entity) -> Option<Entity> {
    state.get::<Transform>(entity).and_then(Transform::parent)
}

/// Returns the entities whose parent is `parent`, in ascending order.
pub fn children_of(state: &State, parent: Entity) -> Vec<Entity> {
    state
        .iter::<Transform>()
        .filter(|(_, transform)| transform.parent == Some(parent))
        .map(|(child, _)| child)
        .collect()
}

/// Resolves the world matrix of `entity`, caching it for the current tick.
///
/// Returns `None` if `entity` has no transform.
pub fn resolve(state: &mut State, entity: Entity) -> Option<Affine2> {
    let tick = state.tick();
    let (store, resolver) = state.store_and_global_mut::<Transform, Resolver>();

    if !store.contains(entity) {
        return None;
    }

    // collect the unresolved part of the chain, starting from `entity`
    let mut chain = Vec::new();
    let mut base = Affine2::IDENTITY;
    let mut cursor = Some(entity);
    while let Some(current) = cursor {
        let transform = match store.get(current) {
            Some(transform) => transform,
            None => break,
        };
        if transform.resolved_tick == tick {
            base = transform.world;
            break;
        }

        chain.push(current);
        debug_assert!(chain.len() <= store.len(), "parent links contain a cycle");
        cursor = transform.parent;
    }

    for &current in chain.iter().rev() {
        let transform = store.get_mut(current).expect("chain only contains stored entities");
        transform.world = base * transform.local_matrix();
        transform.resolved_tick = tick;
        base = transform.world;
        resolver.evaluations += 1;
    }

    Some(base)
}

/// Computes the world matrix of `entity` without updating the cache.
///
/// Cached matrices of the current tick are reused.
pub fn world_matrix(state: &State, entity: Entity) -> Option<Affine2> {
    let tick = state.tick();
    let store = state.store::<Transform>();

    let mut chain = Vec::new();
    let mut base = Affine2::IDENTITY;
    let mut cursor = Some(entity);
    while let Some(current) = cursor {
        let transform = match store.get(current) {
            Some(transform) => transform,
            None if current == entity => return None,
            None => break,
        };
        if transform.resolved_tick == tick {
            base = transform.world;
            break;
        }

        chain.push(transform);
        cursor = transform.parent;
    }

    Some(chain.iter().rev().fold(base, |world, transform| world * transform.local_matrix()))
}

/// Computes the world position of `entity`.
pub fn world_position(state: &State, entity: Entity) -> Option<Vec2> {
    world_matrix(state, entity).map(|matrix| matrix.translation)
}

fn clear_children(state: &mut State, parent: Entity) {
    for (child, transform) in state.iter_mut::<Transform>() {
        if transform.parent == Some(parent) {
            transform.parent = None;
            log::trace!("Cleared parent of {child:?} because {parent:?} lost its transform");
        }
    }
}

/// Resolves every transform once per update pass.
pub struct TransformSystem;

impl TransformSystem {
    /// The debug name of the system.
    pub const NAME: &'static str = "scenec::transform::TransformSystem";
}

impl system::System for TransformSystem {
    fn spec(&self) -> Spec { Spec::new(Self::NAME).priority(TRANSFORM_PRIORITY).require::<Transform>() }

    fn update(&mut self, ctx: &mut Context<'_>) {
        for entity in ctx.entities() {
            resolve(ctx, entity);
        }
    }
}

/// Registers [`Transform`], the [`Resolver`] and the [`TransformSystem`].
pub struct Bundle;

impl world::Bundle for Bundle {
    fn register(&self, builder: &mut Builder) {
        builder.register::<Transform>();
        builder.on_detach::<Transform>(clear_children);
        builder.global_mut_or_default::<Resolver>();
        builder.schedule(Box::new(TransformSystem));
    }
}
