//! Drawables turn components into draw calls.
//!
//! Component kinds that can be drawn join a flag group (by default [`GROUP`]).
//! Each group is mapped to a [`Factory`]
//! through [`Builder::drawable`](crate::world::Builder::drawable).
//! In the draw pass, the [`Compositor`] walks the [draw order](crate::layer::Index),
//! builds the drawable of each entity from the first registered group it is a member of,
//! and draws it with the entity's world matrix onto the host's render target.

use std::any::Any;

use glam::Affine2;
use indexmap::IndexMap;

use crate::layer::{self, DrawLayer};
use crate::system::{self, DrawContext, Spec};
use crate::transform::{self, Transform};
use crate::world::{self, Builder, State};
use crate::{Entity, Global};

#[cfg(test)]
mod tests;

/// The flag group of component kinds drawn by the [`Compositor`].
pub const GROUP: &str = "drawable";

/// The priority of [`Compositor`], which draws after ordinary systems.
pub const COMPOSITOR_PRIORITY: i32 = 1000;

/// Something that can be drawn onto a render target.
pub trait Drawable {
    /// Draws onto `target` with the world matrix of the entity.
    ///
    /// The type of `target` is decided by the host;
    /// drawables should ignore targets they cannot downcast.
    fn draw(&self, world: Affine2, target: &mut dyn Any);
}

/// Builds the drawable of an entity.
pub type Factory = fn(&State, Entity) -> Option<Box<dyn Drawable>>;

/// Maps flag groups to drawable factories.
#[derive(Default)]
pub struct Registry {
    factories: IndexMap<&'static str, Factory>,
}

impl Global for Registry {}

impl Registry {
    /// # Panics
    /// Panics if `group` already has a factory.
    pub(crate) fn insert(&mut self, group: &'static str, factory: Factory) {
        if self.factories.insert(group, factory).is_some() {
            panic!("The drawable group {group:?} is registered twice");
        }
        log::debug!("Registered drawable factory for group {group:?}");
    }

    /// The groups with a factory, in registration order.
    pub fn groups(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    /// Builds the drawable of `entity` from the first group it is a member of.
    pub fn build(&self, state: &State, entity: Entity) -> Option<Box<dyn Drawable>> {
        let mask = state.mask_of(entity);
        let (_, factory) = self.factories.iter().find(|(group, _)| {
            state.registry().group(group).map_or(false, |members| mask.intersects(&members))
        })?;
        factory(state, entity)
    }
}

/// Draws every placed drawable entity in compositing order.
pub struct Compositor;

impl Compositor {
    /// The debug name of the system.
    pub const NAME: &'static str = "scenec::drawable::Compositor";
}

impl system::System for Compositor {
    fn spec(&self) -> Spec {
        Spec::new(Self::NAME)
            .priority(COMPOSITOR_PRIORITY)
            .require::<DrawLayer>()
            .any_group(GROUP)
            .uses::<Transform>()
    }

    fn draw(&mut self, ctx: &mut DrawContext<'_>) {
        let state = ctx.state;
        let view = match ctx.view() {
            Some(view) => view,
            None => return,
        };
        let (index, registry) =
            match (state.try_global::<layer::Index>(), state.try_global::<Registry>()) {
                (Some(index), Some(registry)) => (index, registry),
                _ => return,
            };

        for (_, _, entity) in index.iter() {
            if !view.contains(entity) {
                continue;
            }

            if let Some(drawable) = registry.build(state, entity) {
                let world = transform::world_matrix(state, entity).unwrap_or(Affine2::IDENTITY);
                drawable.draw(world, &mut *ctx.target);
            }
        }
    }
}

/// Declares [`GROUP`] and schedules the [`Compositor`].
///
/// Drawable kinds still need a factory through [`Builder::drawable`].
pub struct Bundle;

impl world::Bundle for Bundle {
    fn register(&self, builder: &mut Builder) {
        builder.declare_group(GROUP);
        builder.global_mut_or_default::<Registry>();
        builder.schedule(Box::new(Compositor));
    }
}
