//! A retained-mode 2D scene runtime built on a flag-matched ECS.
//!
//! # Entities, components and flags
//! Entities are opaque ids issued in increasing order and never reused.
//! Components are plain data attached to entities;
//! each component kind is stored in its own [`ComponentStore`](storage::ComponentStore),
//! an array of `(entity, value)` records sorted by entity.
//!
//! Every registered kind is assigned a [`Flag`](flag::Flag),
//! and the world tracks the [`Mask`](flag::Mask) of flags attached to each entity.
//! Kinds may join named flag groups, such as the [`drawable`] group.
//!
//! # Systems and views
//! A [`System`] declares a [`Spec`](system::Spec):
//! its priority, the kinds an entity must have or must not have,
//! and the groups of which it must have at least one member.
//! The world maintains a [`View`](view::View) for each system,
//! updated incrementally whenever a component is attached or detached.
//! Rows of a view cache the slot of the entity in each required store.
//! Cached slots are tagged with the epoch of their store
//! and are never read after the store changes structurally.
//!
//! # Frames
//! [`World::execute`] runs the update pass of all systems in priority order,
//! delivers queued [events](event), then runs the draw pass.
//!
//! # Scene features
//! - [`transform`] resolves hierarchical 2D transforms, memoized once per tick.
//! - [`layer`] orders drawables by layer and z-index.
//! - [`drawable`] composites drawables onto a render target in that order.

#![cfg_attr(not(debug_assertions), deny(missing_docs))]
#![cfg_attr(doc, warn(missing_docs))]

pub mod sorted;

pub mod tracer;

pub mod comp;
pub use comp::Component;

pub mod entity;
pub use entity::Entity;

pub mod flag;

mod global;
pub use global::Global;

pub mod storage;

pub mod view;

pub mod scheduler;
pub use scheduler::{Frame, Pass};

pub mod system;
pub use system::System;

pub mod event;
pub use event::Emitter;

pub mod world;
pub use world::World;

pub mod transform;
pub use transform::Transform;

pub mod layer;
pub use layer::DrawLayer;

pub mod drawable;
pub use drawable::Drawable;

#[cfg(any(test, feature = "internal-bench"))]
#[doc(hidden)]
pub mod test_util;
