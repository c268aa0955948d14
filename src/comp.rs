//! A component is a small data structure that can be attached to an entity.
//!
//! Each component type is a separate *kind*.
//! Kinds are registered to the world when it is built,
//! either explicitly through [`Builder::register`](crate::world::Builder::register)
//! or implicitly when a scheduled system requests them.
//! Registration assigns the kind a [`Flag`](crate::flag::Flag)
//! and adds it to the flag groups listed in [`Component::GROUPS`].
//!
//! Components of the same kind are stored together in a
//! [`ComponentStore`](crate::storage::ComponentStore), ordered by entity id.

/// A component type.
pub trait Component: Sized + 'static {
    /// The flag groups this component kind joins on registration.
    ///
    /// For example, every kind rendered by the compositor lists
    /// [`drawable::GROUP`](crate::drawable::GROUP) here.
    const GROUPS: &'static [&'static str] = &[];
}
