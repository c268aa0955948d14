//! An entity is a single object that owns components.
//!
//! Entities carry no data of their own.
//! They are identities issued by the world's [`Ealloc`]
//! and used as the key under which components are attached.
//! An entity id is never reused within a world,
//! so a stale id can never alias a newer entity.

use std::fmt;
use std::num::NonZeroU32;

pub mod ealloc;
pub use ealloc::Ealloc;

#[cfg(test)]
mod tests;

/// Identifies an entity in a [`World`](crate::World).
///
/// Ids are issued in strictly increasing order starting from 1.
/// The raw value 0 is reserved for "no entity",
/// which is represented as `Option::<Entity>::None` without extra space.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity(NonZeroU32);

impl Entity {
    /// Converts a raw id to an entity, returning `None` for the reserved value 0.
    pub(crate) fn from_raw(raw: u32) -> Option<Self> { NonZeroU32::new(raw).map(Self) }

    /// Returns the raw integer value of this entity id.
    pub fn id(self) -> u32 { self.0.get() }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "Entity({})", self.0) }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "#{}", self.0) }
}
