//! Manages entity ID allocation.

use super::Entity;

/// Issues unique, monotonically increasing entity ids.
///
/// Deallocation is not supported: a detached entity keeps its id forever,
/// and the id is never handed out again.
#[derive(Debug)]
pub struct Ealloc {
    /// The raw value of the next id to allocate.
    next: u32,
}

impl Default for Ealloc {
    fn default() -> Self { Self { next: 1 } }
}

impl Ealloc {
    /// Creates an allocator that starts from id 1.
    pub fn new() -> Self { Self::default() }

    /// Allocates a new entity id.
    ///
    /// # Panics
    /// Panics if the 32-bit id space is exhausted.
    pub fn allocate(&mut self) -> Entity {
        let entity = Entity::from_raw(self.next).expect("next is never zero");
        self.next = match self.next.checked_add(1) {
            Some(next) => next,
            None => panic!("Entity id space exhausted after {entity:?}"),
        };
        log::trace!("allocated {entity:?}");
        entity
    }

    /// Allocates `count` consecutive entity ids.
    pub fn allocate_many(&mut self, count: usize) -> Vec<Entity> {
        (0..count).map(|_| self.allocate()).collect()
    }

    /// Returns the number of ids issued so far.
    pub fn allocated(&self) -> usize { (self.next - 1).try_into().expect("usize >= u32") }

    /// Returns whether `entity` was issued by this allocator.
    pub fn is_allocated(&self, entity: Entity) -> bool { entity.id() < self.next }
}
