use std::any::{self, Any, TypeId};

use indexmap::IndexMap;

/// A global state that systems can read and write through the world.
///
/// Each global type has a single instance per world,
/// provided through [`Builder::global`](crate::world::Builder::global)
/// or by a bundle during registration.
pub trait Global: 'static {}

/// Stores the global states of a world, keyed by type.
#[derive(Default)]
pub(crate) struct Globals {
    map: IndexMap<TypeId, Box<dyn Any>>,
}

impl Globals {
    /// Inserts a global state.
    ///
    /// # Panics
    /// Panics if a value of the same type was already inserted.
    pub(crate) fn insert<G: Global>(&mut self, value: G) {
        if self.map.insert(TypeId::of::<G>(), Box::new(value)).is_some() {
            panic!("The global state {} is initialized twice", any::type_name::<G>());
        }
    }

    pub(crate) fn contains<G: Global>(&self) -> bool { self.map.contains_key(&TypeId::of::<G>()) }

    pub(crate) fn get_or_default<G: Global + Default>(&mut self) -> &mut G {
        let global = self
            .map
            .entry(TypeId::of::<G>())
            .or_insert_with(|| Box::new(G::default()) as Box<dyn Any>);
        global.downcast_mut::<G>().expect("TypeId mismatch")
    }

    pub(crate) fn get<G: Global>(&self) -> &G {
        let global = match self.map.get(&TypeId::of::<G>()) {
            Some(global) => global,
            None => panic!(
                "The global state {} cannot be retrieved because it was not provided",
                any::type_name::<G>()
            ),
        };
        global.downcast_ref::<G>().expect("TypeId mismatch")
    }

    pub(crate) fn get_mut<G: Global>(&mut self) -> &mut G {
        let global = match self.map.get_mut(&TypeId::of::<G>()) {
            Some(global) => global,
            None => panic!(
                "The global state {} cannot be retrieved because it was not provided",
                any::type_name::<G>()
            ),
        };
        global.downcast_mut::<G>().expect("TypeId mismatch")
    }

    pub(crate) fn try_get<G: Global>(&self) -> Option<&G> {
        let global = self.map.get(&TypeId::of::<G>())?;
        Some(global.downcast_ref::<G>().expect("TypeId mismatch"))
    }

    pub(crate) fn try_get_mut<G: Global>(&mut self) -> Option<&mut G> {
        let global = self.map.get_mut(&TypeId::of::<G>())?;
        Some(global.downcast_mut::<G>().expect("TypeId mismatch"))
    }
}
