//! Component flags and flag groups.
//!
//! Every registered component kind is assigned one bit in a fixed-width [`Mask`].
//! The world keeps one mask per entity,
//! recording which component kinds are currently attached to it,
//! so that views can test membership with a few word-wise bit operations.
//!
//! A flag group is a named union of flags describing a capability shared by several kinds,
//! e.g. every component kind that can be drawn joins the `"drawable"` group.

use std::any::TypeId;
use std::fmt;

use bitvec::array::BitArray;
use bitvec::order::Lsb0;
use indexmap::IndexMap;


/// The maximum number of component kinds a world can register.
pub const MAX_KINDS: usize = 128;

type Bits = BitArray<[u64; MAX_KINDS / 64], Lsb0>;

/// The bit assigned to a single component kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Flag(u8);

impl Flag {
    /// The bit position of this flag in a [`Mask`].
    pub fn index(self) -> usize { usize::from(self.0) }

    pub(crate) fn from_index(index: usize) -> Self {
        assert!(index < MAX_KINDS, "Flag index {index} is out of range");
        Self(index.try_into().expect("MAX_KINDS <= 256"))
    }
}

/// A set of component flags.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Mask(Bits);

impl Mask {
    /// Creates an empty mask.
    pub fn new() -> Self { Self::default() }

    /// Creates a mask with a single flag set.
    pub fn of(flag: Flag) -> Self {
        let mut mask = Self::new();
        mask.insert(flag);
        mask
    }

    /// Sets `flag`, returning whether it was previously unset.
    pub fn insert(&mut self, flag: Flag) -> bool { !self.0.replace(flag.index(), true) }

    /// Unsets `flag`, returning whether it was previously set.
    pub fn remove(&mut self, flag: Flag) -> bool { self.0.replace(flag.index(), false) }

    /// Returns whether `flag` is set.
    pub fn has(&self, flag: Flag) -> bool { self.0[flag.index()] }

    /// Returns whether no flag is set.
    pub fn is_empty(&self) -> bool { self.0.not_any() }

    /// Returns the number of flags set.
    pub fn len(&self) -> usize { self.0.count_ones() }

    /// Returns whether every flag in `other` is also set in `self`.
    pub fn contains(&self, other: &Mask) -> bool {
        self.words().zip(other.words()).all(|(this, that)| this & that == that)
    }

    /// Returns whether `self` and `other` have at least one flag in common.
    pub fn intersects(&self, other: &Mask) -> bool {
        self.words().zip(other.words()).any(|(this, that)| this & that != 0)
    }

    /// Returns the union of two masks.
    pub fn union(mut self, other: &Mask) -> Mask {
        for (this, that) in self.0.as_raw_mut_slice().iter_mut().zip(other.words()) {
            *this |= that;
        }
        self
    }

    /// Iterates over the flags set in ascending bit order.
    pub fn flags(&self) -> impl Iterator<Item = Flag> + '_ {
        self.0.iter_ones().map(Flag::from_index)
    }

    fn words(&self) -> impl Iterator<Item = u64> + '_ { self.0.as_raw_slice().iter().copied() }
}

impl FromIterator<Flag> for Mask {
    fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
        let mut mask = Mask::new();
        for flag in iter {
            mask.insert(flag);
        }
        mask
    }
}

impl fmt::Debug for Mask {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.0.iter_ones()).finish()
    }
}

/// Metadata of a registered component kind.
#[derive(Debug, Clone)]
pub struct Kind {
    /// The type name of the component, used in diagnostics.
    pub name:   &'static str,
    /// The flag assigned to the component.
    pub flag:   Flag,
    /// The flag groups this kind has joined.
    pub groups: Vec<&'static str>,
}

/// Assigns flags to component kinds and maintains flag groups.
///
/// A registry is populated by the [`world::Builder`](crate::world::Builder)
/// and is immutable once the world is built.
#[derive(Debug, Default)]
pub struct Registry {
    /// Registered kinds in registration order. The index of an entry is its flag index.
    kinds:  IndexMap<TypeId, Kind>,
    /// Flag groups by tag.
    groups: IndexMap<&'static str, Mask>,
}

impl Registry {
    /// Assigns a flag to the kind identified by `type_id`.
    ///
    /// Returns the existing flag if the kind is already registered.
    ///
    /// # Panics
    /// Panics if [`MAX_KINDS`] kinds are already registered.
    pub(crate) fn register(&mut self, type_id: TypeId, name: &'static str) -> Flag {
        if let Some(kind) = self.kinds.get(&type_id) {
            return kind.flag;
        }

        let index = self.kinds.len();
        if index >= MAX_KINDS {
            panic!("Cannot register component {name}: all {MAX_KINDS} component flags are in use");
        }

        let flag = Flag::from_index(index);
        self.kinds.insert(type_id, Kind { name, flag, groups: Vec::new() });
        log::debug!("Assigned flag {} to component {name}", flag.index());
        flag
    }

    /// Adds the kind with `flag` to the group `tag`, creating the group if necessary.
    pub(crate) fn join_group(&mut self, tag: &'static str, flag: Flag) {
        let kind = self.kinds.get_index_mut(flag.index()).map(|(_, kind)| kind);
        let kind = kind.expect("flag was issued by this registry");
        if !kind.groups.contains(&tag) {
            kind.groups.push(tag);
        }

        self.groups.entry(tag).or_default().insert(flag);
    }

    /// Declares a group that may have no members.
    pub(crate) fn declare_group(&mut self, tag: &'static str) {
        self.groups.entry(tag).or_default();
    }

    /// Returns the flag of the kind identified by `type_id`.
    pub fn flag_of(&self, type_id: TypeId) -> Option<Flag> {
        self.kinds.get(&type_id).map(|kind| kind.flag)
    }

    /// Returns the kind with the given flag.
    pub fn kind(&self, flag: Flag) -> &Kind {
        match self.kinds.get_index(flag.index()) {
            Some((_, kind)) => kind,
            None => panic!("Flag {} was not issued by this registry", flag.index()),
        }
    }

    /// Returns the union mask of the group `tag`.
    pub fn group(&self, tag: &str) -> Option<Mask> { self.groups.get(tag).copied() }

    /// Iterates over all groups in declaration order.
    pub fn groups(&self) -> impl Iterator<Item = (&'static str, Mask)> + '_ {
        self.groups.iter().map(|(&tag, &mask)| (tag, mask))
    }

    /// Iterates over all registered kinds in flag order.
    pub fn kinds(&self) -> impl Iterator<Item = &Kind> + '_ { self.kinds.values() }

    /// Returns the number of registered kinds.
    pub fn len(&self) -> usize { self.kinds.len() }

    /// Returns whether no kinds are registered.
    pub fn is_empty(&self) -> bool { self.kinds.is_empty() }
}
