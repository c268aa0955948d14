//! An array-backed ordered associative container.
//!
//! [`SortedIndex`] backs every ordered structure in the crate:
//! component storages, system views, entity flag masks and draw layer buckets.

use std::{fmt, mem};


/// An associative container that keeps its entries sorted by key in a contiguous array.
///
/// Locating a key is `O(log n)` by binary search,
/// while insertion and deletion shift the tail of the array in `O(n)`.
/// This trades asymptotic complexity for cache locality,
/// since each index is expected to hold at most a few thousand entries.
///
/// Iteration borrows the index, so it cannot be mutated while an iteration is in progress.
pub struct SortedIndex<K: Ord, V> {
    entries: Vec<(K, V)>,
}

impl<K: Ord, V> Default for SortedIndex<K, V> {
    fn default() -> Self { Self { entries: Vec::new() } }
}

impl<K: Ord, V> SortedIndex<K, V> {
    /// Creates an empty index.
    pub fn new() -> Self { Self::default() }

    /// Creates an empty index with preallocated room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity) }
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize { self.entries.len() }

    /// Returns whether the index has no entries.
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Reserves room for exactly `additional` more entries.
    pub fn reserve_exact(&mut self, additional: usize) { self.entries.reserve_exact(additional); }

    fn search(&self, key: &K) -> Result<usize, usize> {
        self.entries.binary_search_by(|(probe, _)| probe.cmp(key))
    }

    /// Returns the array position of `key`, if present.
    pub fn position_of(&self, key: &K) -> Option<usize> { self.search(key).ok() }

    /// Inserts `value` at `key`, returning the value previously stored at `key`.
    ///
    /// New keys are appended to the array.
    /// If the appended key is smaller than its predecessor,
    /// the whole array is re-sorted (stably) instead of shifting the new entry into place.
    pub fn upsert(&mut self, key: K, value: V) -> Option<V> {
        if let Ok(index) = self.search(&key) {
            let (_, slot) = self.entries.get_mut(index).expect("search returned a valid index");
            return Some(mem::replace(slot, value));
        }

        self.entries.push((key, value));

        let len = self.entries.len();
        if len >= 2 && self.entries[len - 2].0 > self.entries[len - 1].0 {
            self.entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        }

        None
    }

    /// Gets a shared reference to the value at `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        let index = self.search(key).ok()?;
        self.entries.get(index).map(|(_, value)| value)
    }

    /// Gets a mutable reference to the value at `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let index = self.search(key).ok()?;
        self.entries.get_mut(index).map(|(_, value)| value)
    }

    /// Returns whether `key` is present.
    pub fn contains_key(&self, key: &K) -> bool { self.search(key).is_ok() }

    /// Returns the entry at array position `index`.
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        self.entries.get(index).map(|(key, value)| (key, value))
    }

    /// Returns the entry at array position `index` with a mutable value.
    pub fn get_index_mut(&mut self, index: usize) -> Option<(&K, &mut V)> {
        self.entries.get_mut(index).map(|(key, value)| (&*key, value))
    }

    /// Removes `key`, returning whether it was present.
    pub fn delete(&mut self, key: &K) -> bool { self.remove(key).is_some() }

    /// Removes `key`, returning its value.
    ///
    /// The remaining entries are shifted to keep the array contiguous and sorted.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let index = self.search(key).ok()?;
        let (_, value) = self.entries.remove(index);
        Some(value)
    }

    /// Returns the entry with the smallest key.
    pub fn first(&self) -> Option<(&K, &V)> {
        self.entries.first().map(|(key, value)| (key, value))
    }

    /// Returns the entry with the largest key.
    pub fn last(&self) -> Option<(&K, &V)> { self.entries.last().map(|(key, value)| (key, value)) }

    /// Calls `f` on every entry in ascending key order.
    pub fn each_in_order(&self, mut f: impl FnMut(&K, &V)) {
        for (key, value) in &self.entries {
            f(key, value);
        }
    }

    /// Iterates over all entries in ascending key order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&K, &V)> + ExactSizeIterator + '_ {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    /// Iterates over all entries in ascending key order with mutable values.
    pub fn iter_mut(
        &mut self,
    ) -> impl DoubleEndedIterator<Item = (&K, &mut V)> + ExactSizeIterator + '_ {
        self.entries.iter_mut().map(|(key, value)| (&*key, value))
    }

    /// Iterates over all keys in ascending order.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.entries.iter().map(|(key, _)| key)
    }

    /// Iterates over all values in ascending key order.
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
        self.entries.iter().map(|(_, value)| value)
    }

    /// Iterates over all values in ascending key order, mutably.
    pub fn values_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut V> + ExactSizeIterator + '_ {
        self.entries.iter_mut().map(|(_, value)| value)
    }

    /// Retains only the entries for which `f` returns `true`, preserving order.
    pub fn retain(&mut self, mut f: impl FnMut(&K, &mut V) -> bool) {
        self.entries.retain_mut(|(key, value)| f(key, value));
    }

    /// Removes all entries.
    pub fn clear(&mut self) { self.entries.clear(); }
}

impl<K: Ord, V> FromIterator<(K, V)> for SortedIndex<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut index = Self::new();
        for (key, value) in iter {
            index.upsert(key, value);
        }
        index
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for SortedIndex<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { f.debug_map().entries(self.iter()).finish() }
}
