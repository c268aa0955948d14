use crate::storage::DEFAULT_MIN_CAPACITY;

/// Tunables of a world, set through [`Builder::config`](super::Builder::config).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// The capacity every component store allocates on its first insertion.
    /// Stores double their capacity whenever they are full.
    pub min_store_capacity: usize,
}

impl Default for Config {
    fn default() -> Self { Self { min_store_capacity: DEFAULT_MIN_CAPACITY } }
}
