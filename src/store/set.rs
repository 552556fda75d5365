//! CacheSet implementation
//!
//! Sharded HashSet with a parking_lot RwLock per shard.

use std::collections::hash_map::RandomState;
use std::collections::HashSet;
use std::hash::BuildHasher;

use parking_lot::RwLock;

use super::CacheValue;

/// Default number of shards (power of two)
const DEFAULT_SHARDS: usize = 16;

/// Concurrency-safe set of encoded values
///
/// Exposes exactly the three membership operations plus size accessors.
/// No iteration over members is provided.
pub struct CacheSet {
    shards: Box<[RwLock<HashSet<CacheValue>>]>,
    hasher: RandomState,
}

impl CacheSet {
    /// Create an empty set with the default shard count
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    /// Create an empty set with `count` shards (rounded up to a power of two)
    pub fn with_shards(count: usize) -> Self {
        let count = count.max(1).next_power_of_two();
        let shards = (0..count)
            .map(|_| RwLock::new(HashSet::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            shards,
            hasher: RandomState::new(),
        }
    }

    fn shard(&self, value: &CacheValue) -> &RwLock<HashSet<CacheValue>> {
        let hash = self.hasher.hash_one(value);
        &self.shards[(hash as usize) & (self.shards.len() - 1)]
    }

    /// True iff `value` is currently a member (read lock)
    pub fn contains(&self, value: &CacheValue) -> bool {
        self.shard(value).read().contains(value)
    }

    /// Insert `value` if absent (write lock)
    ///
    /// Returns true iff this call inserted it. Among concurrent calls for the
    /// same absent value exactly one returns true.
    pub fn add_if_absent(&self, value: CacheValue) -> bool {
        self.shard(&value).write().insert(value)
    }

    /// Delete `value` if present (write lock)
    ///
    /// Returns true iff this call removed it.
    pub fn remove(&self, value: &CacheValue) -> bool {
        self.shard(value).write().remove(value)
    }

    /// Number of members
    ///
    /// Shards are read one at a time, so under concurrent mutation this is
    /// an approximation.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|s| s.read().is_empty())
    }

    /// Remove all members
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.write().clear();
        }
    }

    /// Number of shards
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }
}

impl Default for CacheSet {
    fn default() -> Self {
        Self::new()
    }
}
