//! Bounded key-only recency list for ghost entries.
//!
//! A ghost list remembers keys that were recently evicted (values are
//! not retained). The ARC policy consults it on a miss: a "ghost hit"
//! means the key would still be resident had the partition leaned the
//! other way, and the partition capacities are rebalanced accordingly.
//!
//! Implemented as an [`IntrusiveList`] of keys plus an `FxHashMap`
//! index for O(1) membership checks. At capacity, recording a new key
//! drops the least recently recorded one.
//!
//! ```
//! use cachemux::ds::GhostList;
//!
//! let mut ghost = GhostList::new(2);
//! ghost.record("a");
//! ghost.record("b");
//! ghost.record("c"); // "a" falls off the end
//!
//! assert!(!ghost.contains(&"a"));
//! assert!(ghost.contains(&"b"));
//! assert!(ghost.remove(&"c"));
//! assert_eq!(ghost.len(), 1);
//! ```

use rustc_hash::FxHashMap;
use std::hash::Hash;

use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;

/// Bounded recency list of keys with no values.
///
/// A capacity of 0 produces a no-op list that ignores all records.
#[derive(Debug)]
pub struct GhostList<K> {
    order: IntrusiveList<K>,
    index: FxHashMap<K, SlotId>,
    capacity: usize,
}

impl<K> GhostList<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates a ghost list holding at most `capacity` keys.
    pub fn new(capacity: usize) -> Self {
        Self {
            order: IntrusiveList::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            capacity,
        }
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns `true` if `key` is present: the "ghost hit" check.
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Records `key` as most recently seen, dropping the least recent
    /// key if the list is full. Re-recording an existing key refreshes
    /// its position instead of growing the list.
    pub fn record(&mut self, key: K) {
        if self.capacity == 0 {
            return;
        }
        if let Some(&id) = self.index.get(&key) {
            self.order.move_to_back(id);
            return;
        }
        if self.order.len() >= self.capacity
            && let Some(dropped) = self.order.pop_front()
        {
            self.index.remove(&dropped);
        }
        let id = self.order.push_back(key.clone());
        self.index.insert(key, id);
    }

    /// Removes `key` from the list; returns `true` if it was present.
    ///
    /// Called after a ghost hit so the same eviction is not counted
    /// twice.
    pub fn remove(&mut self, key: &K) -> bool {
        match self.index.remove(key) {
            Some(id) => {
                self.order.remove(id);
                true
            }
            None => false,
        }
    }

    /// Drops all tracked keys.
    pub fn clear(&mut self) {
        self.order.clear();
        self.index.clear();
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self)
    where
        K: std::fmt::Debug,
    {
        assert_eq!(self.order.len(), self.index.len());
        assert!(self.order.len() <= self.capacity);
        for key in self.order.iter() {
            let id = self.index.get(key).expect("listed key missing from index");
            assert_eq!(self.order.get(*id), Some(key));
        }
        self.order.debug_validate_invariants();
    }
}
