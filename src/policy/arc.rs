//! # ARC (Adaptive Replacement Cache)
//!
//! Splits the entry budget between a *recency part* (an LRU list) and a
//! *frequency part* (LFU buckets), and re-draws the split at runtime by
//! watching ghosts: key-only records of recent evictions.
//!
//! ```text
//!   ┌───────────────────────────────────────────────────────────────┐
//!   │                        ArcCore<K, V>                          │
//!   │                                                               │
//!   │   recency part (LRU)             frequency part (LFU)         │
//!   │   ┌──────────────────┐           ┌──────────────────┐         │
//!   │   │ [k₅]◄──►[k₂]◄──► │  promote  │  1 ─► [k₉]       │         │
//!   │   │ [k₈]      evict  │ ────────► │  4 ─► [k₂]       │         │
//!   │   └────────┬─────────┘  ≥ thresh └────────┬─────────┘         │
//!   │            ▼ key only                     ▼ key only          │
//!   │   ┌──────────────────┐           ┌──────────────────┐         │
//!   │   │ recency ghost    │           │ frequency ghost  │         │
//!   │   └──────────────────┘           └──────────────────┘         │
//!   │                                                               │
//!   │   ghost hit on recency side  → grow recency, shrink frequency │
//!   │   ghost hit on frequency side→ grow frequency, shrink recency │
//!   └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! New keys always enter the recency part. A key whose access count
//! reaches the *transform threshold* on a hit is copied into the
//! frequency part; the recency node stays where it is and leaves by
//! ordinary eviction. A key already in the frequency part has `put`
//! write its value to both homes, so the two copies never diverge.
//!
//! A miss whose key is found in a ghost means that key would still be
//! resident had the split leaned the other way: one slot of capacity
//! moves toward the side whose ghost fired (the consulted ghost entry
//! is dropped). The partition always sums to the configured capacity;
//! the initial split is recency-heavy (`C-1 / 1`), seeding the
//! frequency side with a single slot to grow from.

use std::hash::Hash;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::ds::frequency_buckets::FrequencyBuckets;
use crate::ds::ghost_list::GhostList;
use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;
use crate::traits::CachePolicy;

/// Default access count at which a recency hit escalates the key into
/// the frequency part.
pub const DEFAULT_TRANSFORM_THRESHOLD: u64 = 2;

#[derive(Debug)]
struct RecencyEntry<K, V> {
    key: K,
    value: V,
    accesses: u64,
}

/// LRU side of the split: recency list + eviction ghost.
#[derive(Debug)]
struct RecencyPart<K, V> {
    index: FxHashMap<K, SlotId>,
    order: IntrusiveList<RecencyEntry<K, V>>,
    ghost: GhostList<K>,
    capacity: usize,
    transform_threshold: u64,
}

impl<K, V> RecencyPart<K, V>
where
    K: Eq + Hash + Clone,
{
    fn new(capacity: usize, transform_threshold: u64) -> Self {
        Self {
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            order: IntrusiveList::with_capacity(capacity),
            ghost: GhostList::new(capacity),
            capacity,
            transform_threshold,
        }
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Inserts or overwrites; overwriting refreshes recency without
    /// counting an access.
    fn put(&mut self, key: K, value: V) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if let Some(&id) = self.index.get(&key) {
            self.order.move_to_back(id);
            if let Some(entry) = self.order.get_mut(id) {
                entry.value = value;
            }
            return true;
        }
        if self.index.len() >= self.capacity {
            self.evict_oldest();
        }
        let id = self.order.push_back(RecencyEntry {
            key: key.clone(),
            value,
            accesses: 1,
        });
        self.index.insert(key, id);
        true
    }

    /// Hit: refresh to most-recent, bump the access count, and report
    /// whether the key just reached the transform threshold.
    fn get(&mut self, key: &K) -> Option<(&V, bool)> {
        let &id = self.index.get(key)?;
        self.order.move_to_back(id);
        let threshold = self.transform_threshold;
        let entry = self.order.get_mut(id)?;
        entry.accesses = entry.accesses.saturating_add(1);
        let escalate = entry.accesses >= threshold;
        Some((&entry.value, escalate))
    }

    /// Consults the ghost for `key`, removing the entry on a hit.
    fn check_ghost(&mut self, key: &K) -> bool {
        self.ghost.remove(key)
    }

    fn increase_capacity(&mut self) {
        self.capacity += 1;
    }

    /// Gives up one slot of capacity, evicting if the part is full.
    /// Fails when there is no capacity left to give.
    fn decrease_capacity(&mut self) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.index.len() >= self.capacity {
            self.evict_oldest();
        }
        self.capacity -= 1;
        true
    }

    /// Evicts the least-recent entry; its key moves to the ghost.
    fn evict_oldest(&mut self) {
        if let Some(entry) = self.order.pop_front() {
            self.index.remove(&entry.key);
            self.ghost.record(entry.key);
        }
    }
}

/// LFU side of the split: frequency buckets + eviction ghost.
#[derive(Debug)]
struct FrequencyPart<K, V> {
    buckets: FrequencyBuckets<K>,
    values: FxHashMap<K, V>,
    ghost: GhostList<K>,
    capacity: usize,
}

impl<K, V> FrequencyPart<K, V>
where
    K: Eq + Hash + Clone,
{
    fn new(capacity: usize) -> Self {
        Self {
            buckets: FrequencyBuckets::new(),
            values: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            ghost: GhostList::new(capacity),
            capacity,
        }
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn contains(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    /// Inserts at frequency 1, or overwrites counting a hit.
    fn put(&mut self, key: K, value: V) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if let Some(slot) = self.values.get_mut(&key) {
            *slot = value;
            self.buckets.touch(&key);
            return true;
        }
        if self.values.len() >= self.capacity {
            self.evict_min();
        }
        self.buckets.insert(key.clone());
        self.values.insert(key, value);
        true
    }

    /// Hit: increments the key's frequency.
    fn get(&mut self, key: &K) -> Option<&V> {
        if !self.values.contains_key(key) {
            return None;
        }
        self.buckets.touch(key);
        self.values.get(key)
    }

    /// Consults the ghost for `key`, removing the entry on a hit.
    fn check_ghost(&mut self, key: &K) -> bool {
        self.ghost.remove(key)
    }

    fn increase_capacity(&mut self) {
        self.capacity += 1;
    }

    fn decrease_capacity(&mut self) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.values.len() >= self.capacity {
            self.evict_min();
        }
        self.capacity -= 1;
        true
    }

    /// Evicts the FIFO head of the minimum-frequency bucket; its key
    /// moves to the ghost.
    fn evict_min(&mut self) {
        if let Some((key, _)) = self.buckets.pop_min() {
            self.values.remove(&key);
            self.ghost.record(key);
        }
    }
}

/// Unsynchronised ARC core.
///
/// Single-threaded by design; wrap it in [`ArcCache`] for shared use.
#[derive(Debug)]
pub struct ArcCore<K, V> {
    recency: RecencyPart<K, V>,
    frequency: FrequencyPart<K, V>,
    capacity: usize,
}

impl<K, V> ArcCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an ARC core with the default transform threshold.
    pub fn new(capacity: usize) -> Self {
        Self::with_transform_threshold(capacity, DEFAULT_TRANSFORM_THRESHOLD)
    }

    /// Creates an ARC core with an explicit transform threshold
    /// (clamped to at least 1).
    pub fn with_transform_threshold(capacity: usize, transform_threshold: u64) -> Self {
        // Recency-heavy initial split; the frequency side gets a single
        // seed slot to grow from via ghost hits.
        let frequency_capacity = if capacity >= 2 { 1 } else { 0 };
        let recency_capacity = capacity - frequency_capacity;
        Self {
            recency: RecencyPart::new(recency_capacity, transform_threshold.max(1)),
            frequency: FrequencyPart::new(frequency_capacity),
            capacity,
        }
    }

    /// Inserts or overwrites `key`.
    ///
    /// The value always lands in the recency part; a key that also
    /// lives in the frequency part is updated there too.
    pub fn insert(&mut self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        self.rebalance_on_ghost(&key);
        let dual_home = self.frequency.contains(&key);
        self.recency.put(key.clone(), value.clone());
        if dual_home {
            self.frequency.put(key, value);
        }
    }

    /// Looks up `key`: ghosts first (rebalancing), then the recency
    /// part (escalating at the transform threshold), then the
    /// frequency part.
    pub fn get(&mut self, key: &K) -> Option<V> {
        if self.capacity == 0 {
            return None;
        }
        self.rebalance_on_ghost(key);

        let recency_hit = self
            .recency
            .get(key)
            .map(|(value, escalate)| (value.clone(), escalate));
        if let Some((value, escalate)) = recency_hit {
            if escalate {
                self.frequency.put(key.clone(), value.clone());
            }
            return Some(value);
        }

        self.frequency.get(key).cloned()
    }

    /// Returns `true` if either part holds `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.recency.contains(key) || self.frequency.contains(key)
    }

    /// Total value-carrying entries across both parts (a dual-resident
    /// key counts twice).
    pub fn len(&self) -> usize {
        self.recency.len() + self.frequency.len()
    }

    /// Returns the configured total capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current recency-part entry count.
    pub fn recency_len(&self) -> usize {
        self.recency.len()
    }

    /// Current frequency-part entry count.
    pub fn frequency_len(&self) -> usize {
        self.frequency.len()
    }

    /// Current recency-part capacity share.
    pub fn recency_capacity(&self) -> usize {
        self.recency.capacity
    }

    /// Current frequency-part capacity share.
    pub fn frequency_capacity(&self) -> usize {
        self.frequency.capacity
    }

    /// Keys tracked by the recency-side ghost.
    pub fn recency_ghost_len(&self) -> usize {
        self.recency.ghost.len()
    }

    /// Keys tracked by the frequency-side ghost.
    pub fn frequency_ghost_len(&self) -> usize {
        self.frequency.ghost.len()
    }

    /// A ghost hit shifts one slot of capacity toward the side that
    /// proved it evicted too eagerly. The consulted ghost entry is
    /// removed; the shift only happens if the donor side can actually
    /// give up a slot.
    fn rebalance_on_ghost(&mut self, key: &K) -> bool {
        if self.frequency.check_ghost(key) {
            if self.recency.decrease_capacity() {
                self.frequency.increase_capacity();
            }
            true
        } else if self.recency.check_ghost(key) {
            if self.frequency.decrease_capacity() {
                self.recency.increase_capacity();
            }
            true
        } else {
            false
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert_eq!(
            self.recency.capacity + self.frequency.capacity,
            self.capacity,
            "partition must sum to the configured capacity"
        );
        assert!(self.recency.len() <= self.recency.capacity);
        assert!(self.frequency.len() <= self.frequency.capacity);
        assert!(self.recency.ghost.len() <= self.recency.ghost.capacity());
        assert!(self.frequency.ghost.len() <= self.frequency.ghost.capacity());
        self.recency.order.debug_validate_invariants();
        self.frequency.buckets.debug_validate_invariants();
    }
}

/// Thread-safe ARC cache: [`ArcCore`] behind a single mutex.
///
/// # Example
///
/// ```
/// use cachemux::policy::arc::ArcCache;
/// use cachemux::traits::CachePolicy;
///
/// let cache = ArcCache::new(8);
/// cache.put("page", "contents");
/// assert_eq!(cache.get(&"page"), Some("contents")); // escalates to the frequency part
/// assert_eq!(cache.frequency_len(), 1);
/// ```
#[derive(Debug)]
pub struct ArcCache<K, V> {
    inner: Mutex<ArcCore<K, V>>,
}

impl<K, V> ArcCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an ARC cache with the default transform threshold of 2.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(ArcCore::new(capacity)),
        }
    }

    /// Creates an ARC cache with an explicit transform threshold.
    pub fn with_transform_threshold(capacity: usize, transform_threshold: u64) -> Self {
        Self {
            inner: Mutex::new(ArcCore::with_transform_threshold(
                capacity,
                transform_threshold,
            )),
        }
    }

    /// Returns `true` if either part holds `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }

    /// Current recency-part entry count.
    pub fn recency_len(&self) -> usize {
        self.inner.lock().recency_len()
    }

    /// Current frequency-part entry count.
    pub fn frequency_len(&self) -> usize {
        self.inner.lock().frequency_len()
    }

    /// Current recency-part capacity share.
    pub fn recency_capacity(&self) -> usize {
        self.inner.lock().recency_capacity()
    }

    /// Current frequency-part capacity share.
    pub fn frequency_capacity(&self) -> usize {
        self.inner.lock().frequency_capacity()
    }

    /// Keys tracked by the recency-side ghost.
    pub fn recency_ghost_len(&self) -> usize {
        self.inner.lock().recency_ghost_len()
    }

    /// Keys tracked by the frequency-side ghost.
    pub fn frequency_ghost_len(&self) -> usize {
        self.inner.lock().frequency_ghost_len()
    }
}

impl<K, V> Default for ArcCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// An ARC cache with capacity 10 and the default threshold.
    fn default() -> Self {
        Self::new(10)
    }
}

impl<K, V> CachePolicy<K, V> for ArcCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn put(&self, key: K, value: V) {
        self.inner.lock().insert(key, value);
    }

    fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().get(key)
    }

    fn len(&self) -> usize {
        self.inner.lock().len()
    }

    fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }
}
