//! # Sharded LRU: hash-partitioned locking
//!
//! Splits one logical LRU over `shards` independent [`LruCache`]
//! instances, each holding `ceil(total / shards)` entries behind its
//! own mutex. Requests route by `hash(key) % shards`, so concurrent
//! callers touching different shards never contend, and never
//! coordinate: an insert on one shard cannot evict from another. The
//! price is a small capacity-balancing inaccuracy when the hash does
//! not spread keys evenly, plus the per-shard ceiling rounding.

use std::hash::Hash;

use crate::ds::shard::ShardSelector;
use crate::error::ConfigError;
use crate::policy::lru::LruCache;
use crate::traits::CachePolicy;

/// N-way hash-partitioned LRU.
///
/// # Example
///
/// ```
/// use cachemux::policy::sharded_lru::ShardedLruCache;
/// use cachemux::traits::CachePolicy;
///
/// let cache = ShardedLruCache::new(64, 4);
/// cache.put("a", 1);
/// assert_eq!(cache.get(&"a"), Some(1));
/// assert_eq!(cache.shard_count(), 4);
/// ```
#[derive(Debug)]
pub struct ShardedLruCache<K, V> {
    shards: Vec<LruCache<K, V>>,
    selector: ShardSelector,
    capacity: usize,
}

impl<K, V> ShardedLruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a cache of `total_capacity` entries split over `shards`
    /// partitions (clamped to at least 1).
    pub fn new(total_capacity: usize, shards: usize) -> Self {
        let shards = shards.max(1);
        let per_shard = total_capacity.div_ceil(shards);
        Self {
            shards: (0..shards).map(|_| LruCache::new(per_shard)).collect(),
            selector: ShardSelector::new(shards, 0),
            capacity: total_capacity,
        }
    }

    /// Validating constructor: rejects a zero shard count.
    pub fn try_new(total_capacity: usize, shards: usize) -> Result<Self, ConfigError> {
        if shards == 0 {
            return Err(ConfigError::new("sharded lru: shard count must be at least 1"));
        }
        Ok(Self::new(total_capacity, shards))
    }

    /// Returns the number of partitions.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Returns the per-shard entry budget.
    pub fn shard_capacity(&self) -> usize {
        self.shards.first().map_or(0, |shard| shard.capacity())
    }

    /// Returns the partition `key` routes to.
    pub fn shard_for_key(&self, key: &K) -> usize {
        self.selector.shard_for_key(key)
    }

    /// Removes `key` from its shard.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.shard(key).remove(key)
    }

    /// Returns `true` if `key` is resident, without refreshing it.
    pub fn contains(&self, key: &K) -> bool {
        self.shard(key).contains(key)
    }

    /// Drops all entries in every shard.
    pub fn clear(&self) {
        for shard in &self.shards {
            shard.clear();
        }
    }

    fn shard(&self, key: &K) -> &LruCache<K, V> {
        &self.shards[self.selector.shard_for_key(key)]
    }
}

impl<K, V> CachePolicy<K, V> for ShardedLruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn put(&self, key: K, value: V) {
        self.shard(&key).put(key, value);
    }

    fn get(&self, key: &K) -> Option<V> {
        self.shard(key).get(key)
    }

    /// Total entries across all shards.
    fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.len()).sum()
    }

    /// The configured total capacity. The enforced bound is the sum of
    /// per-shard budgets, which rounding can push slightly above this.
    fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_through_shards() {
        let cache = ShardedLruCache::new(32, 4);
        for key in 0..16u64 {
            cache.put(key, key * 10);
        }
        for key in 0..16u64 {
            assert_eq!(cache.get(&key), Some(key * 10));
        }
        assert_eq!(cache.len(), 16);
    }

    #[test]
    fn capacity_splits_with_ceiling() {
        let cache: ShardedLruCache<u64, u64> = ShardedLruCache::new(10, 3);
        assert_eq!(cache.shard_capacity(), 4); // ceil(10 / 3)
        assert_eq!(cache.capacity(), 10);
        assert_eq!(cache.shard_count(), 3);
    }

    #[test]
    fn shards_do_not_interfere() {
        let cache = ShardedLruCache::new(8, 4); // 2 entries per shard
        // Find three keys on two different shards.
        let mut on_first = Vec::new();
        let mut other = None;
        for key in 0..1000u64 {
            if cache.shard_for_key(&key) == 0 {
                on_first.push(key);
            } else if other.is_none() {
                other = Some(key);
            }
            if on_first.len() >= 3 && other.is_some() {
                break;
            }
        }
        let other = other.expect("some key maps off shard 0");

        // Park a key on the other shard, then overflow shard 0.
        cache.put(other, 1);
        for &key in &on_first {
            cache.put(key, 2);
        }
        // Shard 0 evicted its own oldest; the other shard is untouched.
        assert_eq!(cache.get(&other), Some(1));
        assert!(!cache.contains(&on_first[0]));
    }

    #[test]
    fn remove_targets_owning_shard() {
        let cache = ShardedLruCache::new(16, 2);
        cache.put("k", 7);
        assert_eq!(cache.remove(&"k"), Some(7));
        assert_eq!(cache.remove(&"k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_shards_clamps_to_one() {
        let cache: ShardedLruCache<u64, u64> = ShardedLruCache::new(4, 0);
        assert_eq!(cache.shard_count(), 1);
        assert!(ShardedLruCache::<u64, u64>::try_new(4, 0).is_err());
    }

    #[test]
    fn zero_capacity_is_inert() {
        let cache = ShardedLruCache::new(0, 4);
        cache.put(1u64, "x");
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn clear_empties_every_shard() {
        let cache = ShardedLruCache::new(16, 4);
        for key in 0..8u64 {
            cache.put(key, key);
        }
        cache.clear();
        assert!(cache.is_empty());
        for key in 0..8u64 {
            assert_eq!(cache.get(&key), None);
        }
    }
}
