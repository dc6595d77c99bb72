//! The policy contract shared by every cache in the crate.
//!
//! All seven concrete cache types ([`LruCache`](crate::policy::lru::LruCache),
//! [`LruKCache`](crate::policy::lru_k::LruKCache),
//! [`ShardedLruCache`](crate::policy::sharded_lru::ShardedLruCache),
//! [`LfuCache`](crate::policy::lfu::LfuCache),
//! [`ArcCache`](crate::policy::arc::ArcCache),
//! [`WTinyLfuCache`](crate::policy::tiny_lfu::WTinyLfuCache) and
//! [`AdaptiveCache`](crate::policy::adaptive::AdaptiveCache)) satisfy
//! [`CachePolicy`]. Methods take `&self`: every cache owns its
//! synchronisation internally, and operations on one instance are
//! linearisable under its lock.
//!
//! The contract is deliberately small. Capability differences between
//! policies (frequency inspection, ghost diagnostics, tier statistics)
//! live as inherent methods on the concrete types, and closed-set
//! polymorphism is available as a sum type in
//! [`builder`](crate::builder); there is no deep trait hierarchy to
//! inherit through.
//!
//! ```
//! use cachemux::policy::lru::LruCache;
//! use cachemux::traits::CachePolicy;
//!
//! fn warm<C: CachePolicy<u64, String>>(cache: &C, rows: &[(u64, String)]) {
//!     for (key, value) in rows {
//!         cache.put(*key, value.clone());
//!     }
//! }
//!
//! let cache = LruCache::new(16);
//! warm(&cache, &[(1, "one".into()), (2, "two".into())]);
//! assert_eq!(cache.len(), 2);
//! assert_eq!(cache.get(&1), Some("one".to_string()));
//! ```

/// Common operations every replacement policy supports.
///
/// Lookups return owned values (`V: Clone` on the implementations);
/// a miss is `None`, never an error. `put` has no return: on a full
/// cache it evicts according to the policy before inserting, and on a
/// zero-capacity cache it is a silent no-op.
pub trait CachePolicy<K, V> {
    /// Inserts or overwrites `key`. May evict another entry first when
    /// the cache is at capacity. No-op when the capacity is 0.
    fn put(&self, key: K, value: V);

    /// Looks up `key`, updating the policy's internal ordering on a
    /// hit. Returns `None` on a miss.
    fn get(&self, key: &K) -> Option<V>;

    /// By-value lookup: returns the default value on a miss.
    ///
    /// This mirrors hosts that cannot distinguish a miss from a cached
    /// default; prefer [`get`](Self::get) when the distinction matters.
    fn get_or_default(&self, key: &K) -> V
    where
        V: Default,
    {
        self.get(key).unwrap_or_default()
    }

    /// Returns the number of value-carrying entries.
    fn len(&self) -> usize;

    /// Returns `true` if the cache holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the configured capacity (an entry count).
    fn capacity(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    // Minimal contract check against a mock policy: defaults compose
    // with only the three required methods implemented.
    struct MockCache {
        map: Mutex<HashMap<u32, String>>,
        capacity: usize,
    }

    impl CachePolicy<u32, String> for MockCache {
        fn put(&self, key: u32, value: String) {
            if self.capacity == 0 {
                return;
            }
            self.map.lock().insert(key, value);
        }

        fn get(&self, key: &u32) -> Option<String> {
            self.map.lock().get(key).cloned()
        }

        fn len(&self) -> usize {
            self.map.lock().len()
        }

        fn capacity(&self) -> usize {
            self.capacity
        }
    }

    #[test]
    fn get_or_default_falls_back_on_miss() {
        let cache = MockCache {
            map: Mutex::new(HashMap::new()),
            capacity: 4,
        };
        cache.put(1, "hit".to_string());
        assert_eq!(cache.get_or_default(&1), "hit");
        assert_eq!(cache.get_or_default(&2), String::new());
    }

    #[test]
    fn is_empty_tracks_len() {
        let cache = MockCache {
            map: Mutex::new(HashMap::new()),
            capacity: 4,
        };
        assert!(cache.is_empty());
        cache.put(1, "x".to_string());
        assert!(!cache.is_empty());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn zero_capacity_contract() {
        let cache = MockCache {
            map: Mutex::new(HashMap::new()),
            capacity: 0,
        };
        cache.put(1, "x".to_string());
        assert_eq!(cache.get(&1), None);
        assert!(cache.is_empty());
    }
}
