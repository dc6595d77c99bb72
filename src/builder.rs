//! Unified construction over every eviction policy.
//!
//! [`PolicyKind`] is the closed sum of the crate's policies and
//! [`CacheBuilder::build`] turns one into a [`Cache`], an enum
//! wrapper dispatching the [`CachePolicy`] contract to the selected
//! implementation. Use this when the policy is chosen at runtime
//! (configuration, experiments); reach for the concrete types when you
//! need their policy-specific APIs.
//!
//! ```
//! use cachemux::builder::{CacheBuilder, PolicyKind};
//! use cachemux::traits::CachePolicy;
//!
//! let cache = CacheBuilder::new(100).build::<u64, String>(PolicyKind::WTinyLfu);
//! cache.put(1, "hello".to_string());
//! assert_eq!(cache.get(&1), Some("hello".to_string()));
//! ```

use std::hash::Hash;

use crate::policy::adaptive::AdaptiveCache;
use crate::policy::arc::ArcCache;
use crate::policy::lfu::LfuCache;
use crate::policy::lru::LruCache;
use crate::policy::lru_k::LruKCache;
use crate::policy::sharded_lru::ShardedLruCache;
use crate::policy::tiny_lfu::WTinyLfuCache;
use crate::traits::CachePolicy;

/// Selectable eviction policies.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyKind {
    /// Least Recently Used.
    Lru,
    /// LRU with a K-access history admission filter.
    LruK {
        /// Accesses required for promotion into the main cache.
        k: usize,
    },
    /// Hash-partitioned LRU with independent shard locks.
    ShardedLru {
        /// Number of partitions.
        shards: usize,
    },
    /// Least Frequently Used with overflow shedding.
    Lfu,
    /// LFU with periodic multiplicative frequency decay.
    LfuAging {
        /// Average-frequency ceiling.
        max_average_frequency: u64,
        /// Operations between decays.
        aging_threshold: u64,
        /// Multiplicative decay factor in `(0, 1]`.
        aging_factor: f64,
    },
    /// Adaptive Replacement Cache.
    Arc,
    /// Window LRU + main LRU behind a Count-Min admission filter.
    WTinyLfu,
    /// Shadow-evaluating supervisor over LRU/LFU/LFU-Aging/ARC.
    Adaptive,
}

enum CacheInner<K, V> {
    Lru(LruCache<K, V>),
    LruK(LruKCache<K, V>),
    ShardedLru(ShardedLruCache<K, V>),
    Lfu(LfuCache<K, V>),
    Arc(ArcCache<K, V>),
    WTinyLfu(WTinyLfuCache<K, V>),
    Adaptive(AdaptiveCache<K, V>),
}

/// Policy-erased cache produced by [`CacheBuilder`].
pub struct Cache<K, V> {
    inner: CacheInner<K, V>,
}

macro_rules! dispatch {
    ($self:expr, $cache:ident => $body:expr) => {
        match &$self.inner {
            CacheInner::Lru($cache) => $body,
            CacheInner::LruK($cache) => $body,
            CacheInner::ShardedLru($cache) => $body,
            CacheInner::Lfu($cache) => $body,
            CacheInner::Arc($cache) => $body,
            CacheInner::WTinyLfu($cache) => $body,
            CacheInner::Adaptive($cache) => $body,
        }
    };
}

impl<K, V> CachePolicy<K, V> for Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn put(&self, key: K, value: V) {
        dispatch!(self, cache => cache.put(key, value))
    }

    fn get(&self, key: &K) -> Option<V> {
        dispatch!(self, cache => cache.get(key))
    }

    fn len(&self) -> usize {
        dispatch!(self, cache => cache.len())
    }

    fn capacity(&self) -> usize {
        dispatch!(self, cache => cache.capacity())
    }
}

/// Builder carrying the shared capacity parameter.
pub struct CacheBuilder {
    capacity: usize,
}

impl CacheBuilder {
    /// Starts a builder for caches of `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Builds a cache with the selected policy, using each policy's
    /// default tuning for anything not carried by the variant.
    pub fn build<K, V>(self, policy: PolicyKind) -> Cache<K, V>
    where
        K: Eq + Hash + Clone,
        V: Clone,
    {
        let inner = match policy {
            PolicyKind::Lru => CacheInner::Lru(LruCache::new(self.capacity)),
            PolicyKind::LruK { k } => CacheInner::LruK(LruKCache::with_params(
                self.capacity,
                k,
                crate::policy::lru_k::DEFAULT_HISTORY_RATIO,
            )),
            PolicyKind::ShardedLru { shards } => {
                CacheInner::ShardedLru(ShardedLruCache::new(self.capacity, shards))
            }
            PolicyKind::Lfu => CacheInner::Lfu(LfuCache::new(self.capacity)),
            PolicyKind::LfuAging {
                max_average_frequency,
                aging_threshold,
                aging_factor,
            } => CacheInner::Lfu(LfuCache::with_aging(
                self.capacity,
                max_average_frequency,
                aging_threshold,
                aging_factor,
            )),
            PolicyKind::Arc => CacheInner::Arc(ArcCache::new(self.capacity)),
            PolicyKind::WTinyLfu => CacheInner::WTinyLfu(WTinyLfuCache::new(self.capacity)),
            PolicyKind::Adaptive => CacheInner::Adaptive(AdaptiveCache::new(self.capacity)),
        };
        Cache { inner }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::lfu::{DEFAULT_AGING_THRESHOLD, DEFAULT_MAX_AVERAGE_FREQUENCY};

    fn all_policies() -> Vec<PolicyKind> {
        vec![
            PolicyKind::Lru,
            PolicyKind::LruK { k: 1 },
            PolicyKind::ShardedLru { shards: 4 },
            PolicyKind::Lfu,
            PolicyKind::LfuAging {
                max_average_frequency: DEFAULT_MAX_AVERAGE_FREQUENCY,
                aging_threshold: DEFAULT_AGING_THRESHOLD,
                aging_factor: 0.8,
            },
            PolicyKind::Arc,
            PolicyKind::WTinyLfu,
            PolicyKind::Adaptive,
        ]
    }

    #[test]
    fn every_policy_satisfies_the_contract() {
        for policy in all_policies() {
            let cache = CacheBuilder::new(10).build::<u64, String>(policy.clone());

            cache.put(1, "one".to_string());
            cache.put(2, "two".to_string());
            assert_eq!(
                cache.get(&1),
                Some("one".to_string()),
                "policy {policy:?} lost key 1"
            );
            assert_eq!(cache.get(&3), None, "policy {policy:?} invented key 3");
            assert_eq!(cache.get_or_default(&3), String::new());
            assert!(cache.len() >= 1, "policy {policy:?} reports empty");
            assert_eq!(cache.capacity(), 10);
        }
    }

    #[test]
    fn every_policy_respects_zero_capacity() {
        for policy in all_policies() {
            let cache = CacheBuilder::new(0).build::<u64, String>(policy.clone());
            cache.put(1, "x".to_string());
            assert_eq!(cache.get(&1), None, "policy {policy:?} stored at capacity 0");
            assert_eq!(cache.len(), 0);
        }
    }

    #[test]
    fn overwrite_is_visible_everywhere() {
        for policy in all_policies() {
            let cache = CacheBuilder::new(10).build::<u64, u64>(policy.clone());
            cache.put(7, 1);
            cache.put(7, 2);
            assert_eq!(cache.get(&7), Some(2), "policy {policy:?} kept a stale value");
        }
    }
}
