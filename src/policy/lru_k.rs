//! # LRU-K: recency eviction with a history admission filter
//!
//! A plain LRU promotes a key to most-recent on its very first touch,
//! so a one-pass scan can flush the whole working set. LRU-K refuses
//! residency until a key has been seen `K` times: accesses accumulate
//! in a *history* cache (itself an LRU of counters, sized at
//! `history_ratio ×` the main capacity), and only on the K-th access
//! does the key, with its deferred value, move into the main cache.
//!
//! ```text
//!   access(key)
//!      │ count history[key] += 1
//!      ▼
//!   ┌─────────────────────────┐   count >= K    ┌──────────────────┐
//!   │ history: LruCache<K,u64>│ ───────────────►│ main: LruCache   │
//!   │ pending: FxHashMap<K,V> │    promote      │   (residency)    │
//!   └─────────────────────────┘                 └──────────────────┘
//! ```
//!
//! Values offered by `put` before the threshold is reached wait in the
//! `pending` side map; a later `put` below threshold simply overwrites
//! the waiting value. Keys whose history entry is evicted (the history
//! LRU is bounded too) lose their progress toward promotion, but any
//! pending value stays until the key is promoted or the cache is
//! cleared.
//!
//! ## Locking
//!
//! Main and history are each a [`LruCache`] with their own mutex, and
//! the pending map has a third. An operation holds at most one of the
//! three locks at a time: the sub-caches are called and released
//! before the pending lock is taken.

use std::hash::Hash;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::error::ConfigError;
use crate::policy::lru::LruCache;
use crate::traits::CachePolicy;

/// Default number of accesses required for promotion.
pub const DEFAULT_K: usize = 2;
/// Default history capacity as a multiple of the main capacity.
pub const DEFAULT_HISTORY_RATIO: f64 = 2.5;

/// LRU cache gated by a K-access history filter.
///
/// # Example
///
/// ```
/// use cachemux::policy::lru_k::LruKCache;
/// use cachemux::traits::CachePolicy;
///
/// let cache = LruKCache::new(2); // K = 2
/// cache.put(1, "a");             // first access: not yet resident
/// assert_eq!(cache.get(&1), Some("a")); // second access: promoted
/// assert_eq!(cache.get(&1), Some("a")); // now a plain main-cache hit
/// ```
#[derive(Debug)]
pub struct LruKCache<K, V> {
    main: LruCache<K, V>,
    history: LruCache<K, u64>,
    pending: Mutex<FxHashMap<K, V>>,
    k: u64,
    capacity: usize,
    history_capacity: usize,
}

impl<K, V> LruKCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an LRU-K cache with `K = 2` and the default history
    /// ratio of 2.5.
    pub fn new(capacity: usize) -> Self {
        Self::with_params(capacity, DEFAULT_K, DEFAULT_HISTORY_RATIO)
    }

    /// Creates an LRU-K cache with explicit `k` and history sizing.
    ///
    /// `k` is clamped to at least 1; a non-positive `history_ratio`
    /// falls back to the default. Use [`try_with_params`] to reject
    /// such inputs instead.
    ///
    /// [`try_with_params`]: Self::try_with_params
    pub fn with_params(capacity: usize, k: usize, history_ratio: f64) -> Self {
        let history_ratio = if history_ratio > 0.0 {
            history_ratio
        } else {
            DEFAULT_HISTORY_RATIO
        };
        let history_capacity = (capacity as f64 * history_ratio).ceil() as usize;
        Self {
            main: LruCache::new(capacity),
            history: LruCache::new(history_capacity),
            pending: Mutex::new(FxHashMap::default()),
            k: k.max(1) as u64,
            capacity,
            history_capacity,
        }
    }

    /// Validating constructor: `k >= 1` and `history_ratio > 0`.
    pub fn try_with_params(capacity: usize, k: usize, history_ratio: f64) -> Result<Self, ConfigError> {
        if k == 0 {
            return Err(ConfigError::new("lru-k: k must be at least 1"));
        }
        if !history_ratio.is_finite() || history_ratio <= 0.0 {
            return Err(ConfigError::new("lru-k: history ratio must be positive"));
        }
        Ok(Self::with_params(capacity, k, history_ratio))
    }

    /// Returns the promotion threshold K.
    pub fn k_value(&self) -> usize {
        self.k as usize
    }

    /// Returns the capacity of the history cache.
    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    /// Returns `true` if `key` is resident in the main cache.
    pub fn is_resident(&self, key: &K) -> bool {
        self.main.contains(key)
    }

    /// Drops residency, history and pending values.
    pub fn clear(&self) {
        self.main.clear();
        self.history.clear();
        self.pending.lock().clear();
    }

    /// Counts one access against the history and returns the new tally.
    fn record_access(&self, key: &K) -> u64 {
        let count = self.history.get(key).unwrap_or(0).saturating_add(1);
        self.history.put(key.clone(), count);
        count
    }
}

impl<K, V> CachePolicy<K, V> for LruKCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Offers a value. Below the K-threshold the value is parked in the
    /// pending map (overwriting any earlier offer); at the threshold
    /// the key is promoted into the main cache.
    fn put(&self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        if self.main.get(&key).is_some() {
            self.main.put(key, value);
            return;
        }

        let count = self.record_access(&key);
        if count >= self.k {
            self.history.remove(&key);
            self.pending.lock().remove(&key);
            self.main.put(key, value);
        } else {
            self.pending.lock().insert(key, value);
        }
    }

    /// Looks up `key`, counting the access toward promotion either way.
    /// A miss that crosses the K-threshold promotes the pending value
    /// and returns it.
    fn get(&self, key: &K) -> Option<V> {
        if self.capacity == 0 {
            return None;
        }
        let resident = self.main.get(key);
        let count = self.record_access(key);
        if resident.is_some() {
            return resident;
        }

        if count >= self.k {
            let parked = self.pending.lock().remove(key);
            if let Some(value) = parked {
                self.history.remove(key);
                self.main.put(key.clone(), value.clone());
                return Some(value);
            }
        }
        None
    }

    fn len(&self) -> usize {
        self.main.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
