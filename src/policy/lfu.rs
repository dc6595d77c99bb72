//! # LFU (Least Frequently Used) replacement policy, with aging
//!
//! Evicts the entry with the lowest access count; ties break FIFO
//! (oldest arrival in the minimum bucket goes first). Ordering lives in
//! [`FrequencyBuckets`]; values sit beside it in a flat map.
//!
//! ```text
//!   ┌─────────────────────────────────────────────────────────┐
//!   │                     LfuCore<K, V>                       │
//!   │                                                         │
//!   │   buckets: freq → FIFO chain        values: K → V       │
//!   │      1 ─► [d] ─► [e]   ◄─ eviction candidates           │
//!   │      3 ─► [b]                                           │
//!   │      7 ─► [a] ─► [c]   ◄─ hot set                       │
//!   └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Frequency pressure valves
//!
//! Raw LFU never forgets: a key that was hot last week outranks
//! everything inserted today. Two counter-pressure mechanisms bound
//! that effect, both driven from the running average frequency
//! (`total_frequency / len`):
//!
//! - **Overflow shedding** (plain LFU): when the average exceeds
//!   `max_average_frequency`, subtract `max_average_frequency / 2`
//!   from every entry (floored at 1).
//! - **Aging** (the `with_aging` variant): every `aging_threshold`
//!   operations *or* on average overflow, multiply every frequency by
//!   `aging_factor` (floored at 1), so stale popularity decays
//!   geometrically.
//!
//! Both rebucket every entry and recompute the frequency total.
//!
//! One quirk is kept deliberately: `put` on an existing key both
//! overwrites the value and runs the hit path, so a replacement counts
//! as an access.

use std::hash::Hash;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::ds::frequency_buckets::FrequencyBuckets;
use crate::error::ConfigError;
use crate::traits::CachePolicy;

/// Default ceiling on the average frequency before shedding kicks in.
pub const DEFAULT_MAX_AVERAGE_FREQUENCY: u64 = 1_000_000;
/// Default operation cadence of the aging pass.
pub const DEFAULT_AGING_THRESHOLD: u64 = 10_000;
/// Default multiplicative decay applied by the aging pass.
pub const DEFAULT_AGING_FACTOR: f64 = 0.8;

#[derive(Debug, Clone, Copy)]
struct AgingConfig {
    threshold: u64,
    factor: f64,
}

/// Unsynchronised LFU core.
///
/// Single-threaded by design; wrap it in [`LfuCache`] for shared use.
#[derive(Debug)]
pub struct LfuCore<K, V> {
    buckets: FrequencyBuckets<K>,
    values: FxHashMap<K, V>,
    capacity: usize,
    max_average_frequency: u64,
    aging: Option<AgingConfig>,
    total_frequency: u64,
    operations: u64,
}

impl<K, V> LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Plain LFU with the default average-frequency ceiling.
    pub fn new(capacity: usize) -> Self {
        Self::with_max_average_frequency(capacity, DEFAULT_MAX_AVERAGE_FREQUENCY)
    }

    /// Plain LFU with an explicit average-frequency ceiling.
    pub fn with_max_average_frequency(capacity: usize, max_average_frequency: u64) -> Self {
        Self {
            buckets: FrequencyBuckets::new(),
            values: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            capacity,
            max_average_frequency: max_average_frequency.max(1),
            aging: None,
            total_frequency: 0,
            operations: 0,
        }
    }

    /// Aging LFU: decays every `aging_threshold` operations (clamped to
    /// at least 1) or on average overflow, multiplying frequencies by
    /// `aging_factor`.
    pub fn with_aging(
        capacity: usize,
        max_average_frequency: u64,
        aging_threshold: u64,
        aging_factor: f64,
    ) -> Self {
        let factor = if aging_factor > 0.0 && aging_factor <= 1.0 {
            aging_factor
        } else {
            DEFAULT_AGING_FACTOR
        };
        Self {
            aging: Some(AgingConfig {
                threshold: aging_threshold.max(1),
                factor,
            }),
            ..Self::with_max_average_frequency(capacity, max_average_frequency)
        }
    }

    /// Inserts or overwrites `key`, returning the previous value.
    ///
    /// Overwriting runs the hit path (the access count goes up); a
    /// fresh insert on a full cache evicts from the minimum-frequency
    /// bucket first and starts the key at frequency 1.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(slot) = self.values.get_mut(&key) {
            let previous = std::mem::replace(slot, value);
            self.record_hit(&key);
            return Some(previous);
        }

        if self.capacity == 0 {
            return None;
        }
        if self.values.len() >= self.capacity {
            self.evict();
        }

        self.buckets.insert(key.clone());
        self.values.insert(key, value);
        self.note_operation(1);
        None
    }

    /// Looks up `key`, incrementing its frequency on a hit.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        if !self.values.contains_key(key) {
            return None;
        }
        self.record_hit(key);
        self.values.get(key)
    }

    /// Read-only lookup that does not count an access.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.values.get(key)
    }

    /// Returns `true` without counting an access.
    pub fn contains(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    /// Removes `key` and returns its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.values.remove(key)?;
        if let Some(freq) = self.buckets.remove(key) {
            self.total_frequency = self.total_frequency.saturating_sub(freq);
        }
        Some(value)
    }

    /// Returns the access count for `key`.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.buckets.frequency(key)
    }

    /// Returns the smallest frequency among resident entries.
    pub fn min_frequency(&self) -> Option<u64> {
        self.buckets.min_frequency()
    }

    /// Returns the current average frequency (0 when empty).
    pub fn average_frequency(&self) -> u64 {
        if self.values.is_empty() {
            0
        } else {
            self.total_frequency / self.values.len() as u64
        }
    }

    /// Returns the number of resident entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no entries are resident.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops all entries and resets the frequency accounting.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.values.clear();
        self.total_frequency = 0;
        self.operations = 0;
    }

    fn record_hit(&mut self, key: &K) {
        self.buckets.touch(key);
        self.note_operation(1);
    }

    /// Books `freq_delta` into the running total and runs whichever
    /// pressure valve is configured.
    fn note_operation(&mut self, freq_delta: u64) {
        self.total_frequency = self.total_frequency.saturating_add(freq_delta);
        self.operations = self.operations.wrapping_add(1);

        match self.aging {
            Some(cfg) => {
                if self.operations % cfg.threshold == 0
                    || self.average_frequency() > self.max_average_frequency
                {
                    self.perform_aging(cfg.factor);
                }
            }
            None => {
                if self.average_frequency() > self.max_average_frequency {
                    self.shed_overflow();
                }
            }
        }
    }

    fn evict(&mut self) {
        if let Some((key, freq)) = self.buckets.pop_min() {
            self.values.remove(&key);
            self.total_frequency = self.total_frequency.saturating_sub(freq);
        }
    }

    fn perform_aging(&mut self, factor: f64) {
        if self.values.is_empty() {
            return;
        }
        self.total_frequency = self.buckets.retune(|freq| (freq as f64 * factor) as u64);
    }

    fn shed_overflow(&mut self) {
        if self.values.is_empty() {
            return;
        }
        let shed = self.max_average_frequency / 2;
        self.total_frequency = self.buckets.retune(|freq| freq.saturating_sub(shed));
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert!(self.values.len() <= self.capacity);
        assert_eq!(self.values.len(), self.buckets.len());
        for key in self.values.keys() {
            assert!(self.buckets.contains(key));
        }
        self.buckets.debug_validate_invariants();
    }
}

/// Thread-safe LFU cache: [`LfuCore`] behind a single mutex.
///
/// # Example
///
/// ```
/// use cachemux::policy::lfu::LfuCache;
/// use cachemux::traits::CachePolicy;
///
/// let cache = LfuCache::new(2);
/// cache.put(1, "a");
/// cache.put(2, "b");
/// cache.get(&1);
/// cache.get(&1);
/// cache.put(3, "c"); // evicts key 2 (frequency 1)
///
/// assert_eq!(cache.get(&2), None);
/// assert_eq!(cache.get(&1), Some("a"));
/// assert_eq!(cache.get(&3), Some("c"));
/// ```
#[derive(Debug)]
pub struct LfuCache<K, V> {
    inner: Mutex<LfuCore<K, V>>,
}

impl<K, V> LfuCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Plain LFU with the default average-frequency ceiling.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LfuCore::new(capacity)),
        }
    }

    /// Plain LFU with an explicit average-frequency ceiling.
    pub fn with_max_average_frequency(capacity: usize, max_average_frequency: u64) -> Self {
        Self {
            inner: Mutex::new(LfuCore::with_max_average_frequency(
                capacity,
                max_average_frequency,
            )),
        }
    }

    /// Aging LFU; see [`LfuCore::with_aging`].
    pub fn with_aging(
        capacity: usize,
        max_average_frequency: u64,
        aging_threshold: u64,
        aging_factor: f64,
    ) -> Self {
        Self {
            inner: Mutex::new(LfuCore::with_aging(
                capacity,
                max_average_frequency,
                aging_threshold,
                aging_factor,
            )),
        }
    }

    /// Validating aging constructor: `aging_threshold >= 1` and
    /// `aging_factor` in `(0, 1]`.
    pub fn try_with_aging(
        capacity: usize,
        max_average_frequency: u64,
        aging_threshold: u64,
        aging_factor: f64,
    ) -> Result<Self, ConfigError> {
        if aging_threshold == 0 {
            return Err(ConfigError::new("lfu: aging threshold must be at least 1"));
        }
        if !aging_factor.is_finite() || aging_factor <= 0.0 || aging_factor > 1.0 {
            return Err(ConfigError::new("lfu: aging factor must be in (0, 1]"));
        }
        Ok(Self::with_aging(
            capacity,
            max_average_frequency,
            aging_threshold,
            aging_factor,
        ))
    }

    /// Removes `key` and returns its value.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.lock().remove(key)
    }

    /// Drops all entries and resets the frequency accounting.
    pub fn purge(&self) {
        self.inner.lock().clear();
    }

    /// Returns the access count for `key`.
    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.inner.lock().frequency(key)
    }

    /// Returns the smallest frequency among resident entries.
    pub fn min_frequency(&self) -> Option<u64> {
        self.inner.lock().min_frequency()
    }

    /// Returns the current average frequency (0 when empty).
    pub fn average_frequency(&self) -> u64 {
        self.inner.lock().average_frequency()
    }

    /// Returns `true` without counting an access.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }
}

impl<K, V> CachePolicy<K, V> for LfuCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn put(&self, key: K, value: V) {
        self.inner.lock().insert(key, value);
    }

    fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().get(key).cloned()
    }

    fn len(&self) -> usize {
        self.inner.lock().len()
    }

    fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_minimum_frequency_first() {
        let mut cache = LfuCore::new(2);
        cache.insert(1, 'a');
        cache.insert(2, 'b');
        cache.get(&1);
        cache.get(&1);
        cache.insert(3, 'c');

        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.get(&1), Some(&'a'));
        assert_eq!(cache.get(&3), Some(&'c'));
        cache.debug_validate_invariants();
    }

    #[test]
    fn ties_break_fifo() {
        let mut cache = LfuCore::new(3);
        cache.insert(1, "a");
        cache.insert(2, "b");
        cache.insert(3, "c");
        // All at frequency 1; key 1 arrived first.
        cache.insert(4, "d");
        assert!(!cache.contains(&1));
        assert!(cache.contains(&2));
    }

    #[test]
    fn overwrite_counts_as_access() {
        let mut cache = LfuCore::new(2);
        cache.insert(1, "a");
        assert_eq!(cache.frequency(&1), Some(1));
        assert_eq!(cache.insert(1, "a2"), Some("a"));
        assert_eq!(cache.frequency(&1), Some(2));
        assert_eq!(cache.peek(&1), Some(&"a2"));
    }

    #[test]
    fn min_frequency_follows_hits_and_eviction() {
        let mut cache = LfuCore::new(2);
        cache.insert(1, "a");
        cache.insert(2, "b");
        assert_eq!(cache.min_frequency(), Some(1));
        cache.get(&1);
        cache.get(&2);
        assert_eq!(cache.min_frequency(), Some(2));

        cache.remove(&1);
        cache.remove(&2);
        assert_eq!(cache.min_frequency(), None);
        // A fresh insert restarts the floor at 1.
        cache.insert(3, "c");
        assert_eq!(cache.min_frequency(), Some(1));
    }

    #[test]
    fn remove_adjusts_totals() {
        let mut cache = LfuCore::new(4);
        cache.insert(1, "a");
        cache.get(&1);
        cache.insert(2, "b");
        let total_before = cache.average_frequency() * cache.len() as u64;
        assert_eq!(cache.remove(&1), Some("a"));
        assert!(cache.average_frequency() * cache.len() as u64 <= total_before);
        cache.debug_validate_invariants();
    }

    #[test]
    fn aging_decays_frequencies_multiplicatively() {
        // Overflow valve disabled by a huge ceiling; aging fires on the
        // operation cadence alone (every 8th operation).
        let mut cache = LfuCore::with_aging(4, u64::MAX, 8, 0.5);
        cache.insert(1, "a"); // op 1
        cache.insert(2, "b"); // op 2
        for _ in 0..5 {
            cache.get(&1); // ops 3..=7, key 1 at frequency 6
        }
        assert_eq!(cache.frequency(&1), Some(6));
        cache.get(&2); // op 8: aging fires after the touch
        assert_eq!(cache.frequency(&1), Some(3));
        assert_eq!(cache.frequency(&2), Some(1));
        cache.debug_validate_invariants();
    }

    #[test]
    fn aging_protects_new_keys_from_stale_hot_set() {
        let mut cache = LfuCore::with_aging(2, u64::MAX, 4, 0.5);
        cache.insert(1, "hot");
        cache.get(&1);
        cache.get(&1);
        cache.get(&1); // op 4: aging halves key 1 to 2
        assert_eq!(cache.frequency(&1), Some(2));
    }

    #[test]
    fn overflow_shedding_bounds_average() {
        let mut cache = LfuCore::with_max_average_frequency(1, 10);
        cache.insert(1, "a");
        for _ in 0..50 {
            cache.get(&1);
        }
        // Each time the average passes 10, 5 is shed from every entry.
        let freq = cache.frequency(&1).unwrap();
        assert!(freq <= 11, "frequency {freq} escaped the ceiling");
        assert!(freq >= 1);
    }

    #[test]
    fn zero_capacity_is_inert() {
        let mut cache = LfuCore::new(0);
        assert_eq!(cache.insert(1, "a"), None);
        assert_eq!(cache.get(&1), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn wrapper_purge_resets_accounting() {
        let cache = LfuCache::new(4);
        cache.put(1, "a");
        cache.get(&1);
        cache.purge();
        assert!(cache.is_empty());
        assert_eq!(cache.min_frequency(), None);
        assert_eq!(cache.average_frequency(), 0);
        cache.put(2, "b");
        assert_eq!(cache.frequency(&2), Some(1));
    }

    #[test]
    fn try_with_aging_validates_parameters() {
        assert!(LfuCache::<u32, u32>::try_with_aging(4, 100, 0, 0.5).is_err());
        assert!(LfuCache::<u32, u32>::try_with_aging(4, 100, 10, 0.0).is_err());
        assert!(LfuCache::<u32, u32>::try_with_aging(4, 100, 10, 1.5).is_err());
        assert!(LfuCache::<u32, u32>::try_with_aging(4, 100, 10, 0.5).is_ok());
    }

    #[test]
    fn wrapper_contract() {
        let cache = LfuCache::new(2);
        cache.put(1, 10);
        assert_eq!(cache.get(&1), Some(10));
        assert_eq!(cache.get_or_default(&2), 0);
        assert_eq!(cache.capacity(), 2);
        assert_eq!(cache.remove(&1), Some(10));
        assert!(cache.is_empty());
    }
}
