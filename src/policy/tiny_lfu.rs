//! # W-TinyLFU: windowed LRU tiers behind a frequency admission filter
//!
//! Two LRU tiers and a [`CountMinSketch`]:
//!
//! ```text
//!                  put(new key)
//!                       │
//!                       ▼
//!   ┌───────────────────────────┐  window full: push oldest
//!   │  window LRU (~1% of C)    │ ──────────────────────────┐
//!   └───────────────────────────┘                           ▼
//!                                              ┌─────────────────────┐
//!                                              │   admission filter  │
//!                                              │ est(candidate) ≥    │
//!                                              │ est(main oldest)?   │
//!                                              └──────────┬──────────┘
//!                                no: discard candidate    │ yes: evict
//!                                                         ▼ incumbent
//!                                      ┌───────────────────────────┐
//!                                      │   main LRU (rest of C)    │
//!                                      └───────────────────────────┘
//! ```
//!
//! Every access increments the sketch. New keys always enter the
//! window; the window's eviction victim must beat the main tier's
//! eviction victim on estimated frequency to displace it, so one-touch
//! scan traffic dies in the window without disturbing the main tier. Hits refresh recency *within* their tier only: a main
//! hit never returns to the window, and a window hit waits for natural
//! rotation.
//!
//! Every 1000 admissions the sketch counters are halved, so estimates
//! track the recent workload rather than all of history.
//!
//! ## Locking
//!
//! [`WTinyLfuCache`] holds the structural state under one mutex and
//! the access/admission counters under a second. The stats lock is
//! only ever taken while the structural lock is held (or alone, by the
//! read-only accessors), never the other way around.

use std::hash::Hash;

use parking_lot::Mutex;

use crate::ds::cm_sketch::CountMinSketch;
use crate::error::ConfigError;
use crate::metrics::TinyLfuStats;
use crate::policy::lru::LruCore;
use crate::traits::CachePolicy;

/// Default share of the capacity given to the window tier.
pub const DEFAULT_WINDOW_RATIO: f64 = 0.01;
/// Admissions between sketch decays.
const DECAY_INTERVAL: u64 = 1000;
/// Sketch rows.
const SKETCH_DEPTH: usize = 4;
/// Sketch row width floor.
const SKETCH_MIN_WIDTH: usize = 256;

/// Which tier served a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Window,
    Main,
}

/// What happened when a window victim was pushed at the main tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    /// Main had room; no contest.
    Vacant,
    /// Candidate displaced the incumbent.
    Won,
    /// Candidate was discarded.
    Lost,
}

/// Unsynchronised W-TinyLFU core; [`WTinyLfuCache`] owns one behind
/// its structural lock.
#[derive(Debug)]
struct TinyLfuCore<K, V> {
    window: LruCore<K, V>,
    main: LruCore<K, V>,
    sketch: CountMinSketch,
    capacity: usize,
    admissions: u64,
}

impl<K, V> TinyLfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates a core splitting `capacity` per `window_ratio`.
    ///
    /// The window gets `ceil(capacity × ratio)` slots, clamped so that
    /// for `capacity >= 2` both tiers hold at least one entry. A
    /// non-positive or non-finite ratio falls back to the default.
    fn new(capacity: usize, window_ratio: f64) -> Self {
        let ratio = if window_ratio.is_finite() && window_ratio > 0.0 && window_ratio <= 1.0 {
            window_ratio
        } else {
            DEFAULT_WINDOW_RATIO
        };
        let window_capacity = match capacity {
            0 => 0,
            1 => 1,
            _ => ((capacity as f64 * ratio).ceil() as usize).clamp(1, capacity - 1),
        };
        let main_capacity = capacity - window_capacity;
        let sketch_width = SKETCH_MIN_WIDTH.max(capacity.saturating_mul(4));
        Self {
            window: LruCore::new(window_capacity),
            main: LruCore::new(main_capacity),
            sketch: CountMinSketch::new(sketch_width, SKETCH_DEPTH, capacity),
            capacity,
            admissions: 0,
        }
    }

    /// Inserts or overwrites `key`, reporting the admission contest
    /// this insert triggered, if any.
    fn insert(&mut self, key: K, value: V) -> Option<Admission> {
        if self.capacity == 0 {
            return None;
        }
        self.sketch.increment(&key);

        if self.window.contains(&key) {
            self.window.insert(key, value);
            return None;
        }
        // An overwrite in main refreshes recency there; it does not
        // migrate the entry back to the window.
        if self.main.contains(&key) {
            self.main.insert(key, value);
            return None;
        }

        let outcome = if self.window.len() >= self.window.capacity() {
            self.rotate_window()
        } else {
            None
        };
        self.window.insert(key, value);
        outcome
    }

    /// Looks up `key`, telling the caller which tier answered.
    fn get(&mut self, key: &K) -> Option<(&V, Tier)> {
        if self.capacity == 0 {
            return None;
        }
        self.sketch.increment(key);

        if self.window.contains(key) {
            // Stays in the window; rotation will push it out later.
            return self.window.get(key).map(|value| (value, Tier::Window));
        }
        if self.main.contains(key) {
            return self.main.get(key).map(|value| (value, Tier::Main));
        }
        None
    }

    /// Removes `key` from whichever tier holds it.
    fn remove(&mut self, key: &K) -> Option<V> {
        self.window.remove(key).or_else(|| self.main.remove(key))
    }

    /// The next eviction victim: the main tier's oldest entry, or the
    /// window's when main is empty.
    fn oldest_key(&self) -> Option<&K> {
        self.main.oldest_key().or_else(|| self.window.oldest_key())
    }

    fn contains(&self, key: &K) -> bool {
        self.window.contains(key) || self.main.contains(key)
    }

    fn len(&self) -> usize {
        self.window.len() + self.main.len()
    }

    fn window_capacity(&self) -> usize {
        self.window.capacity()
    }

    fn main_capacity(&self) -> usize {
        self.main.capacity()
    }

    /// Drops both tiers and zeroes the sketch.
    fn reset(&mut self) {
        self.window.clear();
        self.main.clear();
        self.sketch.reset();
        self.admissions = 0;
    }

    /// Evicts the window's oldest entry and offers it to main.
    fn rotate_window(&mut self) -> Option<Admission> {
        let (candidate_key, candidate_value) = self.window.pop_oldest()?;
        Some(self.admit(candidate_key, candidate_value))
    }

    /// The admission filter. Vacant main accepts unconditionally; a
    /// full main pits the candidate against its oldest entry and the
    /// higher estimated frequency stays (ties favour the candidate).
    fn admit(&mut self, key: K, value: V) -> Admission {
        self.admissions += 1;
        if self.admissions % DECAY_INTERVAL == 0 {
            self.sketch.decay();
        }

        if self.main.len() < self.main.capacity() {
            self.main.insert(key, value);
            return Admission::Vacant;
        }

        let candidate_estimate = self.sketch.estimate(&key);
        let incumbent_estimate = match self.main.oldest_key() {
            Some(incumbent) => self.sketch.estimate(incumbent),
            // Zero-width main: nowhere to admit to.
            None => return Admission::Lost,
        };

        if candidate_estimate >= incumbent_estimate {
            self.main.pop_oldest();
            self.main.insert(key, value);
            Admission::Won
        } else {
            Admission::Lost
        }
    }

    #[cfg(test)]
    fn debug_validate_invariants(&self) {
        assert_eq!(self.window.capacity() + self.main.capacity(), self.capacity);
        if self.capacity >= 2 {
            assert!(self.window.capacity() >= 1);
            assert!(self.main.capacity() >= 1);
        }
        assert!(self.len() <= self.capacity);
        self.window.debug_validate_invariants();
        self.main.debug_validate_invariants();
    }
}

/// Thread-safe W-TinyLFU cache.
///
/// # Example
///
/// ```
/// use cachemux::policy::tiny_lfu::WTinyLfuCache;
/// use cachemux::traits::CachePolicy;
///
/// let cache = WTinyLfuCache::new(100);
/// assert_eq!(cache.window_capacity(), 1);
/// assert_eq!(cache.main_capacity(), 99);
///
/// cache.put(1, "a");
/// assert_eq!(cache.get(&1), Some("a"));
/// assert!(cache.hit_rate() > 0.0);
/// ```
#[derive(Debug)]
pub struct WTinyLfuCache<K, V> {
    inner: Mutex<TinyLfuCore<K, V>>,
    stats: Mutex<TinyLfuStats>,
}

impl<K, V> WTinyLfuCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a cache with the default 1% window.
    pub fn new(capacity: usize) -> Self {
        Self::with_window_ratio(capacity, DEFAULT_WINDOW_RATIO)
    }

    /// Creates a cache with an explicit window share. Invalid ratios
    /// fall back to the default; use [`try_with_window_ratio`] to
    /// reject them instead.
    ///
    /// [`try_with_window_ratio`]: Self::try_with_window_ratio
    pub fn with_window_ratio(capacity: usize, window_ratio: f64) -> Self {
        Self {
            inner: Mutex::new(TinyLfuCore::new(capacity, window_ratio)),
            stats: Mutex::new(TinyLfuStats::default()),
        }
    }

    /// Validating constructor: `window_ratio` must be in `(0, 1]`.
    pub fn try_with_window_ratio(capacity: usize, window_ratio: f64) -> Result<Self, ConfigError> {
        if !window_ratio.is_finite() || window_ratio <= 0.0 || window_ratio > 1.0 {
            return Err(ConfigError::new("w-tinylfu: window ratio must be in (0, 1]"));
        }
        Ok(Self::with_window_ratio(capacity, window_ratio))
    }

    /// Returns the window tier's capacity.
    pub fn window_capacity(&self) -> usize {
        self.inner.lock().window_capacity()
    }

    /// Returns the main tier's capacity.
    pub fn main_capacity(&self) -> usize {
        self.inner.lock().main_capacity()
    }

    /// Returns `true` if either tier holds `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }

    /// Removes `key` from whichever tier holds it.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.lock().remove(key)
    }

    /// Returns the next eviction victim's key.
    pub fn oldest_key(&self) -> Option<K> {
        self.inner.lock().oldest_key().cloned()
    }

    /// Snapshot of the access and admission counters.
    pub fn stats(&self) -> TinyLfuStats {
        *self.stats.lock()
    }

    /// Overall hit rate in `[0, 1]`.
    pub fn hit_rate(&self) -> f64 {
        self.stats.lock().hit_rate()
    }

    /// Fraction of hits served by the window tier.
    pub fn window_hit_rate(&self) -> f64 {
        self.stats.lock().window_hit_rate()
    }

    /// Fraction of hits served by the main tier.
    pub fn main_hit_rate(&self) -> f64 {
        self.stats.lock().main_hit_rate()
    }

    /// Fraction of admission contests the window candidate won.
    pub fn admission_win_rate(&self) -> f64 {
        self.stats.lock().admission_win_rate()
    }

    /// Zeroes the counters without touching cached data.
    pub fn reset_stats(&self) {
        *self.stats.lock() = TinyLfuStats::default();
    }

    /// Drops all cached data, zeroes the sketch and the counters.
    pub fn reset(&self) {
        let mut core = self.inner.lock();
        core.reset();
        *self.stats.lock() = TinyLfuStats::default();
    }
}

impl<K, V> CachePolicy<K, V> for WTinyLfuCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn put(&self, key: K, value: V) {
        let mut core = self.inner.lock();
        let outcome = core.insert(key, value);
        if let Some(outcome) = outcome {
            // Stats lock nests inside the structural lock, never the
            // reverse.
            let mut stats = self.stats.lock();
            match outcome {
                Admission::Won => stats.admission_wins += 1,
                Admission::Lost => stats.admission_losses += 1,
                Admission::Vacant => {}
            }
        }
    }

    fn get(&self, key: &K) -> Option<V> {
        let mut core = self.inner.lock();
        let result = core.get(key).map(|(value, tier)| (value.clone(), tier));

        let mut stats = self.stats.lock();
        stats.accesses += 1;
        match result {
            Some((_, Tier::Window)) => {
                stats.hits += 1;
                stats.window_hits += 1;
            }
            Some((_, Tier::Main)) => {
                stats.hits += 1;
                stats.main_hits += 1;
            }
            None => {}
        }
        drop(stats);
        drop(core);

        result.map(|(value, _)| value)
    }

    fn len(&self) -> usize {
        self.inner.lock().len()
    }

    fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_split_defaults() {
        let core: TinyLfuCore<u64, u64> = TinyLfuCore::new(100, DEFAULT_WINDOW_RATIO);
        assert_eq!(core.window_capacity(), 1);
        assert_eq!(core.main_capacity(), 99);
        core.debug_validate_invariants();
    }

    #[test]
    fn tier_split_edge_cases() {
        let one: TinyLfuCore<u64, u64> = TinyLfuCore::new(1, DEFAULT_WINDOW_RATIO);
        assert_eq!(one.window_capacity(), 1);
        assert_eq!(one.main_capacity(), 0);

        let zero: TinyLfuCore<u64, u64> = TinyLfuCore::new(0, DEFAULT_WINDOW_RATIO);
        assert_eq!(zero.window_capacity(), 0);

        let two: TinyLfuCore<u64, u64> = TinyLfuCore::new(2, 0.01);
        assert_eq!(two.window_capacity(), 1);
        assert_eq!(two.main_capacity(), 1);

        // Ratio 1.0 still leaves main one slot.
        let wide: TinyLfuCore<u64, u64> = TinyLfuCore::new(10, 1.0);
        assert_eq!(wide.window_capacity(), 9);
        assert_eq!(wide.main_capacity(), 1);

        // Garbage ratios fall back to the default.
        let fallback: TinyLfuCore<u64, u64> = TinyLfuCore::new(100, -3.0);
        assert_eq!(fallback.window_capacity(), 1);
    }

    #[test]
    fn fresh_keys_are_served_from_the_window() {
        let mut core = TinyLfuCore::new(10, 0.2); // window 2, main 8
        core.insert(1, "a");
        let (value, tier) = core.get(&1).unwrap();
        assert_eq!(*value, "a");
        assert_eq!(tier, Tier::Window);
    }

    #[test]
    fn window_overflow_fills_vacant_main() {
        let mut core = TinyLfuCore::new(10, 0.2); // window 2, main 8
        assert_eq!(core.insert(1, "a"), None);
        assert_eq!(core.insert(2, "b"), None);
        // Window full: key 1 rotates into the vacant main tier.
        assert_eq!(core.insert(3, "c"), Some(Admission::Vacant));

        let (_, tier) = core.get(&1).unwrap();
        assert_eq!(tier, Tier::Main);
        core.debug_validate_invariants();
    }

    #[test]
    fn overwrite_in_main_does_not_return_to_window() {
        let mut core = TinyLfuCore::new(10, 0.2);
        core.insert(1, "a");
        core.insert(2, "b");
        core.insert(3, "c"); // key 1 now in main
        core.insert(1, "a2");

        let (value, tier) = core.get(&1).unwrap();
        assert_eq!(*value, "a2");
        assert_eq!(tier, Tier::Main);
    }

    #[test]
    fn remove_and_oldest_key() {
        let mut core = TinyLfuCore::new(10, 0.2);
        core.insert(1, "a");
        core.insert(2, "b");
        core.insert(3, "c"); // main: [1], window: [2, 3]

        assert_eq!(core.oldest_key(), Some(&1));
        assert_eq!(core.remove(&1), Some("a"));
        assert_eq!(core.remove(&1), None);
        // Main empty: the window's oldest is next in line.
        assert_eq!(core.oldest_key(), Some(&2));
    }

    #[test]
    fn admission_counts_every_rotation() {
        let mut core = TinyLfuCore::new(2, 0.5); // window 1, main 1
        for key in 0..2000u32 {
            core.insert(key, key);
        }
        // Every insert after the first rotates the window.
        assert_eq!(core.admissions, 1999);
        core.debug_validate_invariants();
    }

    #[test]
    fn zero_capacity_is_inert() {
        let mut core = TinyLfuCore::new(0, DEFAULT_WINDOW_RATIO);
        assert_eq!(core.insert(1, "a"), None);
        assert_eq!(core.get(&1), None);
        assert_eq!(core.len(), 0);
    }

    #[test]
    fn reset_clears_tiers_and_sketch() {
        let mut core = TinyLfuCore::new(10, 0.2);
        core.insert(1, "a");
        core.insert(2, "b");
        core.reset();
        assert_eq!(core.len(), 0);
        assert_eq!(core.sketch.estimate(&1), 0);
        assert_eq!(core.admissions, 0);
    }

    #[test]
    fn cold_candidate_loses_to_warm_incumbents() {
        let cache = WTinyLfuCache::with_window_ratio(5, 0.2); // window 1, main 4
        // Fill: main {1, 2, 3, 4}, window {5}.
        for key in 1..=5u32 {
            cache.put(key, key);
        }
        // Warm the incumbents well past any sketch collision noise.
        for _ in 0..5 {
            for key in 1..=4u32 {
                assert_eq!(cache.get(&key), Some(key));
            }
        }

        // Key 6 pushes the one-touch key 5 at the admission filter.
        cache.put(6u32, 6);
        let stats = cache.stats();
        assert_eq!(stats.admission_losses, 1);
        assert_eq!(stats.admission_wins, 0);
        assert_eq!(cache.get(&5), None); // discarded
        for key in 1..=4u32 {
            assert!(cache.contains(&key)); // undisturbed
        }
    }

    #[test]
    fn hot_candidate_displaces_the_coldest_incumbent() {
        let cache = WTinyLfuCache::with_window_ratio(5, 0.2); // window 1, main 4
        for key in 1..=5u32 {
            cache.put(key, key);
        }
        // Modest warmth for the incumbents.
        for key in 1..=4u32 {
            cache.get(&key);
        }
        // Key 5 sits in the window; make it clearly hotter.
        for _ in 0..20 {
            assert_eq!(cache.get(&5), Some(5));
        }

        // Rotation: key 5 beats the main tier's oldest entry.
        cache.put(6u32, 6);
        let stats = cache.stats();
        assert_eq!(stats.admission_wins, 1);
        assert!(cache.contains(&5));

        // One incumbent paid for it.
        let survivors = (1..=4u32).filter(|key| cache.contains(key)).count();
        assert_eq!(survivors, 3);
    }

    #[test]
    fn stats_partition_hits_by_tier() {
        let cache = WTinyLfuCache::with_window_ratio(10, 0.2);
        cache.put(1, "a");
        cache.put(2, "b");
        cache.put(3, "c"); // key 1 rotated into main

        cache.get(&3); // window hit
        cache.get(&1); // main hit
        cache.get(&99); // miss

        let stats = cache.stats();
        assert_eq!(stats.accesses, 3);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.window_hits, 1);
        assert_eq!(stats.main_hits, 1);
        assert!((cache.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
        assert!((cache.window_hit_rate() - 0.5).abs() < 1e-9);

        cache.reset_stats();
        assert_eq!(cache.stats(), TinyLfuStats::default());
        // Data survives a stats reset.
        assert!(cache.contains(&1));

        cache.reset();
        assert!(!cache.contains(&1));
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn repeated_reinsertion_is_eventually_admitted() {
        // Universal property: a key the filter rejected gets in after
        // enough re-offers (its sketch estimate only grows).
        let cache = WTinyLfuCache::with_window_ratio(5, 0.2);
        for key in 1..=5u32 {
            cache.put(key, key);
        }
        for _ in 0..3 {
            for key in 1..=4u32 {
                cache.get(&key);
            }
        }

        let mut filler = 100u32;
        for _ in 0..8 {
            cache.put(42u32, 420); // the contested key
            cache.put(filler, 0); // forces 42 out of the window
            filler += 1;
        }
        // Eight offers gave key 42 a higher estimate than the coldest
        // incumbent's four-ish.
        cache.put(42u32, 420);
        assert!(cache.contains(&42u32));
    }

    #[test]
    fn try_constructor_validates_ratio() {
        assert!(WTinyLfuCache::<u32, u32>::try_with_window_ratio(10, 0.0).is_err());
        assert!(WTinyLfuCache::<u32, u32>::try_with_window_ratio(10, 1.1).is_err());
        assert!(WTinyLfuCache::<u32, u32>::try_with_window_ratio(10, f64::NAN).is_err());
        assert!(WTinyLfuCache::<u32, u32>::try_with_window_ratio(10, 0.25).is_ok());
    }
}
