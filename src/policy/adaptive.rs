//! # Adaptive supervisor: shadow evaluation and policy election
//!
//! Runs four full-capacity policies side by side (LRU, LFU, LFU with
//! aging, and ARC) and serves results from whichever currently has the
//! best observed hit-rate.
//!
//! Every `put` fans out to all four children. Every `get` also fans out
//! to **all four** (shadow evaluation): each child sees the identical
//! request stream, so their hit-rates are directly comparable: an
//! unbiased comparison that deliberately costs 4× memory and work.
//! Evaluating only the live strategy would starve the others of
//! ordering updates and bias the election toward the incumbent.
//!
//! Every 1000 `get` calls the supervisor compares cumulative hit-rates
//! and switches to the best strategy if it leads the current one by
//! more than the switch threshold (0.02). Tallies are never reset, so
//! rates remain cumulative across switches; the low threshold and the
//! frequent evaluation favour adaptation speed over stability.
//!
//! `put` and `get` are serialised under the supervisor's own mutex;
//! the fan-out to the children happens serially inside that critical
//! section (each child briefly takes its own lock within).

use std::hash::Hash;

use parking_lot::Mutex;

use crate::metrics::StrategyPerformance;
use crate::policy::arc::ArcCache;
use crate::policy::lfu::LfuCache;
use crate::policy::lru::LruCache;
use crate::traits::CachePolicy;

/// `get` calls between elections.
pub const EVALUATION_INTERVAL: u64 = 1000;
/// Hit-rate lead required to unseat the current strategy.
pub const SWITCH_THRESHOLD: f64 = 0.02;

/// LFU-Aging child parameters (max average frequency, aging threshold,
/// aging factor).
const AGING_CHILD_PARAMS: (u64, u64, f64) = (8000, 1000, 0.5);

/// The shadowed policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Plain recency eviction.
    Lru,
    /// Frequency eviction with overflow shedding.
    Lfu,
    /// Frequency eviction with periodic decay.
    LfuAging,
    /// Self-tuning recency/frequency split.
    Arc,
}

impl Strategy {
    const ALL: [Strategy; 4] = [
        Strategy::Lru,
        Strategy::Lfu,
        Strategy::LfuAging,
        Strategy::Arc,
    ];

    fn index(self) -> usize {
        match self {
            Strategy::Lru => 0,
            Strategy::Lfu => 1,
            Strategy::LfuAging => 2,
            Strategy::Arc => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    lookups: u64,
    hits: u64,
}

impl Tally {
    fn hit_rate(self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.hits as f64 / self.lookups as f64
        }
    }
}

#[derive(Debug)]
struct Election {
    current: Strategy,
    tallies: [Tally; 4],
    gets: u64,
}

/// Cache that elects among four shadowed policies by hit-rate.
///
/// # Example
///
/// ```
/// use cachemux::policy::adaptive::{AdaptiveCache, Strategy};
/// use cachemux::traits::CachePolicy;
///
/// let cache = AdaptiveCache::new(32);
/// assert_eq!(cache.current_strategy(), Strategy::LfuAging);
///
/// cache.put(1, "a");
/// assert_eq!(cache.get(&1), Some("a"));
/// ```
#[derive(Debug)]
pub struct AdaptiveCache<K, V> {
    lru: LruCache<K, V>,
    lfu: LfuCache<K, V>,
    lfu_aging: LfuCache<K, V>,
    arc: ArcCache<K, V>,
    election: Mutex<Election>,
    capacity: usize,
}

impl<K, V> AdaptiveCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a supervisor whose four children each get the full
    /// `capacity`. The initial strategy is LFU-Aging.
    pub fn new(capacity: usize) -> Self {
        let (max_avg, aging_threshold, aging_factor) = AGING_CHILD_PARAMS;
        Self {
            lru: LruCache::new(capacity),
            lfu: LfuCache::new(capacity),
            lfu_aging: LfuCache::with_aging(capacity, max_avg, aging_threshold, aging_factor),
            arc: ArcCache::new(capacity),
            election: Mutex::new(Election {
                current: Strategy::LfuAging,
                tallies: [Tally::default(); 4],
                gets: 0,
            }),
            capacity,
        }
    }

    /// Returns the strategy currently serving results.
    pub fn current_strategy(&self) -> Strategy {
        self.election.lock().current
    }

    /// Returns the cumulative shadow tallies, one row per strategy.
    pub fn strategy_performance(&self) -> Vec<StrategyPerformance> {
        let election = self.election.lock();
        Strategy::ALL
            .iter()
            .map(|&strategy| {
                let tally = election.tallies[strategy.index()];
                StrategyPerformance {
                    strategy,
                    lookups: tally.lookups,
                    hits: tally.hits,
                }
            })
            .collect()
    }

    /// Promotes the best strategy if it leads the incumbent by more
    /// than the threshold. Tallies are left untouched.
    fn evaluate(election: &mut Election) {
        let rates: Vec<f64> = election.tallies.iter().map(|tally| tally.hit_rate()).collect();
        let mut best = election.current;
        for &strategy in &Strategy::ALL {
            if rates[strategy.index()] > rates[best.index()] {
                best = strategy;
            }
        }
        if rates[best.index()] > rates[election.current.index()] + SWITCH_THRESHOLD {
            election.current = best;
        }
    }

    fn child_len(&self, strategy: Strategy) -> usize {
        match strategy {
            Strategy::Lru => self.lru.len(),
            Strategy::Lfu => self.lfu.len(),
            Strategy::LfuAging => self.lfu_aging.len(),
            Strategy::Arc => self.arc.len(),
        }
    }
}

impl<K, V> CachePolicy<K, V> for AdaptiveCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Fans the write out to all four children.
    fn put(&self, key: K, value: V) {
        let _election = self.election.lock();
        self.lru.put(key.clone(), value.clone());
        self.lfu.put(key.clone(), value.clone());
        self.lfu_aging.put(key.clone(), value.clone());
        self.arc.put(key, value);
    }

    /// Shadow lookup on all four children; the current strategy's
    /// answer is returned. Every `EVALUATION_INTERVAL` calls the
    /// election re-runs.
    fn get(&self, key: &K) -> Option<V> {
        let mut election = self.election.lock();

        let results = [
            self.lru.get(key),
            self.lfu.get(key),
            self.lfu_aging.get(key),
            self.arc.get(key),
        ];
        for (tally, result) in election.tallies.iter_mut().zip(&results) {
            tally.lookups += 1;
            if result.is_some() {
                tally.hits += 1;
            }
        }

        let current = election.current;
        let answer = results.into_iter().nth(current.index()).flatten();

        election.gets += 1;
        if election.gets % EVALUATION_INTERVAL == 0 {
            Self::evaluate(&mut election);
        }
        answer
    }

    /// Entry count of the currently elected child.
    fn len(&self) -> usize {
        let current = self.current_strategy();
        self.child_len(current)
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
