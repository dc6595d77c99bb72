//! Counter snapshots exposed by the statistics-bearing caches.
//!
//! Plain copyable structs, no atomics, no exporters. The W-TinyLFU
//! cache maintains [`TinyLfuStats`] under its dedicated stats lock, and
//! the adaptive supervisor reports one [`StrategyPerformance`] row per
//! shadowed policy.

use crate::policy::adaptive::Strategy;

/// Access and admission counters for a W-TinyLFU cache.
///
/// `hits == window_hits + main_hits`; admission counters track the
/// window→main filter only (wins evict the incumbent, losses discard
/// the candidate).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TinyLfuStats {
    /// Total lookups (hits + misses).
    pub accesses: u64,
    /// Lookups that returned a value.
    pub hits: u64,
    /// Hits served by the window tier.
    pub window_hits: u64,
    /// Hits served by the main tier.
    pub main_hits: u64,
    /// Admission contests won by the window candidate.
    pub admission_wins: u64,
    /// Admission contests won by the main incumbent.
    pub admission_losses: u64,
}

impl TinyLfuStats {
    /// Overall hit rate in `[0, 1]`; 0 before any access.
    pub fn hit_rate(&self) -> f64 {
        ratio(self.hits, self.accesses)
    }

    /// Fraction of hits served by the window tier.
    pub fn window_hit_rate(&self) -> f64 {
        ratio(self.window_hits, self.hits)
    }

    /// Fraction of hits served by the main tier.
    pub fn main_hit_rate(&self) -> f64 {
        ratio(self.main_hits, self.hits)
    }

    /// Fraction of admission contests won by the candidate.
    pub fn admission_win_rate(&self) -> f64 {
        ratio(self.admission_wins, self.admission_wins + self.admission_losses)
    }
}

/// Cumulative shadow-evaluation tally for one adaptive strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyPerformance {
    /// The shadowed policy this row describes.
    pub strategy: Strategy,
    /// Shadow lookups dispatched to this policy.
    pub lookups: u64,
    /// Shadow lookups that hit.
    pub hits: u64,
}

impl StrategyPerformance {
    /// Cumulative hit rate in `[0, 1]`; 0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        ratio(self.hits, self.lookups)
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
