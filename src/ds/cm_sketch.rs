//! Count-Min sketch frequency estimator.
//!
//! A `depth × width` table of saturating 8-bit counters. Each row hashes
//! the key through its own seeded hasher, so rows collide independently;
//! the estimate is the minimum counter across rows. Estimates never
//! under-count (until a decay halves the table) and over-count only on
//! per-row collisions.
//!
//! The W-TinyLFU policy uses the sketch as its admission filter: a
//! candidate pushed out of the window tier is admitted to the main tier
//! only if its estimated frequency is at least the incumbent victim's.
//! Periodic [`decay`](CountMinSketch::decay) halves every counter so
//! that formerly-hot keys age out of the estimate.
//!
//! ```
//! use cachemux::ds::CountMinSketch;
//!
//! let mut sketch = CountMinSketch::new(256, 4, 1000);
//! for _ in 0..3 {
//!     sketch.increment(&"hot");
//! }
//! assert!(sketch.estimate(&"hot") >= 3); // never under-counts
//! sketch.decay();
//! assert!(sketch.estimate(&"hot") >= 1);
//! ```

use std::hash::{DefaultHasher, Hash, Hasher};

/// Counter ceiling: counters saturate here and stop incrementing.
pub const COUNTER_MAX: u8 = u8::MAX;

/// Count-Min sketch with `depth` independently seeded hash rows.
#[derive(Debug, Clone)]
pub struct CountMinSketch {
    /// Row-major `depth × width` counter table.
    counters: Vec<u8>,
    seeds: Vec<u64>,
    width: usize,
    depth: usize,
    sample_size: usize,
}

impl CountMinSketch {
    /// Creates a sketch with freshly randomised row seeds.
    ///
    /// `width` and `depth` are clamped to at least 1. `sample_size` is
    /// informational: it records the population the sketch was sized
    /// for and does not affect behaviour.
    pub fn new(width: usize, depth: usize, sample_size: usize) -> Self {
        let depth = depth.max(1);
        let seeds = (0..depth).map(|_| rand::random::<u64>()).collect();
        Self::with_seeds(width, depth, sample_size, seeds)
    }

    /// Creates a sketch with caller-supplied row seeds.
    ///
    /// Deterministic seeds make collision behaviour reproducible, which
    /// the tests rely on. `seeds` is truncated or zero-extended to
    /// `depth` entries.
    pub fn with_seeds(width: usize, depth: usize, sample_size: usize, mut seeds: Vec<u64>) -> Self {
        let width = width.max(1);
        let depth = depth.max(1);
        seeds.resize(depth, 0);
        Self {
            counters: vec![0; width * depth],
            seeds,
            width,
            depth,
            sample_size,
        }
    }

    /// Returns the number of counters per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the number of rows.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the population size the sketch was configured for.
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Bumps the counter for `key` in every row, saturating at
    /// [`COUNTER_MAX`].
    pub fn increment<K: Hash + ?Sized>(&mut self, key: &K) {
        for row in 0..self.depth {
            let idx = self.cell(row, key);
            let counter = &mut self.counters[idx];
            if *counter < COUNTER_MAX {
                *counter += 1;
            }
        }
    }

    /// Returns the estimated frequency of `key`: the minimum counter
    /// across rows. Never less than the true count of increments since
    /// the last decay/reset.
    pub fn estimate<K: Hash + ?Sized>(&self, key: &K) -> u32 {
        let mut min = u32::from(COUNTER_MAX);
        for row in 0..self.depth {
            let idx = self.cell(row, key);
            min = min.min(u32::from(self.counters[idx]));
        }
        min
    }

    /// Halves every counter (integer division).
    pub fn decay(&mut self) {
        for counter in &mut self.counters {
            *counter /= 2;
        }
    }

    /// Zeroes every counter.
    pub fn reset(&mut self) {
        self.counters.fill(0);
    }

    /// Row slot for `key`: the row seed is folded into the hash stream
    /// so each row behaves as an independently seeded hash function.
    fn cell<K: Hash + ?Sized>(&self, row: usize, key: &K) -> usize {
        let mut hasher = DefaultHasher::new();
        self.seeds[row].hash(&mut hasher);
        key.hash(&mut hasher);
        row * self.width + (hasher.finish() as usize % self.width)
    }
}
