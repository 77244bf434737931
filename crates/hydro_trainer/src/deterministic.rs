//! Deterministic utilities for reproducible training
//!
//! Provides an LCG-based RNG, seed derivation and split tie-breaking so the
//! same data and seed grow identical forests on every platform and run,
//! regardless of how rayon schedules the work.

use std::cmp::Ordering;
use std::num::Wrapping;

/// Linear Congruential Generator for deterministic pseudo-randomness
/// Uses Knuth's MMIX constants; outputs are taken from the high bits
#[derive(Clone, Debug)]
pub struct LcgRng {
    state: Wrapping<u64>,
}

impl LcgRng {
    const MULTIPLIER: u64 = 6_364_136_223_846_793_005;
    const INCREMENT: u64 = 1_442_695_040_888_963_407;

    pub fn new(seed: u64) -> Self {
        let mut rng = Self {
            state: Wrapping(seed),
        };
        // Move small seeds away from the all-zero neighbourhood
        rng.next_u32();
        rng
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state * Wrapping(Self::MULTIPLIER) + Wrapping(Self::INCREMENT);
        (self.state.0 >> 32) as u32
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        ((u64::from(self.next_u32()) * max as u64) >> 32) as usize
    }
}

/// Deterministic xxhash64-style mix of a word sequence
pub fn xxhash64(data: &[u64], seed: u64) -> u64 {
    const PRIME1: u64 = 0x9E37_79B1_85EB_CA87;
    const PRIME2: u64 = 0xC2B2_AE3D_27D4_EB4F;
    const PRIME3: u64 = 0x1656_67B1_9E37_79F9;
    const PRIME5: u64 = 0x85EB_CA77_C2B2_AE63;

    let mut h = seed.wrapping_add(PRIME5);

    for &val in data {
        h = h.wrapping_add(val.wrapping_mul(PRIME3));
        h = h.rotate_left(17).wrapping_mul(PRIME2);
    }

    h ^= h >> 33;
    h = h.wrapping_mul(PRIME1);
    h ^= h >> 29;
    h = h.wrapping_mul(PRIME2);
    h ^= h >> 32;

    h
}

/// Seed for one tree, independent of the order trees are grown in
pub fn derive_seed(base: u64, stream: u64) -> u64 {
    xxhash64(&[stream], base)
}

/// Fisher-Yates permutation of `0..n`
pub fn shuffled_indices(n: usize, seed: u64) -> Vec<usize> {
    let mut rng = LcgRng::new(seed);
    let mut indices: Vec<usize> = (0..n).collect();
    for i in (1..n).rev() {
        let j = rng.next_range(i + 1);
        indices.swap(i, j);
    }
    indices
}

/// Deterministic tie-breaker for split selection
/// Equal gains prefer the lower feature index, then the lower threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitTieBreaker {
    pub feature_idx: usize,
    pub threshold: f64,
}

impl SplitTieBreaker {
    pub fn new(feature_idx: usize, threshold: f64) -> Self {
        Self {
            feature_idx,
            threshold,
        }
    }

    pub fn compare(&self, other: &Self) -> Ordering {
        self.feature_idx
            .cmp(&other.feature_idx)
            .then_with(|| self.threshold.total_cmp(&other.threshold))
    }

    pub fn precedes(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Less
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_lcg_determinism() {
        let mut rng1 = LcgRng::new(42);
        let mut rng2 = LcgRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.next_u32(), rng2.next_u32());
        }
    }

    #[test]
    fn test_lcg_range() {
        let mut rng = LcgRng::new(42);
        let mut seen = [false; 10];
        for _ in 0..1000 {
            let val = rng.next_range(10);
            assert!(val < 10);
            seen[val] = true;
        }
        assert!(seen.iter().all(|&s| s), "every bucket should be hit");
        assert_eq!(rng.next_range(0), 0);
    }

    #[test]
    fn test_xxhash64_different_seeds() {
        let data = vec![1, 2, 3, 4, 5];
        assert_eq!(xxhash64(&data, 42), xxhash64(&data, 42));
        assert_ne!(xxhash64(&data, 42), xxhash64(&data, 43));
    }

    #[test]
    fn test_derived_seeds_differ_per_tree() {
        let seeds: std::collections::BTreeSet<u64> =
            (0..200).map(|t| derive_seed(42, t)).collect();
        assert_eq!(seeds.len(), 200);
    }

    #[test]
    fn test_tie_breaker_ordering() {
        let t1 = SplitTieBreaker::new(0, 10.5);
        let t2 = SplitTieBreaker::new(0, 20.5);
        let t3 = SplitTieBreaker::new(1, 0.5);

        assert!(t1.precedes(&t2));
        assert!(t1.precedes(&t3));
        assert!(!t3.precedes(&t2));
    }

    proptest! {
        #[test]
        fn prop_shuffle_is_a_permutation(n in 0usize..300, seed in any::<u64>()) {
            let mut indices = shuffled_indices(n, seed);
            prop_assert_eq!(&indices, &shuffled_indices(n, seed));
            indices.sort_unstable();
            prop_assert_eq!(indices, (0..n).collect::<Vec<_>>());
        }
    }
}
