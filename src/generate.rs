//! Random vector generation
//!
//! Every worker draws from its own ChaCha stream. The streams share a base seed and are
//! selected by rank, so workers are decorrelated and a run can be replayed from the seed.
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use conv::ConvUtil;
use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::topology::Rank;

/// Lower bound (inclusive) of generated values
pub const LOW: f64 = 0.0;
/// Upper bound (exclusive) of generated values
pub const HIGH: f64 = 100.0;

/// Base seed shared by all workers of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Seed(pub u64);

impl Seed {
    /// Seed taken from the wall clock
    pub fn from_clock() -> Seed {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        Seed(nanos as u64)
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Source of uniformly distributed values in `[LOW, HIGH)` for one worker
pub struct Generator {
    rng: ChaCha8Rng,
    distribution: Uniform<f64>,
}

impl Generator {
    /// The generator of worker `rank` for a run seeded with `seed`.
    pub fn for_rank(seed: Seed, rank: Rank) -> Generator {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.0);
        rng.set_stream(rank.value_as::<u64>().unwrap_or_default());
        Generator {
            rng,
            distribution: Uniform::new(LOW, HIGH),
        }
    }

    /// Draw `len` independent values.
    pub fn generate(&mut self, len: usize) -> Vec<f64> {
        self.distribution
            .sample_iter(&mut self.rng)
            .take(len)
            .collect()
    }

    /// Overwrite `buffer` with independent values.
    pub fn fill(&mut self, buffer: &mut [f64]) {
        for value in buffer.iter_mut() {
            *value = self.distribution.sample(&mut self.rng);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn successive_vectors_differ() {
        let mut generator = Generator::for_rank(Seed(7), 0);
        let x = generator.generate(64);
        let y = generator.generate(64);
        assert_eq!(x.len(), 64);
        assert_ne!(x, y);
    }

    #[test]
    fn same_seed_and_rank_replays() {
        let a = Generator::for_rank(Seed(42), 3).generate(100);
        let b = Generator::for_rank(Seed(42), 3).generate(100);
        assert_eq!(a, b);
    }

    #[test]
    fn ranks_draw_from_distinct_streams() {
        let a = Generator::for_rank(Seed(42), 0).generate(100);
        let b = Generator::for_rank(Seed(42), 1).generate(100);
        assert_ne!(a, b);
    }

    #[test]
    fn fill_matches_generate() {
        let expected = Generator::for_rank(Seed(5), 2).generate(16);
        let mut buffer = vec![-1.0; 16];
        Generator::for_rank(Seed(5), 2).fill(&mut buffer);
        assert_eq!(buffer, expected);
    }

    proptest! {
        #[test]
        fn values_stay_in_range(seed in any::<u64>(), rank in 0i32..256, len in 0usize..2_000) {
            let values = Generator::for_rank(Seed(seed), rank).generate(len);
            prop_assert_eq!(values.len(), len);
            prop_assert!(values.iter().all(|v| (LOW..HIGH).contains(v)));
        }
    }
}
