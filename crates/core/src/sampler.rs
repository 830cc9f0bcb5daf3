//! Uniform-with-replacement selection, the only source of randomness the
//! seeder uses.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::{SeedError, SeedResult};

/// Uniform random selection over non-empty sequences.
///
/// Draws are independent: repeated calls may return the same element and no
/// coverage of the input is guaranteed.
#[derive(Debug, Clone)]
pub struct RandomSampler<R = StdRng> {
    rng: R,
}

impl RandomSampler<StdRng> {
    /// Sampler seeded from OS entropy; every run produces different data.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for RandomSampler<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> RandomSampler<R> {
    /// Wrap an existing generator.
    pub fn from_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Pick one element of `items`, naming `pool` in the error when it is empty.
    pub fn choose<'a, T>(&mut self, pool: &str, items: &'a [T]) -> SeedResult<&'a T> {
        items
            .choose(&mut self.rng)
            .ok_or_else(|| SeedError::empty_catalog(pool))
    }

    /// Uniform integer in `[min, max]`.
    pub fn count_in(&mut self, min: usize, max: usize) -> SeedResult<usize> {
        if min > max {
            return Err(SeedError::config(format!("empty range [{min}, {max}]")));
        }
        Ok(self.rng.gen_range(min..=max))
    }
}
