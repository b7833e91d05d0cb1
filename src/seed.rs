//! Explicit random-generator state for the shear sampler.
//!
//! The generator is a plain `(seed, counter)` value. Advancing it never
//! mutates anything in place: [`SeedGenerator::next`] consumes the current
//! state and hands back the draw for this call together with the successor
//! state, which the owner stores for the next call.

use rand::distr::{Distribution, StandardUniform};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Seed state owned by a layer for its whole lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SeedGenerator {
    seed: u64,
    counter: u64,
}

impl SeedGenerator {
    /// Creates a generator from an explicit seed.
    pub fn new(seed: u64) -> Self {
        Self { seed, counter: 0 }
    }

    /// Creates a generator from `seed`, or from a fresh OS-seeded value
    /// when `seed` is `None`.
    pub fn from_optional(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::new(seed),
            None => {
                let mut rng = rand::rng();
                Self::new(StandardUniform.sample(&mut rng))
            }
        }
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of draws taken so far.
    #[inline]
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Returns the draw for the current state and the advanced generator.
    #[must_use]
    pub fn next(self) -> (SeedDraw, SeedGenerator) {
        let draw = SeedDraw {
            seed: self.seed,
            counter: self.counter,
        };
        let advanced = SeedGenerator {
            seed: self.seed,
            counter: self.counter.wrapping_add(1),
        };
        (draw, advanced)
    }
}

/// The seed material for a single sampling call.
///
/// A draw can be kept and passed back in later to reproduce exactly the
/// same shear vectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeedDraw {
    pub seed: u64,
    pub counter: u64,
}

impl SeedDraw {
    /// A draw for an explicit seed with a zero counter.
    pub fn from_seed(seed: u64) -> Self {
        Self { seed, counter: 0 }
    }

    /// Builds the random stream every uniform draw of one call reads from.
    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(mix(self.seed, self.counter))
    }
}

// SplitMix64 finalizer over (seed, counter), so that neighbouring counters
// give unrelated streams.
fn mix(seed: u64, counter: u64) -> u64 {
    let mut z = seed ^ counter.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_returns_current_state_and_advances() {
        let generator = SeedGenerator::new(42);
        let (first, generator) = generator.next();
        let (second, generator) = generator.next();

        assert_eq!(first, SeedDraw { seed: 42, counter: 0 });
        assert_eq!(second, SeedDraw { seed: 42, counter: 1 });
        assert_eq!(generator.counter(), 2);
    }

    #[test]
    fn same_draw_gives_same_stream() {
        let draw = SeedDraw { seed: 9, counter: 3 };
        let a: Vec<f32> = StandardUniform.sample_iter(draw.rng()).take(8).collect();
        let b: Vec<f32> = StandardUniform.sample_iter(draw.rng()).take(8).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn different_counters_give_different_streams() {
        let a: f32 = StandardUniform.sample(&mut SeedDraw { seed: 9, counter: 0 }.rng());
        let b: f32 = StandardUniform.sample(&mut SeedDraw { seed: 9, counter: 1 }.rng());
        assert_ne!(a, b);
    }

    #[test]
    fn explicit_seed_is_kept() {
        assert_eq!(SeedGenerator::from_optional(Some(5)).seed(), 5);
        assert_eq!(SeedGenerator::from_optional(None).counter(), 0);
    }
}
