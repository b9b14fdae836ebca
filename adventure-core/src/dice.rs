//! Random rolls for combat resolution.
//!
//! Every random draw the engine makes goes through the [`Dice`] trait so that
//! callers can swap the production generator for a seeded or scripted one.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Source of uniform integer rolls.
///
/// Implementations must return values inside the requested inclusive range.
/// A range whose upper bound is below its lower bound collapses to `low`.
pub trait Dice {
    /// Uniform integer in `low..=high`.
    fn range(&mut self, low: i32, high: i32) -> i32;

    /// Percentile roll in `1..=100`.
    fn percent(&mut self) -> i32 {
        self.range(1, 100)
    }

    /// Uniform index into a collection of `len` elements.
    ///
    /// Returns 0 for an empty collection.
    fn pick(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.range(0, len as i32 - 1) as usize
    }
}

impl<D: Dice + ?Sized> Dice for &mut D {
    fn range(&mut self, low: i32, high: i32) -> i32 {
        (**self).range(low, high)
    }

    fn percent(&mut self) -> i32 {
        (**self).percent()
    }

    fn pick(&mut self, len: usize) -> usize {
        (**self).pick(len)
    }
}

/// Seeded game RNG.
///
/// Wraps `ChaCha8Rng` so an encounter can be replayed from its seed.
/// Only the seed is serialized; a restored generator starts over from it.
#[derive(Debug, Clone)]
pub struct GameRng {
    rng: ChaCha8Rng,
    seed: u64,
}

impl Serialize for GameRng {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.seed.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GameRng {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let seed = u64::deserialize(deserializer)?;
        Ok(GameRng::new(seed))
    }
}

impl GameRng {
    /// Create a generator from a fixed seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create a generator with a random seed.
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    /// The seed this generator was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl Dice for GameRng {
    fn range(&mut self, low: i32, high: i32) -> i32 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..=high)
    }
}
