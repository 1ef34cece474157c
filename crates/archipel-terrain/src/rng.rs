//! Seeded pseudo-randomness shared by every generation stage.
//!
//! Each draw builds a fresh ChaCha8 stream from a caller-chosen unique key
//! combined with the world seed, so results never depend on call order or
//! on which thread performs the draw.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic random source keyed by the world seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldRng {
    world_seed: i32,
}

impl WorldRng {
    pub fn new(world_seed: i32) -> Self {
        Self { world_seed }
    }

    /// Resolve a configured seed: `0` picks a fresh positive seed.
    pub fn resolve_seed(configured: i32) -> i32 {
        if configured != 0 {
            return configured;
        }
        rand::rng().random_range(1..i32::MAX)
    }

    pub fn world_seed(&self) -> i32 {
        self.world_seed
    }

    /// Uniform integer in `[min, max)`. Returns `min` for an empty range.
    pub fn random_int(&self, unique: i32, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let key = unique.wrapping_add(self.world_seed);
        let mut rng = ChaCha8Rng::seed_from_u64(key as i64 as u64);
        rng.random_range(min..max)
    }

    /// Float in `[min, max)` keyed by `round(|unique + world_seed|)`.
    pub fn random_float(&self, unique: f32, min: f32, max: f32) -> f32 {
        // f32 cannot hold large seeds exactly, which would merge nearby keys.
        let key = libm::round((unique as f64 + self.world_seed as f64).abs());
        let mut rng = ChaCha8Rng::seed_from_u64(key as u64);
        let u: f32 = rng.random();
        min + u * (max - min)
    }
}
