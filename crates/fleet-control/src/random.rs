//! Randomness provider used for victim selection and unit naming.
//!
//! Passed into the scale controller and fault injector as a capability so
//! tests can make both deterministic.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of randomness for control plane decisions.
pub trait RandomProvider: Send + Sync {
    /// A uniformly distributed `u32`.
    fn random_u32(&self) -> u32;

    /// A uniformly distributed index in `0..len`. `len` must be non-zero.
    fn random_index(&self, len: usize) -> usize;
}

/// Production provider backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomProvider for ThreadRandom {
    fn random_u32(&self) -> u32 {
        rand::rng().random()
    }

    fn random_index(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Deterministic provider seeded from a `u64`.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut rng)
    }
}

impl RandomProvider for SeededRandom {
    fn random_u32(&self) -> u32 {
        self.with_rng(|rng| rng.random())
    }

    fn random_index(&self, len: usize) -> usize {
        self.with_rng(|rng| rng.random_range(0..len))
    }
}
