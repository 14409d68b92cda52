//! Randomness sources for reviewer draws.
//!
//! The assignment engine receives a [`Randomizer`] at construction time and
//! never reaches for global state, so tests can plug in [`FixedRandomizer`]
//! and replays can use [`SeededRandomizer`].

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Source of uniform draws.
///
/// Implementations are shared between concurrent transactions, so every call
/// must be an independent draw.
pub trait Randomizer: Send + Sync {
    /// A uniformly random permutation of `0..n`.
    fn permutation(&self, n: usize) -> Vec<usize>;

    /// A uniformly random integer in `0..n`. Callers never pass `n = 0`.
    fn index_below(&self, n: usize) -> usize;
}

/// Draws from the calling thread's generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandomizer;

impl Randomizer for ThreadRandomizer {
    fn permutation(&self, n: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut rand::thread_rng());
        indices
    }

    fn index_below(&self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        rand::thread_rng().gen_range(0..n)
    }
}

/// Reproducible generator for replaying a sequence of draws.
pub struct SeededRandomizer {
    rng: Mutex<StdRng>,
}

impl SeededRandomizer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        // A poisoned lock still holds a usable generator.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut *rng)
    }
}

impl Randomizer for SeededRandomizer {
    fn permutation(&self, n: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n).collect();
        self.with_rng(|rng| indices.shuffle(rng));
        indices
    }

    fn index_below(&self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        self.with_rng(|rng| rng.gen_range(0..n))
    }
}

/// Deterministic stand-in that always returns the same draws.
///
/// The configured order is clipped to `0..n` and completed with the missing
/// indices in ascending order, so `permutation` always yields a valid
/// permutation. `index_below` clamps the configured index to `n - 1`.
#[derive(Debug, Default, Clone)]
pub struct FixedRandomizer {
    order: Vec<usize>,
    index: usize,
}

impl FixedRandomizer {
    pub fn new(order: Vec<usize>, index: usize) -> Self {
        Self { order, index }
    }

    /// Identity permutation, index 0.
    pub fn first() -> Self {
        Self::default()
    }
}

impl Randomizer for FixedRandomizer {
    fn permutation(&self, n: usize) -> Vec<usize> {
        let mut out = Vec::with_capacity(n);
        for &i in &self.order {
            if i < n && !out.contains(&i) {
                out.push(i);
            }
        }
        for i in 0..n {
            if !out.contains(&i) {
                out.push(i);
            }
        }
        out
    }

    fn index_below(&self, n: usize) -> usize {
        self.index.min(n.saturating_sub(1))
    }
}
