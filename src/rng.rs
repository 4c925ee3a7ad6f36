//! Injectable randomness.
//!
//! Engine operations that need random draws take a [`RandomSource`] instead of
//! reaching for a global generator. Production code passes a freshly seeded
//! [`fastrand::Rng`]; tests pass a seeded one or [`Deterministic`].

/// Source of the few random draws the engine makes.
pub trait RandomSource {
    /// Uniform index in `0..n`. `n` must be non-zero.
    fn below(&mut self, n: usize) -> usize;

    /// Uniform float in `[0, 1)`.
    fn unit(&mut self) -> f64;

    /// Pick one element uniformly, or `None` from an empty slice.
    fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T>
    where
        Self: Sized,
    {
        if items.is_empty() {
            None
        } else {
            items.get(self.below(items.len()))
        }
    }
}

impl RandomSource for fastrand::Rng {
    fn below(&mut self, n: usize) -> usize {
        self.usize(..n)
    }

    fn unit(&mut self) -> f64 {
        self.f64()
    }
}

/// Always takes the first option and always wins coin flips.
///
/// Used by the search to keep simulated futures reproducible.
#[derive(Debug, Default, Clone, Copy)]
pub struct Deterministic;

impl RandomSource for Deterministic {
    fn below(&mut self, _n: usize) -> usize {
        0
    }

    fn unit(&mut self) -> f64 {
        0.0
    }
}

/// A generator seeded from the environment.
pub fn entropy() -> fastrand::Rng {
    fastrand::Rng::new()
}
