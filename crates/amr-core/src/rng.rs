//! Seeded deterministic RNG shared by the scenario generator and the GA
//! optimizer. Every consumer of the seed must draw in a documented, fixed
//! order (spec.md §9) — this wrapper exists so there is exactly one
//! randomness source in the workspace, never `rand::thread_rng()`.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub struct SimRng {
    inner: ChaCha8Rng,
}

impl SimRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uniform `f64` in `[lo, hi]`.
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        self.inner.gen_range(lo..=hi)
    }

    /// Uniform `f64` in `[0, 1)`.
    pub fn gen_f64(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Uniform integer in `[lo, hi]` inclusive.
    pub fn gen_range_u32(&mut self, lo: u32, hi: u32) -> u32 {
        self.inner.gen_range(lo..=hi)
    }

    /// Uniform index in `[0, n)`. Panics if `n == 0`.
    pub fn gen_usize(&mut self, n: usize) -> usize {
        self.inner.gen_range(0..n)
    }

    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.inner.gen_bool(p)
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_draw_sequence() {
        let mut a = SimRng::from_seed(42);
        let mut b = SimRng::from_seed(42);
        for _ in 0..10 {
            assert_eq!(a.gen_usize(1000), b.gen_usize(1000));
        }
    }

    #[test]
    fn different_seed_diverges() {
        let mut a = SimRng::from_seed(1);
        let mut b = SimRng::from_seed(2);
        let seq_a: Vec<usize> = (0..20).map(|_| a.gen_usize(1_000_000)).collect();
        let seq_b: Vec<usize> = (0..20).map(|_| b.gen_usize(1_000_000)).collect();
        assert_ne!(seq_a, seq_b);
    }

    #[test]
    fn uniform_respects_bounds() {
        let mut rng = SimRng::from_seed(7);
        for _ in 0..1000 {
            let v = rng.uniform(1.0, 2.0);
            assert!((1.0..=2.0).contains(&v));
        }
    }
}
