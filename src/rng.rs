//! Deterministic random number generation
//!
//! Every cell phase gets its own stream seeded from (stream id, cell index, year),
//! so results do not depend on the order in which cells are processed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Identifier for an RNG stream, one per yearly phase.
pub type StreamId = u32;

#[derive(Debug, Clone, Copy)]
pub struct RngManager {
    master_seed: u64,
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        Self { master_seed: seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Create the RNG a given phase uses for one cell in one year.
    pub fn cell_rng(&self, stream: StreamId, cell: usize, year: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.derive_seed(stream, cell as u64, year))
    }

    fn derive_seed(&self, stream: StreamId, cell: u64, year: u64) -> u64 {
        let mut seed = self.master_seed;
        seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        seed ^= (stream as u64).wrapping_mul(1103515245);
        seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        seed ^= cell.wrapping_mul(48271);
        seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        seed ^= year.wrapping_mul(69069);
        seed
    }
}

impl Default for RngManager {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Sampling helpers shared by the lifecycle formulas.
pub trait RngExt {
    /// Bernoulli trial; `probability` is expected in [0, 1].
    fn chance(&mut self, probability: f64) -> bool;
    fn gaussian(&mut self, mean: f64, std_dev: f64) -> f64;
}

impl<R: Rng> RngExt for R {
    fn chance(&mut self, probability: f64) -> bool {
        self.gen::<f64>() < probability
    }

    fn gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        // Box-Muller
        let u1: f64 = self.gen::<f64>().max(f64::MIN_POSITIVE);
        let u2: f64 = self.gen::<f64>();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}
