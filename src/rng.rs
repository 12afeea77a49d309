//! Deterministic random streams.
//!
//! Every stream is seeded from (master seed, stream id, week) so a week's draws
//! never depend on how many other weeks were generated before it.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub type StreamId = u64;

/// Mixes the master seed with a stream id and a week index.
pub fn derive_seed(master_seed: u64, stream: StreamId, week: u64) -> u64 {
    let mut seed = master_seed;
    seed = seed
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    seed ^= stream.wrapping_mul(1103515245);
    seed = seed
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    seed ^= week.wrapping_mul(69069);
    seed
}

pub fn week_rng(master_seed: u64, stream: StreamId, week: u32) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_seed(master_seed, stream, u64::from(week)))
}

pub trait RngExt {
    fn uniform(&mut self, min: f64, max: f64) -> f64;
}

impl<R: Rng> RngExt for R {
    fn uniform(&mut self, min: f64, max: f64) -> f64 {
        self.gen::<f64>() * (max - min) + min
    }
}
