//! Synthetic Price Feed
//!
//! Bounded random walk: each tick moves the price by at most
//! `2 * volatility` of its previous value.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Default per-tick volatility
pub const DEFAULT_VOLATILITY: f64 = 0.0008;

/// `prev_price + U(-1, 1) * 2 * volatility * prev_price`
pub fn next_tick<R: Rng + ?Sized>(prev_price: f64, volatility: f64, rng: &mut R) -> f64 {
    let shock: f64 = rng.gen_range(-1.0..1.0);
    prev_price + shock * 2.0 * volatility * prev_price
}

/// Seedable tick generator
pub struct PriceGenerator {
    rng: StdRng,
    volatility: f64,
}

impl PriceGenerator {
    pub fn new(volatility: f64) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            volatility,
        }
    }

    /// Same seed, same price path
    pub fn with_seed(volatility: f64, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            volatility,
        }
    }

    pub fn next_tick(&mut self, prev_price: f64) -> f64 {
        next_tick(prev_price, self.volatility, &mut self.rng)
    }
}
