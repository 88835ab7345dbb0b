use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use super::price_table::base_range;

/// Relative fluctuation applied on top of the base draw (±1%).
pub const FLUCTUATION: f64 = 0.01;

/// Bound of the simulated 24h change percentage (±5%).
pub const MAX_CHANGE_PCT: f64 = 5.0;

/// Stand-in for a market data feed: draws plausible prices at random.
///
/// Results are NOT deterministic. Two calls with the same identifier will
/// usually return different prices; only the range and sign of a draw are
/// guaranteed. Seed the simulator (`PriceSimulator::seeded`) to make a
/// sequence of draws reproducible.
pub struct PriceSimulator {
    rng: Box<dyn RngCore + Send>,
}

impl std::fmt::Debug for PriceSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceSimulator").finish_non_exhaustive()
    }
}

impl PriceSimulator {
    /// Simulator backed by an OS-seeded generator.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Simulator whose draws are reproducible for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    /// Simulator drawing from any random source.
    pub fn from_rng(rng: impl RngCore + Send + 'static) -> Self {
        Self { rng: Box::new(rng) }
    }

    /// Simulated current price for an asset name or symbol.
    ///
    /// Draws uniformly from the asset's base range, then applies an
    /// independent ±1% multiplicative fluctuation. Never negative.
    pub fn price_for(&mut self, identifier: &str) -> f64 {
        let range = base_range(identifier);
        let base = self.rng.gen_range(range.low..range.high);
        let fluctuation = self.fluctuation(FLUCTUATION);
        (base * (1.0 + fluctuation)).max(0.0)
    }

    /// Simulated 24h change percentage in `[-5, 5]`.
    ///
    /// The identifier does not influence the draw; it is accepted so a real
    /// feed could be substituted without changing call sites.
    pub fn change_for(&mut self, _identifier: &str) -> f64 {
        self.rng.gen_range(-MAX_CHANGE_PCT..=MAX_CHANGE_PCT)
    }

    /// Uniform draw in `[-amplitude, amplitude)`. Zero for a non-positive amplitude.
    pub fn fluctuation(&mut self, amplitude: f64) -> f64 {
        if amplitude > 0.0 {
            self.rng.gen_range(-amplitude..amplitude)
        } else {
            0.0
        }
    }
}

impl Default for PriceSimulator {
    fn default() -> Self {
        Self::new()
    }
}
