use super::value_objects::Band;
use crate::domain::market_data::RandomSource;

/// Proposes non-overlapping vertical bands for a set of layers.
///
/// Random proposals are accepted when they keep `min_gap` from every band
/// already placed. After `attempts` proposals, any layers still without a
/// band are stacked from the top with a fixed height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandPlanner {
    pub attempts: usize,
    pub min_gap: f64,
    pub min_height: f64,
    pub height_spread: f64,
    /// Proposed bands end above this fraction of the surface.
    pub max_bottom: f64,
    pub fallback_step: f64,
    pub fallback_height: f64,
}

impl Default for BandPlanner {
    fn default() -> Self {
        Self {
            attempts: 200,
            min_gap: 0.06,
            min_height: 0.22,
            height_spread: 0.18,
            max_bottom: 0.92,
            fallback_step: 0.02,
            fallback_height: 0.28,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BandPlan {
    pub bands: Vec<Band>,
    /// How many bands came from the stacked fallback.
    pub fallback_count: usize,
}

impl BandPlanner {
    pub fn plan<R: RandomSource + ?Sized>(&self, count: usize, rng: &mut R) -> BandPlan {
        let mut bands: Vec<Band> = Vec::with_capacity(count);
        let mut attempts = 0;
        while bands.len() < count && attempts < self.attempts {
            attempts += 1;
            let height = self.min_height + rng.next_uniform() * self.height_spread;
            let max_top = (self.max_bottom - height).max(0.0);
            let candidate = Band::new(rng.next_uniform() * max_top, height);
            if !bands.iter().any(|placed| placed.conflicts_with(&candidate, self.min_gap)) {
                bands.push(candidate);
            }
        }

        let placed = bands.len();
        while bands.len() < count {
            let top = (self.fallback_step * bands.len() as f64).min(1.0 - self.fallback_height);
            bands.push(Band::new(top, self.fallback_height));
        }
        BandPlan { bands, fallback_count: count - placed }
    }
}

pub const MIN_RANDOM_WIDTH_FRACTION: f64 = 0.6;
pub const RANDOM_WIDTH_SPREAD: f64 = 0.2;
pub const MIN_RANDOM_PERIOD_MS: f64 = 900.0;
pub const RANDOM_PERIOD_SPREAD_MS: f64 = 300.0;

/// Width fraction in `[0.6, 0.8)`.
pub fn random_width_fraction<R: RandomSource + ?Sized>(rng: &mut R) -> f64 {
    MIN_RANDOM_WIDTH_FRACTION + rng.next_uniform() * RANDOM_WIDTH_SPREAD
}

/// Whole-millisecond candle period in `[900, 1200)`.
pub fn random_period_ms<R: RandomSource + ?Sized>(rng: &mut R) -> f64 {
    MIN_RANDOM_PERIOD_MS + (rng.next_uniform() * RANDOM_PERIOD_SPREAD_MS).floor()
}

/// Opening price in `[100, 110)`.
pub fn random_initial_price<R: RandomSource + ?Sized>(rng: &mut R) -> f64 {
    100.0 + rng.next_uniform() * 10.0
}
