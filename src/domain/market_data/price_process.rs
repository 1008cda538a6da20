use super::random::{RandomSource, gaussian};
use super::value_objects::Ohlc;
use serde::{Deserialize, Serialize};

/// Numeric constants of the price process. Defaults reproduce the tuned
/// values of the animated backdrop; none of them are invariants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessTuning {
    /// Simulated milliseconds per tick.
    pub tick_ms: f64,
    /// Upper bound on ticks processed by one `advance` call.
    pub max_ticks_per_update: u32,
    pub shock_scale: f64,
    pub mean_reversion: f64,
    pub trend_weight: f64,
    pub bear_push: f64,
    /// Per-tick log move is clamped to `volatility * max_tick_move`.
    pub max_tick_move: f64,
    pub price_floor: f64,
    pub regime_min_ms: f64,
    pub regime_spread_ms: f64,
    pub volatility_min: f64,
    pub volatility_max: f64,
    /// Regime resampling moves volatility by up to this fraction either way.
    pub volatility_jitter: f64,
    pub drift_target_base: f64,
    pub drift_target_spread: f64,
    /// Centre of the uniform draw used for drift targets; below 0.5 biases them upward.
    pub drift_target_pivot: f64,
    pub drift_limit: f64,
    pub relax_rate: f64,
    pub trend_persistence: f64,
    pub trend_innovation: f64,
    pub trend_limit: f64,
    pub bear_base_probability: f64,
    pub bear_trend_bonus: f64,
    pub bear_trend_slope: f64,
    pub bear_max_length: u32,
    pub follow_gain: f64,
    /// Shock scale for synthesized pre-fill history.
    pub prefill_shock_scale: f64,
}

impl Default for ProcessTuning {
    fn default() -> Self {
        Self {
            tick_ms: 16.0,
            max_ticks_per_update: 256,
            shock_scale: 0.6 * (16.0f64 / 1000.0).sqrt(),
            mean_reversion: 0.0005,
            trend_weight: 0.0005,
            bear_push: 0.0010,
            max_tick_move: 4.0,
            price_floor: 0.1,
            regime_min_ms: 1200.0,
            regime_spread_ms: 1800.0,
            volatility_min: 0.004,
            volatility_max: 0.025,
            volatility_jitter: 0.2,
            drift_target_base: 0.00025,
            drift_target_spread: 0.0005,
            drift_target_pivot: 0.3,
            drift_limit: 0.002,
            relax_rate: 0.02,
            trend_persistence: 0.92,
            trend_innovation: 0.08,
            trend_limit: 0.9,
            bear_base_probability: 0.12,
            bear_trend_bonus: 0.08,
            bear_trend_slope: 0.06,
            bear_max_length: 2,
            follow_gain: 0.0003,
            prefill_shock_scale: (100.0f64 / 1000.0).sqrt(),
        }
    }
}

impl ProcessTuning {
    /// `max(1, round(dt / tick_ms))`, capped by `max_ticks_per_update`.
    pub fn ticks_for(&self, dt_ms: f64) -> u32 {
        let dt_ms = sanitize_delta(dt_ms);
        let ticks = (dt_ms / self.tick_ms.max(f64::EPSILON)).round();
        let cap = self.max_ticks_per_update.max(1);
        if ticks >= cap as f64 { cap } else { (ticks as u32).max(1) }
    }

    /// AR(1) step of the directional bias, clamped to `±trend_limit`.
    pub fn next_trend_bias(&self, current: f64, innovation: f64) -> f64 {
        let next = self.trend_persistence * current + self.trend_innovation * innovation;
        next.clamp(-self.trend_limit, self.trend_limit)
    }

    /// Chance that a bear streak starts on a candle close.
    pub fn bear_start_probability(&self, trend_bias: f64) -> f64 {
        self.bear_base_probability + (self.bear_trend_bonus - trend_bias * self.bear_trend_slope).max(0.0)
    }
}

/// Negative, NaN and infinite deltas advance nothing.
pub fn sanitize_delta(dt_ms: f64) -> f64 {
    if dt_ms.is_finite() && dt_ms > 0.0 { dt_ms } else { 0.0 }
}

/// Mutable state of the stochastic process, owned by exactly one layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceState {
    pub price: f64,
    pub last_close: f64,
    pub volatility: f64,
    pub target_volatility: f64,
    pub drift: f64,
    pub target_drift: f64,
    pub trend_bias: f64,
    pub bear_streak_remaining: u32,
}

impl PriceState {
    pub fn new(initial_price: f64) -> Self {
        Self {
            price: initial_price,
            last_close: initial_price,
            volatility: 0.008,
            target_volatility: 0.008,
            drift: 0.0003,
            target_drift: 0.0003,
            trend_bias: 0.5,
            bear_streak_remaining: 0,
        }
    }
}

/// Mean-reverting random walk with regime switching, serpentine trend bias
/// and scheduled bear streaks.
#[derive(Debug, Clone)]
pub struct PriceProcess {
    state: PriceState,
    tuning: ProcessTuning,
    regime_elapsed_ms: f64,
    regime_due_ms: f64,
}

impl PriceProcess {
    pub fn new<R: RandomSource + ?Sized>(initial_price: f64, tuning: ProcessTuning, rng: &mut R) -> Self {
        let initial_price = if initial_price.is_finite() {
            initial_price.max(tuning.price_floor)
        } else {
            100.0
        };
        let mut process = Self {
            state: PriceState::new(initial_price),
            tuning,
            regime_elapsed_ms: 0.0,
            regime_due_ms: 0.0,
        };
        process.schedule_regime(rng);
        process
    }

    pub fn state(&self) -> &PriceState {
        &self.state
    }

    pub fn tuning(&self) -> &ProcessTuning {
        &self.tuning
    }

    pub fn price(&self) -> f64 {
        self.state.price
    }

    /// Advances the process by `dt_ms` and feeds every tick into `candle`.
    ///
    /// Regime relaxation, the trend-bias step and the follow nudge happen
    /// once per call; shocks happen once per tick. The nudge only biases the
    /// ticks of this call and is never stored in `drift`, so the pull toward
    /// the reference is first order and cannot overshoot it.
    pub fn advance<R: RandomSource + ?Sized>(
        &mut self,
        dt_ms: f64,
        candle: &mut Ohlc,
        follow: Option<f64>,
        rng: &mut R,
    ) {
        let dt_ms = sanitize_delta(dt_ms);
        self.step_regime(dt_ms, rng);

        let innovation = rng.signed_unit();
        self.state.trend_bias = self.tuning.next_trend_bias(self.state.trend_bias, innovation);

        let limit = self.tuning.drift_limit;
        self.state.drift = self.state.drift.clamp(-limit, limit);
        let nudge = follow.map_or(0.0, |reference| self.follow_nudge(reference));
        let drift = (self.state.drift + nudge).clamp(-limit, limit);

        for _ in 0..self.tuning.ticks_for(dt_ms) {
            self.tick(drift, candle, rng);
        }
    }

    /// Drift correction pulling the log price toward `reference`.
    /// Zero when the reference is unusable.
    pub fn follow_nudge(&self, reference: f64) -> f64 {
        if !(reference.is_finite() && reference > 0.0) {
            return 0.0;
        }
        (reference.ln() - self.state.price.ln()) * self.tuning.follow_gain
    }

    fn step_regime<R: RandomSource + ?Sized>(&mut self, dt_ms: f64, rng: &mut R) {
        let tuning = self.tuning;
        self.regime_elapsed_ms += dt_ms;
        if self.regime_elapsed_ms > self.regime_due_ms {
            let jitter = rng.uniform_in(1.0 - tuning.volatility_jitter, 1.0 + tuning.volatility_jitter);
            self.state.target_volatility =
                (self.state.volatility * jitter).clamp(tuning.volatility_min, tuning.volatility_max);
            self.state.target_drift = tuning.drift_target_base
                + (rng.next_uniform() - tuning.drift_target_pivot) * tuning.drift_target_spread;
            self.schedule_regime(rng);
        }

        let state = &mut self.state;
        state.volatility += (state.target_volatility - state.volatility) * tuning.relax_rate;
        state.volatility = state.volatility.clamp(tuning.volatility_min, tuning.volatility_max);
        state.drift += (state.target_drift - state.drift) * tuning.relax_rate;
    }

    fn schedule_regime<R: RandomSource + ?Sized>(&mut self, rng: &mut R) {
        self.regime_elapsed_ms = 0.0;
        self.regime_due_ms = self.tuning.regime_min_ms + rng.next_uniform() * self.tuning.regime_spread_ms;
    }

    fn tick<R: RandomSource + ?Sized>(&mut self, drift: f64, candle: &mut Ohlc, rng: &mut R) {
        let tuning = &self.tuning;
        let state = &mut self.state;

        let shock = gaussian(rng) * state.volatility * tuning.shock_scale;
        let mean_reversion = (state.last_close - state.price) * tuning.mean_reversion;
        let bear = if state.bear_streak_remaining > 0 { -tuning.bear_push } else { 0.0 };
        let directional = drift + tuning.trend_weight * state.trend_bias + bear;

        let previous = state.price;
        let mut next = previous * (1.0 + shock + mean_reversion + directional);
        if !next.is_finite() {
            next = previous;
        }
        state.price = next.max(tuning.price_floor);
        candle.absorb(state.price);

        let max_move = state.volatility * tuning.max_tick_move;
        let log_move = state.price.ln() - previous.ln();
        if log_move.abs() > max_move {
            let clamped = (previous.ln() + max_move.copysign(log_move)).exp();
            state.price = clamped.max(tuning.price_floor);
            candle.absorb(state.price);
        }
    }

    /// One step of synthesized history: one or two plain drift-plus-shock ticks.
    pub fn prefill_step<R: RandomSource + ?Sized>(&mut self, candle: &mut Ohlc, rng: &mut R) {
        let tuning = &self.tuning;
        let pseudo_dt = tuning.tick_ms + rng.next_uniform() * tuning.tick_ms;
        let ticks = (pseudo_dt / tuning.tick_ms).round().max(1.0) as u32;
        for _ in 0..ticks {
            let shock = gaussian(rng) * self.state.volatility * tuning.prefill_shock_scale;
            let next = self.state.price * (1.0 + self.state.drift + shock);
            let next = if next.is_finite() { next } else { self.state.price };
            self.state.price = next.max(tuning.price_floor);
            candle.absorb(self.state.price);
        }
    }

    /// Remembers `close` as the anchor for mean reversion.
    pub fn record_close(&mut self, close: f64) {
        self.state.last_close = close;
    }

    /// Candle-close bookkeeping: records the close, then either counts down an
    /// active bear streak or rolls for a new one of 1..=`bear_max_length` candles.
    pub fn on_candle_close<R: RandomSource + ?Sized>(&mut self, close: f64, rng: &mut R) {
        self.record_close(close);
        if self.state.bear_streak_remaining > 0 {
            self.state.bear_streak_remaining -= 1;
            return;
        }
        let probability = self.tuning.bear_start_probability(self.state.trend_bias);
        if rng.next_uniform() < probability {
            let span = self.tuning.bear_max_length.max(1);
            let length = 1 + (rng.next_uniform() * span as f64).floor() as u32;
            self.state.bear_streak_remaining = length.min(span);
        }
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut PriceState {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market_data::random::{SeededRandom, SequenceRandom};

    #[test]
    fn tick_count_rounds_and_floors_at_one() {
        let tuning = ProcessTuning::default();
        assert_eq!(tuning.ticks_for(0.0), 1);
        assert_eq!(tuning.ticks_for(7.0), 1);
        assert_eq!(tuning.ticks_for(24.0), 2);
        assert_eq!(tuning.ticks_for(1000.0), 63);
        assert_eq!(tuning.ticks_for(-5.0), 1);
        assert_eq!(tuning.ticks_for(f64::NAN), 1);
        assert_eq!(tuning.ticks_for(1e12), 256);
    }

    #[test]
    fn bear_probability_leans_on_weak_trend() {
        let tuning = ProcessTuning::default();
        assert!((tuning.bear_start_probability(0.0) - 0.20).abs() < 1e-12);
        assert!((tuning.bear_start_probability(-0.9) - 0.254).abs() < 1e-12);
        // strongly bullish: bonus term vanishes
        assert!((tuning.bear_start_probability(0.9) - 0.146).abs() < 1e-12);
        assert!((tuning.bear_start_probability(2.0) - 0.12).abs() < 1e-12);
    }

    #[test]
    fn bear_streak_counts_down_before_rerolling() {
        let mut rng = SequenceRandom::new(vec![0.5]);
        let mut process = PriceProcess::new(100.0, ProcessTuning::default(), &mut rng);
        process.state_mut().bear_streak_remaining = 2;

        // draws of 0.0 would start a streak, but an active one only decrements
        let mut zeros = SequenceRandom::constant(0.0);
        process.on_candle_close(101.0, &mut zeros);
        assert_eq!(process.state().bear_streak_remaining, 1);
        assert_eq!(process.state().last_close, 101.0);
        process.on_candle_close(102.0, &mut zeros);
        assert_eq!(process.state().bear_streak_remaining, 0);

        // streak over: 0.0 < p starts a new one, length draw 0.99 -> 2 candles
        let mut rolls = SequenceRandom::new(vec![0.0, 0.99]);
        process.on_candle_close(103.0, &mut rolls);
        assert_eq!(process.state().bear_streak_remaining, 2);
    }

    #[test]
    fn no_streak_when_roll_exceeds_probability() {
        let mut rng = SequenceRandom::constant(0.9);
        let mut process = PriceProcess::new(100.0, ProcessTuning::default(), &mut rng);
        process.on_candle_close(100.0, &mut rng);
        assert_eq!(process.state().bear_streak_remaining, 0);
    }

    #[test]
    fn follow_nudge_points_at_the_reference() {
        let mut rng = SeededRandom::new(3);
        let process = PriceProcess::new(100.0, ProcessTuning::default(), &mut rng);
        assert!(process.follow_nudge(120.0) > 0.0);
        assert!(process.follow_nudge(80.0) < 0.0);
        assert_eq!(process.follow_nudge(100.0), 0.0);
        assert_eq!(process.follow_nudge(0.0), 0.0);
        assert_eq!(process.follow_nudge(f64::NAN), 0.0);
        let expected = (120.0f64.ln() - 100.0f64.ln()) * 0.0003;
        assert!((process.follow_nudge(120.0) - expected).abs() < 1e-15);
    }

    #[test]
    fn follow_nudge_is_not_carried_into_drift() {
        let mut rng = SequenceRandom::constant(0.25);
        let mut process = PriceProcess::new(100.0, ProcessTuning::default(), &mut rng);
        let mut followed = process.clone();
        let mut candle = Ohlc::flat(100.0);
        let mut followed_candle = Ohlc::flat(100.0);

        process.advance(16.0, &mut candle, None, &mut rng.clone());
        followed.advance(16.0, &mut followed_candle, Some(150.0), &mut rng);

        assert_eq!(followed.state().drift, process.state().drift);
        assert!(followed.price() > process.price());
    }

    #[test]
    fn tick_move_is_clamped_but_extremes_reach_the_candle() {
        // u = e^-50 -> radius 10, v = 0 redrawn to 1.0 -> cos = 1: a +10 sigma shock
        let huge = (-50.0f64).exp();
        let mut rng = SequenceRandom::new(vec![0.5, huge, 1.0]);
        let mut tuning = ProcessTuning::default();
        tuning.shock_scale = 1.0;
        let mut process = PriceProcess::new(100.0, tuning, &mut rng);
        process.state_mut().volatility = 0.02;
        let mut candle = Ohlc::flat(100.0);

        let mut shock = SequenceRandom::new(vec![huge, 1.0]);
        let drift = process.state().drift;
        process.tick(drift, &mut candle, &mut shock);

        let max_move = 0.02 * 4.0;
        let moved = process.price().ln() - 100.0f64.ln();
        assert!((moved - max_move).abs() < 1e-9, "moved {moved}");
        assert!(candle.high > process.price());
        assert_eq!(candle.close, process.price());
        assert!(candle.is_valid());
    }

    #[test]
    fn price_never_drops_below_the_floor() {
        let mut rng = SeededRandom::new(99);
        let mut process = PriceProcess::new(0.2, ProcessTuning::default(), &mut rng);
        process.state_mut().bear_streak_remaining = u32::MAX;
        process.state_mut().drift = -0.002;
        process.state_mut().target_drift = -0.002;
        let mut candle = Ohlc::flat(0.2);
        for _ in 0..2_000 {
            process.advance(1_000.0, &mut candle, None, &mut rng);
            assert!(process.price() >= 0.1);
        }
        assert!(candle.is_valid());
    }
}
