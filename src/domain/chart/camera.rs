use super::panel::Panel;
use serde::{Deserialize, Serialize};

/// Smoothing rates and framing constants of the auto-framing camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraTuning {
    /// EMA weight of each new log price in `ema_log`, per update.
    pub level_smoothing: f64,
    /// Fraction of the gap to `ema_log` the centre closes per draw.
    pub recenter_rate: f64,
    /// Share of the panel height the fixed log range spans.
    pub frame_fill: f64,
    pub default_log_range: f64,
    pub min_log_range: f64,
    pub range_low_quantile: f64,
    pub range_high_quantile: f64,
    /// Pre-fill shorter than this keeps `default_log_range`.
    pub min_range_candles: usize,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            level_smoothing: 0.02,
            recenter_rate: 0.03,
            frame_fill: 0.9,
            default_log_range: 0.022,
            min_log_range: 1e-6,
            range_low_quantile: 0.05,
            range_high_quantile: 0.95,
            min_range_candles: 5,
        }
    }
}

/// Log-price to pixel mapping with a scale fixed once and a slowly
/// recentring vertical anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    base_log_level: f64,
    ema_log: f64,
    center_log: f64,
    fixed_log_range: f64,
    range_locked: bool,
    tuning: CameraTuning,
}

impl Camera {
    pub fn new(initial_price: f64, tuning: CameraTuning) -> Self {
        let base = safe_ln(initial_price);
        Self {
            base_log_level: base,
            ema_log: base,
            center_log: base,
            fixed_log_range: tuning.default_log_range.max(tuning.min_log_range),
            range_locked: false,
            tuning,
        }
    }

    /// Folds the latest price into the slow level EMA. Called once per update.
    pub fn observe(&mut self, price: f64) {
        if !(price.is_finite() && price > 0.0) {
            return;
        }
        let s = self.tuning.level_smoothing;
        self.ema_log = s * price.ln() + (1.0 - s) * self.ema_log;
    }

    /// Moves the framing centre toward the level EMA. Called once per draw.
    pub fn recenter(&mut self) {
        self.center_log += (self.ema_log - self.center_log) * self.tuning.recenter_rate;
    }

    /// Fixes the log range to the 5th..95th percentile spread of `prices`
    /// and centres the camera on its midpoint.
    ///
    /// `candle_count` is the number of candles the samples came from. The
    /// range can only be fixed once; later calls return `false` and change
    /// nothing.
    pub fn fix_range_from_samples<I>(&mut self, prices: I, candle_count: usize) -> bool
    where
        I: IntoIterator<Item = f64>,
    {
        if self.range_locked {
            return false;
        }
        self.range_locked = true;
        if candle_count < self.tuning.min_range_candles {
            return false;
        }

        let mut logs: Vec<f64> = prices
            .into_iter()
            .filter(|p| p.is_finite() && *p > 0.0)
            .map(f64::ln)
            .collect();
        if logs.is_empty() {
            return false;
        }
        logs.sort_by(f64::total_cmp);

        let last = logs.len() - 1;
        let at = |q: f64| logs[((q * last as f64).floor() as usize).min(last)];
        let low = at(self.tuning.range_low_quantile);
        let high = at(self.tuning.range_high_quantile);
        let mid = (low + high) * 0.5;

        self.fixed_log_range = (high - low).max(self.tuning.min_log_range);
        self.center_log = mid;
        self.ema_log = mid;
        true
    }

    pub fn pixels_per_log_unit(&self, panel_height: f64) -> f64 {
        self.tuning.frame_fill * panel_height / self.fixed_log_range.max(self.tuning.min_log_range)
    }

    /// `y = center_y - (ln(price) - center_log) * pixels_per_log_unit`.
    pub fn project(&self, price: f64, panel: &Panel) -> f64 {
        panel.center_y - (safe_ln(price) - self.center_log) * self.pixels_per_log_unit(panel.height)
    }

    pub fn base_log_level(&self) -> f64 {
        self.base_log_level
    }

    pub fn ema_log(&self) -> f64 {
        self.ema_log
    }

    pub fn center_log(&self) -> f64 {
        self.center_log
    }

    pub fn fixed_log_range(&self) -> f64 {
        self.fixed_log_range
    }

    pub fn tuning(&self) -> &CameraTuning {
        &self.tuning
    }
}

fn safe_ln(price: f64) -> f64 {
    if price.is_finite() && price > 0.0 { price.ln() } else { f64::MIN_POSITIVE.ln() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chart::value_objects::{Band, LayerConfig};

    fn panel(height: f64) -> Panel {
        let config = LayerConfig { band: Band::new(0.0, 1.0), ..LayerConfig::default() };
        Panel::compute(&config, 800.0, height)
    }

    #[test]
    fn centre_maps_to_panel_middle() {
        let camera = Camera::new(100.0, CameraTuning::default());
        let panel = panel(400.0);
        assert!((camera.project(100.0, &panel) - 200.0).abs() < 1e-9);
        assert!(camera.project(101.0, &panel) < 200.0);
        assert!(camera.project(99.0, &panel) > 200.0);
    }

    #[test]
    fn default_range_gives_the_expected_scale() {
        let camera = Camera::new(100.0, CameraTuning::default());
        assert!((camera.pixels_per_log_unit(220.0) - 0.9 * 220.0 / 0.022).abs() < 1e-9);
    }

    #[test]
    fn range_fixes_once_from_percentiles() {
        let mut camera = Camera::new(100.0, CameraTuning::default());
        // 21 log samples 0.00..=0.20 above ln(100); 5th pct index 1, 95th index 19
        let prices: Vec<f64> = (0..=20).map(|i| 100.0 * (i as f64 * 0.01).exp()).collect();
        assert!(camera.fix_range_from_samples(prices.clone(), 6));
        assert!((camera.fixed_log_range() - 0.18).abs() < 1e-9);
        assert!((camera.center_log() - (100.0f64.ln() + 0.10)).abs() < 1e-9);
        assert_eq!(camera.ema_log(), camera.center_log());

        let scale = camera.pixels_per_log_unit(300.0);
        assert!(!camera.fix_range_from_samples(vec![1.0, 1000.0], 6));
        assert_eq!(camera.pixels_per_log_unit(300.0), scale);
    }

    #[test]
    fn short_prefill_keeps_the_default_range() {
        let mut camera = Camera::new(100.0, CameraTuning::default());
        assert!(!camera.fix_range_from_samples(vec![90.0, 110.0], 4));
        assert_eq!(camera.fixed_log_range(), 0.022);
    }

    #[test]
    fn recentring_is_gradual() {
        let mut camera = Camera::new(100.0, CameraTuning::default());
        for _ in 0..10 {
            camera.observe(200.0);
        }
        let target = camera.ema_log();
        let before = camera.center_log();
        camera.recenter();
        let moved = camera.center_log() - before;
        assert!((moved - (target - before) * 0.03).abs() < 1e-12);
        camera.observe(f64::NAN);
        assert_eq!(camera.ema_log(), target);
    }
}
