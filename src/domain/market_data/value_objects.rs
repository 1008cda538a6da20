use derive_more::Constructor;
use serde::{Deserialize, Serialize};

/// Open/high/low/close summary of one candle period.
#[derive(Debug, Clone, Copy, PartialEq, Constructor, Serialize, Deserialize)]
pub struct Ohlc {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Ohlc {
    /// A candle that has not moved yet: every field equals `price`.
    pub fn flat(price: f64) -> Self {
        Self { open: price, high: price, low: price, close: price }
    }

    /// `low <= min(open, close) <= max(open, close) <= high`, all finite.
    pub fn is_valid(&self) -> bool {
        let finite = self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite();
        finite && self.low <= self.body_low() && self.body_high() <= self.high
    }

    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }

    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn body_high(&self) -> f64 {
        self.open.max(self.close)
    }

    pub fn body_low(&self) -> f64 {
        self.open.min(self.close)
    }

    /// Records a new tick: `close` follows the price, `high`/`low` only widen.
    pub fn absorb(&mut self, price: f64) {
        self.close = price;
        if self.high < price {
            self.high = price;
        }
        if self.low > price {
            self.low = price;
        }
    }

    /// Reshapes the candle for display so it reads as a "full" candle.
    ///
    /// A body thinner than `min_body` of the range is widened around its
    /// midpoint (direction preserved) and wicks are rebuilt `wick_padding` of
    /// the range beyond it. Otherwise wicks are capped at `wick_cap` of the
    /// range past the body.
    pub fn normalized(&self, tuning: &NormalizeTuning) -> Ohlc {
        let amplitude = self.range().max(tuning.min_amplitude);
        if self.body() < amplitude * tuning.min_body {
            let mid = (self.open + self.close) * 0.5;
            let half_body = amplitude * tuning.min_body * 0.5;
            let (open, close) = if self.is_bullish() {
                (mid - half_body, mid + half_body)
            } else {
                (mid + half_body, mid - half_body)
            };
            let padding = amplitude * tuning.wick_padding;
            return Ohlc {
                open,
                high: open.max(close) + padding,
                low: open.min(close) - padding,
                close,
            };
        }

        let cap = amplitude * tuning.wick_cap;
        Ohlc {
            open: self.open,
            high: self.high.min(self.body_high() + cap),
            low: self.low.max(self.body_low() - cap),
            close: self.close,
        }
    }
}

/// Display-shape thresholds for [`Ohlc::normalized`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeTuning {
    pub min_body: f64,
    pub wick_padding: f64,
    pub wick_cap: f64,
    pub min_amplitude: f64,
}

impl Default for NormalizeTuning {
    fn default() -> Self {
        Self { min_body: 0.2, wick_padding: 0.2, wick_cap: 0.7, min_amplitude: 1e-6 }
    }
}
