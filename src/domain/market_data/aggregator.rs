use super::entities::{Candle, CandleWindow, CloseHistory};
use super::value_objects::Ohlc;

/// Buckets the continuous price into fixed-duration candles.
///
/// Holds the bounded window of closed candles, the longer close history and
/// the single in-progress candle. Time accumulates through [`advance`]; once a
/// period has elapsed the owner calls [`close_bucket`].
///
/// [`advance`]: CandleAggregator::advance
/// [`close_bucket`]: CandleAggregator::close_bucket
#[derive(Debug, Clone)]
pub struct CandleAggregator {
    period_ms: f64,
    elapsed_ms: f64,
    window: CandleWindow,
    history: CloseHistory,
    in_progress: Ohlc,
    closed_total: u64,
}

impl CandleAggregator {
    pub const MIN_PERIOD_MS: f64 = 1.0;

    pub fn new(period_ms: f64, window_size: usize, opening_price: f64) -> Self {
        let period_ms = if period_ms.is_finite() { period_ms.max(Self::MIN_PERIOD_MS) } else { 1000.0 };
        Self {
            period_ms,
            elapsed_ms: 0.0,
            window: CandleWindow::new(window_size),
            history: CloseHistory::for_window(window_size),
            in_progress: Ohlc::flat(opening_price),
            closed_total: 0,
        }
    }

    /// Adds elapsed time; true once the current bucket is due to close.
    pub fn advance(&mut self, dt_ms: f64) -> bool {
        self.elapsed_ms += dt_ms;
        self.elapsed_ms >= self.period_ms
    }

    /// Closes the in-progress candle with `open` fixed at the previous close,
    /// appends it to the window and the close history, and starts a fresh flat
    /// candle at its close. The elapsed-time accumulator restarts at zero.
    pub fn close_bucket(&mut self, previous_close: f64) -> Candle {
        let mut ohlc = self.in_progress;
        ohlc.open = previous_close;
        ohlc.high = ohlc.high.max(previous_close);
        ohlc.low = ohlc.low.min(previous_close);

        let candle = Candle::new(self.closed_total, ohlc);
        self.closed_total += 1;
        self.window.push(candle);
        self.history.push(ohlc.close);
        self.in_progress = Ohlc::flat(ohlc.close);
        self.elapsed_ms = 0.0;
        candle
    }

    /// Rebounds the window (and the history derived from it). Candles beyond
    /// the new bound are dropped oldest first; returns how many.
    pub fn set_window_size(&mut self, window_size: usize) -> usize {
        if window_size == self.window.max_size() {
            return 0;
        }
        self.history.set_capacity(CloseHistory::capacity_for_window(window_size));
        self.window.set_max_size(window_size)
    }

    pub fn in_progress(&self) -> &Ohlc {
        &self.in_progress
    }

    pub fn in_progress_mut(&mut self) -> &mut Ohlc {
        &mut self.in_progress
    }

    pub fn window(&self) -> &CandleWindow {
        &self.window
    }

    pub fn history(&self) -> &CloseHistory {
        &self.history
    }

    pub fn period_ms(&self) -> f64 {
        self.period_ms
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Candles closed since construction, pre-fill included.
    pub fn closed_total(&self) -> u64 {
        self.closed_total
    }
}
