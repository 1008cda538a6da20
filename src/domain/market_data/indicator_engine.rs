use super::entities::CloseHistory;

pub const EMA_SHORT_PERIOD: usize = 12;
pub const EMA_LONG_PERIOD: usize = 26;

/// Smoothing constant `2 / (period + 1)`.
#[inline]
pub fn smoothing(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

#[inline]
fn update_ema(last: &mut Option<f64>, alpha: f64, close: f64) -> f64 {
    let value = match *last {
        Some(prev) => alpha * close + (1.0 - alpha) * prev,
        None => close,
    };
    *last = Some(value);
    value
}

/// EMA of `closes`, seeded at the first close. One output per input.
pub fn ema_series<I>(closes: I, period: usize) -> Vec<f64>
where
    I: IntoIterator<Item = f64>,
{
    let alpha = smoothing(period);
    let mut last = None;
    closes.into_iter().map(|close| update_ema(&mut last, alpha, close)).collect()
}

/// Short and long EMA lines, aligned with the close history they came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmaOverlay {
    pub short: Vec<f64>,
    pub long: Vec<f64>,
}

impl EmaOverlay {
    pub fn len(&self) -> usize {
        self.short.len()
    }

    pub fn is_empty(&self) -> bool {
        self.short.is_empty()
    }
}

/// Recomputes the EMA overlay from scratch on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorEngine {
    pub short_period: usize,
    pub long_period: usize,
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self { short_period: EMA_SHORT_PERIOD, long_period: EMA_LONG_PERIOD }
    }
}

impl IndicatorEngine {
    /// `None` until the history holds at least one long period of closes.
    pub fn compute(&self, history: &CloseHistory) -> Option<EmaOverlay> {
        if history.len() < self.long_period {
            return None;
        }
        Some(EmaOverlay {
            short: ema_series(history.iter(), self.short_period),
            long: ema_series(history.iter(), self.long_period),
        })
    }
}
