use super::value_objects::Ohlc;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Domain entity - a closed candle. `index` counts closes since the layer was
/// created (pre-fill included), so it doubles as chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub index: u64,
    pub ohlc: Ohlc,
}

impl Candle {
    pub fn new(index: u64, ohlc: Ohlc) -> Self {
        Self { index, ohlc }
    }

    pub fn close(&self) -> f64 {
        self.ohlc.close
    }

    pub fn is_bullish(&self) -> bool {
        self.ohlc.is_bullish()
    }
}

/// Sliding window of closed candles, oldest evicted first.
#[derive(Debug, Clone, Default)]
pub struct CandleWindow {
    candles: VecDeque<Candle>,
    max_size: usize,
}

impl CandleWindow {
    pub fn new(max_size: usize) -> Self {
        Self { candles: VecDeque::with_capacity(max_size), max_size }
    }

    pub fn push(&mut self, candle: Candle) {
        self.candles.push_back(candle);
        self.evict_overflow();
    }

    /// Changes the bound, dropping the oldest candles that no longer fit.
    /// Returns how many were dropped.
    pub fn set_max_size(&mut self, max_size: usize) -> usize {
        self.max_size = max_size;
        self.evict_overflow()
    }

    fn evict_overflow(&mut self) -> usize {
        let overflow = self.candles.len().saturating_sub(self.max_size);
        self.candles.drain(..overflow);
        overflow
    }

    pub fn get_candles(&self) -> &VecDeque<Candle> {
        &self.candles
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candle> + '_ {
        self.candles.iter()
    }

    pub fn latest(&self) -> Option<&Candle> {
        self.candles.back()
    }

    pub fn oldest(&self) -> Option<&Candle> {
        self.candles.front()
    }

    pub fn count(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

/// Closing prices kept for the indicator overlay. Outlives the candle window:
/// its bound is five windows, at least 200 and at most 500 closes.
#[derive(Debug, Clone, Default)]
pub struct CloseHistory {
    closes: VecDeque<f64>,
    capacity: usize,
}

impl CloseHistory {
    pub const MIN_CAPACITY: usize = 200;
    pub const MAX_CAPACITY: usize = 500;
    pub const WINDOW_MULTIPLE: usize = 5;

    pub fn new(capacity: usize) -> Self {
        Self { closes: VecDeque::new(), capacity }
    }

    pub fn for_window(window_size: usize) -> Self {
        Self::new(Self::capacity_for_window(window_size))
    }

    pub fn capacity_for_window(window_size: usize) -> usize {
        (window_size * Self::WINDOW_MULTIPLE).clamp(Self::MIN_CAPACITY, Self::MAX_CAPACITY)
    }

    pub fn push(&mut self, close: f64) {
        self.closes.push_back(close);
        self.trim();
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.trim();
    }

    fn trim(&mut self) {
        let overflow = self.closes.len().saturating_sub(self.capacity);
        self.closes.drain(..overflow);
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.closes.iter().copied()
    }

    pub fn latest(&self) -> Option<f64> {
        self.closes.back().copied()
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(index: u64) -> Candle {
        Candle::new(index, Ohlc::flat(100.0 + index as f64))
    }

    #[test]
    fn window_evicts_oldest_first() {
        let mut window = CandleWindow::new(3);
        (0..5).for_each(|i| window.push(candle(i)));
        let kept: Vec<u64> = window.iter().map(|c| c.index).collect();
        assert_eq!(kept, vec![2, 3, 4]);
    }

    #[test]
    fn shrinking_keeps_the_most_recent() {
        let mut window = CandleWindow::new(10);
        (0..10).for_each(|i| window.push(candle(i)));
        assert_eq!(window.set_max_size(4), 6);
        assert_eq!(window.oldest().map(|c| c.index), Some(6));
        assert_eq!(window.latest().map(|c| c.index), Some(9));
        assert_eq!(window.set_max_size(8), 0);
        assert_eq!(window.count(), 4);
    }

    #[test]
    fn history_capacity_follows_window() {
        assert_eq!(CloseHistory::capacity_for_window(10), 200);
        assert_eq!(CloseHistory::capacity_for_window(60), 300);
        assert_eq!(CloseHistory::capacity_for_window(400), 500);
    }

    #[test]
    fn history_drops_from_the_front() {
        let mut history = CloseHistory::new(2);
        [1.0, 2.0, 3.0].into_iter().for_each(|c| history.push(c));
        assert_eq!(history.iter().collect::<Vec<_>>(), vec![2.0, 3.0]);
    }
}
