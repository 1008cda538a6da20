use super::value_objects::{CANDLE_STEP_PX, LayerConfig};

/// Pixel geometry of one layer for the current surface size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Panel {
    pub top: f64,
    pub height: f64,
    pub center_y: f64,
    pub left_x: f64,
    pub usable_width: f64,
    pub step_x: f64,
}

impl Panel {
    pub fn compute(config: &LayerConfig, width: f64, height: f64) -> Self {
        let top = height * config.band.top;
        let panel_height = height * config.band.height;
        Self {
            top,
            height: panel_height,
            center_y: top + panel_height * 0.5,
            left_x: width * config.left_fraction,
            usable_width: width * config.width_fraction,
            step_x: CANDLE_STEP_PX,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// X of the `slot`-th candle once the whole strip has scrolled by `offset`.
    pub fn slot_x(&self, slot: usize, offset: f64) -> f64 {
        self.left_x - offset + slot as f64 * self.step_x
    }
}

/// Continuous horizontal scroll while the current bucket fills:
/// `clamp(elapsed / period * step, 0, step)`.
pub fn scroll_offset(elapsed_ms: f64, period_ms: f64, step_px: f64) -> f64 {
    if !(period_ms > 0.0) || !elapsed_ms.is_finite() {
        return 0.0;
    }
    (elapsed_ms / period_ms * step_px).clamp(0.0, step_px.max(0.0))
}
