use super::compositor::EngineCompositor;
use super::scene_config::SceneConfig;
use crate::domain::chart::Surface;
use crate::domain::chart::backdrop::{paint_backdrop, paint_grid, paint_static_backdrop};
use crate::domain::market_data::{RandomSource, SeededRandom};

/// Frames at or below this visibility are skipped entirely.
pub const MIN_VISIBILITY: f64 = 0.01;
/// Share of a viewport height of scrolling after which the backdrop is gone.
pub const FADE_SCROLL_FRACTION: f64 = 0.6;

/// `clamp(1 - scroll_y / (0.6 * viewport_height), 0, 1)`.
pub fn visibility_for_scroll(scroll_y: f64, viewport_height: f64) -> f64 {
    if !(viewport_height > 0.0) || !scroll_y.is_finite() {
        return 1.0;
    }
    (1.0 - scroll_y / (viewport_height * FADE_SCROLL_FRACTION)).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    Drawn { dt_ms: f64 },
    Skipped,
}

/// Per-frame loop around the compositor: turns host timestamps into bounded
/// deltas, skips invisible frames and paints the backdrop under the layers.
pub struct FxScene<R: RandomSource = SeededRandom> {
    compositor: EngineCompositor<R>,
    max_frame_delta_ms: f64,
    default_frame_delta_ms: f64,
    last_timestamp_ms: Option<f64>,
    visibility: f64,
    frames_drawn: u64,
    frames_skipped: u64,
}

impl<R: RandomSource> FxScene<R> {
    pub fn new(compositor: EngineCompositor<R>, scene: &SceneConfig) -> Self {
        Self {
            compositor,
            max_frame_delta_ms: scene.max_frame_delta_ms,
            default_frame_delta_ms: scene.default_frame_delta_ms,
            last_timestamp_ms: None,
            visibility: 1.0,
            frames_drawn: 0,
            frames_skipped: 0,
        }
    }

    /// `min(max_delta, now - last)`, or the default delta on the first frame
    /// and whenever the difference is not a positive finite number.
    pub fn frame_delta(&mut self, now_ms: f64) -> f64 {
        let previous = self.last_timestamp_ms.replace(now_ms);
        match previous.map(|last| now_ms - last) {
            Some(diff) if diff.is_finite() && diff > 0.0 => diff.min(self.max_frame_delta_ms),
            _ => self.default_frame_delta_ms,
        }
    }

    pub fn set_visibility(&mut self, visibility: f64) {
        if visibility.is_finite() {
            self.visibility = visibility.clamp(0.0, 1.0);
        }
    }

    pub fn visibility(&self) -> f64 {
        self.visibility
    }

    /// Advances and paints one frame at host time `now_ms`.
    pub fn render_frame<S: Surface + ?Sized>(
        &mut self,
        now_ms: f64,
        width: f64,
        height: f64,
        surface: &mut S,
    ) -> FrameOutcome {
        let dt_ms = self.frame_delta(now_ms);
        if self.visibility <= MIN_VISIBILITY {
            self.frames_skipped += 1;
            return FrameOutcome::Skipped;
        }

        surface.clear(width, height);
        paint_backdrop(surface, width, height);
        paint_grid(surface, width, height, now_ms);
        self.compositor.frame(dt_ms, width, height, surface);
        self.frames_drawn += 1;
        FrameOutcome::Drawn { dt_ms }
    }

    /// Still frame for reduced-motion hosts; touches no layer state.
    pub fn render_static<S: Surface + ?Sized>(&self, width: f64, height: f64, surface: &mut S) {
        surface.clear(width, height);
        paint_static_backdrop(surface, width, height);
    }

    pub fn compositor(&self) -> &EngineCompositor<R> {
        &self.compositor
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }
}
