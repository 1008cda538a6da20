use super::camera::{Camera, CameraTuning};
use super::panel::{Panel, scroll_offset};
use super::surface::Surface;
use super::value_objects::{CANDLE_WIDTH_PX, Color, ColorStop, LayerConfig, Point, Rect, StrokeStyle, visible_count};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{
    CandleAggregator, CandleWindow, CloseHistory, IndicatorEngine, NormalizeTuning, Ohlc, PriceProcess, PriceState,
    ProcessTuning, RandomSource, SeededRandom, sanitize_delta,
};
use crate::{log_debug, log_trace};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;
use strum::{EnumIter, IntoEnumIterator};

/// Read-only view of another layer's current close.
pub trait RefPriceSource {
    fn ref_price(&self) -> f64;
}

impl<F: Fn() -> f64> RefPriceSource for F {
    fn ref_price(&self) -> f64 {
        self()
    }
}

/// Shared cell a layer publishes its current close into after every update.
/// Followers hold clones and only ever read.
#[derive(Debug, Clone, Default)]
pub struct RefPriceFeed(Rc<Cell<f64>>);

impl RefPriceFeed {
    pub fn new(price: f64) -> Self {
        Self(Rc::new(Cell::new(price)))
    }

    pub fn get(&self) -> f64 {
        self.0.get()
    }

    fn publish(&self, price: f64) {
        self.0.set(price);
    }
}

impl RefPriceSource for RefPriceFeed {
    fn ref_price(&self) -> f64 {
        self.get()
    }
}

/// Tunable constants of one layer, grouped so a scene can override them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerTuning {
    pub process: ProcessTuning,
    pub normalize: NormalizeTuning,
    pub camera: CameraTuning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
enum DrawPass {
    TrendLine,
    Indicators,
    Candles,
}

/// Pixel-space shape of one candle, precomputed before any drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandleGlyph {
    pub x: f64,
    pub high_y: f64,
    pub low_y: f64,
    pub body_top: f64,
    pub body_height: f64,
    pub bullish: bool,
}

impl CandleGlyph {
    pub const MIN_BODY_PX: f64 = 2.0;

    pub fn compute(x: f64, ohlc: &Ohlc, camera: &Camera, panel: &Panel) -> Self {
        let open_y = camera.project(ohlc.open, panel);
        let close_y = camera.project(ohlc.close, panel);
        Self {
            x,
            high_y: camera.project(ohlc.high, panel),
            low_y: camera.project(ohlc.low, panel),
            body_top: open_y.min(close_y),
            body_height: (close_y - open_y).abs().max(Self::MIN_BODY_PX),
            bullish: ohlc.is_bullish(),
        }
    }

    pub fn color(&self) -> Color {
        if self.bullish { Color::BULL } else { Color::BEAR }
    }
}

const TREND_LINE_OPACITY: f64 = 0.6;
const TREND_LINE_WIDTH: f64 = 1.6;
const TERMINAL_OPACITY: f64 = 0.9;
const TERMINAL_WIDTH: f64 = 3.2;
const GLOW_RADIUS: f64 = 6.0;
const GLOW_FALLOFF: f64 = 24.0;
const INDICATOR_OPACITY: f64 = 0.9;
const EMA_SHORT_STYLE: StrokeStyle = StrokeStyle { color: Color::rgba(122, 162, 255, 0.9), width: 1.8 };
const EMA_LONG_STYLE: StrokeStyle = StrokeStyle { color: Color::rgba(122, 162, 255, 0.5), width: 1.4 };
const CANDLE_OPACITY: f64 = 0.9;
const WICK_WIDTH: f64 = 1.0;
#[cfg(feature = "parallel")]
const PARALLEL_THRESHOLD: usize = 100;

/// Layer Engine: one independently parameterized price animation.
///
/// Owns its price process, candle aggregator, camera and random source.
/// The only thing it shares is a [`RefPriceFeed`] another layer may follow.
pub struct MarketLayer<R: RandomSource = SeededRandom> {
    config: LayerConfig,
    tuning: LayerTuning,
    process: PriceProcess,
    aggregator: CandleAggregator,
    camera: Camera,
    indicators: IndicatorEngine,
    rng: R,
    visible_count: usize,
    follow: Option<Box<dyn RefPriceSource>>,
    feed: RefPriceFeed,
}

impl<R: RandomSource> MarketLayer<R> {
    /// Builds the layer and synthesizes `visible_count - 1` closed candles
    /// so the first frame already shows a full window.
    pub fn new(config: LayerConfig, surface_width: f64, rng: R) -> Self {
        Self::with_tuning(config, LayerTuning::default(), surface_width, rng)
    }

    pub fn with_tuning(config: LayerConfig, tuning: LayerTuning, surface_width: f64, mut rng: R) -> Self {
        let config = config.sanitized();
        let visible = visible_count(surface_width, config.width_fraction);
        let process = PriceProcess::new(config.initial_price, tuning.process, &mut rng);
        let opening = process.price();

        let mut layer = Self {
            aggregator: CandleAggregator::new(config.candle_period_ms, visible - 1, opening),
            camera: Camera::new(opening, tuning.camera),
            indicators: IndicatorEngine::default(),
            visible_count: visible,
            follow: None,
            feed: RefPriceFeed::new(opening),
            config,
            tuning,
            process,
            rng,
        };
        layer.prefill();
        layer
    }

    fn prefill(&mut self) {
        let target = self.window_bound();
        let mut samples = Vec::with_capacity(target * 4);
        for _ in 0..target {
            self.process.prefill_step(self.aggregator.in_progress_mut(), &mut self.rng);
            let previous = self.process.state().last_close;
            let candle = self.aggregator.close_bucket(previous);
            self.process.record_close(candle.close());
            let Ohlc { open, high, low, close } = candle.ohlc;
            samples.extend([open, high, low, close]);
        }
        self.camera.fix_range_from_samples(samples, target);
        self.feed.publish(self.ref_price());

        log_debug!(
            LogComponent::Domain("MarketLayer"),
            "pre-filled {} candles, fixed log range {:.5}",
            self.aggregator.window().count(),
            self.camera.fixed_log_range()
        );
    }

    /// Advances the layer by `dt_ms` and re-bounds the window to the surface.
    pub fn update(&mut self, dt_ms: f64, surface_width: f64, _surface_height: f64) {
        let dt_ms = sanitize_delta(dt_ms);
        self.rebound(surface_width);

        let follow = self.follow.as_ref().map(|source| source.ref_price());
        self.process.advance(dt_ms, self.aggregator.in_progress_mut(), follow, &mut self.rng);
        self.camera.observe(self.process.price());

        if self.aggregator.advance(dt_ms) {
            let previous = self.process.state().last_close;
            let candle = self.aggregator.close_bucket(previous);
            self.process.on_candle_close(candle.close(), &mut self.rng);
        }
        self.feed.publish(self.ref_price());
    }

    fn rebound(&mut self, surface_width: f64) {
        if !(surface_width.is_finite() && surface_width > 0.0) {
            return;
        }
        let visible = visible_count(surface_width, self.config.width_fraction);
        if visible == self.visible_count {
            return;
        }
        self.visible_count = visible;
        let dropped = self.aggregator.set_window_size(self.window_bound());
        log_trace!(
            LogComponent::Domain("MarketLayer"),
            "window re-bounded to {} candles ({} dropped)",
            self.window_bound(),
            dropped
        );
    }

    /// Renders trend line, indicators and candles, back to front.
    pub fn draw<S: Surface + ?Sized>(&mut self, surface: &mut S, surface_width: f64, surface_height: f64) {
        self.camera.recenter();
        let panel = Panel::compute(&self.config, surface_width, surface_height);
        let offset = scroll_offset(self.aggregator.elapsed_ms(), self.aggregator.period_ms(), panel.step_x);

        for pass in DrawPass::iter() {
            match pass {
                DrawPass::TrendLine => self.draw_trend_line(surface, &panel, offset),
                DrawPass::Indicators if self.config.draw_indicators => self.draw_indicators(surface, &panel, offset),
                DrawPass::Candles if self.config.draw_candles => self.draw_candles(surface, &panel, offset),
                _ => {}
            }
        }
    }

    fn draw_trend_line<S: Surface + ?Sized>(&self, surface: &mut S, panel: &Panel, offset: f64) {
        let points: Vec<Point> = self
            .aggregator
            .window()
            .iter()
            .map(|candle| candle.close())
            .chain(std::iter::once(self.aggregator.in_progress().close))
            .enumerate()
            .map(|(slot, close)| Point::new(panel.slot_x(slot, offset), self.camera.project(close, panel)))
            .collect();

        surface.save();
        surface.set_global_alpha(self.opacity(TREND_LINE_OPACITY));
        surface.stroke_polyline(&points, StrokeStyle::new(Color::TREND.with_alpha(0.6), TREND_LINE_WIDTH));

        if let [.., from, to] = points.as_slice() {
            surface.save();
            surface.set_global_alpha(self.opacity(TERMINAL_OPACITY));
            surface.stroke_segments(&[(*from, *to)], StrokeStyle::new(Color::TREND.with_alpha(0.9), TERMINAL_WIDTH));
            surface.fill_glow(*to, GLOW_RADIUS, GLOW_FALLOFF, &[
                ColorStop::new(0.0, Color::WHITE.with_alpha(0.95)),
                ColorStop::new(0.3, Color::TREND.with_alpha(0.8)),
                ColorStop::new(1.0, Color::TREND.with_alpha(0.0)),
            ]);
            surface.restore();
        }
        surface.restore();
    }

    fn draw_indicators<S: Surface + ?Sized>(&self, surface: &mut S, panel: &Panel, offset: f64) {
        let Some(overlay) = self.indicators.compute(self.aggregator.history()) else {
            return;
        };
        // last EMA value sits on the last closed candle
        let slots = self.aggregator.window().count();
        let to_points = |series: &[f64]| -> Vec<Point> {
            let skip = series.len().saturating_sub(slots);
            series[skip..]
                .iter()
                .enumerate()
                .map(|(slot, value)| Point::new(panel.slot_x(slot, offset), self.camera.project(*value, panel)))
                .collect()
        };

        surface.save();
        surface.set_global_alpha(self.opacity(INDICATOR_OPACITY));
        surface.stroke_polyline(&to_points(&overlay.long), EMA_LONG_STYLE);
        surface.stroke_polyline(&to_points(&overlay.short), EMA_SHORT_STYLE);
        surface.restore();
    }

    fn draw_candles<S: Surface + ?Sized>(&self, surface: &mut S, panel: &Panel, offset: f64) {
        surface.save();
        surface.set_global_alpha(self.opacity(CANDLE_OPACITY));
        for glyph in self.candle_glyphs(panel, offset) {
            let color = glyph.color();
            surface.stroke_segments(
                &[(Point::new(glyph.x, glyph.high_y), Point::new(glyph.x, glyph.low_y))],
                StrokeStyle::new(color, WICK_WIDTH),
            );
            surface.fill_rect(
                Rect::new(glyph.x - CANDLE_WIDTH_PX * 0.5, glyph.body_top, CANDLE_WIDTH_PX, glyph.body_height),
                color,
            );
        }
        surface.restore();
    }

    /// Glyphs for the window candles followed by the in-progress candle,
    /// all shape-normalized.
    pub fn candle_glyphs(&self, panel: &Panel, offset: f64) -> Vec<CandleGlyph> {
        let mut shapes: Vec<Ohlc> = self.aggregator.window().iter().map(|candle| candle.ohlc).collect();
        shapes.push(*self.aggregator.in_progress());

        let normalize = &self.tuning.normalize;
        let camera = &self.camera;
        let glyph = |(slot, ohlc): (usize, &Ohlc)| {
            CandleGlyph::compute(panel.slot_x(slot, offset), &ohlc.normalized(normalize), camera, panel)
        };

        #[cfg(feature = "parallel")]
        if shapes.len() >= PARALLEL_THRESHOLD {
            return shapes.par_iter().enumerate().map(glyph).collect();
        }
        shapes.iter().enumerate().map(glyph).collect()
    }

    fn opacity(&self, weight: f64) -> f64 {
        (weight * self.config.depth).clamp(0.0, 1.0)
    }

    /// Installs the coupling source whose price this layer's drift leans toward.
    pub fn set_follow(&mut self, source: impl RefPriceSource + 'static) {
        self.follow = Some(Box::new(source));
    }

    pub fn clear_follow(&mut self) {
        self.follow = None;
    }

    pub fn is_following(&self) -> bool {
        self.follow.is_some()
    }

    /// Current close of the in-progress candle.
    pub fn ref_price(&self) -> f64 {
        self.aggregator.in_progress().close
    }

    /// Read handle other layers can follow.
    pub fn ref_price_feed(&self) -> RefPriceFeed {
        self.feed.clone()
    }

    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    pub fn tuning(&self) -> &LayerTuning {
        &self.tuning
    }

    pub fn depth(&self) -> f64 {
        self.config.depth
    }

    pub fn candles(&self) -> &CandleWindow {
        self.aggregator.window()
    }

    pub fn in_progress(&self) -> &Ohlc {
        self.aggregator.in_progress()
    }

    pub fn history(&self) -> &CloseHistory {
        self.aggregator.history()
    }

    pub fn price_state(&self) -> &PriceState {
        self.process.state()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    /// Maximum number of closed candles kept: `visible_count - 1`.
    pub fn window_bound(&self) -> usize {
        self.visible_count.saturating_sub(1)
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.aggregator.elapsed_ms()
    }

    pub fn closed_total(&self) -> u64 {
        self.aggregator.closed_total()
    }
}

impl<R: RandomSource> std::fmt::Debug for MarketLayer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketLayer")
            .field("config", &self.config)
            .field("price", &self.process.price())
            .field("candles", &self.aggregator.window().count())
            .field("visible_count", &self.visible_count)
            .field("following", &self.follow.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market_data::SequenceRandom;

    #[test]
    fn feed_reflects_the_latest_close() {
        let mut layer = MarketLayer::new(LayerConfig::default(), 800.0, SeededRandom::new(1));
        let feed = layer.ref_price_feed();
        assert_eq!(feed.get(), layer.ref_price());
        layer.update(16.0, 800.0, 600.0);
        assert_eq!(feed.get(), layer.ref_price());
    }

    #[test]
    fn closures_can_be_followed() {
        let mut layer = MarketLayer::new(LayerConfig::default(), 800.0, SequenceRandom::constant(0.25));
        assert!(!layer.is_following());
        layer.set_follow(|| 120.0);
        assert!(layer.is_following());
        layer.clear_follow();
        assert!(!layer.is_following());
    }

    #[test]
    fn glyph_body_never_collapses() {
        let camera = Camera::new(100.0, CameraTuning::default());
        let panel = Panel::compute(&LayerConfig::default(), 800.0, 600.0);
        let glyph = CandleGlyph::compute(10.0, &Ohlc::flat(100.0), &camera, &panel);
        assert_eq!(glyph.body_height, CandleGlyph::MIN_BODY_PX);
        assert!(glyph.bullish);
        assert_eq!(glyph.color(), Color::BULL);
    }
}
