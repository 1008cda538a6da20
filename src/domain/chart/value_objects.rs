use crate::domain::errors::{AppError, ConfigResult};
use derive_more::Constructor;
use serde::{Deserialize, Serialize};

pub const CANDLE_WIDTH_PX: f64 = 10.0;
pub const CANDLE_GAP_PX: f64 = 6.0;
/// Horizontal pitch of one candle slot: body plus gap.
pub const CANDLE_STEP_PX: f64 = CANDLE_WIDTH_PX + CANDLE_GAP_PX;
/// `visible_count` never drops below this, however narrow the surface.
pub const MIN_VISIBLE_CANDLES: usize = 16;

/// Candle slots that fit in `width * width_fraction` pixels.
pub fn visible_count(surface_width: f64, width_fraction: f64) -> usize {
    let usable = (surface_width * width_fraction).max(0.0);
    let slots = if usable.is_finite() { (usable / CANDLE_STEP_PX).floor() as usize } else { 0 };
    slots.max(MIN_VISIBLE_CANDLES)
}

/// Value Object - Color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    pub const fn from_hex(hex: u32) -> Self {
        Self::rgb(((hex >> 16) & 0xFF) as u8, ((hex >> 8) & 0xFF) as u8, (hex & 0xFF) as u8)
    }

    pub fn with_alpha(&self, a: f64) -> Self {
        Self { a, ..*self }
    }

    /// CSS colour string understood by the 2-D canvas.
    pub fn to_css(&self) -> String {
        if self.a >= 1.0 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("rgba({},{},{},{})", self.r, self.g, self.b, self.a.max(0.0))
        }
    }

    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BULL: Color = Color::from_hex(0x2ee6a6);
    pub const BEAR: Color = Color::from_hex(0xff6b6b);
    pub const TREND: Color = Color::rgb(122, 162, 255);
    pub const GRID: Color = Color::from_hex(0x7aa2ff);
    pub const STATIC_BACKDROP: Color = Color::from_hex(0x0b0f14);
}

impl From<u32> for Color {
    fn from(hex: u32) -> Self {
        Self::from_hex(hex)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Constructor, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Constructor, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Gradient stop; `offset` runs 0..=1 along the gradient.
#[derive(Debug, Clone, Copy, PartialEq, Constructor, Serialize, Deserialize)]
pub struct ColorStop {
    pub offset: f64,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Constructor, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f64,
}

/// Vertical slice of the surface, as fractions of its height.
#[derive(Debug, Clone, Copy, PartialEq, Constructor, Serialize, Deserialize)]
pub struct Band {
    pub top: f64,
    pub height: f64,
}

impl Default for Band {
    fn default() -> Self {
        Self { top: 0.15, height: 0.3 }
    }
}

impl Band {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// True when the bands come within `min_gap` of each other.
    pub fn conflicts_with(&self, other: &Band, min_gap: f64) -> bool {
        !(self.bottom() + min_gap < other.top || self.top > other.bottom() + min_gap)
    }
}

/// Immutable per-layer parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    pub width_fraction: f64,
    pub left_fraction: f64,
    pub band: Band,
    pub draw_candles: bool,
    pub draw_indicators: bool,
    /// Draw order and opacity weight; lower is farther back.
    pub depth: f64,
    pub candle_period_ms: f64,
    pub initial_price: f64,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            width_fraction: 0.7,
            left_fraction: 0.0,
            band: Band::default(),
            draw_candles: false,
            draw_indicators: false,
            depth: 1.0,
            candle_period_ms: 1000.0,
            initial_price: 105.0,
        }
    }
}

impl LayerConfig {
    pub const MIN_WIDTH_FRACTION: f64 = 0.5;
    pub const MAX_WIDTH_FRACTION: f64 = 0.8;
    const BAND_TOLERANCE: f64 = 1e-9;

    /// Rejects values no clamping can make sense of.
    pub fn validate(&self) -> ConfigResult<()> {
        let finite = [
            ("width_fraction", self.width_fraction),
            ("left_fraction", self.left_fraction),
            ("band.top", self.band.top),
            ("band.height", self.band.height),
            ("depth", self.depth),
            ("candle_period_ms", self.candle_period_ms),
            ("initial_price", self.initial_price),
        ];
        if let Some((name, _)) = finite.iter().find(|(_, value)| !value.is_finite()) {
            return Err(AppError::ConfigError(format!("{name} must be finite")));
        }
        if self.candle_period_ms <= 0.0 {
            return Err(AppError::ConfigError(format!(
                "candle_period_ms must be positive, got {}",
                self.candle_period_ms
            )));
        }
        if self.initial_price <= 0.0 {
            return Err(AppError::ConfigError(format!(
                "initial_price must be positive, got {}",
                self.initial_price
            )));
        }
        if self.depth < 0.0 {
            return Err(AppError::ConfigError(format!("depth must not be negative, got {}", self.depth)));
        }
        if self.band.height <= 0.0 || self.band.top < 0.0 || self.band.bottom() > 1.0 + Self::BAND_TOLERANCE {
            return Err(AppError::ValidationError(format!(
                "band {{ top: {}, height: {} }} must lie within the surface",
                self.band.top, self.band.height
            )));
        }
        Ok(())
    }

    /// Same config with the width fraction in [0.5, 0.8] and the left offset
    /// keeping the layer on screen.
    pub fn sanitized(mut self) -> Self {
        self.width_fraction = self.width_fraction.clamp(Self::MIN_WIDTH_FRACTION, Self::MAX_WIDTH_FRACTION);
        self.left_fraction = self.left_fraction.clamp(0.0, 1.0 - self.width_fraction);
        self
    }
}
