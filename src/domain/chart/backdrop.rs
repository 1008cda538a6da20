use super::surface::Surface;
use super::value_objects::{Color, ColorStop, Point, Rect, StrokeStyle};

pub const GRID_STEP_PX: f64 = 64.0;
const GRID_ALPHA: f64 = 0.06;
const STATIC_GRID_ALPHA: f64 = 0.1;
const GRID_X_PERIOD_MS: f64 = 40.0;
const GRID_Y_PERIOD_MS: f64 = 60.0;

const BACKDROP_STOPS: [ColorStop; 2] = [
    ColorStop { offset: 0.0, color: Color::rgba(10, 16, 25, 0.9) },
    ColorStop { offset: 1.0, color: Color::rgba(8, 12, 18, 0.85) },
];

/// Grid lines covering `width x height`, the first vertical line at
/// `x_offset` and the first horizontal one at `y_offset`.
pub fn grid_lines(width: f64, height: f64, x_offset: f64, y_offset: f64) -> Vec<(Point, Point)> {
    let along = |start: f64, end: f64| {
        let start = if start.is_finite() { start.max(0.0) } else { 0.0 };
        let end = if end.is_finite() { end } else { 0.0 };
        std::iter::successors(Some(start), |v| Some(v + GRID_STEP_PX)).take_while(move |v| *v < end)
    };
    let vertical = along(x_offset, width).map(|x| (Point::new(x, 0.0), Point::new(x, height)));
    let horizontal = along(y_offset, height).map(|y| (Point::new(0.0, y), Point::new(width, y)));
    vertical.chain(horizontal).collect()
}

/// Grid phase at host time `clock_ms`: `((t / 40) mod 64, (t / 60) mod 64)`.
pub fn grid_offsets(clock_ms: f64) -> (f64, f64) {
    if !clock_ms.is_finite() {
        return (0.0, 0.0);
    }
    (
        (clock_ms / GRID_X_PERIOD_MS).rem_euclid(GRID_STEP_PX),
        (clock_ms / GRID_Y_PERIOD_MS).rem_euclid(GRID_STEP_PX),
    )
}

/// Vertical gradient painted under the layers each frame.
pub fn paint_backdrop<S: Surface + ?Sized>(surface: &mut S, width: f64, height: f64) {
    surface.fill_vertical_gradient(Rect::new(0.0, 0.0, width, height), &BACKDROP_STOPS);
}

pub fn paint_grid<S: Surface + ?Sized>(surface: &mut S, width: f64, height: f64, clock_ms: f64) {
    let (x_offset, y_offset) = grid_offsets(clock_ms);
    surface.save();
    surface.set_global_alpha(GRID_ALPHA);
    surface.stroke_segments(&grid_lines(width, height, x_offset, y_offset), StrokeStyle::new(Color::GRID, 1.0));
    surface.restore();
}

/// Single still frame used when the host asks for reduced motion.
pub fn paint_static_backdrop<S: Surface + ?Sized>(surface: &mut S, width: f64, height: f64) {
    surface.fill_rect(Rect::new(0.0, 0.0, width, height), Color::STATIC_BACKDROP);
    surface.save();
    surface.set_global_alpha(STATIC_GRID_ALPHA);
    surface.stroke_segments(&grid_lines(width, height, 0.0, 0.0), StrokeStyle::new(Color::GRID, 1.0));
    surface.restore();
}
