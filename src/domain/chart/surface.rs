use super::value_objects::{Color, ColorStop, Point, Rect, StrokeStyle};

/// Abstract 2-D drawing target.
///
/// The engine only ever talks to this trait; the browser canvas and the
/// in-memory recorder in `infrastructure::rendering` implement it. Every call
/// is infallible from the engine's point of view: implementations swallow or
/// log backend failures.
pub trait Surface {
    /// Pushes the current alpha onto the state stack.
    fn save(&mut self);

    fn restore(&mut self);

    /// Opacity multiplier applied to everything drawn until the next `restore`.
    fn set_global_alpha(&mut self, alpha: f64);

    fn clear(&mut self, width: f64, height: f64);

    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Fills `rect` with a top-to-bottom gradient.
    fn fill_vertical_gradient(&mut self, rect: Rect, stops: &[ColorStop]);

    /// One open path through `points`. Fewer than two points draw nothing.
    fn stroke_polyline(&mut self, points: &[Point], style: StrokeStyle);

    /// Independent line segments stroked as a single path.
    fn stroke_segments(&mut self, segments: &[(Point, Point)], style: StrokeStyle);

    /// Disc of `radius` at `center` filled with a radial gradient that fades
    /// out at `falloff`.
    fn fill_glow(&mut self, center: Point, radius: f64, falloff: f64, stops: &[ColorStop]);
}

impl<S: Surface + ?Sized> Surface for &mut S {
    fn save(&mut self) {
        (**self).save()
    }

    fn restore(&mut self) {
        (**self).restore()
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        (**self).set_global_alpha(alpha)
    }

    fn clear(&mut self, width: f64, height: f64) {
        (**self).clear(width, height)
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        (**self).fill_rect(rect, color)
    }

    fn fill_vertical_gradient(&mut self, rect: Rect, stops: &[ColorStop]) {
        (**self).fill_vertical_gradient(rect, stops)
    }

    fn stroke_polyline(&mut self, points: &[Point], style: StrokeStyle) {
        (**self).stroke_polyline(points, style)
    }

    fn stroke_segments(&mut self, segments: &[(Point, Point)], style: StrokeStyle) {
        (**self).stroke_segments(segments, style)
    }

    fn fill_glow(&mut self, center: Point, radius: f64, falloff: f64, stops: &[ColorStop]) {
        (**self).fill_glow(center, radius, falloff, stops)
    }
}
