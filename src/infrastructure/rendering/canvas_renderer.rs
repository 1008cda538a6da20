use crate::domain::chart::{Color, ColorStop, Point, Rect, StrokeStyle, Surface};
use crate::domain::errors::{AppError, RenderingResult};
use crate::domain::logging::LogComponent;
use crate::log_warn;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasGradient, CanvasRenderingContext2d, HtmlCanvasElement};

/// Canvas 2D implementation of [`Surface`].
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn from_element_id(canvas_id: &str) -> RenderingResult<Self> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| AppError::RenderingError("document is not available".to_string()))?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| AppError::RenderingError(format!("no element with id '{canvas_id}'")))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| AppError::RenderingError(format!("element '{canvas_id}' is not a canvas")))?;
        Self::from_canvas(canvas)
    }

    pub fn from_canvas(canvas: HtmlCanvasElement) -> RenderingResult<Self> {
        let context = canvas
            .get_context("2d")
            .map_err(|err| AppError::RenderingError(format!("failed to get 2D context: {err:?}")))?
            .ok_or_else(|| AppError::RenderingError("2D context is not supported".to_string()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| AppError::RenderingError("failed to cast to 2D context".to_string()))?;
        Ok(Self { canvas, context })
    }

    /// Sizes the backing store to `css size * device_ratio` and scales the
    /// context so drawing stays in CSS pixels.
    pub fn resize(&self, css_width: f64, css_height: f64, device_ratio: f64) -> RenderingResult<()> {
        let ratio = if device_ratio.is_finite() && device_ratio > 0.0 { device_ratio } else { 1.0 };
        self.canvas.set_width((css_width * ratio).max(0.0).round() as u32);
        self.canvas.set_height((css_height * ratio).max(0.0).round() as u32);

        let style = self.canvas.style();
        style.set_property("width", &format!("{css_width}px")).map_err(rendering_error)?;
        style.set_property("height", &format!("{css_height}px")).map_err(rendering_error)?;
        self.context.set_transform(ratio, 0.0, 0.0, ratio, 0.0, 0.0).map_err(rendering_error)
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    pub fn context(&self) -> &CanvasRenderingContext2d {
        &self.context
    }

    fn gradient_with_stops(gradient: &CanvasGradient, stops: &[ColorStop]) -> RenderingResult<()> {
        for stop in stops {
            gradient
                .add_color_stop(stop.offset as f32, &stop.color.to_css())
                .map_err(rendering_error)?;
        }
        Ok(())
    }

    fn trace_segments(&self, segments: &[(Point, Point)]) {
        self.context.begin_path();
        for (from, to) in segments {
            self.context.move_to(from.x, from.y);
            self.context.line_to(to.x, to.y);
        }
    }

    fn apply_stroke(&self, style: StrokeStyle) {
        self.context.set_stroke_style_str(&style.color.to_css());
        self.context.set_line_width(style.width);
    }

    fn try_fill_glow(&self, center: Point, radius: f64, falloff: f64, stops: &[ColorStop]) -> RenderingResult<()> {
        let gradient = self
            .context
            .create_radial_gradient(center.x, center.y, 0.0, center.x, center.y, falloff)
            .map_err(rendering_error)?;
        Self::gradient_with_stops(&gradient, stops)?;
        self.context.set_fill_style_canvas_gradient(&gradient);
        self.context.begin_path();
        self.context
            .arc(center.x, center.y, radius, 0.0, std::f64::consts::TAU)
            .map_err(rendering_error)?;
        self.context.fill();
        Ok(())
    }
}

fn rendering_error(err: JsValue) -> AppError {
    AppError::RenderingError(format!("{err:?}"))
}

impl Surface for CanvasSurface {
    fn save(&mut self) {
        self.context.save();
    }

    fn restore(&mut self) {
        self.context.restore();
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.context.set_global_alpha(alpha);
    }

    fn clear(&mut self, width: f64, height: f64) {
        self.context.clear_rect(0.0, 0.0, width, height);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.context.set_fill_style_str(&color.to_css());
        self.context.fill_rect(rect.x, rect.y, rect.width, rect.height);
    }

    fn fill_vertical_gradient(&mut self, rect: Rect, stops: &[ColorStop]) {
        let gradient = self.context.create_linear_gradient(rect.x, rect.y, rect.x, rect.y + rect.height);
        if let Err(err) = Self::gradient_with_stops(&gradient, stops) {
            log_warn!(LogComponent::Infrastructure("CanvasSurface"), "gradient rejected: {}", err);
            return;
        }
        self.context.set_fill_style_canvas_gradient(&gradient);
        self.context.fill_rect(rect.x, rect.y, rect.width, rect.height);
    }

    fn stroke_polyline(&mut self, points: &[Point], style: StrokeStyle) {
        let [first, rest @ ..] = points else {
            return;
        };
        if rest.is_empty() {
            return;
        }
        self.apply_stroke(style);
        self.context.begin_path();
        self.context.move_to(first.x, first.y);
        for point in rest {
            self.context.line_to(point.x, point.y);
        }
        self.context.stroke();
    }

    fn stroke_segments(&mut self, segments: &[(Point, Point)], style: StrokeStyle) {
        if segments.is_empty() {
            return;
        }
        self.apply_stroke(style);
        self.trace_segments(segments);
        self.context.stroke();
    }

    fn fill_glow(&mut self, center: Point, radius: f64, falloff: f64, stops: &[ColorStop]) {
        if let Err(err) = self.try_fill_glow(center, radius, falloff, stops) {
            log_warn!(LogComponent::Infrastructure("CanvasSurface"), "glow skipped: {}", err);
        }
    }
}
