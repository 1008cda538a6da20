use crate::domain::chart::{Color, ColorStop, Point, Rect, StrokeStyle, Surface};
use serde::Serialize;

/// One recorded drawing call, with the alpha in effect when it was issued.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear { width: f64, height: f64 },
    FillRect { rect: Rect, color: Color, alpha: f64 },
    VerticalGradient { rect: Rect, stops: Vec<ColorStop>, alpha: f64 },
    Polyline { points: Vec<Point>, style: StrokeStyle, alpha: f64 },
    Segments { segments: Vec<(Point, Point)>, style: StrokeStyle, alpha: f64 },
    Glow { center: Point, radius: f64, falloff: f64, stops: Vec<ColorStop>, alpha: f64 },
}

impl DrawCommand {
    pub fn alpha(&self) -> Option<f64> {
        match self {
            DrawCommand::Clear { .. } => None,
            DrawCommand::FillRect { alpha, .. }
            | DrawCommand::VerticalGradient { alpha, .. }
            | DrawCommand::Polyline { alpha, .. }
            | DrawCommand::Segments { alpha, .. }
            | DrawCommand::Glow { alpha, .. } => Some(*alpha),
        }
    }
}

/// [`Surface`] that records calls instead of painting. Alpha is tracked
/// through `save`/`restore` the way a canvas context does.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
    alpha: f64,
    saved: Vec<f64>,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self { commands: Vec::new(), alpha: 1.0, saved: Vec::new() }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Unbalanced `save` calls so far.
    pub fn save_depth(&self) -> usize {
        self.saved.len()
    }

    pub fn current_alpha(&self) -> f64 {
        self.alpha
    }

    pub fn polylines(&self) -> impl Iterator<Item = (&[Point], &StrokeStyle)> + '_ {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::Polyline { points, style, .. } => Some((points.as_slice(), style)),
            _ => None,
        })
    }

    pub fn filled_rects(&self) -> impl Iterator<Item = (&Rect, &Color)> + '_ {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::FillRect { rect, color, .. } => Some((rect, color)),
            _ => None,
        })
    }

    pub fn count_where(&self, predicate: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|command| predicate(command)).count()
    }
}

impl Surface for RecordingSurface {
    fn save(&mut self) {
        self.saved.push(self.alpha);
    }

    fn restore(&mut self) {
        if let Some(alpha) = self.saved.pop() {
            self.alpha = alpha;
        }
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.alpha = alpha;
    }

    fn clear(&mut self, width: f64, height: f64) {
        self.commands.push(DrawCommand::Clear { width, height });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::FillRect { rect, color, alpha: self.alpha });
    }

    fn fill_vertical_gradient(&mut self, rect: Rect, stops: &[ColorStop]) {
        self.commands.push(DrawCommand::VerticalGradient { rect, stops: stops.to_vec(), alpha: self.alpha });
    }

    fn stroke_polyline(&mut self, points: &[Point], style: StrokeStyle) {
        if points.len() < 2 {
            return;
        }
        self.commands.push(DrawCommand::Polyline { points: points.to_vec(), style, alpha: self.alpha });
    }

    fn stroke_segments(&mut self, segments: &[(Point, Point)], style: StrokeStyle) {
        if segments.is_empty() {
            return;
        }
        self.commands.push(DrawCommand::Segments { segments: segments.to_vec(), style, alpha: self.alpha });
    }

    fn fill_glow(&mut self, center: Point, radius: f64, falloff: f64, stops: &[ColorStop]) {
        self.commands.push(DrawCommand::Glow { center, radius, falloff, stops: stops.to_vec(), alpha: self.alpha });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_follows_the_save_stack() {
        let mut surface = RecordingSurface::new();
        surface.save();
        surface.set_global_alpha(0.5);
        surface.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::BULL);
        surface.restore();
        surface.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::BEAR);

        let alphas: Vec<_> = surface.commands().iter().map(DrawCommand::alpha).collect();
        assert_eq!(alphas, vec![Some(0.5), Some(1.0)]);
        assert_eq!(surface.save_depth(), 0);
    }

    #[test]
    fn degenerate_strokes_are_not_recorded() {
        let mut surface = RecordingSurface::new();
        let style = StrokeStyle::new(Color::TREND, 1.0);
        surface.stroke_polyline(&[Point::new(0.0, 0.0)], style);
        surface.stroke_segments(&[], style);
        assert!(surface.commands().is_empty());
    }
}
