pub mod canvas_renderer;
pub mod recording;

pub use canvas_renderer::CanvasSurface;
pub use recording::{DrawCommand, RecordingSurface};
