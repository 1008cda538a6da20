//! Chart aggregate: layer geometry, the auto-framing camera, the drawing
//! surface seam and the layer engine that ties a market process to pixels.

pub mod backdrop;
pub mod camera;
pub mod entities;
pub mod panel;
pub mod services;
pub mod surface;
pub mod value_objects;

pub use camera::*;
pub use entities::*;
pub use panel::*;
pub use services::*;
pub use surface::*;
pub use value_objects::*;
