pub mod compositor;
pub mod fx_scene;
pub mod scene_config;

pub use compositor::*;
pub use fx_scene::*;
pub use scene_config::*;
