pub mod camera;
mod render;
#[allow(clippy::module_inception)]
pub mod renderer;
pub mod skinning;
pub mod vertex;

pub use camera::{CameraController, CameraState};
pub use renderer::Renderer;
