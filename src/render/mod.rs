mod common;
mod native;
mod shared;

pub use common::{DrawItem, Frame, GlobalUniform, MeshId, ObjectUniform};
pub use native::Renderer;
pub use shared::CUBE_SIZE;
