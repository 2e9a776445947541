pub mod decode;
pub mod loader;
pub mod model;

pub use decode::decode_model;
pub use loader::{AssetLoader, LoadHandle, LoadProgress, LoadResult, error_chain};
pub use model::{LoadedModel, MeshData, MeshPrimitive, SceneNode, SkinData};
