use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    /// Requested clip name is not part of the loaded clip set.
    #[error("animation clip `{name}` not found")]
    ClipNotFound { name: String },

    /// The asset loader completed with a failure; nothing from that scene is usable.
    #[error("failed to load `{path}`")]
    AssetLoad {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("manual clip selection is disabled while auto-alternating")]
    SelectionDisabled,

    #[error("no default clip is bound yet")]
    NotInitialized,

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Gltf(#[from] gltf::Error),

    #[error(transparent)]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error(transparent)]
    RequestAdapter(#[from] wgpu::RequestAdapterError),

    #[error(transparent)]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error(transparent)]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error(transparent)]
    Os(#[from] winit::error::OsError),
}

impl ViewerError {
    pub fn clip_not_found(name: impl ToString) -> Self {
        ViewerError::ClipNotFound {
            name: name.to_string(),
        }
    }

    pub fn asset_load(
        path: impl ToString,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        ViewerError::AssetLoad {
            path: path.to_string(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_not_found_names_the_clip() {
        let err = ViewerError::clip_not_found("nonexistent");
        assert_eq!(err.to_string(), "animation clip `nonexistent` not found");
    }

    #[test]
    fn asset_load_keeps_its_cause() {
        let cause = io::Error::new(io::ErrorKind::NotFound, "missing");
        let err = ViewerError::asset_load("assets/character.gltf", cause);
        assert_eq!(err.to_string(), "failed to load `assets/character.gltf`");
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("missing"));
    }
}
