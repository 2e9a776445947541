use super::decode::decode_model;
use super::model::LoadedModel;
use crate::error::ViewerError;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};

const READ_CHUNK: usize = 64 * 1024;

pub type LoadResult = Result<LoadedModel, ViewerError>;

/// Bytes read so far out of the file size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadProgress {
    pub loaded: u64,
    pub total: u64,
}

impl LoadProgress {
    pub fn fraction(&self) -> Option<f32> {
        (self.total > 0).then(|| self.loaded as f32 / self.total as f32)
    }
}

/// Spawns model loads on the tokio runtime
#[derive(Clone)]
pub struct AssetLoader {
    runtime: Handle,
}

impl AssetLoader {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Read `path` in the background and decode it on a blocking thread.
    pub fn load(&self, path: impl AsRef<Path>) -> LoadHandle {
        let path = path.as_ref().to_path_buf();
        let display = path.display().to_string();
        let (result_tx, result_rx) = oneshot::channel();
        let (progress_tx, progress_rx) = mpsc::unbounded_channel();

        log::info!("Loading model {}", display);
        self.runtime.spawn(async move {
            let result = load_model(path, progress_tx).await;
            match &result {
                Ok(model) => log::info!(
                    "Loaded {} nodes and {} clips",
                    model.nodes.len(),
                    model.clips.len()
                ),
                Err(e) => log::error!("{}", error_chain(e)),
            }
            // The handle may already be gone
            let _ = result_tx.send(result);
        });

        LoadHandle {
            path: display,
            result: Some(result_rx),
            progress: progress_rx,
            latest: None,
        }
    }
}

/// Single-shot handle to one background load
pub struct LoadHandle {
    path: String,
    result: Option<oneshot::Receiver<LoadResult>>,
    progress: mpsc::UnboundedReceiver<LoadProgress>,
    latest: Option<LoadProgress>,
}

impl LoadHandle {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// True once the result has been handed out
    pub fn is_taken(&self) -> bool {
        self.result.is_none()
    }

    /// Latest progress report, if any arrived yet.
    pub fn progress(&mut self) -> Option<LoadProgress> {
        while let Ok(progress) = self.progress.try_recv() {
            self.latest = Some(progress);
        }
        self.latest
    }

    /// Non-blocking. Returns the outcome exactly once, `None` before and after.
    pub fn poll(&mut self) -> Option<LoadResult> {
        let receiver = self.result.as_mut()?;
        let outcome = match receiver.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return None,
            Err(oneshot::error::TryRecvError::Closed) => Err(ViewerError::asset_load(
                &self.path,
                "loader task ended without a result",
            )),
        };
        self.result = None;
        Some(outcome)
    }

    pub async fn wait(mut self) -> LoadResult {
        match self.result.take() {
            Some(receiver) => receiver.await.unwrap_or_else(|_| {
                Err(ViewerError::asset_load(
                    &self.path,
                    "loader task ended without a result",
                ))
            }),
            None => Err(ViewerError::asset_load(
                &self.path,
                "load result was already taken",
            )),
        }
    }
}

async fn load_model(path: PathBuf, progress: mpsc::UnboundedSender<LoadProgress>) -> LoadResult {
    let display = path.display().to_string();
    let bytes = read_with_progress(&path, &progress)
        .await
        .map_err(|e| ViewerError::asset_load(&display, e))?;

    let base = path.parent().map(Path::to_path_buf);
    tokio::task::spawn_blocking(move || decode_model(&bytes, base.as_deref()))
        .await
        .map_err(|e| ViewerError::asset_load(&display, e))?
        .map_err(|e| into_asset_error(&display, e))
}

async fn read_with_progress(
    path: &Path,
    progress: &mpsc::UnboundedSender<LoadProgress>,
) -> std::io::Result<Vec<u8>> {
    let mut file = tokio::fs::File::open(path).await?;
    let total = file.metadata().await?.len();
    let mut bytes = Vec::with_capacity(total as usize);
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        let read = file.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..read]);
        let _ = progress.send(LoadProgress {
            loaded: bytes.len() as u64,
            total,
        });
    }

    Ok(bytes)
}

fn into_asset_error(path: &str, err: ViewerError) -> ViewerError {
    match err {
        ViewerError::Gltf(source) => ViewerError::asset_load(path, source),
        ViewerError::Io(source) => ViewerError::asset_load(path, source),
        other => other,
    }
}

/// `error: cause: cause` on one line
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
