pub mod content;

pub use content::{ContentError, ContentLibrary, GallerySet, WorkshopContent};

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Model,
    Texture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

/// Opaque handle to a loaded asset.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetHandle {
    pub kind: AssetKind,
    pub path: String,
    pub byte_len: usize,
    pub dimensions: Option<(u32, u32)>,
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read asset at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode texture {path}: {source}")]
    DecodeTexture {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("not a glTF model: {path}")]
    InvalidModel { path: String },
    #[error("asset {path} is unavailable")]
    Unavailable { path: String },
}

/// A finished load, delivered back on the frame thread by `AssetLoader::poll`.
#[derive(Debug)]
pub struct AssetCompletion {
    pub request: RequestId,
    pub result: Result<AssetHandle, AssetError>,
}

/// Asynchronous asset source. Loads run elsewhere; their completions are
/// only observed through `poll`, so every callback runs on the frame thread.
pub trait AssetLoader {
    fn request(&mut self, kind: AssetKind, path: &str) -> RequestId;
    fn poll(&mut self) -> Vec<AssetCompletion>;
}

/// Loads assets from disk on worker threads.
pub struct FsAssetLoader {
    root: PathBuf,
    next_request: u64,
    sender: Sender<AssetCompletion>,
    receiver: Receiver<AssetCompletion>,
}

impl FsAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            root: root.into(),
            next_request: 1,
            sender,
            receiver,
        }
    }
}

impl AssetLoader for FsAssetLoader {
    fn request(&mut self, kind: AssetKind, path: &str) -> RequestId {
        let request = RequestId(self.next_request);
        self.next_request += 1;

        let full_path = self.root.join(path);
        let display = path.to_string();
        let sender = self.sender.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("asset-{}", request.0))
            .spawn(move || {
                let result = load_from_disk(kind, &full_path, &display);
                // The loader may already be gone; nobody is waiting for the result then.
                let _ = sender.send(AssetCompletion { request, result });
            });
        if let Err(err) = spawned {
            log::warn!("Could not spawn loader thread for {}: {}", path, err);
            let _ = self.sender.send(AssetCompletion {
                request,
                result: Err(AssetError::Unavailable {
                    path: path.to_string(),
                }),
            });
        }
        request
    }

    fn poll(&mut self) -> Vec<AssetCompletion> {
        let mut done = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(completion) => done.push(completion),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        done
    }
}

fn load_from_disk(kind: AssetKind, full_path: &Path, path: &str) -> Result<AssetHandle, AssetError> {
    let bytes = std::fs::read(full_path).map_err(|source| AssetError::Read {
        path: path.to_string(),
        source,
    })?;
    let dimensions = match kind {
        AssetKind::Texture => {
            let image = image::load_from_memory(&bytes).map_err(|source| {
                AssetError::DecodeTexture {
                    path: path.to_string(),
                    source,
                }
            })?;
            Some((image.width(), image.height()))
        }
        AssetKind::Model => {
            if !looks_like_gltf(&bytes) {
                return Err(AssetError::InvalidModel {
                    path: path.to_string(),
                });
            }
            None
        }
    };
    Ok(AssetHandle {
        kind,
        path: path.to_string(),
        byte_len: bytes.len(),
        dimensions,
    })
}

/// Binary glTF starts with the `glTF` magic; JSON glTF must carry an `asset` object.
fn looks_like_gltf(bytes: &[u8]) -> bool {
    if bytes.starts_with(b"glTF") {
        return true;
    }
    serde_json::from_slice::<serde_json::Value>(bytes)
        .map(|value| value.get("asset").is_some_and(serde_json::Value::is_object))
        .unwrap_or(false)
}
