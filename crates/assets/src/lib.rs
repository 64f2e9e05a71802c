//! Asset loading: textures, heightfields, car models.
//!
//! Loaded assets carry a content-addressed [`AssetId`] computed from their
//! source bytes. Loads that must not stall the frame loop run inside a
//! [`LoadTask`] and are joined by polling.
//!
//! Model parsing is delegated to `tobj`; only Wavefront OBJ is accepted.

use sha2::{Digest, Sha256};
use std::fmt;
use std::path::PathBuf;

mod model;
mod task;
mod texture;

pub use model::{ModelData, ModelFormat};
pub use task::{LoadTask, TaskStatus};
pub use texture::{HeightField, ImageData};

/// Content-addressed asset ID computed from the asset's source bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(pub u64);

impl AssetId {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        Self(u64::from_le_bytes(head))
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("OBJ load error in {path}: {message}")]
    ObjLoad { path: PathBuf, message: String },
    #[error("unsupported model format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("model has no geometry: {0}")]
    EmptyModel(PathBuf),
    #[error("load of {0} was cancelled")]
    Cancelled(String),
    #[error("load task {0} failed before producing a result")]
    TaskFailed(String),
}

pub fn crate_info() -> &'static str {
    "synthwave-assets v0.1.0"
}
