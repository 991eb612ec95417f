//! Locally selected image handles.
//!
//! A `PendingImage` lives only between selection and upload; only the URL
//! returned by the image host is ever persisted.

use crate::image::UploadError;
use std::path::{Path, PathBuf};

/// Byte-readable reference to an image the user picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingImage {
    /// File on local storage; read when the upload starts.
    File(PathBuf),
    /// Bytes already loaded by the caller.
    Bytes(Vec<u8>),
}

impl PendingImage {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Short label for logs; never includes the full path.
    pub fn display_name(&self) -> String {
        match self {
            Self::File(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string()),
            Self::Bytes(_) => "in-memory image".to_string(),
        }
    }

    /// Reads the full image content.
    ///
    /// # Errors
    /// - Returns `UploadError::Read` when the file cannot be read, e.g. it
    ///   was deleted or access was revoked after selection.
    pub async fn read_bytes(&self) -> Result<Vec<u8>, UploadError> {
        match self {
            Self::File(path) => read_file(path).await,
            Self::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>, UploadError> {
    tokio::fs::read(path).await.map_err(|err| {
        UploadError::Read(format!(
            "could not read selected image `{}`: {err}",
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        ))
    })
}
