//! Image host upload contracts and the Imgur implementation.
//!
//! # Responsibility
//! - Turn a locally selected image into a durable remote URL.
//! - Keep the three failure classes (read, network, malformed) distinct.
//!
//! # Invariants
//! - A read failure happens before any network request is issued.
//! - One upload issues at most one POST; nothing is retried.

mod imgur;

use crate::error::ErrorCategory;
use crate::model::image::PendingImage;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use imgur::ImgurUploader;

/// Upload failure; each variant carries a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// Local image could not be read into bytes.
    Read(String),
    /// Request could not complete (connect, DNS, timeout, body read).
    Network(String),
    /// Host responded without a usable `data.link`.
    MalformedResponse(String),
}

impl UploadError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Read(_) => ErrorCategory::ReadFailure,
            Self::Network(_) => ErrorCategory::NetworkFailure,
            Self::MalformedResponse(_) => ErrorCategory::MalformedResponse,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Read(message) | Self::Network(message) | Self::MalformedResponse(message) => {
                message
            }
        }
    }
}

impl Display for UploadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(message) => write!(f, "could not read image: {message}"),
            Self::Network(message) => write!(f, "image upload failed: {message}"),
            Self::MalformedResponse(message) => {
                write!(f, "unexpected image host response: {message}")
            }
        }
    }
}

impl Error for UploadError {}

/// Uploads image bytes to a remote host and returns the durable URL.
#[async_trait]
pub trait ImageUploader: Send + Sync {
    /// Issues a single upload request for already-read bytes.
    async fn upload_bytes(&self, bytes: Vec<u8>) -> Result<String, UploadError>;

    /// Reads the pending image, then uploads it.
    async fn upload(&self, image: &PendingImage) -> Result<String, UploadError> {
        let bytes = image.read_bytes().await?;
        self.upload_bytes(bytes).await
    }
}

#[async_trait]
impl<T: ImageUploader + ?Sized> ImageUploader for std::sync::Arc<T> {
    async fn upload_bytes(&self, bytes: Vec<u8>) -> Result<String, UploadError> {
        (**self).upload_bytes(bytes).await
    }

    async fn upload(&self, image: &PendingImage) -> Result<String, UploadError> {
        (**self).upload(image).await
    }
}

#[cfg(test)]
mod tests {
    use super::{ImageUploader, UploadError};
    use crate::error::ErrorCategory;

    #[test]
    fn each_variant_maps_to_its_own_category() {
        assert_eq!(
            UploadError::Read(String::new()).category(),
            ErrorCategory::ReadFailure
        );
        assert_eq!(
            UploadError::Network(String::new()).category(),
            ErrorCategory::NetworkFailure
        );
        assert_eq!(
            UploadError::MalformedResponse(String::new()).category(),
            ErrorCategory::MalformedResponse
        );
    }

    #[test]
    fn uploader_trait_is_object_safe() {
        struct Dummy;

        #[async_trait::async_trait]
        impl ImageUploader for Dummy {
            async fn upload_bytes(&self, _bytes: Vec<u8>) -> Result<String, UploadError> {
                Ok(String::new())
            }
        }

        let _uploader: &dyn ImageUploader = &Dummy;
    }
}
