//! # Backend Module
//!
//! The remote service that stores uploaded images, captions them and turns
//! captions into poems. [`PoetryBackend`] is the seam the session talks to;
//! [`HttpBackend`] is the real implementation over JSON/HTTP.

use async_trait::async_trait;

use crate::encoded::EncodedImage;
use crate::error::PoetryResult;

pub mod http;
pub mod protocol;

pub use http::HttpBackend;

/// What the backend returns for a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Server-assigned name used to address the image afterwards.
    pub image_name: String,
    /// Where the stored image can be fetched, if the backend says.
    pub image_url: Option<String>,
    /// Where the caption can be fetched, if the backend says.
    pub caption_url: Option<String>,
}

impl UploadReceipt {
    pub fn named(image_name: impl Into<String>) -> Self {
        Self {
            image_name: image_name.into(),
            image_url: None,
            caption_url: None,
        }
    }
}

/// Operations offered by a photo-to-poetry backend.
///
/// Implementations report a reply that lacks its payload field as
/// [`PoetryError::MissingField`](crate::error::PoetryError::MissingField).
#[async_trait]
pub trait PoetryBackend: Send + Sync {
    /// Store an image and return its server-assigned name.
    async fn upload(&self, image: &EncodedImage) -> PoetryResult<UploadReceipt>;

    /// Fetch the caption generated for a previously uploaded image.
    async fn caption(&self, image_name: &str) -> PoetryResult<String>;

    /// Turn a caption into a poem.
    async fn convert(&self, caption: &str) -> PoetryResult<String>;

    /// Fetch the raw bytes of a previously uploaded image.
    async fn fetch_image(&self, image_name: &str) -> PoetryResult<Vec<u8>>;
}
