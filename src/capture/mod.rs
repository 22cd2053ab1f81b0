//! # Capture Module
//!
//! Image sources for the first stage of the workflow: a snapshot from a live
//! camera or a file picked from disk. Both hand back raw encoded bytes which
//! [`capture_image`] turns into an [`EncodedImage`] ready for upload.

use async_trait::async_trait;

use crate::encoded::EncodedImage;
use crate::error::{PoetryError, PoetryResult};
use crate::processing;

pub mod camera;
pub mod file;

pub use camera::CameraSource;
pub use file::FileSource;

/// Abstract interface for image sources.
#[async_trait]
pub trait ImageSource: Send {
    /// Produce the bytes of one encoded image (PNG, JPEG, ...).
    async fn grab(&mut self) -> PoetryResult<Vec<u8>>;

    /// Short human-readable label, used in logs.
    fn describe(&self) -> String;
}

/// Grab one image from `source`, downscale it if needed, and encode it.
pub async fn capture_image(
    source: &mut dyn ImageSource,
    max_long_side: Option<u32>,
) -> PoetryResult<EncodedImage> {
    let bytes = source.grab().await?;
    tracing::debug!("Grabbed {} bytes from {}", bytes.len(), source.describe());

    let bytes = match max_long_side {
        Some(max) => tokio::task::spawn_blocking(move || {
            processing::downscale(&bytes, max).map(|scaled| scaled.unwrap_or(bytes))
        })
        .await
        .map_err(|e| PoetryError::image("downscaling", e.to_string()))??,
        None => bytes,
    };

    let image = EncodedImage::from_bytes(&bytes)?;
    tracing::info!("Captured {} from {}", image, source.describe());
    Ok(image)
}
