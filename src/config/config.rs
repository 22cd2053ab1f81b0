//! # Client Configuration
//!
//! Configuration shared by the CLI and the desktop front-end: where the
//! photo-to-poetry backend lives, how long to wait for it, how to prepare
//! images before upload and which camera to snapshot from.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Range | Description |
//! |-----------|------|-------|-------------|
//! | `backend_url` | `String` | http(s) URL | Base URL of the backend |
//! | `request_timeout_secs` | `Option<u64>` | 1-600 | Per-request timeout, none by default |
//! | `max_long_side` | `Option<u32>` | 16-8192 | Downscale limit before upload |
//! | `camera.width` × `camera.height` | `u32` | > 0 | Snapshot size |
//!
//! ## Examples
//!
//! ```rust
//! use photo_poetry::config::config::ClientConfig;
//!
//! let mut config = ClientConfig::default();
//! assert_eq!(config.backend_url, "http://localhost:8080");
//!
//! config.max_long_side = Some(1024);
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use reqwest::Url;

use crate::error::{PoetryError, PoetryResult};

/// Backend address used when nothing else is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";

/// How to take a snapshot from a live camera.
///
/// Snapshots are taken by an external `ffmpeg` process reading one frame from
/// the platform's camera input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraConfig {
    /// Program used to talk to the camera.
    pub ffmpeg: String,
    /// Device path or name (`/dev/video0`, `0`, or a DirectShow device name).
    pub device: String,
    pub width: u32,
    pub height: u32,
}

impl Default for CameraConfig {
    /// 640×480 from the platform's first camera.
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            device: default_camera_device().to_string(),
            width: 640,
            height: 480,
        }
    }
}

fn default_camera_device() -> &'static str {
    if cfg!(target_os = "linux") {
        "/dev/video0"
    } else if cfg!(target_os = "windows") {
        "Integrated Camera"
    } else {
        "0"
    }
}

/// Configuration for a photo-to-poetry client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the backend; stage paths are appended to it.
    pub backend_url: String,

    /// Optional timeout applied to every request.
    ///
    /// `None` waits as long as the backend takes, which is what the model
    /// servers behind it usually need on a cold start.
    pub request_timeout_secs: Option<u64>,

    /// Longest side, in pixels, an image may have when uploaded.
    ///
    /// Larger images are downscaled with their aspect ratio preserved.
    /// `None` uploads images untouched.
    pub max_long_side: Option<u32>,

    /// Camera snapshot settings.
    pub camera: CameraConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout_secs: None,
            max_long_side: None,
            camera: CameraConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Creates a configuration with default camera settings.
    pub fn new(
        backend_url: String,
        request_timeout_secs: Option<u64>,
        max_long_side: Option<u32>,
    ) -> Self {
        Self {
            backend_url,
            request_timeout_secs,
            max_long_side,
            camera: CameraConfig::default(),
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), String> {
        let url = Url::parse(&self.backend_url)
            .map_err(|e| format!("Backend URL '{}' is invalid: {}", self.backend_url, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!(
                "Backend URL must use http or https, got '{}'",
                url.scheme()
            ));
        }
        if let Some(secs) = self.request_timeout_secs {
            if !(1..=600).contains(&secs) {
                return Err("Request timeout must be between 1 and 600 seconds".to_string());
            }
        }
        if let Some(side) = self.max_long_side {
            if !(16..=8192).contains(&side) {
                return Err("Max image side must be between 16 and 8192 pixels".to_string());
            }
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err("Camera frame size must be greater than 0".to_string());
        }
        if self.camera.device.trim().is_empty() {
            return Err("Camera device must not be empty".to_string());
        }
        Ok(())
    }

    /// Parsed backend URL.
    pub fn base_url(&self) -> PoetryResult<Url> {
        Url::parse(&self.backend_url)
            .map_err(|e| PoetryError::config("backend_url", &self.backend_url, e.to_string()))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
