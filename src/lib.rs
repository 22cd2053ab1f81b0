//! # Photo-to-Poetry Client Library
//!
//! Captures or loads a photo, uploads it to a photo-to-poetry backend, fetches
//! the caption the backend generates for it and turns that caption into a
//! poem.
//!
//! ## Architecture
//!
//! - `capture`: camera and file image sources
//! - `processing`: downscaling before upload
//! - `backend`: the backend trait and its JSON/HTTP client
//! - `session`: workflow state, stage preconditions and request tokens
//! - `config`: backend, timeout, image and camera settings
//! - `error`: the error type and its classification helpers
//!
//! ## Example
//!
//! ```rust,no_run
//! use photo_poetry::capture::{FileSource, capture_image};
//! use photo_poetry::{ClientConfig, HttpBackend, PoetrySession};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::default();
//! let backend = HttpBackend::new(&config)?;
//! let mut session = PoetrySession::new();
//!
//! let mut source = FileSource::new("dog.jpg");
//! session.capture(capture_image(&mut source, config.max_long_side).await?);
//! session.upload(&backend).await?;
//! session.generate_caption(&backend).await?;
//! session.convert_to_poem(&backend).await?;
//!
//! println!("{}\n\n{}", session.caption(), session.poem());
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod capture;
pub mod config;
pub mod encoded;
pub mod error;
pub mod logging;
pub mod processing;
pub mod session;

pub use backend::{HttpBackend, PoetryBackend, UploadReceipt};
pub use config::{CameraConfig, ClientConfig};
pub use encoded::EncodedImage;
pub use error::{HasRecoverySuggestion, HasSeverity, PoetryError, PoetryResult};
pub use session::{PoetrySession, RequestToken, Stage, StageOutcome};
