//! # Configuration Module
//!
//! Backend, timeout, image preparation and camera settings.

pub mod config;

pub use config::{CameraConfig, ClientConfig, DEFAULT_BACKEND_URL};
