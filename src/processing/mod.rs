//! # Processing Module
//!
//! Image preparation applied between capture and upload.

pub mod scale;

pub use scale::{Size, downscale, fit_long_side};
