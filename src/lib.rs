//! pixsig - pixel format transcoding and pixel-to-signal scanning
//!
//! This crate provides a table-driven converter between packed RGB, packed
//! and planar YUV and luminance formats, and a scan converter that turns
//! the latest frame into a continuous four-channel sample stream.

pub mod config;
pub mod error;
pub mod signal;
pub mod video;

pub use error::{AppError, Result};
