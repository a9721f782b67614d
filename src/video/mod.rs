//! Pixel formats, frames and format conversion
//!
//! This module provides the pixel-format vocabulary shared by the
//! conversion engine and the scan converter.

pub mod convert;
pub mod format;
pub mod frame;
pub mod pattern;

pub use convert::PixelConverter;
pub use format::{ComponentType, Orientation, PixelFormat, Resolution};
pub use frame::{ImageRef, VideoFrame};
pub use pattern::{PatternKind, TestPattern};
