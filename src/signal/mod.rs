//! Pixel-to-signal scan conversion
//!
//! Re-exposes a frame as a four-channel sample stream, scanning it
//! according to a [`ScanMode`] on a clock independent of the frame rate.

pub mod mode;
pub mod pipeline;
pub mod reader;
pub mod scan;

pub use mode::{ModeCommand, ScanMode, ScanState};
pub use pipeline::{FrameSource, ScanPipeline, ScanPipelineConfig, ScanPipelineStats};
pub use scan::{FrameIntake, ScanConverter, SignalBlock};
