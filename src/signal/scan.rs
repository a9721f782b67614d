//! Pixel-to-signal scan converter
//!
//! The video side hands frames to a [`FrameIntake`]; each delivery copies
//! the pixels into a fresh snapshot and publishes it with one atomic swap.
//! The signal side calls [`ScanConverter::produce_samples`] on its own
//! clock and always reads a complete snapshot, whichever thread delivered
//! it. Missing frames and exhausted scans yield zeros, never errors.

use arc_swap::ArcSwapOption;
use bytes::Bytes;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::mode::{ModeCommand, ScanMode, ScanState};
use super::reader::{PixelReader, Sample};
use crate::error::{AppError, Result};
use crate::video::format::{ComponentType, Orientation, PixelFormat, Resolution};
use crate::video::frame::VideoFrame;

/// Number of output channels: red/luma, green/U, blue/V, alpha
pub const CHANNELS: usize = 4;

/// One block of samples per channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalBlock {
    pub channels: [Vec<f32>; CHANNELS],
}

impl SignalBlock {
    /// Create a zeroed block
    pub fn new(len: usize) -> Self {
        Self {
            channels: std::array::from_fn(|_| vec![0.0; len]),
        }
    }

    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels[0].is_empty()
    }

    /// Resize every channel, zeroing all samples
    pub fn reset(&mut self, len: usize) {
        for channel in &mut self.channels {
            channel.clear();
            channel.resize(len, 0.0);
        }
    }

    #[inline]
    pub fn set(&mut self, idx: usize, sample: Sample) {
        for (channel, value) in self.channels.iter_mut().zip(sample) {
            channel[idx] = value;
        }
    }

    /// Samples of all channels at one index
    pub fn get(&self, idx: usize) -> Sample {
        std::array::from_fn(|c| self.channels[c][idx])
    }

    /// Peak absolute value per channel
    pub fn peak(&self) -> [f32; CHANNELS] {
        std::array::from_fn(|c| {
            self.channels[c]
                .iter()
                .fold(0.0f32, |peak, v| peak.max(v.abs()))
        })
    }

    /// Check if every sample is zero
    pub fn is_silent(&self) -> bool {
        self.channels.iter().flatten().all(|v| *v == 0.0)
    }
}

/// Video-side handle of a scan converter
///
/// Cheap to clone and safe to move to another thread.
#[derive(Clone)]
pub struct FrameIntake {
    snapshot: Arc<ArcSwapOption<VideoFrame>>,
    sequence: Arc<AtomicU64>,
}

impl FrameIntake {
    /// Snapshot caller-owned 8-bit pixel data
    pub fn deliver_frame(
        &self,
        data: &[u8],
        resolution: Resolution,
        format: PixelFormat,
        orientation: Orientation,
    ) -> Result<()> {
        self.deliver_components(data, resolution, format, orientation, ComponentType::Unsigned8)
    }

    /// Snapshot caller-owned pixel data with an explicit component type
    pub fn deliver_components(
        &self,
        data: &[u8],
        resolution: Resolution,
        format: PixelFormat,
        orientation: Orientation,
        component: ComponentType,
    ) -> Result<()> {
        let probe = VideoFrame::new(Bytes::new(), resolution, format, orientation, 0)
            .with_component(component);
        let needed = probe.expected_len();
        if data.len() < needed {
            warn!(
                "Dropping {} {} frame: {} bytes, need {}",
                format,
                resolution,
                data.len(),
                needed
            );
            return Err(AppError::BufferTooSmall {
                what: "Frame",
                needed,
                actual: data.len(),
            });
        }

        let frame = VideoFrame::new(
            Bytes::copy_from_slice(&data[..needed]),
            resolution,
            format,
            orientation,
            self.sequence.fetch_add(1, Ordering::Relaxed),
        )
        .with_component(component);
        self.publish(frame)
    }

    /// Publish an owned frame without copying
    ///
    /// The frame's bytes are immutable, so sharing them is as safe as a copy.
    pub fn deliver(&self, frame: VideoFrame) -> Result<()> {
        frame.validate().inspect_err(|e| warn!("Dropping frame: {}", e))?;
        self.publish(frame)
    }

    fn publish(&self, frame: VideoFrame) -> Result<()> {
        if !PixelReader::supports(frame.format, frame.component) {
            warn!(
                "Dropping frame: {:?} components are not supported for {}",
                frame.component, frame.format
            );
            return Err(AppError::FormatMismatch {
                expected: "8-bit components".to_string(),
                actual: format!("{:?} {}", frame.component, frame.format),
            });
        }
        if frame.format.is_subsampled() && (frame.width() % 2 != 0 || frame.height() % 2 != 0) {
            warn!("Dropping {} frame with odd size {}", frame.format, frame.resolution);
            return Err(AppError::InvalidDimensions {
                format: frame.format,
                width: frame.width(),
                height: frame.height(),
            });
        }

        trace!(
            "Snapshot #{} {} {}",
            frame.sequence,
            frame.format,
            frame.resolution
        );
        self.snapshot.store(Some(Arc::new(frame)));
        Ok(())
    }

    /// Drop the current snapshot
    pub fn clear(&self) {
        self.snapshot.store(None);
    }

    /// Get the current snapshot
    pub fn current(&self) -> Option<Arc<VideoFrame>> {
        self.snapshot.load_full()
    }
}

/// Scans the latest snapshot into sample blocks
pub struct ScanConverter {
    intake: FrameIntake,
    state: ScanState,
}

impl Default for ScanConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanConverter {
    /// Create a converter in CLEAR mode at the top-left corner
    pub fn new() -> Self {
        Self::with_state(ScanState::default())
    }

    pub fn with_state(state: ScanState) -> Self {
        Self {
            intake: FrameIntake {
                snapshot: Arc::new(ArcSwapOption::empty()),
                sequence: Arc::new(AtomicU64::new(0)),
            },
            state,
        }
    }

    /// Handle for delivering frames from another thread
    pub fn intake(&self) -> FrameIntake {
        self.intake.clone()
    }

    /// Snapshot a frame (same as going through [`ScanConverter::intake`])
    pub fn deliver_frame(
        &self,
        data: &[u8],
        resolution: Resolution,
        format: PixelFormat,
        orientation: Orientation,
    ) -> Result<()> {
        self.intake.deliver_frame(data, resolution, format, orientation)
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn mode(&self) -> ScanMode {
        self.state.mode
    }

    /// Handle a text command `mode <name> [<param>]`
    ///
    /// A rejected command leaves the scan state untouched.
    pub fn command(&mut self, input: &str) -> Result<()> {
        let command = ModeCommand::parse(input).inspect_err(|e| warn!("{}", e))?;
        self.set_mode(command);
        Ok(())
    }

    pub fn set_mode(&mut self, command: ModeCommand) {
        self.state = command.apply(&self.state);
        debug!(
            "Scan mode set to {} (line {})",
            self.state.mode, self.state.line
        );
    }

    /// Produce `n` samples per channel
    pub fn produce_samples(&mut self, n: usize) -> SignalBlock {
        let mut block = SignalBlock::new(n);
        self.process(&mut block);
        block
    }

    /// Fill `block` in place, returning how many samples came from the frame
    ///
    /// Samples past that count are zero.
    pub fn process(&mut self, block: &mut SignalBlock) -> usize {
        let n = block.len();
        block.reset(n);

        let Some(frame) = self.intake.current() else {
            trace!("No frame, zero-filling {} samples", n);
            return 0;
        };
        let Some(reader) = PixelReader::new(&frame) else {
            trace!("Unreadable frame, zero-filling {} samples", n);
            return 0;
        };
        let (width, height) = (reader.width(), reader.height());
        if width == 0 || height == 0 {
            return 0;
        }

        // The frame may have shrunk since the last call
        self.state.offset_x %= width;
        self.state.offset_y %= height;

        match self.state.mode {
            ScanMode::Clear => {
                self.state.offset_x = 0;
                self.state.offset_y = 0;
                self.raster(&reader, block, n.min(width * height))
            }
            ScanMode::Fill => self.raster(&reader, block, n),
            ScanMode::Line => {
                let line = self.state.offset_y;
                self.state.offset_x = 0;
                self.state.offset_y = (line + 1) % height;
                read_line(&reader, block, line, n)
            }
            ScanMode::Waterfall => {
                let Some(line) = resolve_line(self.state.line, height) else {
                    trace!(
                        "Waterfall line {} outside {} rows, zero-filling",
                        self.state.line,
                        height
                    );
                    return 0;
                };
                self.state.offset_x = 0;
                self.state.offset_y = line;
                read_line(&reader, block, line, n)
            }
        }
    }

    /// Raster-scan `count` samples from the current position
    fn raster(&mut self, reader: &PixelReader<'_>, block: &mut SignalBlock, count: usize) -> usize {
        let (width, height) = (reader.width(), reader.height());
        let ScanState {
            mut offset_x,
            mut offset_y,
            ..
        } = self.state;

        for idx in 0..count {
            block.set(idx, reader.pixel(offset_x, offset_y));
            offset_x += 1;
            if offset_x == width {
                offset_x = 0;
                offset_y = (offset_y + 1) % height;
            }
        }

        self.state.offset_x = offset_x;
        self.state.offset_y = offset_y;
        count
    }
}

/// Read up to one row starting at column 0
fn read_line(reader: &PixelReader<'_>, block: &mut SignalBlock, line: usize, n: usize) -> usize {
    let count = n.min(reader.width());
    for x in 0..count {
        block.set(x, reader.pixel(x, line));
    }
    count
}

/// Map a possibly negative waterfall line onto `0..height`
fn resolve_line(line: i64, height: usize) -> Option<usize> {
    let height = height as i64;
    match line {
        l if (0..height).contains(&l) => Some(l as usize),
        l if (-height..0).contains(&l) => Some((height + l) as usize),
        _ => None,
    }
}
