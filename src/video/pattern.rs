//! Synthetic frame producer
//!
//! Renders RGBA and converts it to the requested format through the
//! conversion engine, so the frames exercise the same kernels real input
//! would.

use bytes::Bytes;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::convert::PixelConverter;
use super::format::{Orientation, PixelFormat, Resolution};
use super::frame::VideoFrame;
use crate::error::{AppError, Result};
use crate::signal::pipeline::FrameSource;

/// Color bars, left to right
const BARS: [[u8; 3]; 8] = [
    [255, 255, 255],
    [255, 255, 0],
    [0, 255, 255],
    [0, 255, 0],
    [255, 0, 255],
    [255, 0, 0],
    [0, 0, 255],
    [0, 0, 0],
];

/// Checker square size in pixels
const CHECKER_SIZE: usize = 8;

/// Test pattern kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    /// Eight vertical color bars
    #[default]
    Bars,
    /// Red across, green down, blue cycling over time
    Gradient,
    /// Black and white squares scrolling right
    Checker,
    /// Uniform random noise
    Noise,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PatternKind::Bars => "bars",
            PatternKind::Gradient => "gradient",
            PatternKind::Checker => "checker",
            PatternKind::Noise => "noise",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for PatternKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bars" => Ok(PatternKind::Bars),
            "gradient" => Ok(PatternKind::Gradient),
            "checker" => Ok(PatternKind::Checker),
            "noise" => Ok(PatternKind::Noise),
            _ => Err(format!("Unknown pattern: {}", s)),
        }
    }
}

/// Frame generator for one pattern, format and resolution
pub struct TestPattern {
    kind: PatternKind,
    resolution: Resolution,
    format: PixelFormat,
    orientation: Orientation,
    sequence: u64,
    rgba: Vec<u8>,
    /// None when the target format is RGBA itself
    converter: Option<PixelConverter>,
    rng: StdRng,
}

impl TestPattern {
    /// Create a generator; fails when RGBA cannot be converted to `format`
    pub fn new(
        kind: PatternKind,
        resolution: Resolution,
        format: PixelFormat,
        orientation: Orientation,
    ) -> Result<Self> {
        let converter = if format == PixelFormat::Rgba {
            None
        } else {
            Some(PixelConverter::new(PixelFormat::Rgba, format, resolution)?)
        };

        debug!(
            "Created {} test pattern {} {} ({:?})",
            kind, format, resolution, orientation
        );

        Ok(Self {
            kind,
            resolution,
            format,
            orientation,
            sequence: 0,
            rgba: vec![0; PixelFormat::Rgba.frame_size(resolution)],
            converter,
            rng: StdRng::from_entropy(),
        })
    }

    /// Use a fixed noise seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Render the next frame
    pub fn render(&mut self) -> Result<VideoFrame> {
        self.paint();

        let data = match self.converter.as_mut() {
            Some(converter) => Bytes::copy_from_slice(converter.convert(&self.rgba)?),
            None => Bytes::copy_from_slice(&self.rgba),
        };

        let frame = VideoFrame::new(
            data,
            self.resolution,
            self.format,
            self.orientation,
            self.sequence,
        );
        self.sequence += 1;
        Ok(frame)
    }

    fn paint(&mut self) {
        let width = self.resolution.width as usize;
        let height = self.resolution.height as usize;
        let phase = self.sequence as usize;

        for y in 0..height {
            // Painted top-down, stored in the frame's own row order
            let row = self.orientation.memory_row(y, height);
            for x in 0..width {
                let rgb = match self.kind {
                    PatternKind::Bars => BARS[x * BARS.len() / width],
                    PatternKind::Gradient => [
                        ramp(x, width),
                        ramp(y, height),
                        (phase * 4 % 256) as u8,
                    ],
                    PatternKind::Checker => {
                        let on = ((x + phase) / CHECKER_SIZE + y / CHECKER_SIZE) % 2 == 0;
                        if on {
                            [255; 3]
                        } else {
                            [0; 3]
                        }
                    }
                    PatternKind::Noise => self.rng.gen(),
                };
                let at = (row * width + x) * 4;
                self.rgba[at..at + 3].copy_from_slice(&rgb);
                self.rgba[at + 3] = 255;
            }
        }
    }
}

impl FrameSource for TestPattern {
    fn next_frame(&mut self) -> Result<VideoFrame> {
        self.render()
    }
}

/// Position mapped onto 0..=255
fn ramp(pos: usize, len: usize) -> u8 {
    if len <= 1 {
        0
    } else {
        (pos * 255 / (len - 1)) as u8
    }
}

impl TryFrom<&crate::config::VideoConfig> for TestPattern {
    type Error = AppError;

    fn try_from(config: &crate::config::VideoConfig) -> Result<Self> {
        Self::new(
            config.pattern,
            Resolution::new(config.width, config.height),
            config.format,
            config.orientation,
        )
    }
}
