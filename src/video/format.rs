//! Pixel format definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported pixel formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PixelFormat {
    /// Packed R, G, B (3 bytes per pixel)
    Rgb,
    /// Packed B, G, R (3 bytes per pixel)
    Bgr,
    /// Packed R, G, B, A (4 bytes per pixel)
    Rgba,
    /// Packed B, G, R, A (4 bytes per pixel)
    Bgra,
    /// Packed A, R, G, B (4 bytes per pixel)
    Argb,
    /// Packed A, B, G, R (4 bytes per pixel)
    Abgr,
    /// 5-6-5 bit-packed RGB in one native-endian u16 per pixel
    Rgb565,
    /// YUV 4:2:2 packed as U Y0 V Y1
    Uyvy,
    /// YUV 4:2:2 packed as V Y0 U Y1
    Vyuy,
    /// YUV 4:2:2 packed as Y0 U Y1 V
    Yuyv,
    /// YUV 4:2:2 packed as Y0 V Y1 U
    Yvyu,
    /// YUV 4:2:0 planar, 8-bit samples
    I420,
    /// YUV 4:2:0 planar, signed 16-bit samples
    I420S16,
    /// 8-bit luminance
    Gray,
    /// 16-bit luminance (native-endian)
    Gray16,
}

impl PixelFormat {
    /// Check if format is one of the packed 8-bit RGB layouts
    pub fn is_rgb_family(&self) -> bool {
        matches!(
            self,
            PixelFormat::Rgb
                | PixelFormat::Bgr
                | PixelFormat::Rgba
                | PixelFormat::Bgra
                | PixelFormat::Argb
                | PixelFormat::Abgr
        )
    }

    /// Check if format is packed YUV 4:2:2
    pub fn is_packed_yuv(&self) -> bool {
        matches!(
            self,
            PixelFormat::Uyvy | PixelFormat::Vyuy | PixelFormat::Yuyv | PixelFormat::Yvyu
        )
    }

    /// Check if format stores Y, U and V in separate planes
    pub fn is_planar(&self) -> bool {
        matches!(self, PixelFormat::I420 | PixelFormat::I420S16)
    }

    /// Check if format is single-channel luminance
    pub fn is_gray(&self) -> bool {
        matches!(self, PixelFormat::Gray | PixelFormat::Gray16)
    }

    /// Check if chroma is subsampled (requires even dimensions)
    pub fn is_subsampled(&self) -> bool {
        self.is_packed_yuv() || self.is_planar()
    }

    /// Number of semantic channels per pixel
    pub fn channels(&self) -> usize {
        match self {
            PixelFormat::Rgba | PixelFormat::Bgra | PixelFormat::Argb | PixelFormat::Abgr => 4,
            PixelFormat::Gray | PixelFormat::Gray16 => 1,
            _ => 3,
        }
    }

    /// Bytes per luma sample of a planar format
    pub fn sample_size(&self) -> usize {
        match self {
            PixelFormat::I420S16 | PixelFormat::Gray16 | PixelFormat::Rgb565 => 2,
            _ => 1,
        }
    }

    /// Get bytes per pixel for packed formats
    /// Returns None for planar formats
    pub fn bytes_per_pixel(&self) -> Option<usize> {
        match self {
            PixelFormat::Rgb | PixelFormat::Bgr => Some(3),
            PixelFormat::Rgba | PixelFormat::Bgra | PixelFormat::Argb | PixelFormat::Abgr => {
                Some(4)
            }
            PixelFormat::Rgb565 => Some(2),
            PixelFormat::Uyvy | PixelFormat::Vyuy | PixelFormat::Yuyv | PixelFormat::Yvyu => {
                Some(2)
            }
            PixelFormat::I420 | PixelFormat::I420S16 => None,
            PixelFormat::Gray => Some(1),
            PixelFormat::Gray16 => Some(2),
        }
    }

    /// Byte sizes of the Y, U and V planes for a planar format
    ///
    /// Packed formats report their whole frame as the first plane.
    pub fn plane_sizes(&self, resolution: Resolution) -> [usize; 3] {
        let pixels = resolution.pixels() as usize;
        if self.is_planar() {
            let chroma = resolution.chroma().pixels() as usize;
            let sample = self.sample_size();
            [pixels * sample, chroma * sample, chroma * sample]
        } else {
            [pixels * self.bytes_per_pixel().unwrap_or(1), 0, 0]
        }
    }

    /// Calculate expected frame size for a given resolution
    pub fn frame_size(&self, resolution: Resolution) -> usize {
        self.plane_sizes(resolution).iter().sum()
    }

    /// Get all supported formats
    pub fn all() -> &'static [PixelFormat] {
        &[
            PixelFormat::Rgb,
            PixelFormat::Bgr,
            PixelFormat::Rgba,
            PixelFormat::Bgra,
            PixelFormat::Argb,
            PixelFormat::Abgr,
            PixelFormat::Rgb565,
            PixelFormat::Uyvy,
            PixelFormat::Vyuy,
            PixelFormat::Yuyv,
            PixelFormat::Yvyu,
            PixelFormat::I420,
            PixelFormat::I420S16,
            PixelFormat::Gray,
            PixelFormat::Gray16,
        ]
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelFormat::Rgb => "RGB",
            PixelFormat::Bgr => "BGR",
            PixelFormat::Rgba => "RGBA",
            PixelFormat::Bgra => "BGRA",
            PixelFormat::Argb => "ARGB",
            PixelFormat::Abgr => "ABGR",
            PixelFormat::Rgb565 => "RGB565",
            PixelFormat::Uyvy => "UYVY",
            PixelFormat::Vyuy => "VYUY",
            PixelFormat::Yuyv => "YUYV",
            PixelFormat::Yvyu => "YVYU",
            PixelFormat::I420 => "I420",
            PixelFormat::I420S16 => "I420S16",
            PixelFormat::Gray => "GRAY",
            PixelFormat::Gray16 => "GRAY16",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for PixelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "RGB" | "RGB24" => Ok(PixelFormat::Rgb),
            "BGR" | "BGR24" => Ok(PixelFormat::Bgr),
            "RGBA" => Ok(PixelFormat::Rgba),
            "BGRA" => Ok(PixelFormat::Bgra),
            "ARGB" => Ok(PixelFormat::Argb),
            "ABGR" => Ok(PixelFormat::Abgr),
            "RGB565" | "RGB16" => Ok(PixelFormat::Rgb565),
            "UYVY" => Ok(PixelFormat::Uyvy),
            "VYUY" => Ok(PixelFormat::Vyuy),
            "YUYV" | "YUY2" => Ok(PixelFormat::Yuyv),
            "YVYU" => Ok(PixelFormat::Yvyu),
            "I420" | "YU12" | "YUV420" => Ok(PixelFormat::I420),
            "I420S16" => Ok(PixelFormat::I420S16),
            "GRAY" | "GREY" | "Y8" => Ok(PixelFormat::Gray),
            "GRAY16" | "GREY16" | "Y16" => Ok(PixelFormat::Gray16),
            _ => Err(format!("Unknown pixel format: {}", s)),
        }
    }
}

/// Resolution (width x height)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Get total pixels
    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Check for a zero-area frame
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Size of a 4:2:0 chroma plane
    pub fn chroma(&self) -> Resolution {
        Resolution::new(self.width / 2, self.height / 2)
    }

    /// Common resolutions
    pub const VGA: Resolution = Resolution {
        width: 640,
        height: 480,
    };
    pub const HD720: Resolution = Resolution {
        width: 1280,
        height: 720,
    };
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<(u32, u32)> for Resolution {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Order of rows in memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// First row in memory is the top of the image
    #[default]
    TopDown,
    /// First row in memory is the bottom of the image
    BottomUp,
}

impl Orientation {
    /// Memory row holding the `line`-th visual row (counted from the top)
    pub fn memory_row(&self, line: usize, height: usize) -> usize {
        match self {
            Orientation::TopDown => line,
            Orientation::BottomUp => height - 1 - line,
        }
    }
}

/// Numeric type of each channel component
///
/// Only the packed RGB layouts and 8-bit gray may carry float components;
/// every other format implies its own sample type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    /// One unsigned byte per channel
    #[default]
    Unsigned8,
    /// One unsigned byte per channel, packed as a single word so that the
    /// in-memory channel order is reversed
    Unsigned8Reversed,
    /// One native-endian f32 per channel
    Float32,
    /// One native-endian f64 per channel
    Float64,
}

impl ComponentType {
    /// Size of one channel component in bytes
    pub fn size(&self) -> usize {
        match self {
            ComponentType::Unsigned8 | ComponentType::Unsigned8Reversed => 1,
            ComponentType::Float32 => 4,
            ComponentType::Float64 => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ComponentType::Float32 | ComponentType::Float64)
    }
}
