//! Video frame data structures

use bytes::Bytes;
use std::time::Instant;

use super::format::{ComponentType, Orientation, PixelFormat, Resolution};
use crate::error::{AppError, Result};

/// Pixel data of a borrowed image
#[derive(Debug, Clone, Copy)]
pub enum Planes<'a> {
    /// Single plane holding every channel
    Packed(&'a [u8]),
    /// Separate Y, U and V planes
    Planar([&'a [u8]; 3]),
}

/// Borrowed view of an image in one of the supported formats
///
/// The view is only valid for the duration of a call; nothing in the
/// conversion engine retains it.
#[derive(Debug, Clone, Copy)]
pub struct ImageRef<'a> {
    format: PixelFormat,
    resolution: Resolution,
    planes: Planes<'a>,
}

impl<'a> ImageRef<'a> {
    /// Wrap a contiguous buffer
    ///
    /// Planar formats are split into Y, U and V planes laid out back to back.
    pub fn new(format: PixelFormat, resolution: Resolution, data: &'a [u8]) -> Result<Self> {
        let needed = format.frame_size(resolution);
        if data.len() < needed {
            return Err(AppError::BufferTooSmall {
                what: "Input",
                needed,
                actual: data.len(),
            });
        }

        let planes = if format.is_planar() {
            let [y_size, u_size, v_size] = format.plane_sizes(resolution);
            let (y, rest) = data.split_at(y_size);
            let (u, rest) = rest.split_at(u_size);
            Planes::Planar([y, u, &rest[..v_size]])
        } else {
            Planes::Packed(&data[..needed])
        };

        Ok(Self {
            format,
            resolution,
            planes,
        })
    }

    /// Wrap three separately allocated planes
    pub fn planar(
        format: PixelFormat,
        resolution: Resolution,
        y: &'a [u8],
        u: &'a [u8],
        v: &'a [u8],
    ) -> Result<Self> {
        if !format.is_planar() {
            return Err(AppError::FormatMismatch {
                expected: "planar format".to_string(),
                actual: format.to_string(),
            });
        }
        let sizes = format.plane_sizes(resolution);
        for (plane, needed) in [y, u, v].iter().zip(sizes) {
            if plane.len() < needed {
                return Err(AppError::BufferTooSmall {
                    what: "Plane",
                    needed,
                    actual: plane.len(),
                });
            }
        }
        let [y_size, u_size, v_size] = sizes;
        Ok(Self {
            format,
            resolution,
            planes: Planes::Planar([&y[..y_size], &u[..u_size], &v[..v_size]]),
        })
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn planes(&self) -> Planes<'a> {
        self.planes
    }

    /// Get the single plane of a packed image
    pub fn packed(&self) -> Option<&'a [u8]> {
        match self.planes {
            Planes::Packed(data) => Some(data),
            Planes::Planar(_) => None,
        }
    }

    /// Get Y, U and V planes of a planar image
    pub fn yuv_planes(&self) -> Option<[&'a [u8]; 3]> {
        match self.planes {
            Planes::Packed(_) => None,
            Planes::Planar(planes) => Some(planes),
        }
    }
}

/// An owned video frame with metadata
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Raw frame data (planar formats are stored Y, U, V back to back)
    data: Bytes,
    /// Frame resolution
    pub resolution: Resolution,
    /// Pixel format
    pub format: PixelFormat,
    /// Numeric type of each channel component
    pub component: ComponentType,
    /// Row order in memory
    pub orientation: Orientation,
    /// Frame sequence number
    pub sequence: u64,
    /// Timestamp when frame was produced
    pub capture_ts: Instant,
}

impl VideoFrame {
    /// Create a new video frame with 8-bit components
    pub fn new(
        data: Bytes,
        resolution: Resolution,
        format: PixelFormat,
        orientation: Orientation,
        sequence: u64,
    ) -> Self {
        Self {
            data,
            resolution,
            format,
            component: ComponentType::Unsigned8,
            orientation,
            sequence,
            capture_ts: Instant::now(),
        }
    }

    /// Create a frame from a Vec<u8>
    pub fn from_vec(
        data: Vec<u8>,
        resolution: Resolution,
        format: PixelFormat,
        orientation: Orientation,
        sequence: u64,
    ) -> Self {
        Self::new(Bytes::from(data), resolution, format, orientation, sequence)
    }

    /// Set the component type
    pub fn with_component(mut self, component: ComponentType) -> Self {
        self.component = component;
        self
    }

    /// Get frame data as bytes slice
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get frame data as Bytes (cheap clone)
    pub fn data_bytes(&self) -> Bytes {
        self.data.clone()
    }

    /// Get data length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if frame is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get width
    pub fn width(&self) -> u32 {
        self.resolution.width
    }

    /// Get height
    pub fn height(&self) -> u32 {
        self.resolution.height
    }

    /// Get age of this frame (time since capture)
    pub fn age(&self) -> std::time::Duration {
        self.capture_ts.elapsed()
    }

    /// Number of bytes this frame's metadata calls for
    pub fn expected_len(&self) -> usize {
        let wide = self.component.is_float()
            && (self.format.is_rgb_family() || self.format == PixelFormat::Gray);
        if wide {
            self.resolution.pixels() as usize * self.format.channels() * self.component.size()
        } else {
            self.format.frame_size(self.resolution)
        }
    }

    /// Check that the data covers the declared format and resolution
    pub fn validate(&self) -> Result<()> {
        let needed = self.expected_len();
        if self.data.len() < needed {
            return Err(AppError::BufferTooSmall {
                what: "Frame",
                needed,
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    /// Borrow as an image for the conversion engine
    pub fn image(&self) -> Result<ImageRef<'_>> {
        if self.component != ComponentType::Unsigned8 {
            return Err(AppError::FormatMismatch {
                expected: "8-bit components".to_string(),
                actual: format!("{:?}", self.component),
            });
        }
        ImageRef::new(self.format, self.resolution, &self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_ref_splits_planes() {
        let res = Resolution::new(4, 2);
        let data: Vec<u8> = (0..12).collect();
        let image = ImageRef::new(PixelFormat::I420, res, &data).unwrap();
        let [y, u, v] = image.yuv_planes().unwrap();
        assert_eq!(y, &data[..8]);
        assert_eq!(u, &data[8..10]);
        assert_eq!(v, &data[10..12]);
        assert!(image.packed().is_none());
    }

    #[test]
    fn test_image_ref_rejects_short_buffer() {
        let res = Resolution::new(4, 2);
        let data = vec![0u8; 23];
        let err = ImageRef::new(PixelFormat::Rgb, res, &data).unwrap_err();
        assert!(matches!(
            err,
            AppError::BufferTooSmall {
                needed: 24,
                actual: 23,
                ..
            }
        ));
    }

    #[test]
    fn test_planar_requires_planar_format() {
        let res = Resolution::new(2, 2);
        let plane = [0u8; 4];
        assert!(ImageRef::planar(PixelFormat::Rgb, res, &plane, &plane, &plane).is_err());
        assert!(ImageRef::planar(PixelFormat::I420, res, &plane, &plane[..1], &plane[..1]).is_ok());
    }

    #[test]
    fn test_float_frame_expected_len() {
        let frame = VideoFrame::from_vec(
            vec![0; 2 * 2 * 4 * 4],
            Resolution::new(2, 2),
            PixelFormat::Rgba,
            Orientation::TopDown,
            0,
        )
        .with_component(ComponentType::Float32);
        assert_eq!(frame.expected_len(), 64);
        assert!(frame.validate().is_ok());
        assert!(frame.image().is_err());
    }
}
