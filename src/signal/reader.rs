//! Pixel to sample scaling
//!
//! Every pixel becomes four samples: red, green, blue and alpha for RGB
//! layouts, luma, U, V and a constant 1.0 for YUV layouts, and the
//! luminance repeated three times plus 1.0 for gray. 8-bit components are
//! divided by 255, 16-bit luminance by 65535 and signed 16-bit planar
//! samples by 32768. Float components pass through unscaled.

use crate::video::convert::layout::{RgbLayout, Yuv422Layout};
use crate::video::convert::math::unpack_565;
use crate::video::format::{ComponentType, Orientation, PixelFormat};
use crate::video::frame::VideoFrame;

const U8_MAX: f32 = 255.0;
const U16_MAX: f32 = 65535.0;
const S16_RANGE: f32 = 32768.0;

/// Samples of one pixel: red/luma, green/U, blue/V, alpha
pub type Sample = [f32; 4];

#[derive(Debug, Clone, Copy)]
enum Layout {
    Rgb {
        layout: RgbLayout,
        component: ComponentType,
    },
    Rgb565,
    Yuv422(Yuv422Layout),
    Planar {
        signed: bool,
        u_offset: usize,
        v_offset: usize,
    },
    Gray(ComponentType),
    Gray16,
}

/// Read-only sampler over one frame
pub struct PixelReader<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    orientation: Orientation,
    layout: Layout,
}

impl<'a> PixelReader<'a> {
    /// Check whether frames of this format and component type can be scanned
    pub fn supports(format: PixelFormat, component: ComponentType) -> bool {
        component == ComponentType::Unsigned8
            || format.is_rgb_family()
            || (format == PixelFormat::Gray && component != ComponentType::Unsigned8Reversed)
    }

    /// Build a reader, or `None` for a frame that cannot be scanned
    pub fn new(frame: &'a VideoFrame) -> Option<Self> {
        if !Self::supports(frame.format, frame.component) || frame.validate().is_err() {
            return None;
        }

        let layout = match frame.format {
            PixelFormat::Rgb565 => Layout::Rgb565,
            PixelFormat::I420 | PixelFormat::I420S16 => {
                let [y_size, u_size, _] = frame.format.plane_sizes(frame.resolution);
                Layout::Planar {
                    signed: frame.format == PixelFormat::I420S16,
                    u_offset: y_size,
                    v_offset: y_size + u_size,
                }
            }
            PixelFormat::Gray => Layout::Gray(frame.component),
            PixelFormat::Gray16 => Layout::Gray16,
            format => match (RgbLayout::of(format), Yuv422Layout::of(format)) {
                (Some(layout), _) => Layout::Rgb {
                    layout,
                    component: frame.component,
                },
                (None, Some(layout)) => Layout::Yuv422(layout),
                (None, None) => return None,
            },
        };

        Some(Self {
            data: frame.data(),
            width: frame.width() as usize,
            height: frame.height() as usize,
            orientation: frame.orientation,
            layout,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Samples of the pixel at column `x` of display line `line`
    ///
    /// Line 0 is the top of the image regardless of the row order in memory.
    pub fn pixel(&self, x: usize, line: usize) -> Sample {
        let row = self.orientation.memory_row(line, self.height);
        let idx = row * self.width + x;

        match self.layout {
            Layout::Rgb { layout, component } => self.rgb(idx, layout, component),
            Layout::Rgb565 => {
                let word = bytemuck::pod_read_unaligned(&self.data[idx * 2..idx * 2 + 2]);
                let [r, g, b] = unpack_565(word);
                [r as f32 / U8_MAX, g as f32 / U8_MAX, b as f32 / U8_MAX, 1.0]
            }
            Layout::Yuv422(layout) => {
                let block = &self.data[(idx / 2) * Yuv422Layout::STRIDE..][..Yuv422Layout::STRIDE];
                let (y0, y1, u, v) = layout.load(block);
                let y = if idx % 2 == 0 { y0 } else { y1 };
                [y as f32 / U8_MAX, u as f32 / U8_MAX, v as f32 / U8_MAX, 1.0]
            }
            Layout::Planar {
                signed,
                u_offset,
                v_offset,
            } => {
                let chroma = (row / 2) * (self.width / 2) + x / 2;
                if signed {
                    let read = |at: usize| -> f32 {
                        let value: i16 = bytemuck::pod_read_unaligned(&self.data[at..at + 2]);
                        value as f32 / S16_RANGE
                    };
                    [
                        read(idx * 2),
                        read(u_offset + chroma * 2),
                        read(v_offset + chroma * 2),
                        1.0,
                    ]
                } else {
                    [
                        self.data[idx] as f32 / U8_MAX,
                        self.data[u_offset + chroma] as f32 / U8_MAX,
                        self.data[v_offset + chroma] as f32 / U8_MAX,
                        1.0,
                    ]
                }
            }
            Layout::Gray(component) => {
                let g = self.component(idx * component.size(), component);
                [g, g, g, 1.0]
            }
            Layout::Gray16 => {
                let value: u16 = bytemuck::pod_read_unaligned(&self.data[idx * 2..idx * 2 + 2]);
                let g = value as f32 / U16_MAX;
                [g, g, g, 1.0]
            }
        }
    }

    fn rgb(&self, idx: usize, layout: RgbLayout, component: ComponentType) -> Sample {
        let size = component.size();
        let base = idx * layout.stride * size;
        // A word-packed pixel stores its channels back to front
        let position = |channel: usize| match component {
            ComponentType::Unsigned8Reversed => layout.stride - 1 - channel,
            _ => channel,
        };
        let read = |channel: usize| self.component(base + position(channel) * size, component);

        [
            read(layout.r),
            read(layout.g),
            read(layout.b),
            layout.a.map(read).unwrap_or(1.0),
        ]
    }

    #[inline]
    fn component(&self, at: usize, component: ComponentType) -> f32 {
        match component {
            ComponentType::Unsigned8 | ComponentType::Unsigned8Reversed => {
                self.data[at] as f32 / U8_MAX
            }
            ComponentType::Float32 => bytemuck::pod_read_unaligned::<f32>(&self.data[at..at + 4]),
            ComponentType::Float64 => {
                bytemuck::pod_read_unaligned::<f64>(&self.data[at..at + 8]) as f32
            }
        }
    }
}
