//! Channel positions of the packed layouts
//!
//! Conversions are driven by these index tables instead of one function
//! per format pair.

use crate::video::format::PixelFormat;

use super::math::ALPHA_OPAQUE;

/// Byte offsets of R, G, B (and optionally A) inside one packed RGB pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RgbLayout {
    pub stride: usize,
    pub r: usize,
    pub g: usize,
    pub b: usize,
    pub a: Option<usize>,
}

impl RgbLayout {
    pub const RGB: RgbLayout = RgbLayout::three(0, 1, 2);
    pub const BGR: RgbLayout = RgbLayout::three(2, 1, 0);
    pub const RGBA: RgbLayout = RgbLayout::four(0, 1, 2, 3);
    pub const BGRA: RgbLayout = RgbLayout::four(2, 1, 0, 3);
    pub const ARGB: RgbLayout = RgbLayout::four(1, 2, 3, 0);
    pub const ABGR: RgbLayout = RgbLayout::four(3, 2, 1, 0);

    const fn three(r: usize, g: usize, b: usize) -> Self {
        Self {
            stride: 3,
            r,
            g,
            b,
            a: None,
        }
    }

    const fn four(r: usize, g: usize, b: usize, a: usize) -> Self {
        Self {
            stride: 4,
            r,
            g,
            b,
            a: Some(a),
        }
    }

    /// Layout for an RGB-family format
    pub fn of(format: PixelFormat) -> Option<Self> {
        match format {
            PixelFormat::Rgb => Some(Self::RGB),
            PixelFormat::Bgr => Some(Self::BGR),
            PixelFormat::Rgba => Some(Self::RGBA),
            PixelFormat::Bgra => Some(Self::BGRA),
            PixelFormat::Argb => Some(Self::ARGB),
            PixelFormat::Abgr => Some(Self::ABGR),
            _ => None,
        }
    }

    /// Read R, G, B from one pixel
    #[inline]
    pub fn load(&self, pixel: &[u8]) -> [u8; 3] {
        [pixel[self.r], pixel[self.g], pixel[self.b]]
    }

    /// Write R, G, B into one pixel, synthesizing opaque alpha
    #[inline]
    pub fn store(&self, pixel: &mut [u8], [r, g, b]: [u8; 3]) {
        pixel[self.r] = r;
        pixel[self.g] = g;
        pixel[self.b] = b;
        if let Some(a) = self.a {
            pixel[a] = ALPHA_OPAQUE;
        }
    }
}

/// Byte offsets of U, Y0, V, Y1 inside one 4-byte 4:2:2 macropixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Yuv422Layout {
    pub u: usize,
    pub y0: usize,
    pub v: usize,
    pub y1: usize,
}

impl Yuv422Layout {
    pub const UYVY: Yuv422Layout = Yuv422Layout::new(0, 1, 2, 3);
    pub const VYUY: Yuv422Layout = Yuv422Layout::new(2, 1, 0, 3);
    pub const YUYV: Yuv422Layout = Yuv422Layout::new(1, 0, 3, 2);
    pub const YVYU: Yuv422Layout = Yuv422Layout::new(3, 0, 1, 2);

    /// Bytes per macropixel (two pixels)
    pub const STRIDE: usize = 4;

    const fn new(u: usize, y0: usize, v: usize, y1: usize) -> Self {
        Self { u, y0, v, y1 }
    }

    /// Layout for a packed YUV format
    pub fn of(format: PixelFormat) -> Option<Self> {
        match format {
            PixelFormat::Uyvy => Some(Self::UYVY),
            PixelFormat::Vyuy => Some(Self::VYUY),
            PixelFormat::Yuyv => Some(Self::YUYV),
            PixelFormat::Yvyu => Some(Self::YVYU),
            _ => None,
        }
    }

    /// Read (Y0, Y1, U, V) from one macropixel
    #[inline]
    pub fn load(&self, block: &[u8]) -> (u8, u8, u8, u8) {
        (block[self.y0], block[self.y1], block[self.u], block[self.v])
    }

    /// Write one macropixel
    #[inline]
    pub fn store(&self, block: &mut [u8], y0: u8, y1: u8, u: u8, v: u8) {
        block[self.y0] = y0;
        block[self.y1] = y1;
        block[self.u] = u;
        block[self.v] = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_layouts_are_permutations() {
        for format in PixelFormat::all().iter().filter(|f| f.is_rgb_family()) {
            let layout = RgbLayout::of(*format).unwrap();
            let mut seen = vec![false; layout.stride];
            for idx in [layout.r, layout.g, layout.b]
                .into_iter()
                .chain(layout.a)
            {
                assert!(!seen[idx], "{} reuses offset {}", format, idx);
                seen[idx] = true;
            }
            assert!(seen.iter().all(|s| *s));
            assert_eq!(Some(layout.stride), format.bytes_per_pixel());
        }
    }

    #[test]
    fn test_store_sets_alpha() {
        let mut pixel = [0u8; 4];
        RgbLayout::ARGB.store(&mut pixel, [1, 2, 3]);
        assert_eq!(pixel, [255, 1, 2, 3]);
    }

    #[test]
    fn test_yuv422_layout_roundtrip() {
        let mut block = [0u8; 4];
        Yuv422Layout::YVYU.store(&mut block, 10, 20, 30, 40);
        assert_eq!(block, [10, 40, 20, 30]);
        assert_eq!(Yuv422Layout::YVYU.load(&block), (10, 20, 30, 40));
    }
}
