//! Per-pixel readers over source images
//!
//! Kernels are generic over these so that one loop serves every source
//! layout of a family.

use super::layout::RgbLayout;
use super::math::{
    clamp_u8, luma_term, unpack_565, ChromaTerms, S16_CHROMA_SHIFT, S16_LUMA_SHIFT, UV_OFFSET,
    YUV_TO_RGB,
};

/// Read a native-endian u16 sample (the buffer may be unaligned)
#[inline]
pub fn read_u16(data: &[u8], idx: usize) -> u16 {
    bytemuck::pod_read_unaligned(&data[idx * 2..idx * 2 + 2])
}

/// Read a native-endian i16 sample (the buffer may be unaligned)
#[inline]
pub fn read_i16(data: &[u8], idx: usize) -> i16 {
    bytemuck::pod_read_unaligned(&data[idx * 2..idx * 2 + 2])
}

/// Anything that yields an 8-bit RGB triple per pixel
pub trait RgbSource {
    fn pixel(&self, idx: usize) -> [u8; 3];
}

/// Packed 8-bit RGB family
pub struct PackedRgb<'a> {
    pub data: &'a [u8],
    pub layout: RgbLayout,
}

impl RgbSource for PackedRgb<'_> {
    #[inline]
    fn pixel(&self, idx: usize) -> [u8; 3] {
        let stride = self.layout.stride;
        self.layout.load(&self.data[idx * stride..idx * stride + stride])
    }
}

/// 5-6-5 packed RGB
pub struct Rgb565<'a> {
    pub data: &'a [u8],
}

impl RgbSource for Rgb565<'_> {
    #[inline]
    fn pixel(&self, idx: usize) -> [u8; 3] {
        unpack_565(read_u16(self.data, idx))
    }
}

/// Bit depth of a luminance image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrayDepth {
    Eight,
    Sixteen,
}

/// Luminance image, reduced to 8 bits by dropping the low byte
pub struct GraySource<'a> {
    pub data: &'a [u8],
    pub depth: GrayDepth,
}

impl GraySource<'_> {
    #[inline]
    pub fn value(&self, idx: usize) -> u8 {
        match self.depth {
            GrayDepth::Eight => self.data[idx],
            GrayDepth::Sixteen => (read_u16(self.data, idx) >> 8) as u8,
        }
    }
}

impl RgbSource for GraySource<'_> {
    #[inline]
    fn pixel(&self, idx: usize) -> [u8; 3] {
        let value = self.value(idx);
        [value, value, value]
    }
}

/// Sample depth of a planar 4:2:0 image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanarDepth {
    /// Unsigned 8-bit samples with the usual 16/128 offsets
    Unsigned8,
    /// Signed 16-bit samples; luma is shifted by 7 and chroma by 8,
    /// both already centered on zero
    Signed16,
}

/// Y, U and V planes of a 4:2:0 image
///
/// Luma indices run over the full frame, chroma indices over the
/// half-width, half-height chroma planes.
pub struct PlanarSource<'a> {
    pub y: &'a [u8],
    pub u: &'a [u8],
    pub v: &'a [u8],
    pub depth: PlanarDepth,
}

impl PlanarSource<'_> {
    /// Scaled luma contribution for the inverse transform
    #[inline]
    pub fn luma_term(&self, idx: usize) -> i32 {
        match self.depth {
            PlanarDepth::Unsigned8 => luma_term(self.y[idx]),
            PlanarDepth::Signed16 => {
                YUV_TO_RGB[0][0] * ((read_i16(self.y, idx) as i32) >> S16_LUMA_SHIFT)
            }
        }
    }

    /// 8-bit offset luma
    #[inline]
    pub fn luma(&self, idx: usize) -> u8 {
        match self.depth {
            PlanarDepth::Unsigned8 => self.y[idx],
            PlanarDepth::Signed16 => clamp_u8((read_i16(self.y, idx) as i32) >> S16_LUMA_SHIFT),
        }
    }

    /// Chroma correction of one chroma sample
    #[inline]
    pub fn chroma_terms(&self, idx: usize) -> ChromaTerms {
        match self.depth {
            PlanarDepth::Unsigned8 => ChromaTerms::from_u8(self.u[idx], self.v[idx]),
            PlanarDepth::Signed16 => {
                let (u, v) = self.centered_s16(idx);
                ChromaTerms::new(u, v)
            }
        }
    }

    /// 8-bit offset chroma as (U, V)
    #[inline]
    pub fn chroma(&self, idx: usize) -> (u8, u8) {
        match self.depth {
            PlanarDepth::Unsigned8 => (self.u[idx], self.v[idx]),
            PlanarDepth::Signed16 => {
                let (u, v) = self.centered_s16(idx);
                (clamp_u8(u + UV_OFFSET), clamp_u8(v + UV_OFFSET))
            }
        }
    }

    #[inline]
    fn centered_s16(&self, idx: usize) -> (i32, i32) {
        (
            (read_i16(self.u, idx) as i32) >> S16_CHROMA_SHIFT,
            (read_i16(self.v, idx) as i32) >> S16_CHROMA_SHIFT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_unaligned_samples() {
        let mut data = vec![0u8];
        data.extend_from_slice(&0x1234u16.to_ne_bytes());
        data.extend_from_slice(&(-2i16).to_ne_bytes());
        // Offset by one byte so the samples are misaligned
        assert_eq!(read_u16(&data[1..], 0), 0x1234);
        assert_eq!(read_i16(&data[1..], 1), -2);
    }

    #[test]
    fn test_gray16_drops_low_byte() {
        let data: Vec<u8> = [0xABCDu16, 0x00FF]
            .iter()
            .flat_map(|v| v.to_ne_bytes())
            .collect();
        let source = GraySource {
            data: &data,
            depth: GrayDepth::Sixteen,
        };
        assert_eq!(source.value(0), 0xAB);
        assert_eq!(source.pixel(1), [0, 0, 0]);
    }

    #[test]
    fn test_signed16_planar_shifts() {
        let y: Vec<u8> = (16i16 << 7).to_ne_bytes().to_vec();
        let u: Vec<u8> = (-(10i16 << 8)).to_ne_bytes().to_vec();
        let v: Vec<u8> = (20i16 << 8).to_ne_bytes().to_vec();
        let source = PlanarSource {
            y: &y,
            u: &u,
            v: &v,
            depth: PlanarDepth::Signed16,
        };
        assert_eq!(source.luma(0), 16);
        assert_eq!(source.luma_term(0), 298 * 16);
        assert_eq!(source.chroma(0), (118, 148));
        assert_eq!(source.chroma_terms(0), ChromaTerms::new(-10, 20));
    }
}
