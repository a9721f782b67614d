//! Fixed-point colorspace arithmetic
//!
//! Every coefficient is scaled by 256 and every matrix product is shifted
//! right by 8 (arithmetic shift, so negative products round toward minus
//! infinity). The forward transform never clamps: with these coefficients
//! and offsets its results always land in `16..=240`. The inverse transform
//! always clamps to `0..=255`, since e.g. Y=235, V=240 overshoots red.

/// Offset added to luma after the forward transform
pub const Y_OFFSET: i32 = 16;
/// Offset added to both chroma components after the forward transform
pub const UV_OFFSET: i32 = 128;
/// Synthesized alpha for 4-channel outputs
pub const ALPHA_OPAQUE: u8 = 255;

/// Luma weights for grayscale extraction (R, G, B); they sum to 256
pub const GRAY_WEIGHTS: [i32; 3] = [77, 150, 29];

/// RGB → YUV matrix, rows are Y, U, V
pub const RGB_TO_YUV: [[i32; 3]; 3] = [[66, 129, 25], [-38, -74, 112], [112, -94, -18]];

/// YUV → RGB matrix, rows are R, G, B; columns multiply (Y - 16), (U - 128), (V - 128)
pub const YUV_TO_RGB: [[i32; 3]; 3] = [[298, 0, 409], [298, -100, -208], [298, 516, 0]];

/// Right shift turning a signed 16-bit planar luma sample into the 8-bit-offset domain
pub const S16_LUMA_SHIFT: u32 = 7;
/// Right shift turning a signed 16-bit planar chroma sample into a centered 8-bit value
pub const S16_CHROMA_SHIFT: u32 = 8;

/// Clamp a reconstructed value into the 8-bit range
#[inline]
pub fn clamp_u8(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

/// Grayscale value of an RGB triple (truncating, no rounding)
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as i32 * GRAY_WEIGHTS[0] + g as i32 * GRAY_WEIGHTS[1] + b as i32 * GRAY_WEIGHTS[2]) >> 8)
        as u8
}

#[inline]
fn dot(row: &[i32; 3], r: i32, g: i32, b: i32) -> i32 {
    (row[0] * r + row[1] * g + row[2] * b) >> 8
}

/// Forward-transform luma
#[inline]
pub fn rgb_to_y(r: u8, g: u8, b: u8) -> u8 {
    (dot(&RGB_TO_YUV[0], r as i32, g as i32, b as i32) + Y_OFFSET) as u8
}

/// Forward-transform chroma as (U, V)
#[inline]
pub fn rgb_to_uv(r: u8, g: u8, b: u8) -> (u8, u8) {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let u = dot(&RGB_TO_YUV[1], r, g, b) + UV_OFFSET;
    let v = dot(&RGB_TO_YUV[2], r, g, b) + UV_OFFSET;
    (u as u8, v as u8)
}

/// Chroma correction shared by every luma sample of a chroma block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChromaTerms {
    r: i32,
    g: i32,
    b: i32,
}

impl ChromaTerms {
    /// Build from centered chroma (U - 128, V - 128)
    #[inline]
    pub fn new(u: i32, v: i32) -> Self {
        Self {
            r: YUV_TO_RGB[0][1] * u + YUV_TO_RGB[0][2] * v,
            g: YUV_TO_RGB[1][1] * u + YUV_TO_RGB[1][2] * v,
            b: YUV_TO_RGB[2][1] * u + YUV_TO_RGB[2][2] * v,
        }
    }

    /// Build from 8-bit offset chroma
    #[inline]
    pub fn from_u8(u: u8, v: u8) -> Self {
        Self::new(u as i32 - UV_OFFSET, v as i32 - UV_OFFSET)
    }

    /// Reconstruct RGB from a scaled luma term (see [`luma_term`])
    #[inline]
    pub fn apply(&self, y_term: i32) -> [u8; 3] {
        [
            clamp_u8((y_term + self.r) >> 8),
            clamp_u8((y_term + self.g) >> 8),
            clamp_u8((y_term + self.b) >> 8),
        ]
    }
}

/// Scaled luma contribution of an 8-bit offset luma sample
#[inline]
pub fn luma_term(y: u8) -> i32 {
    YUV_TO_RGB[0][0] * (y as i32 - Y_OFFSET)
}

/// Unpack a 5-6-5 word into 8-bit R, G, B; the low bits stay zero
#[inline]
pub fn unpack_565(word: u16) -> [u8; 3] {
    [
        ((word >> 8) & 0xF8) as u8,
        ((word >> 3) & 0xFC) as u8,
        ((word << 3) & 0xF8) as u8,
    ]
}
