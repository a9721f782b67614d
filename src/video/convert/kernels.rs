//! Conversion kernels
//!
//! Each kernel assumes the caller already checked buffer sizes against the
//! format and resolution; none of them can fail.

use super::layout::{RgbLayout, Yuv422Layout};
use super::math::{luma, luma_term, rgb_to_uv, rgb_to_y, ChromaTerms, UV_OFFSET};
use super::source::{GraySource, PlanarSource, RgbSource};

const NEUTRAL_CHROMA: u8 = UV_OFFSET as u8;

/// Split an I420 destination into Y, U and V planes
fn split_i420(dst: &mut [u8], width: usize, height: usize) -> (&mut [u8], &mut [u8], &mut [u8]) {
    let y_size = width * height;
    let uv_size = (width / 2) * (height / 2);
    let (y_plane, uv_planes) = dst.split_at_mut(y_size);
    let (u_plane, rest) = uv_planes.split_at_mut(uv_size);
    (y_plane, u_plane, &mut rest[..uv_size])
}

#[inline]
fn average(pixels: &[[u8; 3]]) -> [u8; 3] {
    let mut sum = [0u32; 3];
    for pixel in pixels {
        for (acc, c) in sum.iter_mut().zip(pixel) {
            *acc += *c as u32;
        }
    }
    let n = pixels.len() as u32;
    [(sum[0] / n) as u8, (sum[1] / n) as u8, (sum[2] / n) as u8]
}

// ============================================================================
// RGB-valued sources
// ============================================================================

/// Write every pixel into a packed RGB layout (alpha synthesized as opaque)
pub fn rgb_to_rgb(src: &impl RgbSource, dst: &mut [u8], layout: RgbLayout, pixels: usize) {
    for (idx, out) in dst.chunks_exact_mut(layout.stride).take(pixels).enumerate() {
        layout.store(out, src.pixel(idx));
    }
}

/// Grayscale extraction with the fixed luma weights
pub fn rgb_to_gray(src: &impl RgbSource, dst: &mut [u8], pixels: usize) {
    for (idx, out) in dst.iter_mut().take(pixels).enumerate() {
        let [r, g, b] = src.pixel(idx);
        *out = luma(r, g, b);
    }
}

/// Forward transform into packed 4:2:2, chroma averaged over each pixel pair
pub fn rgb_to_yuv422(src: &impl RgbSource, dst: &mut [u8], layout: Yuv422Layout, pixels: usize) {
    for (pair, block) in dst
        .chunks_exact_mut(Yuv422Layout::STRIDE)
        .take(pixels / 2)
        .enumerate()
    {
        let p0 = src.pixel(pair * 2);
        let p1 = src.pixel(pair * 2 + 1);
        let [r, g, b] = average(&[p0, p1]);
        let (u, v) = rgb_to_uv(r, g, b);
        layout.store(
            block,
            rgb_to_y(p0[0], p0[1], p0[2]),
            rgb_to_y(p1[0], p1[1], p1[2]),
            u,
            v,
        );
    }
}

/// Forward transform into planar 4:2:0, chroma averaged over each 2×2 block
pub fn rgb_to_i420(src: &impl RgbSource, dst: &mut [u8], width: usize, height: usize) {
    let (y_plane, u_plane, v_plane) = split_i420(dst, width, height);

    for (idx, y) in y_plane.iter_mut().enumerate() {
        let [r, g, b] = src.pixel(idx);
        *y = rgb_to_y(r, g, b);
    }

    let half_width = width / 2;
    for row in 0..height / 2 {
        for col in 0..half_width {
            let top = row * 2 * width + col * 2;
            let bottom = top + width;
            let block = [
                src.pixel(top),
                src.pixel(top + 1),
                src.pixel(bottom),
                src.pixel(bottom + 1),
            ];
            let [r, g, b] = average(&block);
            let (u, v) = rgb_to_uv(r, g, b);
            let uv_idx = row * half_width + col;
            u_plane[uv_idx] = u;
            v_plane[uv_idx] = v;
        }
    }
}

// ============================================================================
// Packed 4:2:2 sources
// ============================================================================

/// Inverse transform of packed 4:2:2 into a packed RGB layout
pub fn yuv422_to_rgb(
    src: &[u8],
    src_layout: Yuv422Layout,
    dst: &mut [u8],
    dst_layout: RgbLayout,
    pixels: usize,
) {
    let stride = dst_layout.stride;
    for (block, out) in src
        .chunks_exact(Yuv422Layout::STRIDE)
        .zip(dst.chunks_exact_mut(stride * 2))
        .take(pixels / 2)
    {
        let (y0, y1, u, v) = src_layout.load(block);
        let terms = ChromaTerms::from_u8(u, v);
        let (first, second) = out.split_at_mut(stride);
        dst_layout.store(first, terms.apply(luma_term(y0)));
        dst_layout.store(second, terms.apply(luma_term(y1)));
    }
}

/// Luma extraction from packed 4:2:2
pub fn yuv422_to_gray(src: &[u8], layout: Yuv422Layout, dst: &mut [u8], pixels: usize) {
    for (block, out) in src
        .chunks_exact(Yuv422Layout::STRIDE)
        .zip(dst.chunks_exact_mut(2))
        .take(pixels / 2)
    {
        let (y0, y1, _, _) = layout.load(block);
        out[0] = y0;
        out[1] = y1;
    }
}

/// Packed 4:2:2 to planar 4:2:0; chroma of each row pair is averaged
pub fn yuv422_to_i420(
    src: &[u8],
    layout: Yuv422Layout,
    dst: &mut [u8],
    width: usize,
    height: usize,
) {
    let (y_plane, u_plane, v_plane) = split_i420(dst, width, height);
    let half_width = width / 2;

    for row in (0..height).step_by(2) {
        let top_row = row * width * 2;
        let bottom_row = (row + 1) * width * 2;
        let uv_row = (row / 2) * half_width;

        for col in (0..width).step_by(2) {
            let top = &src[top_row + col * 2..top_row + col * 2 + 4];
            let bottom = &src[bottom_row + col * 2..bottom_row + col * 2 + 4];
            let (y00, y01, u0, v0) = layout.load(top);
            let (y10, y11, u1, v1) = layout.load(bottom);

            y_plane[row * width + col] = y00;
            y_plane[row * width + col + 1] = y01;
            y_plane[(row + 1) * width + col] = y10;
            y_plane[(row + 1) * width + col + 1] = y11;

            let uv_idx = uv_row + col / 2;
            u_plane[uv_idx] = ((u0 as u16 + u1 as u16) / 2) as u8;
            v_plane[uv_idx] = ((v0 as u16 + v1 as u16) / 2) as u8;
        }
    }
}

// ============================================================================
// Planar 4:2:0 sources
// ============================================================================

/// Inverse transform of planar 4:2:0 into a packed RGB layout
///
/// Luma is processed in row pairs; the four samples of each 2×2 block share
/// one chroma correction and are written to two output rows at once.
pub fn planar_to_rgb(
    src: &PlanarSource<'_>,
    dst: &mut [u8],
    layout: RgbLayout,
    width: usize,
    height: usize,
) {
    if width == 0 || height == 0 {
        return;
    }
    let stride = layout.stride;
    let row_bytes = width * stride;
    let half_width = width / 2;

    for (row, rows) in dst
        .chunks_exact_mut(row_bytes * 2)
        .take(height / 2)
        .enumerate()
    {
        let (upper, lower) = rows.split_at_mut(row_bytes);
        let upper_luma = row * 2 * width;
        let lower_luma = upper_luma + width;

        for col in 0..half_width {
            let terms = src.chroma_terms(row * half_width + col);
            for dx in 0..2 {
                let x = col * 2 + dx;
                let at = x * stride;
                layout.store(
                    &mut upper[at..at + stride],
                    terms.apply(src.luma_term(upper_luma + x)),
                );
                layout.store(
                    &mut lower[at..at + stride],
                    terms.apply(src.luma_term(lower_luma + x)),
                );
            }
        }
    }
}

/// Planar 4:2:0 to packed 4:2:2; each chroma sample is repeated on both rows
pub fn planar_to_yuv422(
    src: &PlanarSource<'_>,
    dst: &mut [u8],
    layout: Yuv422Layout,
    width: usize,
    height: usize,
) {
    if width == 0 || height == 0 {
        return;
    }
    let row_bytes = width * 2;
    let half_width = width / 2;

    for (row, rows) in dst
        .chunks_exact_mut(row_bytes * 2)
        .take(height / 2)
        .enumerate()
    {
        let (upper, lower) = rows.split_at_mut(row_bytes);
        let upper_luma = row * 2 * width;
        let lower_luma = upper_luma + width;

        for col in 0..half_width {
            let (u, v) = src.chroma(row * half_width + col);
            let x = col * 2;
            let at = col * Yuv422Layout::STRIDE;
            layout.store(
                &mut upper[at..at + 4],
                src.luma(upper_luma + x),
                src.luma(upper_luma + x + 1),
                u,
                v,
            );
            layout.store(
                &mut lower[at..at + 4],
                src.luma(lower_luma + x),
                src.luma(lower_luma + x + 1),
                u,
                v,
            );
        }
    }
}

/// Luma plane of a planar image
pub fn planar_to_gray(src: &PlanarSource<'_>, dst: &mut [u8], pixels: usize) {
    for (idx, out) in dst.iter_mut().take(pixels).enumerate() {
        *out = src.luma(idx);
    }
}

// ============================================================================
// Luminance sources
// ============================================================================

/// Luminance as the Y of packed 4:2:2 with neutral chroma
pub fn gray_to_yuv422(src: &GraySource<'_>, dst: &mut [u8], layout: Yuv422Layout, pixels: usize) {
    for (pair, block) in dst
        .chunks_exact_mut(Yuv422Layout::STRIDE)
        .take(pixels / 2)
        .enumerate()
    {
        layout.store(
            block,
            src.value(pair * 2),
            src.value(pair * 2 + 1),
            NEUTRAL_CHROMA,
            NEUTRAL_CHROMA,
        );
    }
}

/// Luminance as the Y plane of planar 4:2:0 with neutral chroma
pub fn gray_to_i420(src: &GraySource<'_>, dst: &mut [u8], width: usize, height: usize) {
    let (y_plane, u_plane, v_plane) = split_i420(dst, width, height);
    for (idx, y) in y_plane.iter_mut().enumerate() {
        *y = src.value(idx);
    }
    u_plane.fill(NEUTRAL_CHROMA);
    v_plane.fill(NEUTRAL_CHROMA);
}

#[cfg(test)]
mod tests {
    use super::super::source::{GrayDepth, PackedRgb, PlanarDepth};
    use super::*;

    #[test]
    fn test_yuv422_pair_shares_averaged_chroma() {
        // Pure red next to pure blue
        let rgb = [255, 0, 0, 0, 0, 255];
        let src = PackedRgb {
            data: &rgb,
            layout: RgbLayout::RGB,
        };
        let mut out = [0u8; 4];
        rgb_to_yuv422(&src, &mut out, Yuv422Layout::UYVY, 2);

        let (u, v) = rgb_to_uv(127, 0, 127);
        assert_eq!(out, [u, rgb_to_y(255, 0, 0), v, rgb_to_y(0, 0, 255)]);
    }

    #[test]
    fn test_i420_block_average() {
        // 2x2 image, one chroma sample
        let rgb = [
            200, 0, 0, 0, 200, 0, //
            0, 0, 200, 200, 200, 200,
        ];
        let src = PackedRgb {
            data: &rgb,
            layout: RgbLayout::RGB,
        };
        let mut out = [0u8; 6];
        rgb_to_i420(&src, &mut out, 2, 2);
        assert_eq!(out[0], rgb_to_y(200, 0, 0));
        assert_eq!(out[3], rgb_to_y(200, 200, 200));
        let (u, v) = rgb_to_uv(100, 100, 100);
        assert_eq!(&out[4..], &[u, v]);
    }

    #[test]
    fn test_yuv422_to_i420_averages_rows() {
        // 2x2 YUYV: rows carry different chroma
        let yuyv = [10, 100, 11, 200, 12, 110, 13, 210];
        let mut out = [0u8; 6];
        yuv422_to_i420(&yuyv, Yuv422Layout::YUYV, &mut out, 2, 2);
        assert_eq!(out, [10, 11, 12, 13, 105, 205]);
    }

    #[test]
    fn test_planar_to_yuv422_repeats_chroma() {
        let y = [1, 2, 3, 4, 5, 6, 7, 8];
        let u = [50, 60];
        let v = [70, 80];
        let src = PlanarSource {
            y: &y,
            u: &u,
            v: &v,
            depth: PlanarDepth::Unsigned8,
        };
        let mut out = [0u8; 16];
        planar_to_yuv422(&src, &mut out, Yuv422Layout::UYVY, 4, 2);
        assert_eq!(
            out,
            [50, 1, 70, 2, 60, 3, 80, 4, 50, 5, 70, 6, 60, 7, 80, 8]
        );
    }

    #[test]
    fn test_planar_to_rgb_non_square() {
        // 4 wide, 2 high: two chroma blocks side by side
        let y = [235; 8];
        let u = [128, 128];
        let v = [128, 255];
        let src = PlanarSource {
            y: &y,
            u: &u,
            v: &v,
            depth: PlanarDepth::Unsigned8,
        };
        let mut out = [0u8; 24];
        planar_to_rgb(&src, &mut out, RgbLayout::RGB, 4, 2);
        let white = ChromaTerms::from_u8(128, 128).apply(luma_term(235));
        let tinted = ChromaTerms::from_u8(128, 255).apply(luma_term(235));
        for row in 0..2 {
            for x in 0..4 {
                let at = (row * 4 + x) * 3;
                let expected = if x < 2 { white } else { tinted };
                assert_eq!(&out[at..at + 3], &expected, "pixel ({}, {})", x, row);
            }
        }
    }

    #[test]
    fn test_gray_kernels_use_neutral_chroma() {
        let gray = [10, 20, 30, 40];
        let src = GraySource {
            data: &gray,
            depth: GrayDepth::Eight,
        };
        let mut packed = [0u8; 8];
        gray_to_yuv422(&src, &mut packed, Yuv422Layout::YUYV, 4);
        assert_eq!(packed, [10, 128, 20, 128, 30, 128, 40, 128]);

        let mut planar = [0u8; 6];
        gray_to_i420(&src, &mut planar, 2, 2);
        assert_eq!(planar, [10, 20, 30, 40, 128, 128]);
    }
}
