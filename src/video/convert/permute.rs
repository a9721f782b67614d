//! Channel permutation primitive
//!
//! Reorders the bytes of fixed-size blocks (one pixel for packed RGB, one
//! macropixel for packed 4:2:2) according to a tap table, optionally
//! changing the block size between 3 and 4 and synthesizing opaque alpha.
//!
//! # In-place traversal
//!
//! `apply_in_place` runs over a single buffer that holds the source on entry
//! and the destination on exit:
//!
//! - destination stride <= source stride: blocks are visited first to last.
//!   Block `i` is written to `[i*ds, (i+1)*ds)`, which never reaches the
//!   unread source block `i+1` at `(i+1)*ss`.
//! - destination stride > source stride: blocks are visited last to first.
//!   Block `i` is written at or after `i*ss`, above every unread source block.
//!
//! Each block is fully read into a scratch array before it is written, so
//! overlap inside one block is harmless. Visiting a growing conversion first
//! to last would overwrite source pixels before they are read.

use super::layout::{RgbLayout, Yuv422Layout};
use super::math::ALPHA_OPAQUE;

/// Where one destination byte comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tap {
    /// Byte offset inside the source block
    Channel(usize),
    /// Fully opaque alpha
    Opaque,
}

/// Block visiting order for in-place operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    Forward,
    Reverse,
}

/// Block-wise byte permutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permutation {
    src_stride: usize,
    dst_stride: usize,
    taps: [Tap; 4],
}

impl Permutation {
    /// Permutation between two packed RGB layouts
    ///
    /// Alpha is carried over when both sides have it, synthesized as opaque
    /// when only the destination has it, and dropped otherwise.
    pub fn rgb(src: RgbLayout, dst: RgbLayout) -> Self {
        let mut taps = [Tap::Opaque; 4];
        taps[dst.r] = Tap::Channel(src.r);
        taps[dst.g] = Tap::Channel(src.g);
        taps[dst.b] = Tap::Channel(src.b);
        if let Some(a) = dst.a {
            taps[a] = src.a.map(Tap::Channel).unwrap_or(Tap::Opaque);
        }
        Self {
            src_stride: src.stride,
            dst_stride: dst.stride,
            taps,
        }
    }

    /// Permutation between two packed 4:2:2 orderings
    pub fn yuv422(src: Yuv422Layout, dst: Yuv422Layout) -> Self {
        let mut taps = [Tap::Opaque; 4];
        taps[dst.u] = Tap::Channel(src.u);
        taps[dst.y0] = Tap::Channel(src.y0);
        taps[dst.v] = Tap::Channel(src.v);
        taps[dst.y1] = Tap::Channel(src.y1);
        Self {
            src_stride: Yuv422Layout::STRIDE,
            dst_stride: Yuv422Layout::STRIDE,
            taps,
        }
    }

    pub fn src_stride(&self) -> usize {
        self.src_stride
    }

    pub fn dst_stride(&self) -> usize {
        self.dst_stride
    }

    /// Visiting order required for in-place operation
    pub fn traversal(&self) -> Traversal {
        if self.dst_stride > self.src_stride {
            Traversal::Reverse
        } else {
            Traversal::Forward
        }
    }

    #[inline]
    fn gather(&self, src_block: &[u8], scratch: &mut [u8; 4]) {
        for (out, tap) in scratch.iter_mut().zip(&self.taps[..self.dst_stride]) {
            *out = match *tap {
                Tap::Channel(idx) => src_block[idx],
                Tap::Opaque => ALPHA_OPAQUE,
            };
        }
    }

    /// Permute `blocks` blocks from `src` into a separate `dst`
    ///
    /// Requires `src.len() >= blocks * src_stride` and
    /// `dst.len() >= blocks * dst_stride`.
    pub fn apply(&self, src: &[u8], dst: &mut [u8], blocks: usize) {
        let mut scratch = [0u8; 4];
        let ds = self.dst_stride;
        for (src_block, dst_block) in src
            .chunks_exact(self.src_stride)
            .zip(dst.chunks_exact_mut(ds))
            .take(blocks)
        {
            self.gather(src_block, &mut scratch);
            dst_block.copy_from_slice(&scratch[..ds]);
        }
    }

    /// Permute `blocks` blocks within one buffer
    ///
    /// Requires `buf.len() >= blocks * max(src_stride, dst_stride)`. On return
    /// the first `blocks * dst_stride` bytes hold the destination image and
    /// match what [`Permutation::apply`] would have produced.
    pub fn apply_in_place(&self, buf: &mut [u8], blocks: usize) {
        let (ss, ds) = (self.src_stride, self.dst_stride);
        let mut scratch = [0u8; 4];
        let mut step = |i: usize| {
            self.gather(&buf[i * ss..i * ss + ss], &mut scratch);
            buf[i * ds..i * ds + ds].copy_from_slice(&scratch[..ds]);
        };
        match self.traversal() {
            Traversal::Forward => (0..blocks).for_each(&mut step),
            Traversal::Reverse => (0..blocks).rev().for_each(&mut step),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixels(count: usize, stride: usize) -> Vec<u8> {
        (0..count * stride).map(|i| (i * 7 + 3) as u8).collect()
    }

    #[test]
    fn test_rgb_to_bgr_swaps_red_and_blue() {
        let perm = Permutation::rgb(RgbLayout::RGB, RgbLayout::BGR);
        let src = [1, 2, 3, 4, 5, 6];
        let mut dst = [0u8; 6];
        perm.apply(&src, &mut dst, 2);
        assert_eq!(dst, [3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn test_alpha_synthesized_and_carried() {
        let mut dst = [0u8; 4];
        Permutation::rgb(RgbLayout::RGB, RgbLayout::ABGR).apply(&[10, 20, 30], &mut dst, 1);
        assert_eq!(dst, [255, 30, 20, 10]);

        Permutation::rgb(RgbLayout::RGBA, RgbLayout::ARGB).apply(&[10, 20, 30, 7], &mut dst, 1);
        assert_eq!(dst, [7, 10, 20, 30]);

        let mut three = [0u8; 3];
        Permutation::rgb(RgbLayout::BGRA, RgbLayout::RGB).apply(&[10, 20, 30, 7], &mut three, 1);
        assert_eq!(three, [30, 20, 10]);
    }

    #[test]
    fn test_traversal_direction() {
        assert_eq!(
            Permutation::rgb(RgbLayout::RGB, RgbLayout::RGBA).traversal(),
            Traversal::Reverse
        );
        assert_eq!(
            Permutation::rgb(RgbLayout::RGBA, RgbLayout::BGR).traversal(),
            Traversal::Forward
        );
        assert_eq!(
            Permutation::rgb(RgbLayout::RGB, RgbLayout::BGR).traversal(),
            Traversal::Forward
        );
    }

    #[test]
    fn test_in_place_matches_out_of_place() {
        let layouts = [
            RgbLayout::RGB,
            RgbLayout::BGR,
            RgbLayout::RGBA,
            RgbLayout::BGRA,
            RgbLayout::ARGB,
            RgbLayout::ABGR,
        ];
        let count = 37;
        for src in layouts {
            for dst in layouts {
                let perm = Permutation::rgb(src, dst);
                let input = pixels(count, src.stride);

                let mut expected = vec![0u8; count * dst.stride];
                perm.apply(&input, &mut expected, count);

                let mut buf = input.clone();
                buf.resize(count * src.stride.max(dst.stride), 0);
                perm.apply_in_place(&mut buf, count);
                assert_eq!(&buf[..count * dst.stride], &expected[..], "{:?} → {:?}", src, dst);
            }
        }
    }

    #[test]
    fn test_growing_in_place_needs_reverse_order() {
        // Forward traversal of a 3 → 4 expansion clobbers the second pixel
        let perm = Permutation::rgb(RgbLayout::RGB, RgbLayout::RGBA);
        let mut buf = vec![1, 2, 3, 4, 5, 6, 0, 0];
        let mut scratch = [0u8; 4];
        for i in 0..2 {
            perm.gather(&buf[i * 3..i * 3 + 3], &mut scratch);
            buf[i * 4..i * 4 + 4].copy_from_slice(&scratch);
        }
        assert_ne!(buf, vec![1, 2, 3, 255, 4, 5, 6, 255]);

        let mut buf = vec![1, 2, 3, 4, 5, 6, 0, 0];
        perm.apply_in_place(&mut buf, 2);
        assert_eq!(buf, vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn test_yuv422_permutation() {
        let perm = Permutation::yuv422(Yuv422Layout::UYVY, Yuv422Layout::YUYV);
        let mut dst = [0u8; 4];
        // U=1 Y0=2 V=3 Y1=4
        perm.apply(&[1, 2, 3, 4], &mut dst, 1);
        assert_eq!(dst, [2, 1, 4, 3]);
    }
}
