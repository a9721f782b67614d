//! Conversion registry
//!
//! Every supported (source, destination) pair maps to one [`Kernel`]: a
//! primitive plus the layout tables it is parameterized by. The table is
//! built once on first use.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::{AppError, Result};
use crate::video::format::PixelFormat;
use crate::video::frame::ImageRef;

use super::kernels;
use super::layout::{RgbLayout, Yuv422Layout};
use super::permute::Permutation;
use super::source::{GrayDepth, GraySource, PackedRgb, PlanarDepth, PlanarSource, Rgb565};

/// Source of an RGB-valued kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RgbInput {
    Packed(RgbLayout),
    Rgb565,
    Gray(GrayDepth),
}

impl RgbInput {
    fn of(format: PixelFormat) -> Option<Self> {
        match format {
            PixelFormat::Rgb565 => Some(Self::Rgb565),
            PixelFormat::Gray => Some(Self::Gray(GrayDepth::Eight)),
            PixelFormat::Gray16 => Some(Self::Gray(GrayDepth::Sixteen)),
            _ => RgbLayout::of(format).map(Self::Packed),
        }
    }
}

/// Run `$body` with `$src` bound to the concrete reader for `$input`
macro_rules! with_rgb_source {
    ($input:expr, $data:expr, |$src:ident| $body:expr) => {
        match $input {
            RgbInput::Packed(layout) => {
                let $src = PackedRgb { data: $data, layout };
                $body
            }
            RgbInput::Rgb565 => {
                let $src = Rgb565 { data: $data };
                $body
            }
            RgbInput::Gray(depth) => {
                let $src = GraySource { data: $data, depth };
                $body
            }
        }
    };
}

/// A conversion primitive bound to its layout tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    /// Identical formats
    Copy,
    /// RGB family ↔ RGB family, packed 4:2:2 ↔ packed 4:2:2
    Permute(Permutation),
    /// RGB565 or luminance into an RGB-family layout
    RgbToRgb { input: RgbInput, dst: RgbLayout },
    /// Luma extraction (also narrows 16-bit luminance)
    RgbToGray(RgbInput),
    RgbToYuv422 { input: RgbInput, dst: Yuv422Layout },
    RgbToI420(RgbInput),
    Yuv422ToRgb { src: Yuv422Layout, dst: RgbLayout },
    Yuv422ToGray(Yuv422Layout),
    Yuv422ToI420(Yuv422Layout),
    PlanarToRgb { depth: PlanarDepth, dst: RgbLayout },
    PlanarToYuv422 { depth: PlanarDepth, dst: Yuv422Layout },
    PlanarToGray(PlanarDepth),
    GrayToYuv422 { depth: GrayDepth, dst: Yuv422Layout },
    GrayToI420(GrayDepth),
}

impl Kernel {
    /// Pick the kernel for a format pair
    pub fn resolve(src: PixelFormat, dst: PixelFormat) -> Option<Self> {
        use PixelFormat::*;

        if src == dst {
            return Some(Kernel::Copy);
        }

        let planar_depth = match src {
            I420 => Some(PlanarDepth::Unsigned8),
            I420S16 => Some(PlanarDepth::Signed16),
            _ => None,
        };
        let gray_depth = match src {
            Gray => Some(GrayDepth::Eight),
            Gray16 => Some(GrayDepth::Sixteen),
            _ => None,
        };

        if let Some(depth) = planar_depth {
            return match dst {
                Gray => Some(Kernel::PlanarToGray(depth)),
                _ => RgbLayout::of(dst)
                    .map(|dst| Kernel::PlanarToRgb { depth, dst })
                    .or_else(|| {
                        Yuv422Layout::of(dst).map(|dst| Kernel::PlanarToYuv422 { depth, dst })
                    }),
            };
        }

        if let Some(src) = Yuv422Layout::of(src) {
            return match dst {
                Gray => Some(Kernel::Yuv422ToGray(src)),
                I420 => Some(Kernel::Yuv422ToI420(src)),
                _ => RgbLayout::of(dst)
                    .map(|dst| Kernel::Yuv422ToRgb { src, dst })
                    .or_else(|| {
                        Yuv422Layout::of(dst).map(|dst| Kernel::Permute(Permutation::yuv422(src, dst)))
                    }),
            };
        }

        let input = RgbInput::of(src)?;
        match dst {
            Gray => Some(Kernel::RgbToGray(input)),
            I420 => Some(match gray_depth {
                Some(depth) => Kernel::GrayToI420(depth),
                None => Kernel::RgbToI420(input),
            }),
            _ => {
                if let Some(dst) = Yuv422Layout::of(dst) {
                    return Some(match gray_depth {
                        Some(depth) => Kernel::GrayToYuv422 { depth, dst },
                        None => Kernel::RgbToYuv422 { input, dst },
                    });
                }
                let dst = RgbLayout::of(dst)?;
                Some(match input {
                    RgbInput::Packed(src) => Kernel::Permute(Permutation::rgb(src, dst)),
                    _ => Kernel::RgbToRgb { input, dst },
                })
            }
        }
    }

    /// Whether the kernel can run with source and destination in one buffer
    pub fn supports_in_place(&self) -> bool {
        matches!(self, Kernel::Copy | Kernel::Permute(_))
    }

    /// Convert `image` into `dst`
    ///
    /// `dst` must already be checked to hold the destination frame.
    pub fn run(&self, image: &ImageRef<'_>, dst: &mut [u8]) -> Result<()> {
        let resolution = image.resolution();
        let width = resolution.width as usize;
        let height = resolution.height as usize;
        let pixels = width * height;

        if let Some([y, u, v]) = image.yuv_planes() {
            let depth = match image.format() {
                PixelFormat::I420S16 => PlanarDepth::Signed16,
                _ => PlanarDepth::Unsigned8,
            };
            let src = PlanarSource { y, u, v, depth };
            match *self {
                Kernel::Copy => {
                    let mut offset = 0;
                    for plane in [y, u, v] {
                        dst[offset..offset + plane.len()].copy_from_slice(plane);
                        offset += plane.len();
                    }
                }
                Kernel::PlanarToRgb { dst: layout, .. } => {
                    kernels::planar_to_rgb(&src, dst, layout, width, height)
                }
                Kernel::PlanarToYuv422 { dst: layout, .. } => {
                    kernels::planar_to_yuv422(&src, dst, layout, width, height)
                }
                Kernel::PlanarToGray(_) => kernels::planar_to_gray(&src, dst, pixels),
                _ => return Err(self.mismatch(image)),
            }
            return Ok(());
        }

        let data = image.packed().ok_or_else(|| self.mismatch(image))?;
        match *self {
            Kernel::Copy => dst[..data.len()].copy_from_slice(data),
            Kernel::Permute(perm) => perm.apply(data, dst, data.len() / perm.src_stride()),
            Kernel::RgbToRgb { input, dst: layout } => {
                with_rgb_source!(input, data, |src| kernels::rgb_to_rgb(&src, dst, layout, pixels))
            }
            Kernel::RgbToGray(input) => {
                with_rgb_source!(input, data, |src| kernels::rgb_to_gray(&src, dst, pixels))
            }
            Kernel::RgbToYuv422 { input, dst: layout } => {
                with_rgb_source!(input, data, |src| kernels::rgb_to_yuv422(
                    &src, dst, layout, pixels
                ))
            }
            Kernel::RgbToI420(input) => {
                with_rgb_source!(input, data, |src| kernels::rgb_to_i420(
                    &src, dst, width, height
                ))
            }
            Kernel::Yuv422ToRgb { src, dst: layout } => {
                kernels::yuv422_to_rgb(data, src, dst, layout, pixels)
            }
            Kernel::Yuv422ToGray(layout) => kernels::yuv422_to_gray(data, layout, dst, pixels),
            Kernel::Yuv422ToI420(layout) => {
                kernels::yuv422_to_i420(data, layout, dst, width, height)
            }
            Kernel::GrayToYuv422 { depth, dst: layout } => {
                kernels::gray_to_yuv422(&GraySource { data, depth }, dst, layout, pixels)
            }
            Kernel::GrayToI420(depth) => {
                kernels::gray_to_i420(&GraySource { data, depth }, dst, width, height)
            }
            _ => return Err(self.mismatch(image)),
        }
        Ok(())
    }

    /// Run within a single buffer holding the source frame
    ///
    /// `blocks` is the number of permutation blocks in the frame.
    pub fn run_in_place(&self, buf: &mut [u8], blocks: usize) -> bool {
        match self {
            Kernel::Copy => true,
            Kernel::Permute(perm) => {
                perm.apply_in_place(buf, blocks);
                true
            }
            _ => false,
        }
    }

    fn mismatch(&self, image: &ImageRef<'_>) -> AppError {
        AppError::FormatMismatch {
            expected: format!("source for {:?}", self),
            actual: image.format().to_string(),
        }
    }
}

fn registry() -> &'static HashMap<(PixelFormat, PixelFormat), Kernel> {
    static REGISTRY: OnceLock<HashMap<(PixelFormat, PixelFormat), Kernel>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut table = HashMap::new();
        for &src in PixelFormat::all() {
            for &dst in PixelFormat::all() {
                if let Some(kernel) = Kernel::resolve(src, dst) {
                    table.insert((src, dst), kernel);
                }
            }
        }
        table
    })
}

/// Look up the kernel for a format pair
pub fn lookup(src: PixelFormat, dst: PixelFormat) -> Result<Kernel> {
    registry()
        .get(&(src, dst))
        .copied()
        .ok_or(AppError::UnsupportedConversion { src, dst })
}

/// Check if a format pair can be converted
pub fn is_supported(src: PixelFormat, dst: PixelFormat) -> bool {
    registry().contains_key(&(src, dst))
}

/// Every supported pair, in declaration order of the formats
pub fn supported_pairs() -> Vec<(PixelFormat, PixelFormat)> {
    let mut pairs = Vec::new();
    for &src in PixelFormat::all() {
        for &dst in PixelFormat::all() {
            if is_supported(src, dst) {
                pairs.push((src, dst));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_always_supported() {
        for &format in PixelFormat::all() {
            assert_eq!(lookup(format, format).unwrap(), Kernel::Copy);
        }
    }

    #[test]
    fn test_no_conversion_targets_wide_formats() {
        for &src in PixelFormat::all() {
            for dst in [PixelFormat::Rgb565, PixelFormat::Gray16, PixelFormat::I420S16] {
                assert_eq!(is_supported(src, dst), src == dst, "{} → {}", src, dst);
            }
        }
    }

    #[test]
    fn test_family_coverage() {
        for &src in PixelFormat::all() {
            for &dst in PixelFormat::all() {
                if dst.is_rgb_family() || dst == PixelFormat::Gray {
                    assert!(is_supported(src, dst), "{} → {}", src, dst);
                }
                if dst.is_packed_yuv() || dst == PixelFormat::I420 {
                    let expected = src != PixelFormat::I420S16 || dst != PixelFormat::I420;
                    assert_eq!(is_supported(src, dst), expected, "{} → {}", src, dst);
                }
            }
        }
    }

    #[test]
    fn test_kernel_selection() {
        assert!(matches!(
            lookup(PixelFormat::Rgb, PixelFormat::Bgra).unwrap(),
            Kernel::Permute(_)
        ));
        assert!(matches!(
            lookup(PixelFormat::Uyvy, PixelFormat::Yvyu).unwrap(),
            Kernel::Permute(_)
        ));
        assert_eq!(
            lookup(PixelFormat::Gray16, PixelFormat::Gray).unwrap(),
            Kernel::RgbToGray(RgbInput::Gray(GrayDepth::Sixteen))
        );
        assert_eq!(
            lookup(PixelFormat::Gray, PixelFormat::Yuyv).unwrap(),
            Kernel::GrayToYuv422 {
                depth: GrayDepth::Eight,
                dst: Yuv422Layout::YUYV
            }
        );
        assert_eq!(
            lookup(PixelFormat::I420S16, PixelFormat::Gray).unwrap(),
            Kernel::PlanarToGray(PlanarDepth::Signed16)
        );
    }

    #[test]
    fn test_unsupported_pair() {
        let err = lookup(PixelFormat::Rgb, PixelFormat::Rgb565).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedConversion { .. }));
        assert!(!supported_pairs().contains(&(PixelFormat::I420S16, PixelFormat::I420)));
    }
}
