//! Pixel format conversion
//!
//! Every supported pair is served by one of a handful of table-driven
//! primitives (see [`registry`]). Conversions are deterministic integer
//! arithmetic; the only runtime failures are configuration errors (an
//! unsupported pair, odd dimensions for a subsampled format, or a
//! buffer shorter than the format and resolution call for). Sizes are
//! checked before anything is written.

mod kernels;
pub mod layout;
pub mod math;
pub mod permute;
pub mod registry;
mod source;

use tracing::debug;

use crate::error::{AppError, Result};
use crate::video::format::{PixelFormat, Resolution};
use crate::video::frame::ImageRef;

pub use registry::{is_supported, supported_pairs, Kernel};

/// Converter for one format pair at one resolution
///
/// Owns its output buffer, which is reused across conversions.
pub struct PixelConverter {
    /// Source format
    src_format: PixelFormat,
    /// Destination format
    dst_format: PixelFormat,
    /// Frame resolution
    resolution: Resolution,
    /// Kernel selected at construction
    kernel: Kernel,
    /// Output buffer (reused across conversions)
    output_buffer: Vec<u8>,
}

impl PixelConverter {
    /// Create a converter, failing on an unsupported pair or odd dimensions
    pub fn new(
        src_format: PixelFormat,
        dst_format: PixelFormat,
        resolution: Resolution,
    ) -> Result<Self> {
        let kernel = registry::lookup(src_format, dst_format)?;
        check_dimensions(src_format, resolution)?;
        check_dimensions(dst_format, resolution)?;

        debug!(
            "Created pixel converter {} → {} at {} ({:?})",
            src_format, dst_format, resolution, kernel
        );

        Ok(Self {
            src_format,
            dst_format,
            resolution,
            kernel,
            output_buffer: vec![0u8; dst_format.frame_size(resolution)],
        })
    }

    /// Convert a contiguous frame and return a reference to the output buffer
    pub fn convert(&mut self, input: &[u8]) -> Result<&[u8]> {
        let image = ImageRef::new(self.src_format, self.resolution, input)?;
        self.kernel.run(&image, &mut self.output_buffer)?;
        Ok(&self.output_buffer)
    }

    /// Convert a borrowed image and return a reference to the output buffer
    pub fn convert_image(&mut self, image: &ImageRef<'_>) -> Result<&[u8]> {
        self.check_image(image)?;
        self.kernel.run(image, &mut self.output_buffer)?;
        Ok(&self.output_buffer)
    }

    /// Convert a borrowed image into a caller-supplied buffer
    pub fn convert_into(&self, image: &ImageRef<'_>, dst: &mut [u8]) -> Result<()> {
        self.check_image(image)?;
        check_output(dst.len(), self.output_len())?;
        self.kernel.run(image, dst)
    }

    /// Convert within one buffer that holds the source frame on entry
    ///
    /// Only permutations and copies can run in place. The buffer must hold
    /// the larger of the source and destination frames; on return the
    /// destination frame starts at offset 0.
    pub fn convert_in_place(&self, buf: &mut [u8]) -> Result<()> {
        if !self.kernel.supports_in_place() {
            return Err(AppError::InPlaceUnsupported {
                src: self.src_format,
                dst: self.dst_format,
            });
        }

        let src_len = self.src_format.frame_size(self.resolution);
        let needed = src_len.max(self.output_len());
        check_output(buf.len(), needed)?;

        let blocks = match self.kernel {
            Kernel::Permute(perm) => src_len / perm.src_stride(),
            _ => 0,
        };
        self.kernel.run_in_place(buf, blocks);
        Ok(())
    }

    /// Get source format
    pub fn src_format(&self) -> PixelFormat {
        self.src_format
    }

    /// Get destination format
    pub fn dst_format(&self) -> PixelFormat {
        self.dst_format
    }

    /// Get output buffer length
    pub fn output_len(&self) -> usize {
        self.output_buffer.len()
    }

    /// Get resolution
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn check_image(&self, image: &ImageRef<'_>) -> Result<()> {
        if image.format() != self.src_format || image.resolution() != self.resolution {
            return Err(AppError::FormatMismatch {
                expected: format!("{} {}", self.src_format, self.resolution),
                actual: format!("{} {}", image.format(), image.resolution()),
            });
        }
        Ok(())
    }
}

/// One-shot conversion of `image` into `dst`
pub fn convert(image: &ImageRef<'_>, dst_format: PixelFormat, dst: &mut [u8]) -> Result<()> {
    let resolution = image.resolution();
    let kernel = registry::lookup(image.format(), dst_format)?;
    check_dimensions(image.format(), resolution)?;
    check_dimensions(dst_format, resolution)?;
    check_output(dst.len(), dst_format.frame_size(resolution))?;
    kernel.run(image, dst)
}

fn check_dimensions(format: PixelFormat, resolution: Resolution) -> Result<()> {
    if format.is_subsampled() && (resolution.width % 2 != 0 || resolution.height % 2 != 0) {
        return Err(AppError::InvalidDimensions {
            format,
            width: resolution.width,
            height: resolution.height,
        });
    }
    Ok(())
}

fn check_output(actual: usize, needed: usize) -> Result<()> {
    if actual < needed {
        return Err(AppError::BufferTooSmall {
            what: "Output",
            needed,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_bytes(rng: &mut StdRng, len: usize) -> Vec<u8> {
        (0..len).map(|_| rng.gen()).collect()
    }

    /// RGB image whose 2×2 blocks are uniform, so chroma subsampling is lossless
    fn blocky_rgb(rng: &mut StdRng, width: usize, height: usize) -> Vec<u8> {
        let mut data = vec![0u8; width * height * 3];
        for by in (0..height).step_by(2) {
            for bx in (0..width).step_by(2) {
                let color: [u8; 3] = rng.gen();
                for y in by..by + 2 {
                    for x in bx..bx + 2 {
                        let at = (y * width + x) * 3;
                        data[at..at + 3].copy_from_slice(&color);
                    }
                }
            }
        }
        data
    }

    fn convert_vec(src: PixelFormat, dst: PixelFormat, res: Resolution, data: &[u8]) -> Vec<u8> {
        let mut converter = PixelConverter::new(src, dst, res).unwrap();
        converter.convert(data).unwrap().to_vec()
    }

    #[test]
    fn test_identity_for_every_format() {
        let mut rng = StdRng::seed_from_u64(7);
        let res = Resolution::new(6, 4);
        for &format in PixelFormat::all() {
            let input = random_bytes(&mut rng, format.frame_size(res));
            assert_eq!(convert_vec(format, format, res, &input), input, "{}", format);
        }
    }

    #[test]
    fn test_rgb_to_bgr_and_back() {
        let res = Resolution::new(4, 2);
        let input: Vec<u8> = (0..24).collect();
        let bgr = convert_vec(PixelFormat::Rgb, PixelFormat::Bgr, res, &input);
        assert_eq!(&bgr[..6], &[2, 1, 0, 5, 4, 3]);
        assert_eq!(convert_vec(PixelFormat::Bgr, PixelFormat::Rgb, res, &bgr), input);
    }

    #[test]
    fn test_permutation_round_trips() {
        let mut rng = StdRng::seed_from_u64(11);
        let res = Resolution::new(8, 6);
        let families: Vec<Vec<PixelFormat>> = vec![
            PixelFormat::all()
                .iter()
                .copied()
                .filter(|f| f.is_rgb_family() && f.channels() == 3)
                .collect(),
            PixelFormat::all()
                .iter()
                .copied()
                .filter(|f| f.is_rgb_family() && f.channels() == 4)
                .collect(),
            PixelFormat::all()
                .iter()
                .copied()
                .filter(|f| f.is_packed_yuv())
                .collect(),
        ];
        for family in families {
            for &a in &family {
                for &b in &family {
                    let input = random_bytes(&mut rng, a.frame_size(res));
                    let there = convert_vec(a, b, res, &input);
                    let back = convert_vec(b, a, res, &there);
                    assert_eq!(back, input, "{} → {} → {}", a, b, a);
                }
            }
        }
    }

    #[test]
    fn test_i420_to_rgba_known_values() {
        let res = Resolution::new(2, 2);
        // Saturated red: Y=81 U=90 V=240
        let red = [81, 81, 81, 81, 90, 240];
        let out = convert_vec(PixelFormat::I420, PixelFormat::Rgba, res, &red);
        for pixel in out.chunks_exact(4) {
            assert_eq!(pixel, &[254, 0, 0, 255]);
        }

        // Neutral chroma, one luma per pixel
        let gray = [16, 235, 126, 235, 128, 128];
        let out = convert_vec(PixelFormat::I420, PixelFormat::Rgba, res, &gray);
        // 298 * 110 >> 8 = 128
        assert_eq!(
            out,
            vec![0, 0, 0, 255, 254, 254, 254, 255, 128, 128, 128, 255, 254, 254, 254, 255]
        );
    }

    #[test]
    fn test_rgb_yuv_round_trip_error_is_bounded() {
        let mut rng = StdRng::seed_from_u64(42);
        let res = Resolution::new(64, 48);
        let input = blocky_rgb(&mut rng, 64, 48);

        for via in [
            PixelFormat::I420,
            PixelFormat::Uyvy,
            PixelFormat::Yuyv,
            PixelFormat::Vyuy,
            PixelFormat::Yvyu,
        ] {
            let yuv = convert_vec(PixelFormat::Rgb, via, res, &input);
            let back = convert_vec(via, PixelFormat::Rgb, res, &yuv);

            let errors: Vec<u32> = input
                .iter()
                .zip(&back)
                .map(|(a, b)| (*a as i32 - *b as i32).unsigned_abs())
                .collect();
            let max = errors.iter().copied().max().unwrap_or(0);
            let mean = errors.iter().sum::<u32>() as f64 / errors.len() as f64;
            assert!(max <= 5, "max error {} via {}", max, via);
            assert!(mean <= 2.0, "mean error {} via {}", mean, via);
        }
    }

    #[test]
    fn test_in_place_matches_out_of_place() {
        let mut rng = StdRng::seed_from_u64(3);
        let res = Resolution::new(10, 6);
        for (src, dst) in supported_pairs() {
            let converter = PixelConverter::new(src, dst, res).unwrap();
            if !registry::lookup(src, dst).unwrap().supports_in_place() {
                let mut buf = vec![0u8; src.frame_size(res).max(dst.frame_size(res))];
                assert!(matches!(
                    converter.convert_in_place(&mut buf),
                    Err(AppError::InPlaceUnsupported { .. })
                ));
                continue;
            }

            let input = random_bytes(&mut rng, src.frame_size(res));
            let expected = convert_vec(src, dst, res, &input);

            let mut buf = input.clone();
            buf.resize(input.len().max(expected.len()), 0);
            converter.convert_in_place(&mut buf).unwrap();
            assert_eq!(&buf[..expected.len()], &expected[..], "{} → {}", src, dst);
        }
    }

    #[test]
    fn test_alpha_is_opaque_for_every_widening_conversion() {
        let mut rng = StdRng::seed_from_u64(5);
        let res = Resolution::new(4, 4);
        for (src, dst) in supported_pairs() {
            if dst.channels() != 4 || src.channels() == 4 {
                continue;
            }
            let input = random_bytes(&mut rng, src.frame_size(res));
            let out = convert_vec(src, dst, res, &input);
            let alpha = match dst {
                PixelFormat::Argb | PixelFormat::Abgr => 0,
                _ => 3,
            };
            assert!(
                out.chunks_exact(4).all(|pixel| pixel[alpha] == 255),
                "{} → {}",
                src,
                dst
            );
        }
    }

    #[test]
    fn test_zero_size_is_noop() {
        let res = Resolution::new(0, 0);
        for (src, dst) in supported_pairs() {
            let mut converter = PixelConverter::new(src, dst, res).unwrap();
            assert!(converter.convert(&[]).unwrap().is_empty());
        }
    }

    #[test]
    fn test_unsupported_pair_is_reported() {
        let res = Resolution::new(2, 2);
        assert!(matches!(
            PixelConverter::new(PixelFormat::Rgb, PixelFormat::I420S16, res),
            Err(AppError::UnsupportedConversion { .. })
        ));
    }

    #[test]
    fn test_odd_dimensions_rejected_for_subsampled() {
        let res = Resolution::new(3, 2);
        assert!(matches!(
            PixelConverter::new(PixelFormat::Rgb, PixelFormat::Yuyv, res),
            Err(AppError::InvalidDimensions { width: 3, .. })
        ));
        assert!(PixelConverter::new(PixelFormat::Rgb, PixelFormat::Bgra, res).is_ok());
    }

    #[test]
    fn test_short_output_writes_nothing() {
        let res = Resolution::new(2, 2);
        let input = [9u8; 12];
        let image = ImageRef::new(PixelFormat::Rgb, res, &input).unwrap();
        let mut dst = vec![7u8; 15];
        let err = convert(&image, PixelFormat::Rgba, &mut dst).unwrap_err();
        assert!(matches!(
            err,
            AppError::BufferTooSmall {
                needed: 16,
                actual: 15,
                ..
            }
        ));
        assert!(dst.iter().all(|b| *b == 7));
    }

    #[test]
    fn test_converter_rejects_foreign_image() {
        let res = Resolution::new(2, 2);
        let converter = PixelConverter::new(PixelFormat::Rgb, PixelFormat::Gray, res).unwrap();
        let data = [0u8; 16];
        let image = ImageRef::new(PixelFormat::Rgba, res, &data).unwrap();
        let mut dst = [0u8; 4];
        assert!(matches!(
            converter.convert_into(&image, &mut dst),
            Err(AppError::FormatMismatch { .. })
        ));
    }

    #[test]
    fn test_separate_planes() {
        let res = Resolution::new(2, 2);
        let y = [235u8; 4];
        let u = [128u8];
        let v = [128u8];
        let image = ImageRef::planar(PixelFormat::I420, res, &y, &u, &v).unwrap();
        let mut gray = [0u8; 4];
        convert(&image, PixelFormat::Gray, &mut gray).unwrap();
        assert_eq!(gray, [235; 4]);

        let mut rgb = [0u8; 12];
        convert(&image, PixelFormat::Bgr, &mut rgb).unwrap();
        assert_eq!(rgb, [254; 12]);
    }

    #[test]
    fn test_rgb565_and_gray16_sources() {
        let res = Resolution::new(2, 1);
        let words: Vec<u8> = [0xF800u16, 0x001F]
            .iter()
            .flat_map(|w| w.to_ne_bytes())
            .collect();
        assert_eq!(
            convert_vec(PixelFormat::Rgb565, PixelFormat::Rgb, res, &words),
            vec![0xF8, 0, 0, 0, 0, 0xF8]
        );

        let gray16: Vec<u8> = [0x1234u16, 0xFF00]
            .iter()
            .flat_map(|w| w.to_ne_bytes())
            .collect();
        assert_eq!(
            convert_vec(PixelFormat::Gray16, PixelFormat::Gray, res, &gray16),
            vec![0x12, 0xFF]
        );
        assert_eq!(
            convert_vec(PixelFormat::Gray16, PixelFormat::Rgba, res, &gray16),
            vec![0x12, 0x12, 0x12, 255, 0xFF, 0xFF, 0xFF, 255]
        );
    }
}
