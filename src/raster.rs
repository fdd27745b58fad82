use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::{GrayImage, ImageFormat, RgbImage, imageops};
use miette::Diagnostic;
use thiserror::Error;
use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult, Limits};

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ConversionFailure {
    #[error("unsupported raster layout: {0}")]
    UnsupportedLayout(String),

    #[error("failed to decode raster: {0}")]
    Decode(String),
}

/// Channel layouts the converter accepts. Everything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterLayout {
    Grayscale,
    Rgb,
    Rgba,
}

impl RasterLayout {
    /// Multiband rasters with three or four samples are read as RGB / RGBA.
    pub fn classify(color: ColorType) -> Result<Self, ConversionFailure> {
        let (layout, bits) = match color {
            ColorType::Gray(bits) => (RasterLayout::Grayscale, bits),
            ColorType::RGB(bits) => (RasterLayout::Rgb, bits),
            ColorType::RGBA(bits) => (RasterLayout::Rgba, bits),
            ColorType::Multiband {
                bit_depth,
                num_samples: 3,
            } => (RasterLayout::Rgb, bit_depth),
            ColorType::Multiband {
                bit_depth,
                num_samples: 4,
            } => (RasterLayout::Rgba, bit_depth),
            other => {
                return Err(ConversionFailure::UnsupportedLayout(format!(
                    "colour type {other:?}"
                )));
            }
        };
        let packed = layout == RasterLayout::Grayscale && matches!(bits, 1 | 2 | 4);
        if !packed && !matches!(bits, 8 | 16 | 32 | 64) {
            return Err(ConversionFailure::UnsupportedLayout(format!(
                "{bits}-bit samples in {layout:?}"
            )));
        }
        Ok(layout)
    }

    /// Samples per pixel in the source raster.
    pub fn channels(self) -> usize {
        match self {
            RasterLayout::Grayscale => 1,
            RasterLayout::Rgb => 3,
            RasterLayout::Rgba => 4,
        }
    }

    /// Samples per pixel after normalization; alpha never survives.
    pub fn output_channels(self) -> usize {
        match self {
            RasterLayout::Grayscale => 1,
            RasterLayout::Rgb | RasterLayout::Rgba => 3,
        }
    }
}

/// 8-bit display raster: grayscale or RGB, never with alpha.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedImage {
    Gray(GrayImage),
    Rgb(RgbImage),
}

impl NormalizedImage {
    pub fn width(&self) -> u32 {
        match self {
            NormalizedImage::Gray(img) => img.width(),
            NormalizedImage::Rgb(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            NormalizedImage::Gray(img) => img.height(),
            NormalizedImage::Rgb(img) => img.height(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn channels(&self) -> u8 {
        match self {
            NormalizedImage::Gray(_) => 1,
            NormalizedImage::Rgb(_) => 3,
        }
    }

    pub fn pixel_rgb(&self, x: u32, y: u32) -> [u8; 3] {
        match self {
            NormalizedImage::Gray(img) => {
                let value = img.get_pixel(x, y).0[0];
                [value, value, value]
            }
            NormalizedImage::Rgb(img) => img.get_pixel(x, y).0,
        }
    }

    /// Area-averaged downscale to exactly `width` x `height`.
    pub fn thumbnail(&self, width: u32, height: u32) -> NormalizedImage {
        match self {
            NormalizedImage::Gray(img) => {
                NormalizedImage::Gray(imageops::thumbnail(img, width, height))
            }
            NormalizedImage::Rgb(img) => NormalizedImage::Rgb(imageops::thumbnail(img, width, height)),
        }
    }

    pub fn save_png(&self, path: &Path) -> Result<(), image::ImageError> {
        match self {
            NormalizedImage::Gray(img) => img.save_with_format(path, ImageFormat::Png),
            NormalizedImage::Rgb(img) => img.save_with_format(path, ImageFormat::Png),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RasterConverter;

impl RasterConverter {
    pub fn new() -> Self {
        Self
    }

    pub fn convert(&self, path: &Path) -> Result<NormalizedImage, ConversionFailure> {
        let decode_error = |err: &dyn std::fmt::Display| {
            ConversionFailure::Decode(format!("{}: {err}", path.display()))
        };

        let file = File::open(path).map_err(|err| decode_error(&err))?;
        let mut decoder = Decoder::new(BufReader::new(file))
            .map_err(|err| decode_error(&err))?
            .with_limits(Limits::unlimited());

        let (width, height) = decoder.dimensions().map_err(|err| decode_error(&err))?;
        let color = decoder.colortype().map_err(|err| decode_error(&err))?;
        let layout = RasterLayout::classify(color)?;
        if decoder.more_images() {
            return Err(ConversionFailure::UnsupportedLayout(
                "multi-page raster stack".to_string(),
            ));
        }

        let packed_bits = match color {
            ColorType::Gray(bits @ (1 | 2 | 4)) => Some(bits),
            _ => None,
        };
        let expected = width as usize * height as usize * layout.channels();
        let samples = match decoder.read_image().map_err(|err| decode_error(&err))? {
            DecodingResult::U8(data) => match packed_bits {
                Some(bits) => unpack_gray(&data, width, height, bits)?,
                None => {
                    check_len(data.len(), expected)?;
                    color_samples(&data, layout).collect()
                }
            },
            DecodingResult::U16(data) => stretch(&data, layout, expected, |v| v as f64)?,
            DecodingResult::U32(data) => stretch(&data, layout, expected, |v| v as f64)?,
            DecodingResult::U64(data) => stretch(&data, layout, expected, |v| v as f64)?,
            DecodingResult::I8(data) => stretch(&data, layout, expected, |v| v as f64)?,
            DecodingResult::I16(data) => stretch(&data, layout, expected, |v| v as f64)?,
            DecodingResult::I32(data) => stretch(&data, layout, expected, |v| v as f64)?,
            DecodingResult::I64(data) => stretch(&data, layout, expected, |v| v as f64)?,
            DecodingResult::F32(data) => stretch(&data, layout, expected, |v| v as f64)?,
            DecodingResult::F64(data) => stretch(&data, layout, expected, |v| v)?,
            #[allow(unreachable_patterns)]
            _ => {
                return Err(ConversionFailure::Decode(format!(
                    "{}: unsupported sample format",
                    path.display()
                )));
            }
        };

        let image = build_image(width, height, layout, samples).ok_or_else(|| {
            ConversionFailure::Decode(format!("{}: sample buffer size mismatch", path.display()))
        })?;
        tracing::debug!(
            path = %path.display(),
            ?layout,
            width,
            height,
            "raster normalized"
        );
        Ok(image)
    }
}

fn check_len(actual: usize, expected: usize) -> Result<(), ConversionFailure> {
    if actual != expected {
        return Err(ConversionFailure::Decode(format!(
            "expected {expected} samples, decoded {actual}"
        )));
    }
    Ok(())
}

fn color_samples<T: Copy>(samples: &[T], layout: RasterLayout) -> impl Iterator<Item = T> + '_ {
    let keep = layout.output_channels();
    samples
        .chunks_exact(layout.channels())
        .flat_map(move |pixel| pixel[..keep].iter().copied())
}

/// Expands sub-byte grayscale rows (MSB first, each row padded to a byte)
/// and scales the sample range onto 0..=255.
fn unpack_gray(
    data: &[u8],
    width: u32,
    height: u32,
    bits: u8,
) -> Result<Vec<u8>, ConversionFailure> {
    let width = width as usize;
    let depth = usize::from(bits);
    let row_bytes = (width * depth).div_ceil(8);
    check_len(data.len(), row_bytes * height as usize)?;
    if row_bytes == 0 {
        return Ok(Vec::new());
    }

    let max = (1u16 << depth) - 1;
    Ok(data
        .chunks_exact(row_bytes)
        .flat_map(|row| {
            (0..width).map(move |x| {
                let offset = x * depth;
                let value = (row[offset / 8] >> (8 - depth - offset % 8)) & max as u8;
                (u16::from(value) * 255 / max) as u8
            })
        })
        .collect())
}

/// Min-max stretch of wide samples onto 0..=255, over colour channels only.
fn stretch<T: Copy>(
    samples: &[T],
    layout: RasterLayout,
    expected: usize,
    to_f64: impl Fn(T) -> f64,
) -> Result<Vec<u8>, ConversionFailure> {
    check_len(samples.len(), expected)?;

    let (min, max) = color_samples(samples, layout)
        .map(&to_f64)
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    let span = max - min;
    if !span.is_finite() || span <= 0.0 {
        return Ok(vec![0; expected / layout.channels() * layout.output_channels()]);
    }

    Ok(color_samples(samples, layout)
        .map(|v| {
            let v = to_f64(v);
            if v.is_nan() {
                0
            } else {
                ((v - min) / span * 255.0).clamp(0.0, 255.0).round() as u8
            }
        })
        .collect())
}

fn build_image(
    width: u32,
    height: u32,
    layout: RasterLayout,
    samples: Vec<u8>,
) -> Option<NormalizedImage> {
    match layout {
        RasterLayout::Grayscale => {
            GrayImage::from_raw(width, height, samples).map(NormalizedImage::Gray)
        }
        RasterLayout::Rgb | RasterLayout::Rgba => {
            RgbImage::from_raw(width, height, samples).map(NormalizedImage::Rgb)
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn classify_supported_layouts() {
        assert_eq!(
            RasterLayout::classify(ColorType::Gray(8)).unwrap(),
            RasterLayout::Grayscale
        );
        assert_eq!(
            RasterLayout::classify(ColorType::Gray(16)).unwrap(),
            RasterLayout::Grayscale
        );
        assert_eq!(
            RasterLayout::classify(ColorType::RGB(8)).unwrap(),
            RasterLayout::Rgb
        );
        assert_eq!(
            RasterLayout::classify(ColorType::RGBA(8)).unwrap(),
            RasterLayout::Rgba
        );
    }

    #[test]
    fn classify_rejects_other_layouts() {
        assert_matches!(
            RasterLayout::classify(ColorType::GrayA(8)),
            Err(ConversionFailure::UnsupportedLayout(_))
        );
        assert_matches!(
            RasterLayout::classify(ColorType::CMYK(8)),
            Err(ConversionFailure::UnsupportedLayout(_))
        );
        assert_matches!(
            RasterLayout::classify(ColorType::Palette(8)),
            Err(ConversionFailure::UnsupportedLayout(_))
        );
        assert_matches!(
            RasterLayout::classify(ColorType::Gray(12)),
            Err(ConversionFailure::UnsupportedLayout(_))
        );
        assert_matches!(
            RasterLayout::classify(ColorType::RGB(4)),
            Err(ConversionFailure::UnsupportedLayout(_))
        );
        assert_matches!(
            RasterLayout::classify(ColorType::Multiband {
                bit_depth: 8,
                num_samples: 2
            }),
            Err(ConversionFailure::UnsupportedLayout(_))
        );
    }

    #[test]
    fn classify_packed_gray_and_multiband() {
        for bits in [1, 2, 4] {
            assert_eq!(
                RasterLayout::classify(ColorType::Gray(bits)).unwrap(),
                RasterLayout::Grayscale
            );
        }
        assert_eq!(
            RasterLayout::classify(ColorType::Multiband {
                bit_depth: 8,
                num_samples: 3
            })
            .unwrap(),
            RasterLayout::Rgb
        );
        assert_eq!(
            RasterLayout::classify(ColorType::Multiband {
                bit_depth: 16,
                num_samples: 4
            })
            .unwrap(),
            RasterLayout::Rgba
        );
    }

    #[test]
    fn unpack_bilevel_rows_are_byte_padded() {
        // 3 pixels per row, so each row is one byte with 5 padding bits.
        let data = [0b1010_0000, 0b0110_0000];
        let out = unpack_gray(&data, 3, 2, 1).unwrap();
        assert_eq!(out, vec![255, 0, 255, 0, 255, 255]);
    }

    #[test]
    fn unpack_nibbles_scale_to_full_range() {
        let data = [0x0F, 0x80];
        let out = unpack_gray(&data, 3, 1, 4).unwrap();
        assert_eq!(out, vec![0, 255, 136]);
    }

    #[test]
    fn unpack_short_buffer_is_decode_error() {
        assert_matches!(
            unpack_gray(&[0xFF], 9, 1, 1),
            Err(ConversionFailure::Decode(_))
        );
    }

    #[test]
    fn stretch_preserves_order() {
        let samples: Vec<u16> = vec![1000, 0, 65535, 30000];
        let out = stretch(&samples, RasterLayout::Grayscale, 4, |v| v as f64).unwrap();
        assert_eq!(out[1], 0);
        assert_eq!(out[2], 255);
        assert!(out[1] < out[0] && out[0] < out[3] && out[3] < out[2]);
    }

    #[test]
    fn stretch_ignores_alpha_range() {
        // Colour samples span 0..=100, alpha is saturated.
        let samples: Vec<u16> = vec![0, 50, 100, 65535, 100, 100, 100, 65535];
        let out = stretch(&samples, RasterLayout::Rgba, 8, |v| v as f64).unwrap();
        assert_eq!(out, vec![0, 128, 255, 255, 255, 255]);
    }

    #[test]
    fn stretch_constant_buffer_is_black() {
        let samples: Vec<f32> = vec![0.5; 6];
        let out = stretch(&samples, RasterLayout::Rgb, 6, |v| v as f64).unwrap();
        assert_eq!(out, vec![0; 6]);
    }

    #[test]
    fn length_mismatch_is_decode_error() {
        let samples: Vec<u16> = vec![1, 2, 3];
        assert_matches!(
            stretch(&samples, RasterLayout::Grayscale, 4, |v| v as f64),
            Err(ConversionFailure::Decode(_))
        );
    }
}
