//! Image transformation engine.
//!
//! Applies the requested operations to an original image and encodes the
//! result:
//!
//! 1. **Resize** when `w` and/or `h` is given. With both, the image covers the
//!    box and is centre-cropped to it. With one, the other side scales
//!    proportionally.
//! 2. **Grayscale** when `gray=1`.
//! 3. **Encode** to the resolved format. Quality applies to JPEG. PNG and
//!    WebP are written lossless and ignore it.
//!
//! The engine is synchronous and CPU-bound; async callers should run it on the
//! blocking pool.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};

use super::format::OutputFormat;
use super::request::{clamp_quality, TransformRequest, MAX_DIMENSION};
use crate::error::VariantError;

/// Resampling filter used for every resize.
const RESIZE_FILTER: FilterType = FilterType::Lanczos3;

/// Stateless transformation engine.
///
/// # Example
///
/// ```ignore
/// use variant_cache::variant::{OutputFormat, TransformEngine, TransformRequest};
///
/// let engine = TransformEngine::new();
/// let request = TransformRequest::new().with_width(200).with_quality(90);
///
/// let output = engine.apply(&original_png, &request, OutputFormat::Png)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransformEngine {}

impl TransformEngine {
    /// Create a new engine.
    pub fn new() -> Self {
        Self {}
    }

    /// Decode `source`, apply `request`, and encode as `format`.
    ///
    /// # Errors
    ///
    /// - `DecodeError` if `source` is not a decodable image
    /// - `InvalidRequest` if a side derived from the aspect ratio would
    ///   exceed [`MAX_DIMENSION`]
    /// - `EncodeError` if the result cannot be written in `format`
    pub fn apply(
        &self,
        source: &[u8],
        request: &TransformRequest,
        format: OutputFormat,
    ) -> Result<Bytes, VariantError> {
        let mut img = decode(source)?;

        if request.has_resize() {
            img = resize(&img, request.width, request.height)?;
        }

        if request.grayscale {
            img = img.grayscale();
        }

        encode(&img, format, request.quality)
    }
}

fn decode_error(err: impl std::fmt::Display) -> VariantError {
    VariantError::DecodeError {
        message: err.to_string(),
    }
}

fn encode_error(err: impl std::fmt::Display) -> VariantError {
    VariantError::EncodeError {
        message: err.to_string(),
    }
}

fn decode(source: &[u8]) -> Result<DynamicImage, VariantError> {
    ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(decode_error)?
        .decode()
        .map_err(decode_error)
}

fn resize(
    img: &DynamicImage,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<DynamicImage, VariantError> {
    match (width, height) {
        (Some(w), Some(h)) => Ok(fill(img, w, h)),
        _ => {
            let (w, h) = target_dimensions((img.width(), img.height()), width, height);
            if w > MAX_DIMENSION || h > MAX_DIMENSION {
                return Err(VariantError::invalid(format!(
                    "resize to {}x{} exceeds the {} pixel limit",
                    w, h, MAX_DIMENSION
                )));
            }
            Ok(img.resize_exact(w, h, RESIZE_FILTER))
        }
    }
}

/// Cover a `width` x `height` box and centre-crop to it.
///
/// The crop happens on the source first, so nothing larger than the source or
/// the box is ever allocated, whatever the aspect ratios.
fn fill(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    let (x, y, crop_w, crop_h) = fill_crop((img.width(), img.height()), width, height);
    img.crop_imm(x, y, crop_w, crop_h)
        .resize_exact(width, height, RESIZE_FILTER)
}

/// Source region `(x, y, width, height)` with the aspect ratio of the target box.
fn fill_crop(source: (u32, u32), width: u32, height: u32) -> (u32, u32, u32, u32) {
    let (src_w, src_h) = source;
    let (sw, sh, w, h) = (src_w as u64, src_h as u64, width as u64, height as u64);

    let (crop_w, crop_h) = if sw * h > sh * w {
        // Source is wider than the box
        (((sh * w + h / 2) / h).clamp(1, sw), sh)
    } else {
        (sw, ((sw * h + w / 2) / w).clamp(1, sh))
    };

    let (crop_w, crop_h) = (crop_w as u32, crop_h as u32);
    ((src_w - crop_w) / 2, (src_h - crop_h) / 2, crop_w, crop_h)
}

/// Compute the output size for a resize request.
///
/// A missing side is derived from the source aspect ratio, rounded to the
/// nearest pixel and never less than 1.
pub fn target_dimensions(
    source: (u32, u32),
    width: Option<u32>,
    height: Option<u32>,
) -> (u32, u32) {
    let (src_w, src_h) = source;
    match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, scale_side(src_h, w, src_w)),
        (None, Some(h)) => (scale_side(src_w, h, src_h), h),
        (None, None) => source,
    }
}

fn scale_side(other: u32, target: u32, base: u32) -> u32 {
    if base == 0 {
        return other.max(1);
    }
    let scaled = (other as f64 * target as f64 / base as f64).round() as u32;
    scaled.max(1)
}

fn encode(img: &DynamicImage, format: OutputFormat, quality: u8) -> Result<Bytes, VariantError> {
    let mut output = Vec::new();

    match format {
        OutputFormat::Jpg | OutputFormat::Jpeg => {
            // JPEG has no alpha channel
            let flat = if img.color().has_color() {
                DynamicImage::ImageRgb8(img.to_rgb8())
            } else {
                DynamicImage::ImageLuma8(img.to_luma8())
            };
            let encoder = JpegEncoder::new_with_quality(&mut output, clamp_quality(quality));
            flat.write_with_encoder(encoder).map_err(encode_error)?;
        }
        OutputFormat::Png => {
            let encoder = PngEncoder::new(&mut output);
            img.write_with_encoder(encoder).map_err(encode_error)?;
        }
        OutputFormat::WebP => {
            let normalized = if img.color().has_alpha() {
                DynamicImage::ImageRgba8(img.to_rgba8())
            } else {
                DynamicImage::ImageRgb8(img.to_rgb8())
            };
            let encoder = WebPEncoder::new_lossless(&mut output);
            normalized.write_with_encoder(encoder).map_err(encode_error)?;
        }
    }

    Ok(Bytes::from(output))
}
