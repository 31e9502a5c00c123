//! Transformation parameters parsed from the request query.

use std::collections::HashMap;

use crate::error::VariantError;

/// Default output quality (1-100).
pub const DEFAULT_QUALITY: u8 = 85;

/// Minimum allowed quality.
pub const MIN_QUALITY: u8 = 1;

/// Maximum allowed quality.
pub const MAX_QUALITY: u8 = 100;

/// Largest width or height a client may ask for.
pub const MAX_DIMENSION: u32 = 10_000;

/// Validated transformation parameters.
///
/// Built once at the HTTP boundary from the raw query map; nothing downstream
/// looks at the raw strings again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformRequest {
    /// Explicitly requested output format (`fm`), not yet validated
    pub format: Option<String>,

    /// Output quality (`q`), 1-100
    pub quality: u8,

    /// Target width in pixels (`w`)
    pub width: Option<u32>,

    /// Target height in pixels (`h`)
    pub height: Option<u32>,

    /// Convert to grayscale (`gray=1`)
    pub grayscale: bool,
}

impl Default for TransformRequest {
    fn default() -> Self {
        Self {
            format: None,
            quality: DEFAULT_QUALITY,
            width: None,
            height: None,
            grayscale: false,
        }
    }
}

impl TransformRequest {
    /// Create a request with no transformations and default quality.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the query parameters of a variant request.
    ///
    /// - `fm`: kept as given; an empty value counts as absent
    /// - `q`: integer 1-100, anything else falls back to [`DEFAULT_QUALITY`]
    /// - `w`, `h`: positive integers, non-numeric or zero values are ignored
    /// - `gray`: only the literal `"1"` enables grayscale
    ///
    /// Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` when a dimension exceeds [`MAX_DIMENSION`].
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self, VariantError> {
        let format = params
            .get("fm")
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(str::to_string);

        let quality = params
            .get("q")
            .and_then(|q| q.trim().parse::<u8>().ok())
            .filter(|q| is_valid_quality(*q))
            .unwrap_or(DEFAULT_QUALITY);

        let width = parse_dimension(params.get("w"), "w")?;
        let height = parse_dimension(params.get("h"), "h")?;

        let grayscale = params.get("gray").map(|g| g == "1").unwrap_or(false);

        Ok(Self {
            format,
            quality,
            width,
            height,
            grayscale,
        })
    }

    /// Set the explicit output format.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Set the output quality, clamped to 1-100.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = clamp_quality(quality);
        self
    }

    /// Set the target width.
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    /// Set the target height.
    pub fn with_height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    /// Enable grayscale conversion.
    pub fn with_grayscale(mut self) -> Self {
        self.grayscale = true;
        self
    }

    /// Whether a resize was requested.
    pub fn has_resize(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }
}

fn parse_dimension(raw: Option<&String>, name: &str) -> Result<Option<u32>, VariantError> {
    let value = match raw.and_then(|v| v.trim().parse::<u64>().ok()) {
        Some(0) | None => return Ok(None),
        Some(v) => v,
    };

    if value > MAX_DIMENSION as u64 {
        return Err(VariantError::invalid(format!(
            "{} must be at most {} (got {})",
            name, MAX_DIMENSION, value
        )));
    }

    Ok(Some(value as u32))
}

/// Returns `true` if quality is in the valid range (1-100).
#[inline]
pub fn is_valid_quality(quality: u8) -> bool {
    (MIN_QUALITY..=MAX_QUALITY).contains(&quality)
}

/// Clamp quality to the valid range.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_QUALITY, MAX_QUALITY)
}
