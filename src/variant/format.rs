//! Output format resolution.
//!
//! An explicit `fm` parameter wins. Without one, the client's `Accept` header
//! picks the encoding: WebP when advertised, then the first literally matched
//! JPEG spelling, then PNG as the universal default.

use std::fmt;
use std::str::FromStr;

use crate::error::VariantError;

/// Format used when negotiation finds nothing better.
pub const DEFAULT_FORMAT: OutputFormat = OutputFormat::Png;

/// Output encodings a variant can be produced in.
///
/// `Jpg` and `Jpeg` encode identically but are kept apart because the
/// spelling ends up as the variant's file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    WebP,
    Jpg,
    Jpeg,
    Png,
}

impl OutputFormat {
    /// Every supported format, in negotiation preference order.
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::WebP,
        OutputFormat::Jpg,
        OutputFormat::Jpeg,
        OutputFormat::Png,
    ];

    /// File extension used in variant keys.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::WebP => "webp",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
        }
    }

    /// MIME type stored alongside the variant.
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::WebP => "image/webp",
            OutputFormat::Jpg | OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    /// Whether the quality parameter changes the encoded output.
    pub fn is_lossy(&self) -> bool {
        matches!(self, OutputFormat::Jpg | OutputFormat::Jpeg)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = VariantError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lowered = value.trim().to_ascii_lowercase();
        OutputFormat::ALL
            .into_iter()
            .find(|f| f.extension() == lowered)
            .ok_or_else(|| VariantError::UnsupportedFormat {
                format: value.to_string(),
            })
    }
}

/// Pick a format from a content-negotiation signal such as an `Accept` header.
///
/// Always returns a member of [`OutputFormat::ALL`]; an absent or unrecognised
/// signal yields [`DEFAULT_FORMAT`].
pub fn negotiate_format(accept: Option<&str>) -> OutputFormat {
    let accept = accept.unwrap_or("");

    if accept.contains("image/webp") {
        OutputFormat::WebP
    } else if accept.contains("image/jpg") {
        OutputFormat::Jpg
    } else if accept.contains("image/jpeg") {
        OutputFormat::Jpeg
    } else {
        DEFAULT_FORMAT
    }
}

/// Resolve the output format for a request.
///
/// # Arguments
///
/// * `requested` - Explicit format from the request, if any
/// * `accept` - Content-negotiation signal used when no format is requested
///
/// # Errors
///
/// Returns `UnsupportedFormat` when `requested` is present but not one of
/// webp, jpg, jpeg or png (case-insensitive).
pub fn resolve_format(
    requested: Option<&str>,
    accept: Option<&str>,
) -> Result<OutputFormat, VariantError> {
    match requested {
        Some(format) => format.parse(),
        None => Ok(negotiate_format(accept)),
    }
}
