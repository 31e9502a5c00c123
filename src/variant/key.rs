//! Cache key derivation for image variants.
//!
//! A variant key is `<stem><params>.<ext>` where:
//!
//! - `stem` is the image identifier without its final extension
//! - `params` is the canonical query string of the transformation
//! - `ext` is the resolved output format
//!
//! Every character outside `[A-Za-z0-9_.-]` is replaced with `_`, so keys are
//! safe to use directly as object store keys and URL path segments.
//!
//! Parameters are sorted by name before serialization. Two requests with the
//! same parameters in a different order map to the same key.

use std::fmt;

use super::format::OutputFormat;
use super::request::TransformRequest;

/// Key of a stored variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a variant of `image_id`.
    pub fn derive(image_id: &str, request: &TransformRequest, format: OutputFormat) -> Self {
        let stem = sanitize(strip_extension(image_id));
        let params = sanitize(&canonical_params(request));
        CacheKey(format!("{}{}.{}", stem, params, format.extension()))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the key, returning the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Remove the final extension from an identifier.
///
/// Only the last path segment is considered, and a leading dot (`.hidden`)
/// is not treated as an extension separator.
pub fn strip_extension(image_id: &str) -> &str {
    let name_start = image_id.rfind('/').map(|i| i + 1).unwrap_or(0);
    match image_id[name_start..].rfind('.') {
        Some(0) | None => image_id,
        Some(idx) => &image_id[..name_start + idx],
    }
}

/// Serialize the transformation parameters in canonical form.
///
/// The format is omitted since it is already the key's extension. Quality is
/// always present, so every variant key carries a parameter segment and can
/// never equal the bare name of an original.
pub fn canonical_params(request: &TransformRequest) -> String {
    let mut pairs: Vec<(&'static str, String)> = Vec::new();

    if let Some(width) = request.width {
        pairs.push(("w", width.to_string()));
    }
    if let Some(height) = request.height {
        pairs.push(("h", height.to_string()));
    }
    pairs.push(("q", request.quality.to_string()));
    if request.grayscale {
        pairs.push(("gray", "1".to_string()));
    }

    serialize_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())))
}

/// Join name/value pairs as an URL-encoded query string, sorted by name.
///
/// Order of the input does not matter.
pub fn serialize_pairs<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut sorted: Vec<(&str, &str)> = pairs.into_iter().collect();
    sorted.sort_unstable();

    sorted
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Replace every character outside `[A-Za-z0-9_.-]` with `_`.
pub fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if is_key_safe(c) { c } else { '_' })
        .collect()
}

/// Whether a character may appear in a cache key.
#[inline]
pub fn is_key_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}
