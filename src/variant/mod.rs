//! Variant pipeline.
//!
//! Turns an original image plus transformation parameters into a stored,
//! publicly addressable variant.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │  VariantRequest
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │             VariantService              │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │ format / key │  │ TransformEngine │  │
//! │  │  (pure)      │  │ (decode → ops → │  │
//! │  │              │  │   encode)       │  │
//! │  └──────────────┘  └─────────────────┘  │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │OriginFetcher │  │  CheckedStore   │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │               ObjectStore               │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`resolve_format`]: explicit `fm` or `Accept` negotiation → [`OutputFormat`]
//! - [`TransformRequest`]: validated `fm`, `q`, `w`, `h`, `gray` parameters
//! - [`CacheKey`]: deterministic, storage-safe variant key
//! - [`TransformEngine`]: resize, grayscale and encode
//! - [`OriginFetcher`]: reads originals
//! - [`CheckedStore`]: HEAD-then-PUT of variants
//! - [`VariantService`]: the end-to-end get-or-create flow
//!
//! # Example
//!
//! ```
//! use variant_cache::variant::{CacheKey, OutputFormat, TransformRequest};
//!
//! let request = TransformRequest::new().with_width(200).with_quality(90);
//! let key = CacheKey::derive("photo.png", &request, OutputFormat::Png);
//!
//! assert_eq!(key.as_str(), "photoq_90_w_200.png");
//! ```

mod format;
mod key;
mod origin;
mod request;
mod service;
mod store;
mod transform;

pub use format::{negotiate_format, resolve_format, OutputFormat, DEFAULT_FORMAT};
pub use key::{canonical_params, is_key_safe, sanitize, serialize_pairs, strip_extension, CacheKey};
pub use origin::OriginFetcher;
pub use request::{
    clamp_quality, is_valid_quality, TransformRequest, DEFAULT_QUALITY, MAX_DIMENSION,
    MAX_QUALITY, MIN_QUALITY,
};
pub use service::{normalize_public_base, VariantRequest, VariantResponse, VariantService};
pub use store::{
    cache_directive, CheckedStore, ExistencePolicy, StoreOutcome, DEFAULT_VARIANT_MAX_AGE,
};
pub use transform::{target_dimensions, TransformEngine};
