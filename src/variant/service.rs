//! Variant service: the get-or-create pipeline.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        VariantService                           │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │                    get_variant()                        │    │
//! │  │  1. Resolve format     4. Derive cache key              │    │
//! │  │  2. Fetch original     5. Check, store if absent        │    │
//! │  │  3. Transform          6. Build public URL              │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │         │                  │                    │               │
//! │         ▼                  ▼                    ▼               │
//! │  ┌──────────────┐  ┌─────────────────┐  ┌──────────────────┐    │
//! │  │ OriginFetcher│  │ TransformEngine │  │  CheckedStore    │    │
//! │  └──────────────┘  └─────────────────┘  └──────────────────┘    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each stage's error ends the request unchanged. The service keeps no state
//! between requests; memoization lives entirely in the object store.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};

use super::format::{resolve_format, OutputFormat};
use super::key::CacheKey;
use super::origin::OriginFetcher;
use super::request::TransformRequest;
use super::store::{CheckedStore, ExistencePolicy};
use super::transform::TransformEngine;
use crate::error::VariantError;
use crate::io::{ObjectListing, ObjectStore, PutObject};

// =============================================================================
// Variant Request
// =============================================================================

/// A request for a transformed variant of an original image.
#[derive(Debug, Clone)]
pub struct VariantRequest {
    /// Identifier of the original (object key, may include an extension)
    pub image_id: String,

    /// Validated transformation parameters
    pub transform: TransformRequest,

    /// Content-negotiation signal, typically the `Accept` header
    pub accept: Option<String>,
}

impl VariantRequest {
    /// Create a request without a negotiation signal.
    pub fn new(image_id: impl Into<String>, transform: TransformRequest) -> Self {
        Self {
            image_id: image_id.into(),
            transform,
            accept: None,
        }
    }

    /// Attach a content-negotiation signal.
    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }
}

// =============================================================================
// Variant Response
// =============================================================================

/// Result of a successful variant request.
#[derive(Debug, Clone)]
pub struct VariantResponse {
    /// Public URL of the stored variant
    pub url: String,

    /// Key the variant is stored under
    pub key: CacheKey,

    /// Format the variant was encoded in
    pub format: OutputFormat,

    /// Whether the variant already existed in the store
    pub cache_hit: bool,
}

// =============================================================================
// Variant Service
// =============================================================================

/// Service that produces and memoizes image variants.
///
/// # Type Parameters
///
/// * `S` - The object store backing originals and variants
///
/// # Example
///
/// ```ignore
/// use variant_cache::variant::{TransformRequest, VariantRequest, VariantService};
///
/// let service = VariantService::new(store, "https://cdn.example.com");
///
/// let request = VariantRequest::new("photo.png", TransformRequest::new().with_width(200));
/// let response = service.get_variant(request).await?;
///
/// println!("{} (cache hit: {})", response.url, response.cache_hit);
/// ```
pub struct VariantService<S: ObjectStore> {
    store: Arc<S>,
    origin: OriginFetcher<S>,
    engine: TransformEngine,
    checked: CheckedStore<S>,
    public_base: String,
}

impl<S: ObjectStore + 'static> VariantService<S> {
    /// Create a service over `store`, publishing variants under `public_base`.
    ///
    /// `public_base` may be a bare domain (`cdn.example.com`, served over
    /// https) or a full URL.
    pub fn new(store: S, public_base: impl AsRef<str>) -> Self {
        Self::with_shared_store(Arc::new(store), public_base)
    }

    /// Create a service over a store shared with other components.
    pub fn with_shared_store(store: Arc<S>, public_base: impl AsRef<str>) -> Self {
        Self {
            origin: OriginFetcher::new(Arc::clone(&store)),
            checked: CheckedStore::new(Arc::clone(&store)),
            engine: TransformEngine::new(),
            public_base: normalize_public_base(public_base.as_ref()),
            store,
        }
    }

    /// Set how existence-check failures are treated.
    pub fn with_existence_policy(mut self, policy: ExistencePolicy) -> Self {
        self.checked = self.checked.with_policy(policy);
        self
    }

    /// Set the `max-age` written with each variant.
    pub fn with_variant_max_age(mut self, seconds: u32) -> Self {
        self.checked = self.checked.with_max_age(seconds);
        self
    }

    /// Get the underlying object store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Get the normalized public base URL.
    pub fn public_base(&self) -> &str {
        &self.public_base
    }

    /// Get the existence policy in effect.
    pub fn existence_policy(&self) -> ExistencePolicy {
        self.checked.policy()
    }

    /// Public URL of the object stored under `key`.
    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }

    /// Get or create a variant and return its public URL.
    ///
    /// Runs the pipeline `resolve format → fetch → transform → derive key →
    /// check and store → build URL`. Nothing is retried here.
    ///
    /// The output format is resolved before the original is fetched, so an
    /// unsupported `fm` is rejected without touching storage, even when the
    /// original is also missing.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` if the identifier is empty or a resized side would
    ///   exceed the dimension limit
    /// - `UnsupportedFormat` if the explicit format is not supported
    /// - `NotFound` if the original does not exist; nothing is written
    /// - `DecodeError` / `EncodeError` from the transformation engine
    /// - `StoreUnavailable` for storage failures
    pub async fn get_variant(
        &self,
        request: VariantRequest,
    ) -> Result<VariantResponse, VariantError> {
        let VariantRequest {
            image_id,
            transform,
            accept,
        } = request;

        if image_id.trim().is_empty() {
            return Err(VariantError::invalid("image identifier is missing"));
        }

        let format = resolve_format(transform.format.as_deref(), accept.as_deref())?;
        debug!(image_id = %image_id, format = %format, "Resolved output format");

        let original = self.origin.fetch(&image_id).await?;

        let data = self.transform(original, &transform, format).await?;

        let key = CacheKey::derive(&image_id, &transform, format);

        let outcome = self
            .checked
            .ensure(&key, data, format.content_type())
            .await?;

        let url = self.url_for(key.as_str());
        info!(
            image_id = %image_id,
            key = %key,
            cache_hit = outcome.is_hit(),
            "Variant ready"
        );

        Ok(VariantResponse {
            url,
            key,
            format,
            cache_hit: outcome.is_hit(),
        })
    }

    /// Run the transformation engine on the blocking pool.
    async fn transform(
        &self,
        original: Bytes,
        transform: &TransformRequest,
        format: OutputFormat,
    ) -> Result<Bytes, VariantError> {
        let engine = self.engine.clone();
        let transform = transform.clone();

        tokio::task::spawn_blocking(move || engine.apply(&original, &transform, format))
            .await
            .map_err(|e| VariantError::EncodeError {
                message: format!("transform task failed: {}", e),
            })?
    }

    /// Store an original image under `image_id`.
    ///
    /// Originals are written as-is, with no transformation and no cache
    /// directive.
    pub async fn upload_original(
        &self,
        image_id: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), VariantError> {
        if image_id.trim().is_empty() {
            return Err(VariantError::invalid("file name is missing"));
        }
        if data.is_empty() {
            return Err(VariantError::invalid("uploaded file is empty"));
        }

        let size = data.len();
        self.store
            .put(image_id, PutObject::new(data, content_type))
            .await?;

        info!(
            image_id = image_id,
            size = size,
            content_type = content_type,
            "Stored original"
        );
        Ok(())
    }

    /// List stored object keys, originals and variants alike.
    pub async fn list_images(
        &self,
        limit: u32,
        cursor: Option<&str>,
        prefix: Option<&str>,
    ) -> Result<ObjectListing, VariantError> {
        Ok(self.store.list(limit, cursor, prefix).await?)
    }
}

/// Normalize a configured public base into `scheme://host[/path]` form.
///
/// A value without a scheme is treated as an https domain; trailing slashes
/// are removed.
pub fn normalize_public_base(base: &str) -> String {
    let trimmed = base.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}
