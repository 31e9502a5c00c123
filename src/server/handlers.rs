//! HTTP request handlers for the variant API.
//!
//! # Endpoints
//!
//! - `GET /pictures/{image_name}` - Get or create a variant, returns its URL
//! - `GET /pictures` - List stored images
//! - `POST /upload` - Upload an original image (multipart field `image`)
//! - `GET /health` - Health check endpoint

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{StoreError, VariantError};
use crate::io::ObjectStore;
use crate::variant::{TransformRequest, VariantRequest, VariantService};

/// Response header reporting whether the variant already existed.
pub const CACHE_HIT_HEADER: HeaderName = HeaderName::from_static("x-variant-cache-hit");

/// Response header carrying the variant's storage key.
pub const VARIANT_KEY_HEADER: HeaderName = HeaderName::from_static("x-variant-key");

/// Multipart field holding the uploaded file.
pub const UPLOAD_FIELD: &str = "image";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the variant service.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<S: ObjectStore> {
    /// The variant service for processing requests
    pub variant_service: Arc<VariantService<S>>,
}

impl<S: ObjectStore> AppState<S> {
    /// Create a new application state with the given variant service.
    pub fn new(variant_service: VariantService<S>) -> Self {
        Self {
            variant_service: Arc::new(variant_service),
        }
    }
}

impl<S: ObjectStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            variant_service: Arc::clone(&self.variant_service),
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query parameters for the image list endpoint.
#[derive(Debug, Deserialize)]
pub struct ListQueryParams {
    /// Maximum number of keys to return (default: 100, max: 1000)
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Continuation token for pagination (from previous response)
    #[serde(default)]
    pub cursor: Option<String>,

    /// Only list keys starting with this prefix
    #[serde(default)]
    pub prefix: Option<String>,
}

fn default_limit() -> u32 {
    100
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "invalid_request")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Response from the variant endpoint.
#[derive(Debug, Serialize)]
pub struct VariantUrlResponse {
    /// Public URL of the stored variant
    pub url: String,
}

/// Response from the image list endpoint.
#[derive(Debug, Serialize)]
pub struct ImagesResponse {
    /// Stored object keys
    pub images: Vec<String>,

    /// Continuation token for next page (None if no more pages)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Response from the upload endpoint.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Key the original was stored under
    pub key: String,

    /// Size of the stored original in bytes
    pub size: usize,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert VariantError to HTTP response.
///
/// Errors are logged by severity:
/// - 5xx at ERROR
/// - 404 at DEBUG (common and expected)
/// - other 4xx at WARN
impl IntoResponse for VariantError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            VariantError::InvalidRequest { .. } => (StatusCode::BAD_REQUEST, "invalid_request"),
            VariantError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            VariantError::UnsupportedFormat { .. } => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_format")
            }
            VariantError::DecodeError { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "decode_error"),
            VariantError::EncodeError { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "encode_error")
            }
            VariantError::StoreUnavailable(StoreError::Connection(_)) => {
                (StatusCode::BAD_GATEWAY, "connection_error")
            }
            VariantError::StoreUnavailable(_) => (StatusCode::BAD_GATEWAY, "storage_error"),
        };
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);

        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle variant requests.
///
/// # Endpoint
///
/// `GET /pictures/{image_name}`
///
/// # Query Parameters
///
/// - `fm`: Output format (webp, jpg, jpeg, png); negotiated from `Accept` if absent
/// - `q`: Quality 1-100 (default: 85)
/// - `w`, `h`: Target width / height in pixels
/// - `gray`: `1` for grayscale
///
/// # Response
///
/// `200 OK` with JSON body `{"url": "https://cdn.example.com/photoq_85_w_200.webp"}`.
///
/// # Headers
///
/// - `Cache-Control: no-store` (the URL changes if transformation rules change)
/// - `X-Variant-Cache-Hit: true|false`
/// - `X-Variant-Key: <cache key>`
///
/// # Errors
///
/// - `400 Bad Request`: Invalid parameters
/// - `404 Not Found`: Original image not found
/// - `415 Unsupported Media Type`: Requested format not supported
/// - `422 Unprocessable Entity`: Original is not a decodable image
/// - `502 Bad Gateway`: Storage failure
pub async fn variant_handler<S: ObjectStore + 'static>(
    State(state): State<AppState<S>>,
    Path(image_name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, VariantError> {
    debug!(image_name = %image_name, "Variant requested");

    let transform = TransformRequest::from_query(&params)?;

    let mut request = VariantRequest::new(image_name, transform);
    if let Some(accept) = headers
        .get(header::ACCEPT)
        .and_then(|h| h.to_str().ok())
    {
        request = request.with_accept(accept);
    }

    let response = state.variant_service.get_variant(request).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CACHE_CONTROL, "no-store".to_string()),
            (CACHE_HIT_HEADER, response.cache_hit.to_string()),
            (VARIANT_KEY_HEADER, response.key.into_string()),
        ],
        Json(VariantUrlResponse { url: response.url }),
    )
        .into_response())
}

/// Handle variant requests with an empty image name.
///
/// `GET /pictures/` always fails with `400 Bad Request`.
pub async fn missing_image_handler() -> VariantError {
    VariantError::invalid("image path is missing")
}

/// Handle image list requests.
///
/// # Endpoint
///
/// `GET /pictures`
///
/// # Query Parameters
///
/// - `limit`: Maximum number of keys to return (default: 100, max: 1000)
/// - `cursor`: Continuation token for pagination (from previous response)
/// - `prefix`: Only list keys starting with this prefix
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "images": ["photo.png", "photoq_90_w_200.webp"],
///   "next_cursor": "continuation_token_or_null"
/// }
/// ```
pub async fn list_handler<S: ObjectStore + 'static>(
    State(state): State<AppState<S>>,
    Query(query): Query<ListQueryParams>,
) -> Result<Json<ImagesResponse>, VariantError> {
    let limit = query.limit.clamp(1, 1000);

    let listing = state
        .variant_service
        .list_images(limit, query.cursor.as_deref(), query.prefix.as_deref())
        .await?;

    Ok(Json(ImagesResponse {
        images: listing.keys,
        next_cursor: listing.next_cursor,
    }))
}

/// Handle original image uploads.
///
/// # Endpoint
///
/// `POST /upload` with a `multipart/form-data` body whose `image` field holds
/// the file. The file name becomes the image identifier and the part's
/// content type is stored with it.
///
/// # Response
///
/// `201 Created` with JSON body `{"key": "photo.png", "size": 1234}`.
///
/// # Errors
///
/// - `400 Bad Request`: No `image` field, no file name, or empty file
/// - `502 Bad Gateway`: Storage failure
pub async fn upload_handler<S: ObjectStore + 'static>(
    State(state): State<AppState<S>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), VariantError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| VariantError::invalid(format!("malformed multipart body: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| VariantError::invalid("uploaded file has no name"))?;
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let data = field
            .bytes()
            .await
            .map_err(|e| VariantError::invalid(format!("failed to read upload: {}", e)))?;
        let size = data.len();

        state
            .variant_service
            .upload_original(&file_name, data, &content_type)
            .await?;

        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                key: file_name,
                size,
            }),
        ));
    }

    Err(VariantError::invalid("no image file provided"))
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
