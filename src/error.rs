use thiserror::Error;

/// Errors returned by the object store layer.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// No object exists under the key
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Error from S3 or S3-compatible storage
    #[error("S3 error: {0}")]
    S3(String),

    /// Network or connection error while streaming a body
    #[error("Connection error: {0}")]
    Connection(String),
}

impl StoreError {
    /// Whether this error means the key has no backing object.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Errors surfaced by the variant pipeline.
///
/// Every stage returns one of these unchanged; the HTTP layer decides how each
/// kind is presented to the client.
#[derive(Debug, Clone, Error)]
pub enum VariantError {
    /// Requested or negotiated format is outside the supported set
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// The original image does not exist
    #[error("Image not found: {image_id}")]
    NotFound { image_id: String },

    /// Original bytes are not a decodable image
    #[error("Failed to decode image: {message}")]
    DecodeError { message: String },

    /// Transformed image could not be encoded
    #[error("Failed to encode image: {message}")]
    EncodeError { message: String },

    /// Transport or storage failure on fetch, existence check or write
    #[error("Storage unavailable: {0}")]
    StoreUnavailable(StoreError),

    /// Missing identifier or structurally invalid parameters
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },
}

impl VariantError {
    /// Build an `InvalidRequest` error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        VariantError::InvalidRequest {
            reason: reason.into(),
        }
    }
}

impl From<StoreError> for VariantError {
    fn from(err: StoreError) -> Self {
        VariantError::StoreUnavailable(err)
    }
}
