//! HTTP server layer.
//!
//! Thin plumbing around [`crate::variant::VariantService`]: query parsing,
//! multipart uploads, listing, and error-to-status mapping.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │   GET /pictures/{image_name}   GET /pictures   POST /upload     │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌────────────────────────────┐   │
//! │  │        handlers          │  │          routes            │   │
//! │  │ (requests, error mapping)│  │ (CORS, tracing, limits)    │   │
//! │  └──────────────────────────┘  └────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    health_handler, list_handler, missing_image_handler, upload_handler, variant_handler,
    AppState, ErrorResponse, HealthResponse, ImagesResponse, ListQueryParams, UploadResponse,
    VariantUrlResponse, CACHE_HIT_HEADER, UPLOAD_FIELD, VARIANT_KEY_HEADER,
};
pub use routes::{create_router, RouterConfig, DEFAULT_MAX_UPLOAD_BYTES};
