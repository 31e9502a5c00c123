//! # Variant Cache
//!
//! An on-demand image variant service backed by S3-compatible object storage.
//!
//! A client asks for an image plus transformation parameters (output format,
//! quality, width, height, grayscale). The service derives a deterministic
//! key for that combination, computes and stores the variant the first time
//! it is requested, and returns the public URL where it can be fetched.
//! Later requests for the same combination skip the write and return the
//! same URL.
//!
//! ## Features
//!
//! - **Deterministic keys**: equivalent parameter sets map to one stored object
//! - **Format negotiation**: explicit `fm` or the `Accept` header (WebP, JPEG, PNG)
//! - **Transformations**: resize (fill or proportional), grayscale, lossy quality
//! - **Check-then-store**: variants are written at most once per key under normal operation
//! - **Uploads and listing**: originals can be uploaded and browsed
//!
//! ## Architecture
//!
//! - [`io`] - Object store abstraction and the S3 implementation
//! - [`variant`] - Key derivation, transformation and the variant pipeline
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//! - [`error`] - Error types shared across layers
//!
//! ## Example
//!
//! ```rust,no_run
//! use variant_cache::{create_router, create_s3_client, RouterConfig, S3ObjectStore, VariantService};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = create_s3_client(None, "us-east-1").await;
//!     let store = S3ObjectStore::new(client, "my-images".to_string());
//!     let service = VariantService::new(store, "d111.cloudfront.net");
//!
//!     let router = create_router(service, RouterConfig::new());
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:4000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod io;
pub mod server;
pub mod variant;

// Re-export commonly used types
pub use config::Config;
pub use error::{StoreError, VariantError};
pub use io::{
    create_s3_client, ObjectHead, ObjectListing, ObjectStore, PutObject, S3ObjectStore,
    StoredObject,
};
pub use server::{create_router, AppState, RouterConfig};
pub use variant::{
    resolve_format, CacheKey, ExistencePolicy, OutputFormat, TransformEngine, TransformRequest,
    VariantRequest, VariantResponse, VariantService,
};
