//! Configuration management for the variant service.
//!
//! Options come from command-line arguments (clap) with environment variable
//! fallbacks and defaults for everything optional.
//!
//! # Environment Variables
//!
//! - `VC_HOST` - Server bind address (default: 0.0.0.0)
//! - `VC_PORT` - Server port (default: 4000)
//! - `VC_S3_BUCKET` - S3 bucket holding originals and variants (required)
//! - `VC_S3_ENDPOINT` - Custom S3 endpoint for S3-compatible services
//! - `VC_S3_REGION` - AWS region (default: us-east-1)
//! - `VC_PUBLIC_BASE_URL` - Domain or URL variants are served from (required)
//! - `VC_VARIANT_MAX_AGE` - `max-age` stored with variants (default: 31536000)
//! - `VC_EXISTENCE_POLICY` - `fail-closed` (default) or `fail-open`
//! - `VC_MAX_UPLOAD_BYTES` - Upload size limit (default: 20 MiB)
//! - `VC_CORS_ORIGINS` - Allowed CORS origins, comma-separated

use clap::Parser;

use crate::server::DEFAULT_MAX_UPLOAD_BYTES;
use crate::variant::{normalize_public_base, ExistencePolicy, DEFAULT_VARIANT_MAX_AGE};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 4000;

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

// =============================================================================
// CLI Arguments
// =============================================================================

/// Variant Cache - serves transformed images from S3.
///
/// Each variant is computed on first request, stored next to its original
/// under a deterministic key, and served from the public base URL afterwards.
#[derive(Parser, Debug, Clone)]
#[command(name = "variant-cache")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "VC_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "VC_PORT")]
    pub port: u16,

    // =========================================================================
    // S3 Configuration
    // =========================================================================
    /// S3 bucket holding originals and variants.
    #[arg(long, env = "VC_S3_BUCKET")]
    pub s3_bucket: String,

    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    #[arg(long, env = "VC_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "VC_S3_REGION")]
    pub s3_region: String,

    // =========================================================================
    // Variant Configuration
    // =========================================================================
    /// Domain or URL that serves the bucket (e.g. a CDN distribution).
    ///
    /// A bare domain is served over https.
    #[arg(long, env = "VC_PUBLIC_BASE_URL")]
    pub public_base_url: String,

    /// `Cache-Control` max-age stored with each variant, in seconds.
    #[arg(long, default_value_t = DEFAULT_VARIANT_MAX_AGE, env = "VC_VARIANT_MAX_AGE")]
    pub variant_max_age: u32,

    /// How a failed existence check is treated: `fail-closed` returns a
    /// storage error, `fail-open` writes the variant anyway.
    #[arg(long, default_value_t = ExistencePolicy::FailClosed, env = "VC_EXISTENCE_POLICY")]
    pub existence_policy: ExistencePolicy,

    // =========================================================================
    // HTTP Configuration
    // =========================================================================
    /// Maximum upload size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES, env = "VC_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: usize,

    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "VC_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.s3_bucket.trim().is_empty() {
            return Err("S3 bucket name is required. Set --s3-bucket or VC_S3_BUCKET".to_string());
        }

        if self.public_base_url.trim().is_empty() {
            return Err(
                "Public base URL is required. Set --public-base-url or VC_PUBLIC_BASE_URL"
                    .to_string(),
            );
        }

        let base = self.public_base();
        match url::Url::parse(&base) {
            Ok(url) if url.host_str().is_some() => {}
            Ok(_) => return Err(format!("Public base URL '{}' has no host", base)),
            Err(e) => return Err(format!("Invalid public base URL '{}': {}", base, e)),
        }

        if let Some(ref endpoint) = self.s3_endpoint {
            url::Url::parse(endpoint)
                .map_err(|e| format!("Invalid S3 endpoint '{}': {}", endpoint, e))?;
        }

        if self.max_upload_bytes == 0 {
            return Err("max_upload_bytes must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the normalized public base URL.
    pub fn public_base(&self) -> String {
        normalize_public_base(&self.public_base_url)
    }
}

// =============================================================================
// Tests
// =============================================================================
