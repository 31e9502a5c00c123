//! Variant Cache - on-demand image variants stored in S3.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use variant_cache::{
    config::Config,
    io::{create_s3_client, S3ObjectStore},
    server::{create_router, RouterConfig},
    variant::{ExistencePolicy, VariantService},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("variant-cache v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  S3 bucket: {}", config.s3_bucket);
    if let Some(ref endpoint) = config.s3_endpoint {
        info!("  S3 endpoint: {}", endpoint);
    }
    info!("  S3 region: {}", config.s3_region);
    info!("  Public base: {}", config.public_base());
    info!("  Variant max-age: {}s", config.variant_max_age);
    info!("  Upload limit: {} bytes", config.max_upload_bytes);

    match config.existence_policy {
        ExistencePolicy::FailClosed => info!("  Existence policy: {}", config.existence_policy),
        ExistencePolicy::FailOpen => {
            warn!("  Existence policy: {}", config.existence_policy);
            warn!("        Variants are rewritten whenever the existence check fails");
        }
    }

    let s3_client = create_s3_client(config.s3_endpoint.as_deref(), &config.s3_region).await;

    info!("Connecting to S3...");
    if let Err(e) = test_s3_connection(&s3_client, &config.s3_bucket).await {
        error!("  Failed to connect to S3: {}", e);
        error!("  Please check:");
        error!("    - Your AWS credentials are configured correctly");
        error!("    - The bucket '{}' exists and is accessible", config.s3_bucket);
        error!("    - The S3 endpoint is correct (if using MinIO/custom S3)");
        return ExitCode::FAILURE;
    }
    info!("  Connected successfully");

    let store = S3ObjectStore::new(s3_client, config.s3_bucket.clone());
    let variant_service = VariantService::new(store, config.public_base())
        .with_existence_policy(config.existence_policy)
        .with_variant_max_age(config.variant_max_age);

    let router = create_router(variant_service, build_router_config(&config));

    let addr = config.bind_address();
    info!("Server listening on: http://{}", addr);
    info!("  curl http://{}/health", addr);
    info!("  curl 'http://{}/pictures/<image>?w=200&fm=webp'", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Check that the bucket is reachable with the configured credentials.
async fn test_s3_connection(client: &aws_sdk_s3::Client, bucket: &str) -> Result<(), String> {
    client
        .list_objects_v2()
        .bucket(bucket)
        .max_keys(1)
        .send()
        .await
        .map_err(|e| format!("{}", aws_sdk_s3::error::DisplayErrorContext(&e)))?;

    Ok(())
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "variant_cache=debug,tower_http=debug"
    } else {
        "variant_cache=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_max_upload_bytes(config.max_upload_bytes)
        .with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}
