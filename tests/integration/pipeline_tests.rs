//! Pipeline integration tests.
//!
//! Tests verify:
//! - Key derivation and public URL for a first request
//! - Idempotency of repeated and concurrent identical requests
//! - Failures that must not write anything
//! - Existence-check policies

use std::collections::HashMap;
use std::sync::Arc;

use variant_cache::error::VariantError;
use variant_cache::io::ObjectStore;
use variant_cache::variant::{
    ExistencePolicy, OutputFormat, TransformEngine, TransformRequest, VariantRequest,
    DEFAULT_VARIANT_MAX_AGE,
};

use super::test_utils::{
    create_test_jpeg, create_test_png, image_dimensions, is_valid_jpeg, is_valid_png,
    is_valid_webp, service_for, store_with_photo, MockObjectStore,
};

fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// =============================================================================
// First Request
// =============================================================================

#[tokio::test]
async fn test_first_request_writes_variant() {
    let store = store_with_photo();
    let service = service_for(&store);

    let transform = TransformRequest::from_query(&query(&[("w", "200"), ("q", "90")])).unwrap();
    let response = service
        .get_variant(VariantRequest::new("photo.png", transform))
        .await
        .unwrap();

    assert_eq!(response.key.as_str(), "photoq_90_w_200.png");
    assert_eq!(
        response.url,
        "https://d111.cloudfront.net/photoq_90_w_200.png"
    );
    assert_eq!(response.format, OutputFormat::Png);
    assert!(!response.cache_hit);
    assert_eq!(store.put_count(), 1);

    let stored = store.object("photoq_90_w_200.png").await.unwrap();
    assert!(is_valid_png(&stored.data));
    assert_eq!(stored.content_type.as_deref(), Some("image/png"));
    assert_eq!(
        stored.cache_control,
        Some(format!("public, max-age={}", DEFAULT_VARIANT_MAX_AGE))
    );

    // Height follows the 4:3 aspect ratio of the 64x48 original
    assert_eq!(image_dimensions(&stored.data), (200, 150));
}

#[tokio::test]
async fn test_fill_resize_and_grayscale() {
    let store = store_with_photo();
    let service = service_for(&store);

    let transform = TransformRequest::new()
        .with_width(10)
        .with_height(20)
        .with_grayscale()
        .with_quality(50)
        .with_format("jpg");
    let response = service
        .get_variant(VariantRequest::new("photo.png", transform))
        .await
        .unwrap();

    assert_eq!(response.key.as_str(), "photogray_1_h_20_q_50_w_10.jpg");

    let stored = store.object(response.key.as_str()).await.unwrap();
    assert!(is_valid_jpeg(&stored.data));
    assert_eq!(stored.content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(image_dimensions(&stored.data), (10, 20));
}

#[tokio::test]
async fn test_accept_header_selects_webp() {
    let store = store_with_photo();
    let service = service_for(&store);

    let request = VariantRequest::new("photo.png", TransformRequest::new().with_width(32))
        .with_accept("image/avif,image/webp,*/*");
    let response = service.get_variant(request).await.unwrap();

    assert_eq!(response.format, OutputFormat::WebP);
    assert_eq!(response.key.as_str(), "photoq_85_w_32.webp");

    let stored = store.object("photoq_85_w_32.webp").await.unwrap();
    assert!(is_valid_webp(&stored.data));
    assert_eq!(stored.content_type.as_deref(), Some("image/webp"));
}

#[tokio::test]
async fn test_explicit_format_overrides_accept() {
    let store = store_with_photo();
    let service = service_for(&store);

    let transform = TransformRequest::new().with_width(16).with_format("png");
    let request = VariantRequest::new("photo.png", transform).with_accept("image/webp");
    let response = service.get_variant(request).await.unwrap();

    assert_eq!(response.format, OutputFormat::Png);
    assert_eq!(response.key.as_str(), "photoq_85_w_16.png");
}

#[tokio::test]
async fn test_untransformed_request_does_not_reuse_originals() {
    let jpg = create_test_jpeg(10, 10);
    let png = create_test_png(30, 30);
    let store = Arc::new(
        MockObjectStore::new()
            .with_object("photo.jpg", jpg.clone(), "image/jpeg")
            .with_object("photo.png", png.clone(), "image/png"),
    );
    let service = service_for(&store);

    // Negotiates png for photo.jpg; must not land on the photo.png original
    let response = service
        .get_variant(VariantRequest::new("photo.jpg", TransformRequest::new()))
        .await
        .unwrap();
    assert_eq!(response.key.as_str(), "photoq_85.png");
    assert!(!response.cache_hit);

    let stored = store.object("photoq_85.png").await.unwrap();
    assert_eq!(image_dimensions(&stored.data), (10, 10));
    assert_eq!(store.object("photo.png").await.unwrap().data.as_ref(), png.as_slice());

    // Re-encoding in the original's own format still produces a variant
    let transform = TransformRequest::from_query(&query(&[("fm", "jpg"), ("q", "85")])).unwrap();
    let response = service
        .get_variant(VariantRequest::new("photo.jpg", transform))
        .await
        .unwrap();
    assert_eq!(response.key.as_str(), "photoq_85.jpg");
    assert!(!response.cache_hit);
    assert_eq!(store.put_count(), 2);
    assert_eq!(store.object("photo.jpg").await.unwrap().data.as_ref(), jpg.as_slice());
}

#[tokio::test]
async fn test_extreme_aspect_ratio_is_rejected() {
    let store = Arc::new(MockObjectStore::new().with_object(
        "tall.png",
        create_test_png(1, 10_000),
        "image/png",
    ));
    let service = service_for(&store);

    let transform = TransformRequest::from_query(&query(&[("w", "10000")])).unwrap();
    let result = service
        .get_variant(VariantRequest::new("tall.png", transform))
        .await;

    assert!(matches!(result, Err(VariantError::InvalidRequest { .. })));
    assert_eq!(store.put_count(), 0);
}

// =============================================================================
// Idempotency
// =============================================================================

#[tokio::test]
async fn test_repeated_request_is_cache_hit() {
    let store = store_with_photo();
    let service = service_for(&store);

    let transform = TransformRequest::new().with_width(200).with_quality(90);
    let first = service
        .get_variant(VariantRequest::new("photo.png", transform.clone()))
        .await
        .unwrap();
    let second = service
        .get_variant(VariantRequest::new("photo.png", transform))
        .await
        .unwrap();

    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    assert_eq!(first.url, second.url);
    assert_eq!(store.put_count(), 1);
}

#[tokio::test]
async fn test_stored_variant_head_metadata() {
    let store = store_with_photo();
    let service = service_for(&store);

    let transform = TransformRequest::new().with_width(24).with_format("jpeg");
    let response = service
        .get_variant(VariantRequest::new("photo.png", transform))
        .await
        .unwrap();

    let head = store.head(response.key.as_str()).await.unwrap();
    let stored = store.object(response.key.as_str()).await.unwrap();
    assert_eq!(head.content_length, stored.data.len() as u64);
    assert_eq!(head.content_type.as_deref(), Some("image/jpeg"));

    let original = store.get("photo.png").await.unwrap();
    assert_eq!(original.content_type.as_deref(), Some("image/png"));
}

#[tokio::test]
async fn test_default_quality_shares_key() {
    let store = store_with_photo();
    let service = service_for(&store);

    let implicit = TransformRequest::from_query(&query(&[("w", "40")])).unwrap();
    let explicit = TransformRequest::from_query(&query(&[("q", "85"), ("w", "40")])).unwrap();

    let first = service
        .get_variant(VariantRequest::new("photo.png", implicit))
        .await
        .unwrap();
    let second = service
        .get_variant(VariantRequest::new("photo.png", explicit))
        .await
        .unwrap();

    assert_eq!(first.key, second.key);
    assert!(second.cache_hit);
    assert_eq!(store.put_count(), 1);
}

#[tokio::test]
async fn test_concurrent_identical_requests() {
    let store = store_with_photo();
    let service = Arc::new(service_for(&store));

    let transform = TransformRequest::new().with_width(48).with_format("png");
    let (a, b) = tokio::join!(
        service.get_variant(VariantRequest::new("photo.png", transform.clone())),
        service.get_variant(VariantRequest::new("photo.png", transform.clone())),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.url, b.url);
    assert!((1..=2).contains(&store.put_count()));

    // Whichever write landed last, the stored bytes are the deterministic output
    let original = create_test_png(64, 48);
    let expected = TransformEngine::new()
        .apply(&original, &transform, OutputFormat::Png)
        .unwrap();
    let stored = store.object(a.key.as_str()).await.unwrap();
    assert_eq!(stored.data, expected);
}

// =============================================================================
// Failures Without Writes
// =============================================================================

#[tokio::test]
async fn test_missing_original_writes_nothing() {
    let store = store_with_photo();
    let service = service_for(&store);

    let result = service
        .get_variant(VariantRequest::new("missing.png", TransformRequest::new()))
        .await;

    assert!(matches!(result, Err(VariantError::NotFound { .. })));
    assert_eq!(store.head_count(), 0);
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_unsupported_format_rejected_before_work() {
    let store = store_with_photo();
    let service = service_for(&store);

    let request = VariantRequest::new("photo.png", TransformRequest::new().with_format("gif"));
    let result = service.get_variant(request).await;

    match result {
        Err(VariantError::UnsupportedFormat { format }) => assert_eq!(format, "gif"),
        other => panic!("expected UnsupportedFormat, got {:?}", other),
    }
    assert_eq!(store.get_count(), 0);
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_unsupported_format_wins_over_missing_original() {
    let store = store_with_photo();
    let service = service_for(&store);

    let request = VariantRequest::new("missing.png", TransformRequest::new().with_format("gif"));
    let result = service.get_variant(request).await;

    assert!(matches!(result, Err(VariantError::UnsupportedFormat { .. })));
    assert_eq!(store.get_count(), 0);
}

#[tokio::test]
async fn test_undecodable_original() {
    let store = Arc::new(MockObjectStore::new().with_object(
        "notes.png",
        b"definitely not an image".to_vec(),
        "image/png",
    ));
    let service = service_for(&store);

    let result = service
        .get_variant(VariantRequest::new("notes.png", TransformRequest::new()))
        .await;

    assert!(matches!(result, Err(VariantError::DecodeError { .. })));
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_empty_identifier_is_invalid() {
    let store = store_with_photo();
    let service = service_for(&store);

    let result = service
        .get_variant(VariantRequest::new("", TransformRequest::new()))
        .await;

    assert!(matches!(result, Err(VariantError::InvalidRequest { .. })));
    assert_eq!(store.get_count(), 0);
}

#[tokio::test]
async fn test_fetch_failure_is_store_unavailable() {
    let store = store_with_photo();
    store.set_fail_get(true);
    let service = service_for(&store);

    let result = service
        .get_variant(VariantRequest::new("photo.png", TransformRequest::new()))
        .await;

    assert!(matches!(result, Err(VariantError::StoreUnavailable(_))));
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_write_failure_is_store_unavailable() {
    let store = store_with_photo();
    store.set_fail_put(true);
    let service = service_for(&store);

    let result = service
        .get_variant(VariantRequest::new("photo.png", TransformRequest::new().with_width(16)))
        .await;

    assert!(matches!(result, Err(VariantError::StoreUnavailable(_))));
    assert_eq!(store.keys().await, vec!["photo.png".to_string()]);
}

// =============================================================================
// Existence Policy
// =============================================================================

#[tokio::test]
async fn test_fail_closed_on_head_error() {
    let store = store_with_photo();
    store.set_fail_head(true);
    let service = service_for(&store).with_existence_policy(ExistencePolicy::FailClosed);

    let result = service
        .get_variant(VariantRequest::new("photo.png", TransformRequest::new().with_width(16)))
        .await;

    assert!(matches!(result, Err(VariantError::StoreUnavailable(_))));
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_fail_open_on_head_error() {
    let store = store_with_photo();
    store.set_fail_head(true);
    let service = service_for(&store).with_existence_policy(ExistencePolicy::FailOpen);

    let response = service
        .get_variant(VariantRequest::new("photo.png", TransformRequest::new().with_width(16)))
        .await
        .unwrap();

    assert!(!response.cache_hit);
    assert_eq!(store.put_count(), 1);
}

#[tokio::test]
async fn test_custom_variant_max_age() {
    let store = store_with_photo();
    let service = service_for(&store).with_variant_max_age(600);

    let response = service
        .get_variant(VariantRequest::new("photo.png", TransformRequest::new().with_width(8)))
        .await
        .unwrap();

    let stored = store.object(response.key.as_str()).await.unwrap();
    assert_eq!(stored.cache_control.as_deref(), Some("public, max-age=600"));
}
