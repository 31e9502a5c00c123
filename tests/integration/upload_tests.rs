//! Upload integration tests.
//!
//! Tests verify:
//! - Multipart uploads store the original with its content type
//! - Uploaded originals can be transformed right away
//! - Malformed or oversized uploads are rejected

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use variant_cache::{create_router, RouterConfig};

use super::test_utils::{create_test_png, router_for, service_for, MockObjectStore};

const BOUNDARY: &str = "variant-cache-test-boundary";

/// Build a multipart body with a single file part.
fn multipart_body(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_upload_stores_original() {
    let store = Arc::new(MockObjectStore::new());
    let router = router_for(&store);

    let png = create_test_png(32, 32);
    let body = multipart_body("image", "cat.png", "image/png", &png);

    let response = router.oneshot(upload_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["key"], "cat.png");
    assert_eq!(json["size"], png.len());

    let stored = store.object("cat.png").await.unwrap();
    assert_eq!(stored.data.as_ref(), png.as_slice());
    assert_eq!(stored.content_type.as_deref(), Some("image/png"));
    assert!(stored.cache_control.is_none());
}

#[tokio::test]
async fn test_upload_then_transform() {
    let store = Arc::new(MockObjectStore::new());
    let router = router_for(&store);

    let body = multipart_body("image", "dog.png", "image/png", &create_test_png(40, 20));
    let response = router
        .clone()
        .oneshot(upload_request(body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let request = Request::builder()
        .uri("/pictures/dog.png?w=20&fm=jpeg")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-variant-key").unwrap(),
        "dogq_85_w_20.jpeg"
    );
}

#[tokio::test]
async fn test_upload_missing_image_field() {
    let store = Arc::new(MockObjectStore::new());
    let router = router_for(&store);

    let body = multipart_body("attachment", "cat.png", "image/png", &create_test_png(8, 8));

    let response = router.oneshot(upload_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_upload_empty_file() {
    let store = Arc::new(MockObjectStore::new());
    let router = router_for(&store);

    let body = multipart_body("image", "empty.png", "image/png", &[]);

    let response = router.oneshot(upload_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_upload_over_limit() {
    let store = Arc::new(MockObjectStore::new());
    let router = create_router(
        service_for(&store),
        RouterConfig::new()
            .with_tracing(false)
            .with_max_upload_bytes(64),
    );

    let body = multipart_body("image", "big.png", "image/png", &create_test_png(64, 64));

    let response = router.oneshot(upload_request(body)).await.unwrap();
    assert!(response.status().is_client_error());
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_upload_storage_failure() {
    let store = Arc::new(MockObjectStore::new());
    store.set_fail_put(true);
    let router = router_for(&store);

    let body = multipart_body("image", "cat.png", "image/png", &create_test_png(8, 8));

    let response = router.oneshot(upload_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
