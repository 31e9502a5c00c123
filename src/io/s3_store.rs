//! S3-backed object store.
//!
//! Originals and variants live side by side as flat keys in one bucket.

use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::debug;

use super::object_store::{ObjectHead, ObjectListing, ObjectStore, PutObject, StoredObject};
use crate::error::StoreError;

/// S3-backed implementation of [`ObjectStore`].
///
/// # Example
///
/// ```ignore
/// use variant_cache::io::{create_s3_client, S3ObjectStore};
///
/// let client = create_s3_client(None, "us-east-1").await;
/// let store = S3ObjectStore::new(client, "my-images".to_string());
///
/// let original = store.get("photo.png").await?;
/// ```
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Create a store over the given bucket.
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Get the bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn location(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }
}

/// Classify an SDK error as not-found or a generic S3 failure.
///
/// The typed check differs per operation (`NoSuchKey` for GET, `NotFound` for
/// HEAD), so the raw status and message are consulted as well.
fn classify_error<E>(err: SdkError<E>, typed_not_found: bool, location: String) -> StoreError
where
    E: std::error::Error + 'static,
{
    if typed_not_found {
        return StoreError::NotFound(location);
    }

    let status_is_404 = err
        .raw_response()
        .map(|r| r.status().as_u16() == 404)
        .unwrap_or(false);
    if status_is_404 {
        return StoreError::NotFound(location);
    }

    let err_str = DisplayErrorContext(&err).to_string();
    if err_str.contains("NotFound") || err_str.contains("NoSuchKey") {
        return StoreError::NotFound(location);
    }

    StoreError::S3(err_str)
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get(&self, key: &str) -> Result<StoredObject, StoreError> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let typed = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false);
                classify_error(e, typed, self.location(key))
            })?;

        let content_type = resp.content_type().map(str::to_string);

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?
            .into_bytes();

        debug!(key = key, size = data.len(), "Fetched object");

        Ok(StoredObject { data, content_type })
    }

    async fn head(&self, key: &str) -> Result<ObjectHead, StoreError> {
        let head = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let typed = e
                    .as_service_error()
                    .map(|se| se.is_not_found())
                    .unwrap_or(false);
                classify_error(e, typed, self.location(key))
            })?;

        Ok(ObjectHead {
            content_length: head.content_length().unwrap_or(0).max(0) as u64,
            content_type: head.content_type().map(str::to_string),
        })
    }

    async fn put(&self, key: &str, object: PutObject) -> Result<(), StoreError> {
        let size = object.data.len();
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(object.content_type)
            .body(ByteStream::from(object.data));

        if let Some(directive) = object.cache_control {
            request = request.cache_control(directive);
        }

        request
            .send()
            .await
            .map_err(|e| StoreError::S3(DisplayErrorContext(&e).to_string()))?;

        debug!(key = key, size = size, "Stored object");
        Ok(())
    }

    async fn list(
        &self,
        limit: u32,
        cursor: Option<&str>,
        prefix: Option<&str>,
    ) -> Result<ObjectListing, StoreError> {
        let mut request = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .max_keys(limit.min(i32::MAX as u32) as i32);

        if let Some(token) = cursor {
            request = request.continuation_token(token);
        }
        if let Some(prefix) = prefix {
            request = request.prefix(prefix);
        }

        let result = request
            .send()
            .await
            .map_err(|e| StoreError::S3(DisplayErrorContext(&e).to_string()))?;

        let keys = result
            .contents()
            .iter()
            .filter_map(|obj| obj.key().map(str::to_string))
            .collect();

        let next_cursor = if result.is_truncated() == Some(true) {
            result.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ObjectListing { keys, next_cursor })
    }
}

/// Create an S3 client with optional custom endpoint and region.
///
/// Use a custom endpoint for S3-compatible services like MinIO:
/// ```ignore
/// let client = create_s3_client(Some("http://localhost:9000"), "us-east-1").await;
/// ```
///
/// For AWS S3, pass `None` to use the default endpoint:
/// ```ignore
/// let client = create_s3_client(None, "us-east-1").await;
/// ```
pub async fn create_s3_client(endpoint_url: Option<&str>, region: &str) -> Client {
    let region = aws_config::Region::new(region.to_string());
    let mut config_loader =
        aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

    if let Some(endpoint) = endpoint_url {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    let sdk_config = config_loader.load().await;

    // S3-compatible services usually need path-style addressing
    let s3_config = if endpoint_url.is_some() {
        aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build()
    } else {
        aws_sdk_s3::config::Builder::from(&sdk_config).build()
    };

    Client::from_conf(s3_config)
}
