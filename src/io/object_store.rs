use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;

/// An object read back from the store.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Object body
    pub data: Bytes,

    /// Content type recorded at write time, if any
    pub content_type: Option<String>,
}

/// Metadata returned by a HEAD-style existence check.
#[derive(Debug, Clone, Default)]
pub struct ObjectHead {
    /// Object size in bytes
    pub content_length: u64,

    /// Content type recorded at write time, if any
    pub content_type: Option<String>,
}

/// A write request for a single object.
#[derive(Debug, Clone)]
pub struct PutObject {
    pub data: Bytes,
    pub content_type: String,
    pub cache_control: Option<String>,
}

impl PutObject {
    /// Create a write with no cache directive.
    pub fn new(data: Bytes, content_type: impl Into<String>) -> Self {
        Self {
            data,
            content_type: content_type.into(),
            cache_control: None,
        }
    }

    /// Attach a `Cache-Control` directive to the stored object.
    pub fn with_cache_control(mut self, directive: impl Into<String>) -> Self {
        self.cache_control = Some(directive.into());
        self
    }
}

/// One page of a key listing.
#[derive(Debug, Clone, Default)]
pub struct ObjectListing {
    /// Keys in this page
    pub keys: Vec<String>,

    /// Cursor for the next page, `None` when the listing is exhausted
    pub next_cursor: Option<String>,
}

/// Flat key/value object storage.
///
/// Implementations must provide read-after-write consistency for a single key:
/// a completed `put` is visible to any later `head` or `get` of that key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read the full object stored under `key`.
    ///
    /// Returns `StoreError::NotFound` when nothing is stored there.
    async fn get(&self, key: &str) -> Result<StoredObject, StoreError>;

    /// Check whether an object exists without transferring its body.
    ///
    /// Returns `StoreError::NotFound` when nothing is stored there.
    async fn head(&self, key: &str) -> Result<ObjectHead, StoreError>;

    /// Store `object` under `key`, replacing anything already there.
    async fn put(&self, key: &str, object: PutObject) -> Result<(), StoreError>;

    /// List keys in the store, one page at a time.
    ///
    /// # Arguments
    /// * `limit` - Maximum number of keys to return
    /// * `cursor` - Continuation token from a previous page
    /// * `prefix` - Only return keys starting with this prefix
    async fn list(
        &self,
        limit: u32,
        cursor: Option<&str>,
        prefix: Option<&str>,
    ) -> Result<ObjectListing, StoreError>;
}
