//! Origin fetcher: reads original images straight from the object store.

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::error::{StoreError, VariantError};
use crate::io::ObjectStore;

/// Passthrough reader for original images.
pub struct OriginFetcher<S: ObjectStore> {
    store: Arc<S>,
}

impl<S: ObjectStore> OriginFetcher<S> {
    /// Create a fetcher over a shared store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Fetch the bytes of the original stored under `image_id`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if nothing is stored under `image_id`
    /// - `StoreUnavailable` for any other storage failure
    pub async fn fetch(&self, image_id: &str) -> Result<Bytes, VariantError> {
        match self.store.get(image_id).await {
            Ok(object) => {
                debug!(
                    image_id = image_id,
                    size = object.data.len(),
                    content_type = ?object.content_type,
                    "Fetched original"
                );
                Ok(object.data)
            }
            Err(StoreError::NotFound(_)) => Err(VariantError::NotFound {
                image_id: image_id.to_string(),
            }),
            Err(err) => Err(VariantError::StoreUnavailable(err)),
        }
    }
}

impl<S: ObjectStore> Clone for OriginFetcher<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}
