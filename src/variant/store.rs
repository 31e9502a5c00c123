//! Existence-checked writes of variants.
//!
//! A variant is written only when a HEAD check says its key is empty. Two
//! concurrent requests for the same key may both see "absent" and both write;
//! since the key is derived from the inputs, both writes carry identical bytes
//! and the last one wins harmlessly. No locking is done.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use super::key::CacheKey;
use crate::error::VariantError;
use crate::io::{ObjectStore, PutObject};

/// Default `max-age` for stored variants: one year.
pub const DEFAULT_VARIANT_MAX_AGE: u32 = 31_536_000;

/// How a failed existence check is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExistencePolicy {
    /// Only a not-found answer leads to a write; other errors are returned
    /// as `StoreUnavailable`.
    #[default]
    FailClosed,

    /// Any existence-check error is treated as "absent" and the write goes
    /// ahead.
    FailOpen,
}

impl fmt::Display for ExistencePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExistencePolicy::FailClosed => f.write_str("fail-closed"),
            ExistencePolicy::FailOpen => f.write_str("fail-open"),
        }
    }
}

impl FromStr for ExistencePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fail-closed" | "closed" => Ok(ExistencePolicy::FailClosed),
            "fail-open" | "open" => Ok(ExistencePolicy::FailOpen),
            other => Err(format!(
                "unknown existence policy '{}' (expected fail-closed or fail-open)",
                other
            )),
        }
    }
}

/// Result of [`CheckedStore::ensure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// An object already existed under the key
    Hit,

    /// The object was written by this call
    Written,
}

impl StoreOutcome {
    /// Whether the variant was already stored.
    pub fn is_hit(&self) -> bool {
        matches!(self, StoreOutcome::Hit)
    }
}

/// Writes variants to the object store unless they already exist.
pub struct CheckedStore<S: ObjectStore> {
    store: Arc<S>,
    policy: ExistencePolicy,
    cache_control: String,
}

impl<S: ObjectStore> CheckedStore<S> {
    /// Create a checked store with the default policy and cache directive.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            policy: ExistencePolicy::default(),
            cache_control: cache_directive(DEFAULT_VARIANT_MAX_AGE),
        }
    }

    /// Set how existence-check failures are treated.
    pub fn with_policy(mut self, policy: ExistencePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the `max-age` written with each variant.
    pub fn with_max_age(mut self, seconds: u32) -> Self {
        self.cache_control = cache_directive(seconds);
        self
    }

    /// Get the existence policy.
    pub fn policy(&self) -> ExistencePolicy {
        self.policy
    }

    /// Make sure an object exists under `key`, writing `data` if it does not.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the write fails, or if the existence
    /// check fails for a reason other than not-found under
    /// [`ExistencePolicy::FailClosed`].
    pub async fn ensure(
        &self,
        key: &CacheKey,
        data: Bytes,
        content_type: &str,
    ) -> Result<StoreOutcome, VariantError> {
        match self.store.head(key.as_str()).await {
            Ok(head) => {
                debug!(
                    key = %key,
                    size = head.content_length,
                    content_type = ?head.content_type,
                    "Variant already stored"
                );
                return Ok(StoreOutcome::Hit);
            }
            Err(err) if err.is_not_found() => {}
            Err(err) => match self.policy {
                ExistencePolicy::FailClosed => {
                    warn!(key = %key, error = %err, "Existence check failed");
                    return Err(VariantError::StoreUnavailable(err));
                }
                ExistencePolicy::FailOpen => {
                    warn!(key = %key, error = %err, "Existence check failed, writing anyway");
                }
            },
        }

        let size = data.len();
        let object = PutObject::new(data, content_type).with_cache_control(&self.cache_control);
        self.store.put(key.as_str(), object).await?;

        info!(key = %key, size = size, content_type = content_type, "Stored variant");
        Ok(StoreOutcome::Written)
    }
}

impl<S: ObjectStore> Clone for CheckedStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy,
            cache_control: self.cache_control.clone(),
        }
    }
}

/// Build the `Cache-Control` value stored with variants.
pub fn cache_directive(max_age: u32) -> String {
    format!("public, max-age={}", max_age)
}
