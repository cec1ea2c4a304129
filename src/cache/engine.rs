//! The cache-aside core: read-through and invalidation.
//!
//! The engine is strictly best-effort. A backend failure on read counts as
//! a miss, a backend failure on write is logged and the freshly loaded
//! value is still returned; only the wrapped data accessor's own errors
//! ever reach the caller.

use std::sync::Arc;

use metrics::counter;
use once_cell::sync::OnceCell;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::domain::types::EntityClass;

use super::backend::CacheBackend;
use super::keys::{CacheKey, Tag};
use super::policy::PolicyResolver;

const METRIC_CACHE_HITS: &str = "scorta_cache_hits_total";
const METRIC_CACHE_MISSES: &str = "scorta_cache_misses_total";
const METRIC_CACHE_SKIPS: &str = "scorta_cache_skips_total";
const METRIC_CACHE_ERRORS: &str = "scorta_cache_errors_total";

/// Tagged cache-aside engine over a pluggable backend.
///
/// Holds no mutable state beyond the memoized tag-support flag; policies
/// are immutable for the engine's lifetime. Concurrent callers may race to
/// fill the same key; the duplicate loader execution is tolerated rather
/// than coordinated away.
pub struct CacheEngine {
    backend: Arc<dyn CacheBackend>,
    policy: PolicyResolver,
    tag_support: OnceCell<bool>,
}

impl CacheEngine {
    pub fn new(backend: Arc<dyn CacheBackend>, policy: PolicyResolver) -> Self {
        Self {
            backend,
            policy,
            tag_support: OnceCell::new(),
        }
    }

    /// Whether the backend indexes entries by tag. Probed once, memoized.
    pub fn tags_supported(&self) -> bool {
        *self
            .tag_support
            .get_or_init(|| self.backend.supports_tags())
    }

    pub fn policy(&self) -> &PolicyResolver {
        &self.policy
    }

    /// Read through the cache.
    ///
    /// `subject` is the exclusion discriminator (collection name, set
    /// handle) the policy checks; `tags` are attached to the stored entry
    /// when the backend supports them. The loader runs at most once per
    /// call and its error, if any, propagates unchanged with nothing
    /// cached.
    pub async fn read_through<T, E, F, Fut>(
        &self,
        class: EntityClass,
        subject: Option<&str>,
        key: &CacheKey,
        tags: &[Tag],
        loader: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self
            .policy
            .should_cache(class, subject, self.tags_supported())
        {
            counter!(METRIC_CACHE_SKIPS, "class" => class.as_str()).increment(1);
            debug!(class = %class, key = %key, "cache skipped by policy");
            return loader().await;
        }

        match self.backend.get(key.as_str()).await {
            Ok(Some(cached)) => match serde_json::from_value::<T>(cached) {
                Ok(value) => {
                    counter!(METRIC_CACHE_HITS, "class" => class.as_str()).increment(1);
                    debug!(class = %class, key = %key, "cache hit");
                    return Ok(value);
                }
                Err(error) => {
                    // A payload we can no longer decode is as good as absent.
                    warn!(
                        class = %class,
                        key = %key,
                        error = %error,
                        "cached payload failed to decode, treating as miss"
                    );
                }
            },
            Ok(None) => {}
            Err(error) => {
                counter!(METRIC_CACHE_ERRORS, "class" => class.as_str()).increment(1);
                warn!(
                    class = %class,
                    key = %key,
                    error = %error,
                    "cache read failed, treating as miss"
                );
            }
        }

        counter!(METRIC_CACHE_MISSES, "class" => class.as_str()).increment(1);
        let value = loader().await?;

        match serde_json::to_value(&value) {
            Ok(payload) => {
                let stored_tags = if self.tags_supported() { tags } else { &[] };
                if let Err(error) = self
                    .backend
                    .put(key.as_str(), payload, self.policy.ttl(class), stored_tags)
                    .await
                {
                    counter!(METRIC_CACHE_ERRORS, "class" => class.as_str()).increment(1);
                    warn!(
                        class = %class,
                        key = %key,
                        error = %error,
                        "cache write failed, returning uncached value"
                    );
                }
            }
            Err(error) => {
                counter!(METRIC_CACHE_ERRORS, "class" => class.as_str()).increment(1);
                warn!(
                    class = %class,
                    key = %key,
                    error = %error,
                    "value not serializable for caching, returning uncached value"
                );
            }
        }

        Ok(value)
    }

    /// Invalidate by tag when the backend can, by exact key otherwise.
    ///
    /// Under a non-tagging backend only the reconstructible keys are
    /// forgotten; untracked shapes (ID-list and URI lookups) stay cached
    /// until their TTL runs out. Failures are logged and swallowed.
    pub async fn invalidate(&self, class: EntityClass, tags: &[Tag], exact_keys: &[CacheKey]) {
        if self.tags_supported() {
            for tag in tags {
                if let Err(error) = self.backend.flush_tag(tag).await {
                    counter!(METRIC_CACHE_ERRORS, "class" => class.as_str()).increment(1);
                    warn!(class = %class, tag = %tag, error = %error, "tag flush failed");
                } else {
                    debug!(class = %class, tag = %tag, "tag flushed");
                }
            }
        } else {
            for key in exact_keys {
                if let Err(error) = self.backend.forget(key.as_str()).await {
                    counter!(METRIC_CACHE_ERRORS, "class" => class.as_str()).increment(1);
                    warn!(class = %class, key = %key, error = %error, "key forget failed");
                } else {
                    debug!(class = %class, key = %key, "key forgotten");
                }
            }
        }
    }
}
