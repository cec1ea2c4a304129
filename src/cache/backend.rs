//! Cache backend adapter.
//!
//! [`CacheBackend`] is the uniform seam over any key-value cache store that
//! can hold TTL'd JSON payloads, with optional tag support for grouped
//! invalidation. [`MemoryBackend`] is the in-process implementation: an
//! LRU-bounded map with per-entry expiry and a tag index.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;

use super::keys::Tag;

const DEFAULT_CAPACITY: usize = 1024;

/// Failure in the cache store itself.
///
/// Callers of the engine never see this error: every backend failure
/// degrades to a cache miss or a skipped write.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Uniform interface over a key→value TTL cache with optional tag support.
///
/// All methods must be safe to call concurrently; per-key atomicity is the
/// only consistency the adapter is expected to provide.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetch a value. `Ok(None)` is a miss; expired entries answer as misses.
    async fn get(&self, key: &str) -> Result<Option<Value>, BackendError>;

    /// Store a value under `key` for `ttl`, grouped under `tags`.
    ///
    /// Backends without tag support ignore `tags`.
    async fn put(
        &self,
        key: &str,
        value: Value,
        ttl: Duration,
        tags: &[Tag],
    ) -> Result<(), BackendError>;

    /// Remove one key. Removing an absent key is not an error.
    async fn forget(&self, key: &str) -> Result<(), BackendError>;

    /// Expire every entry stored under `tag`.
    ///
    /// Backends without tag support treat this as a no-op.
    async fn flush_tag(&self, tag: &Tag) -> Result<(), BackendError>;

    /// Whether this backend indexes entries by tag.
    ///
    /// Must be cheap and must not fail; adapters that have to probe their
    /// store catch the probe error internally and report `false`.
    fn supports_tags(&self) -> bool;
}

// ============================================================================
// Memory backend
// ============================================================================

struct StoredEntry {
    value: Value,
    expires_at: Instant,
    tags: Vec<Tag>,
}

impl StoredEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

struct Inner {
    entries: LruCache<String, StoredEntry>,
    tag_index: HashMap<Tag, HashSet<String>>,
}

impl Inner {
    /// Remove `key` from every tag set it was registered under.
    fn detach(&mut self, key: &str, tags: &[Tag]) {
        for tag in tags {
            if let Some(keys) = self.tag_index.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.tag_index.remove(tag);
                }
            }
        }
    }
}

/// In-process cache store: LRU-bounded, TTL-expiring, tag-indexed.
///
/// Expired entries are dropped lazily when touched. The untagged variant
/// reports no tag support and accepts `flush_tag` as a no-op, which is
/// useful for exercising the exact-key invalidation path.
pub struct MemoryBackend {
    inner: RwLock<Inner>,
    tagged: bool,
}

impl MemoryBackend {
    /// Create a tag-aware store. Zero capacity is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        Self::build(capacity, true)
    }

    /// Create a store without tag support.
    pub fn untagged(capacity: usize) -> Self {
        Self::build(capacity, false)
    }

    fn build(capacity: usize, tagged: bool) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: RwLock::new(Inner {
                entries: LruCache::new(capacity),
                tag_index: HashMap::new(),
            }),
            tagged,
        }
    }

    /// Number of live (possibly expired, not yet collected) entries.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Value>, BackendError> {
        let mut inner = self.inner.write().await;

        let expired = match inner.entries.get(key) {
            Some(entry) => entry.is_expired(Instant::now()),
            None => return Ok(None),
        };

        if expired {
            if let Some(entry) = inner.entries.pop(key) {
                inner.detach(key, &entry.tags);
            }
            return Ok(None);
        }

        Ok(inner.entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn put(
        &self,
        key: &str,
        value: Value,
        ttl: Duration,
        tags: &[Tag],
    ) -> Result<(), BackendError> {
        let mut inner = self.inner.write().await;

        // Replacing a key drops its previous tag registrations first.
        if let Some(previous) = inner.entries.pop(key) {
            let tags = previous.tags;
            inner.detach(key, &tags);
        }

        let entry = StoredEntry {
            value,
            expires_at: Instant::now() + ttl,
            tags: if self.tagged { tags.to_vec() } else { Vec::new() },
        };

        if let Some((evicted_key, evicted)) = inner.entries.push(key.to_string(), entry) {
            if evicted_key != key {
                let tags = evicted.tags;
                inner.detach(&evicted_key, &tags);
            }
        }

        if self.tagged {
            for tag in tags {
                inner
                    .tag_index
                    .entry(tag.clone())
                    .or_default()
                    .insert(key.to_string());
            }
        }

        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<(), BackendError> {
        let mut inner = self.inner.write().await;
        if let Some(entry) = inner.entries.pop(key) {
            inner.detach(key, &entry.tags);
        }
        Ok(())
    }

    async fn flush_tag(&self, tag: &Tag) -> Result<(), BackendError> {
        if !self.tagged {
            return Ok(());
        }

        let mut inner = self.inner.write().await;
        let Some(keys) = inner.tag_index.remove(tag) else {
            return Ok(());
        };

        for key in keys {
            if let Some(entry) = inner.entries.pop(&key) {
                // The entry may also live under other tags.
                let tags = entry.tags;
                inner.detach(&key, &tags);
            }
        }

        Ok(())
    }

    fn supports_tags(&self) -> bool {
        self.tagged
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn get_put_forget_round_trip() {
        let backend = MemoryBackend::default();

        assert!(backend.get("k").await.expect("get").is_none());

        backend
            .put("k", json!({"n": 1}), TTL, &[])
            .await
            .expect("put");
        assert_eq!(backend.get("k").await.expect("get"), Some(json!({"n": 1})));

        backend.forget("k").await.expect("forget");
        assert!(backend.get("k").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn expired_entries_answer_as_misses() {
        let backend = MemoryBackend::default();

        backend
            .put("k", json!(1), Duration::ZERO, &[])
            .await
            .expect("put");

        assert!(backend.get("k").await.expect("get").is_none());
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn flush_tag_expires_only_tagged_entries() {
        let backend = MemoryBackend::default();
        let hot = Tag::collection("articles");
        let cold = Tag::collection("pages");

        backend
            .put("a", json!("a"), TTL, std::slice::from_ref(&hot))
            .await
            .expect("put a");
        backend
            .put("b", json!("b"), TTL, std::slice::from_ref(&cold))
            .await
            .expect("put b");

        backend.flush_tag(&hot).await.expect("flush");

        assert!(backend.get("a").await.expect("get").is_none());
        assert_eq!(backend.get("b").await.expect("get"), Some(json!("b")));
    }

    #[tokio::test]
    async fn multi_tagged_entry_is_reachable_through_each_tag() {
        let backend = MemoryBackend::default();
        let tags = vec![Tag::entries(), Tag::uris()];

        backend
            .put("k", json!("v"), TTL, &tags)
            .await
            .expect("put");
        backend.flush_tag(&Tag::uris()).await.expect("flush");

        assert!(backend.get("k").await.expect("get").is_none());
        // The other tag's index entry was cleaned up with the value.
        backend.flush_tag(&Tag::entries()).await.expect("flush");
    }

    #[tokio::test]
    async fn overwrite_replaces_tag_registrations() {
        let backend = MemoryBackend::default();

        backend
            .put("k", json!("old"), TTL, &[Tag::collection("old")])
            .await
            .expect("put old");
        backend
            .put("k", json!("new"), TTL, &[Tag::collection("new")])
            .await
            .expect("put new");

        // The stale tag no longer reaches the key.
        backend
            .flush_tag(&Tag::collection("old"))
            .await
            .expect("flush");
        assert_eq!(backend.get("k").await.expect("get"), Some(json!("new")));

        backend
            .flush_tag(&Tag::collection("new"))
            .await
            .expect("flush");
        assert!(backend.get("k").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn lru_eviction_detaches_tags() {
        let backend = MemoryBackend::new(2);
        let tag = Tag::entries();

        backend
            .put("a", json!("a"), TTL, std::slice::from_ref(&tag))
            .await
            .expect("put a");
        backend
            .put("b", json!("b"), TTL, std::slice::from_ref(&tag))
            .await
            .expect("put b");
        backend
            .put("c", json!("c"), TTL, std::slice::from_ref(&tag))
            .await
            .expect("put c");

        // "a" was evicted; flushing must still clear the survivors.
        assert!(backend.get("a").await.expect("get").is_none());
        backend.flush_tag(&tag).await.expect("flush");
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn untagged_backend_reports_no_tag_support() {
        let backend = MemoryBackend::untagged(16);
        assert!(!backend.supports_tags());

        backend
            .put("k", json!("v"), TTL, &[Tag::entries()])
            .await
            .expect("put");

        // flush_tag is a harmless no-op without tag support.
        backend.flush_tag(&Tag::entries()).await.expect("flush");
        assert_eq!(backend.get("k").await.expect("get"), Some(json!("v")));

        // Exact-key removal still works.
        backend.forget("k").await.expect("forget");
        assert!(backend.get("k").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn zero_capacity_is_clamped() {
        let backend = MemoryBackend::new(0);
        backend.put("k", json!(1), TTL, &[]).await.expect("put");
        assert_eq!(backend.len().await, 1);
    }
}
