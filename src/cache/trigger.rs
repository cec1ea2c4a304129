//! Invalidation trigger: the host-facing write-side API.
//!
//! The host wires its event bus (or its repositories) to [`InvalidationTrigger::notify`];
//! each notification translates into tag flushes or exact-key forgets
//! against the engine. Handlers are idempotent and never surface
//! cache-layer failures into the mutation path.

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::types::EntityClass;

use super::engine::CacheEngine;
use super::events::MutationEvent;
use super::keys::{CacheKey, Tag};

/// Translates domain mutation notifications into cache invalidation.
#[derive(Clone)]
pub struct InvalidationTrigger {
    engine: Arc<CacheEngine>,
}

impl InvalidationTrigger {
    pub fn new(engine: Arc<CacheEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<CacheEngine> {
        &self.engine
    }

    /// Apply one mutation event.
    ///
    /// Safe to invoke multiple times for the same logical change: flushing
    /// an already-flushed tag or forgetting an absent key is a no-op.
    pub async fn notify(&self, event: &MutationEvent) {
        let class = event.class();
        if !self.engine.policy().class_enabled(class) {
            debug!(class = %class, event = ?event, "invalidation skipped, class disabled");
            return;
        }

        debug!(class = %class, event = ?event, "invalidation event");
        self.engine
            .invalidate(class, &event.affected_tags(), &event.affected_keys())
            .await;
    }

    // ========================================================================
    // Per-event conveniences
    // ========================================================================

    pub async fn entry_saved(&self, id: Uuid, collection: &str, uri: &str, site: &str) {
        self.notify(&MutationEvent::EntrySaved {
            id,
            collection: collection.to_string(),
            uri: uri.to_string(),
            site: site.to_string(),
        })
        .await;
    }

    pub async fn entry_deleted(&self, id: Uuid, collection: &str, uri: &str, site: &str) {
        self.notify(&MutationEvent::EntryDeleted {
            id,
            collection: collection.to_string(),
            uri: uri.to_string(),
            site: site.to_string(),
        })
        .await;
    }

    pub async fn uris_updated(&self, collection: &str) {
        self.notify(&MutationEvent::UrisUpdated {
            collection: collection.to_string(),
        })
        .await;
    }

    pub async fn global_set_saved(&self, handle: &str) {
        self.notify(&MutationEvent::GlobalSetSaved {
            handle: handle.to_string(),
        })
        .await;
    }

    pub async fn global_variables_saved(&self, handle: &str) {
        self.notify(&MutationEvent::GlobalVariablesSaved {
            handle: handle.to_string(),
        })
        .await;
    }

    pub async fn fieldset_saved(&self, handle: &str) {
        self.notify(&MutationEvent::FieldsetSaved {
            handle: handle.to_string(),
        })
        .await;
    }

    pub async fn fieldset_deleted(&self, handle: &str) {
        self.notify(&MutationEvent::FieldsetDeleted {
            handle: handle.to_string(),
        })
        .await;
    }

    // ========================================================================
    // Administrative clears
    // ========================================================================
    // Each is a direct tag flush where the backend can tag. Without tag
    // support, only reconstructible keys are forgotten; clears with no such
    // keys degrade to a logged no-op. Flushing the entire backend is never
    // done here.

    /// Drop every entry cache, including URI lookups.
    pub async fn clear_all_entry_cache(&self) {
        info!("clearing all entry caches");
        self.clear(EntityClass::Entries, &[Tag::entries(), Tag::uris()], &[])
            .await;
    }

    /// Drop caches derived from one collection, plus URI lookups.
    pub async fn clear_collection_cache(&self, collection: &str) {
        info!(collection, "clearing collection cache");
        self.clear(
            EntityClass::Entries,
            &[Tag::collection(collection), Tag::uris()],
            &[CacheKey::entry_collection(collection)],
        )
        .await;
    }

    /// Drop every URI lookup cache, e.g. after bulk route changes.
    pub async fn clear_uri_cache(&self) {
        info!("clearing uri caches");
        self.clear(EntityClass::Entries, &[Tag::uris()], &[]).await;
    }

    /// Drop the cache for one global set.
    pub async fn clear_global_cache(&self, handle: &str) {
        info!(handle, "clearing global set cache");
        self.clear(
            EntityClass::Globals,
            &[Tag::global(handle)],
            &[CacheKey::global_set(handle)],
        )
        .await;
    }

    /// Drop the caches of every known global set.
    ///
    /// Non-tagging backends cannot enumerate cached handles, so the caller
    /// supplies the full handle list.
    pub async fn clear_all_global_cache(&self, handles: &[String]) {
        info!(count = handles.len(), "clearing all global set caches");
        let keys: Vec<CacheKey> = handles
            .iter()
            .map(|handle| CacheKey::global_set(handle))
            .collect();
        self.clear(EntityClass::Globals, &[Tag::globals()], &keys)
            .await;
    }

    /// Drop every fieldset cache.
    pub async fn clear_all_fieldset_cache(&self) {
        info!("clearing all fieldset caches");
        self.clear(
            EntityClass::Fieldsets,
            &[Tag::fieldsets()],
            &[CacheKey::fieldset_all()],
        )
        .await;
    }

    /// Drop the cache for one fieldset, along with the listing that
    /// includes it.
    pub async fn clear_fieldset_cache(&self, handle: &str) {
        info!(handle, "clearing fieldset cache");
        self.clear(
            EntityClass::Fieldsets,
            &[Tag::fieldset(handle)],
            &[CacheKey::fieldset_handle(handle), CacheKey::fieldset_all()],
        )
        .await;
    }

    async fn clear(&self, class: EntityClass, tags: &[Tag], exact_keys: &[CacheKey]) {
        if !self.engine.tags_supported() && exact_keys.is_empty() {
            warn!(
                class = %class,
                "cache clear needs tag support to enumerate keys, skipping"
            );
            return;
        }
        self.engine.invalidate(class, tags, exact_keys).await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use crate::cache::backend::{CacheBackend, MemoryBackend};
    use crate::cache::policy::{CachePolicy, PolicyResolver};

    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    fn trigger_over(backend: Arc<MemoryBackend>) -> InvalidationTrigger {
        InvalidationTrigger::new(Arc::new(CacheEngine::new(
            backend,
            PolicyResolver::default(),
        )))
    }

    #[tokio::test]
    async fn entry_save_flushes_collection_and_uri_caches() {
        let backend = Arc::new(MemoryBackend::default());
        let trigger = trigger_over(backend.clone());
        let id = Uuid::new_v4();

        backend
            .put(
                CacheKey::entry_collection("articles").as_str(),
                json!(["e1"]),
                TTL,
                &[Tag::collection("articles")],
            )
            .await
            .expect("seed collection");
        backend
            .put(
                CacheKey::entry_uri("/a", None).as_str(),
                json!("e1"),
                TTL,
                &[Tag::uris()],
            )
            .await
            .expect("seed uri");
        backend
            .put(
                CacheKey::entry_collection("pages").as_str(),
                json!(["p1"]),
                TTL,
                &[Tag::collection("pages")],
            )
            .await
            .expect("seed other collection");

        trigger
            .entry_saved(id, "articles", "/a", "default")
            .await;

        assert!(
            backend
                .get(CacheKey::entry_collection("articles").as_str())
                .await
                .expect("get")
                .is_none()
        );
        assert!(
            backend
                .get(CacheKey::entry_uri("/a", None).as_str())
                .await
                .expect("get")
                .is_none()
        );
        // Unrelated collections survive.
        assert!(
            backend
                .get(CacheKey::entry_collection("pages").as_str())
                .await
                .expect("get")
                .is_some()
        );
    }

    #[tokio::test]
    async fn notify_is_idempotent() {
        let backend = Arc::new(MemoryBackend::default());
        let trigger = trigger_over(backend);
        let event = MutationEvent::GlobalVariablesSaved {
            handle: "footer".to_string(),
        };

        trigger.notify(&event).await;
        trigger.notify(&event).await;
    }

    #[tokio::test]
    async fn disabled_class_skips_invalidation_work() {
        let backend = Arc::new(MemoryBackend::default());
        let engine = Arc::new(CacheEngine::new(
            backend.clone(),
            PolicyResolver::new(
                CachePolicy::default(),
                CachePolicy::disabled(),
                CachePolicy::default(),
            ),
        ));
        let trigger = InvalidationTrigger::new(engine);

        // Seed a key that an enabled globals class would have flushed.
        backend
            .put(
                CacheKey::global_set("footer").as_str(),
                json!("v"),
                TTL,
                &[Tag::global("footer")],
            )
            .await
            .expect("seed");

        trigger.global_variables_saved("footer").await;

        assert!(
            backend
                .get(CacheKey::global_set("footer").as_str())
                .await
                .expect("get")
                .is_some()
        );
    }

    #[tokio::test]
    async fn clear_all_entry_cache_without_tags_is_a_noop() {
        let backend = Arc::new(MemoryBackend::untagged(16));
        let trigger = InvalidationTrigger::new(Arc::new(CacheEngine::new(
            backend.clone(),
            PolicyResolver::default(),
        )));

        backend
            .put("entries:ids:deadbeef", json!(["e1"]), TTL, &[])
            .await
            .expect("seed");

        // No enumerable keys: nothing is touched, nothing is flushed wholesale.
        trigger.clear_all_entry_cache().await;
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn clear_all_global_cache_forgets_supplied_handles() {
        let backend = Arc::new(MemoryBackend::untagged(16));
        let trigger = InvalidationTrigger::new(Arc::new(CacheEngine::new(
            backend.clone(),
            PolicyResolver::default(),
        )));

        for handle in ["footer", "header"] {
            backend
                .put(CacheKey::global_set(handle).as_str(), json!("v"), TTL, &[])
                .await
                .expect("seed");
        }

        trigger
            .clear_all_global_cache(&["footer".to_string(), "header".to_string()])
            .await;

        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn clear_fieldset_cache_also_drops_the_listing() {
        let backend = Arc::new(MemoryBackend::untagged(16));
        let trigger = InvalidationTrigger::new(Arc::new(CacheEngine::new(
            backend.clone(),
            PolicyResolver::default(),
        )));

        backend
            .put(CacheKey::fieldset_all().as_str(), json!([]), TTL, &[])
            .await
            .expect("seed all");
        backend
            .put(
                CacheKey::fieldset_handle("hero").as_str(),
                json!({}),
                TTL,
                &[],
            )
            .await
            .expect("seed handle");

        trigger.clear_fieldset_cache("hero").await;

        assert!(backend.is_empty().await);
    }
}
