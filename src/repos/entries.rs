//! Caching repository for content entries.

use std::sync::Arc;

use uuid::Uuid;

use crate::cache::{CacheEngine, CacheKey, InvalidationTrigger, Tag};
use crate::domain::entities::EntryRecord;
use crate::domain::types::EntityClass;

use super::{EntryStore, StoreError};

/// Wraps an [`EntryStore`] with read-through caching and write-side
/// invalidation.
///
/// Entries change more often than globals or fieldsets, so they get the
/// shortest default TTL and the densest tag set: list-shaped reads carry a
/// tag per contained entry, URI reads carry the broad `uris` tag.
pub struct CachingEntryRepository<S> {
    store: S,
    engine: Arc<CacheEngine>,
    trigger: InvalidationTrigger,
}

impl<S: EntryStore> CachingEntryRepository<S> {
    pub fn new(store: S, engine: Arc<CacheEngine>) -> Self {
        let trigger = InvalidationTrigger::new(engine.clone());
        Self {
            store,
            engine,
            trigger,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Single-ID lookup, uncached.
    ///
    /// Hosts already memoize this per request; a second cache layer under
    /// a 300 s TTL would add staleness without saving queries.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<EntryRecord>, StoreError> {
        self.store.find_by_id(id).await
    }

    /// ID-list lookup (navigation, listings), cached.
    ///
    /// Tagged with each requested entry so a save or delete of any of them
    /// expires exactly the lists that contained it.
    pub async fn find_many_by_ids(&self, ids: &[Uuid]) -> Result<Vec<EntryRecord>, StoreError> {
        let key = CacheKey::entry_ids(ids);
        let mut tags = vec![Tag::entries()];
        tags.extend(ids.iter().map(|id| Tag::entry(*id)));

        self.engine
            .read_through(EntityClass::Entries, None, &key, &tags, || {
                self.store.find_many_by_ids(ids)
            })
            .await
    }

    /// URI lookup, cached under the broad `uris` tag.
    pub async fn find_by_uri(
        &self,
        uri: &str,
        site: Option<&str>,
    ) -> Result<Option<EntryRecord>, StoreError> {
        let key = CacheKey::entry_uri(uri, site);
        let tags = [Tag::entries(), Tag::uris()];

        self.engine
            .read_through(EntityClass::Entries, None, &key, &tags, || {
                self.store.find_by_uri(uri, site)
            })
            .await
    }

    /// Published listing of one collection, cached.
    ///
    /// The collection name is the exclusion subject: collections on the
    /// exclude list are never cached.
    pub async fn list_published(&self, collection: &str) -> Result<Vec<EntryRecord>, StoreError> {
        let key = CacheKey::entry_collection(collection);
        let tags = [Tag::entries(), Tag::collection(collection)];

        self.engine
            .read_through(EntityClass::Entries, Some(collection), &key, &tags, || {
                self.store.list_published(collection)
            })
            .await
    }

    /// Persist an entry, then invalidate the caches it may have affected.
    ///
    /// The store write must succeed first; on failure nothing is
    /// invalidated (the stale cache still matches the unchanged store).
    pub async fn save(&self, entry: &EntryRecord) -> Result<(), StoreError> {
        self.store.save(entry).await?;
        self.trigger
            .entry_saved(entry.id, &entry.collection, &entry.uri, &entry.site)
            .await;
        Ok(())
    }

    /// Delete an entry, then invalidate.
    pub async fn delete(&self, entry: &EntryRecord) -> Result<(), StoreError> {
        self.store.delete(entry).await?;
        self.trigger
            .entry_deleted(entry.id, &entry.collection, &entry.uri, &entry.site)
            .await;
        Ok(())
    }

    /// Recompute URIs for a collection, then drop every URI lookup cache.
    pub async fn update_uris(&self, collection: &str) -> Result<(), StoreError> {
        self.store.update_uris(collection).await?;
        self.trigger.uris_updated(collection).await;
        Ok(())
    }

    // ========================================================================
    // Administrative clears
    // ========================================================================

    pub async fn clear_all_cache(&self) {
        self.trigger.clear_all_entry_cache().await;
    }

    pub async fn clear_collection_cache(&self, collection: &str) {
        self.trigger.clear_collection_cache(collection).await;
    }

    pub async fn clear_uri_cache(&self) {
        self.trigger.clear_uri_cache().await;
    }
}
