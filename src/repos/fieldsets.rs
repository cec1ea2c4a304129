//! Caching repository for fieldsets.
//!
//! Fieldsets are configuration data read on nearly every render and
//! changed almost never, which makes them the best caching candidate of
//! the three classes. The `all` listing depends on every fieldset, so any
//! fieldset write expires the whole class.

use std::sync::Arc;

use crate::cache::{CacheEngine, CacheKey, InvalidationTrigger, Tag};
use crate::domain::entities::FieldsetRecord;
use crate::domain::types::EntityClass;

use super::{FieldsetStore, StoreError};

/// Wraps a [`FieldsetStore`] with read-through caching.
pub struct CachingFieldsetRepository<S> {
    store: S,
    engine: Arc<CacheEngine>,
    trigger: InvalidationTrigger,
}

impl<S: FieldsetStore> CachingFieldsetRepository<S> {
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

    /// All fieldsets, cached as one listing.
    pub async fn list_all(&self) -> Result<Vec<FieldsetRecord>, StoreError> {
        let key = CacheKey::fieldset_all();
        let tags = [Tag::fieldsets()];

        self.engine
            .read_through(EntityClass::Fieldsets, None, &key, &tags, || {
                self.store.list_all()
            })
            .await
    }

    /// One fieldset by handle, cached separately from the listing.
    pub async fn find_by_handle(&self, handle: &str) -> Result<Option<FieldsetRecord>, StoreError> {
        let key = CacheKey::fieldset_handle(handle);
        let tags = [Tag::fieldsets(), Tag::fieldset(handle)];

        self.engine
            .read_through(EntityClass::Fieldsets, None, &key, &tags, || {
                self.store.find_by_handle(handle)
            })
            .await
    }

    /// Persist a fieldset, then expire the class.
    pub async fn save(&self, fieldset: &FieldsetRecord) -> Result<(), StoreError> {
        self.store.save(fieldset).await?;
        self.trigger.fieldset_saved(&fieldset.handle).await;
        Ok(())
    }

    /// Delete a fieldset, then expire the class.
    pub async fn delete(&self, fieldset: &FieldsetRecord) -> Result<(), StoreError> {
        self.store.delete(fieldset).await?;
        self.trigger.fieldset_deleted(&fieldset.handle).await;
        Ok(())
    }

    /// Drop every fieldset cache.
    pub async fn clear_all_cache(&self) {
        self.trigger.clear_all_fieldset_cache().await;
    }

    /// Drop the cache for one handle, along with the listing.
    pub async fn clear_cache(&self, handle: &str) {
        self.trigger.clear_fieldset_cache(handle).await;
    }
}
