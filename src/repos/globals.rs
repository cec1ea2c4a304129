//! Caching repository for global variable sets.

use std::sync::Arc;

use crate::cache::{CacheEngine, CacheKey, InvalidationTrigger, Tag};
use crate::domain::entities::GlobalVariablesRecord;
use crate::domain::types::EntityClass;

use super::{GlobalsStore, StoreError};

/// Wraps a [`GlobalsStore`] with read-through caching.
///
/// Global sets rarely change, so they default to a 24 h TTL; the set
/// handle doubles as the exclusion subject.
pub struct CachingGlobalsRepository<S> {
    store: S,
    engine: Arc<CacheEngine>,
    trigger: InvalidationTrigger,
}

impl<S: GlobalsStore> CachingGlobalsRepository<S> {
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

    /// Variables of one global set, cached per handle.
    pub async fn find_by_handle(
        &self,
        handle: &str,
    ) -> Result<Option<GlobalVariablesRecord>, StoreError> {
        let key = CacheKey::global_set(handle);
        let tags = [Tag::globals(), Tag::global(handle)];

        self.engine
            .read_through(EntityClass::Globals, Some(handle), &key, &tags, || {
                self.store.find_by_handle(handle)
            })
            .await
    }

    /// Persist a set's variables, then drop its cache entry.
    pub async fn save(&self, variables: &GlobalVariablesRecord) -> Result<(), StoreError> {
        self.store.save(variables).await?;
        self.trigger.global_variables_saved(&variables.handle).await;
        Ok(())
    }

    /// Drop the cache for one handle.
    pub async fn clear_cache(&self, handle: &str) {
        self.trigger.clear_global_cache(handle).await;
    }

    /// Drop the caches of every set the store knows about.
    pub async fn clear_all_cache(&self) -> Result<(), StoreError> {
        let handles = self.store.list_handles().await?;
        self.trigger.clear_all_global_cache(&handles).await;
        Ok(())
    }
}
