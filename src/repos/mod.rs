//! Caching repositories: the three call sites of the engine.
//!
//! Each repository wraps a store trait by composition and adds the cache
//! layer in front of its read operations; writes go to the store first and
//! invalidate on success only.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{EntryRecord, FieldsetRecord, GlobalVariablesRecord};

mod entries;
mod fieldsets;
mod globals;

pub use entries::CachingEntryRepository;
pub use fieldsets::CachingFieldsetRepository;
pub use globals::CachingGlobalsRepository;

/// Failure in the wrapped data accessor.
///
/// Always propagated unchanged through the cache layer; a store failure on
/// write also suppresses the invalidation that would have followed it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl StoreError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Data accessor for content entries.
#[async_trait]
pub trait EntryStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<EntryRecord>, StoreError>;
    async fn find_many_by_ids(&self, ids: &[Uuid]) -> Result<Vec<EntryRecord>, StoreError>;
    async fn find_by_uri(
        &self,
        uri: &str,
        site: Option<&str>,
    ) -> Result<Option<EntryRecord>, StoreError>;
    async fn list_published(&self, collection: &str) -> Result<Vec<EntryRecord>, StoreError>;
    async fn save(&self, entry: &EntryRecord) -> Result<(), StoreError>;
    async fn delete(&self, entry: &EntryRecord) -> Result<(), StoreError>;
    async fn update_uris(&self, collection: &str) -> Result<(), StoreError>;
}

/// Data accessor for global variable sets.
#[async_trait]
pub trait GlobalsStore: Send + Sync {
    async fn find_by_handle(
        &self,
        handle: &str,
    ) -> Result<Option<GlobalVariablesRecord>, StoreError>;
    async fn list_handles(&self) -> Result<Vec<String>, StoreError>;
    async fn save(&self, variables: &GlobalVariablesRecord) -> Result<(), StoreError>;
}

/// Data accessor for fieldsets.
#[async_trait]
pub trait FieldsetStore: Send + Sync {
    async fn find_by_handle(&self, handle: &str) -> Result<Option<FieldsetRecord>, StoreError>;
    async fn list_all(&self) -> Result<Vec<FieldsetRecord>, StoreError>;
    async fn save(&self, fieldset: &FieldsetRecord) -> Result<(), StoreError>;
    async fn delete(&self, fieldset: &FieldsetRecord) -> Result<(), StoreError>;
}
