//! A tagged cache-aside layer for database-backed content repositories.
//!
//! Three repository classes (content entries, global variable sets,
//! fieldsets) are wrapped with read-through caching against a pluggable
//! key-value backend, and kept fresh through event-driven invalidation:
//! tag flushes where the backend supports tags, exact-key forgets where it
//! does not.
//!
//! The cache layer is strictly best-effort. Backend failures degrade to
//! uncached passthrough; accessor failures propagate unchanged; a failed
//! write never triggers invalidation.
//!
//! ```ignore
//! let settings = Settings::load(None)?;
//! let backend = Arc::new(MemoryBackend::default());
//! let engine = Arc::new(CacheEngine::new(backend, settings.policies()));
//!
//! let entries = CachingEntryRepository::new(entry_store, engine.clone());
//! let globals = CachingGlobalsRepository::new(globals_store, engine.clone());
//! let fieldsets = CachingFieldsetRepository::new(fieldset_store, engine.clone());
//!
//! // Host event bus:
//! let trigger = InvalidationTrigger::new(engine);
//! trigger.notify(&MutationEvent::GlobalVariablesSaved { handle }).await;
//! ```

pub mod cache;
pub mod config;
pub mod domain;
pub mod repos;

pub use cache::{
    BackendError, CacheBackend, CacheEngine, CacheKey, CachePolicy, InvalidationTrigger,
    MemoryBackend, MutationEvent, PolicyResolver, Tag,
};
pub use config::Settings;
pub use domain::types::EntityClass;
pub use repos::{
    CachingEntryRepository, CachingFieldsetRepository, CachingGlobalsRepository, EntryStore,
    FieldsetStore, GlobalsStore, StoreError,
};
