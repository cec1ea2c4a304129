//! Cache key derivation and invalidation tags.
//!
//! Keys are namespaced per entity class so the classes can never collide.
//! Compound or high-cardinality discriminators (ID lists, URI + site pairs)
//! are digested to keep key length bounded; single low-cardinality handles
//! are kept verbatim so keys stay readable in backend tooling.

use sha2::{Digest, Sha256};
use uuid::Uuid;

const NS_ENTRIES: &str = "entries";
const NS_GLOBALS: &str = "globals";
const NS_FIELDSETS: &str = "fieldsets";

/// Site discriminator applied when a lookup does not name a site.
pub const DEFAULT_SITE: &str = "default";

/// A derived cache key.
///
/// Identical discriminator sets always produce identical keys; distinct
/// sets collide only with negligible probability (128-bit digest).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key for an ID-list lookup (`find_many_by_ids`). Order-sensitive.
    pub fn entry_ids(ids: &[Uuid]) -> Self {
        let mut parts: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids {
            parts.push(id.to_string());
        }
        Self(format!("{NS_ENTRIES}:ids:{}", digest(&parts)))
    }

    /// Key for a URI lookup. A missing site falls back to [`DEFAULT_SITE`].
    pub fn entry_uri(uri: &str, site: Option<&str>) -> Self {
        let site = site.unwrap_or(DEFAULT_SITE);
        Self(format!(
            "{NS_ENTRIES}:uri:{}",
            digest(&[uri.to_string(), site.to_string()])
        ))
    }

    /// Key for the published listing of one collection.
    pub fn entry_collection(collection: &str) -> Self {
        Self(format!("{NS_ENTRIES}:collection:{collection}:published"))
    }

    /// Key for a single entry by ID.
    pub fn entry(id: Uuid) -> Self {
        Self(format!("{NS_ENTRIES}:entry:{id}"))
    }

    /// Key for the variables of one global set. Handles are low-cardinality
    /// and kept verbatim.
    pub fn global_set(handle: &str) -> Self {
        Self(format!("{NS_GLOBALS}:{handle}"))
    }

    /// Key for the full fieldset listing.
    pub fn fieldset_all() -> Self {
        Self(format!("{NS_FIELDSETS}:all"))
    }

    /// Key for a single fieldset by handle.
    pub fn fieldset_handle(handle: &str) -> Self {
        Self(format!(
            "{NS_FIELDSETS}:handle:{}",
            digest(&[handle.to_string()])
        ))
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An invalidation grouping label.
///
/// A cache entry may carry several tags; flushing one tag expires every
/// entry stored under it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(String);

impl Tag {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// All entry caches.
    pub fn entries() -> Self {
        Self(NS_ENTRIES.to_string())
    }

    /// Every cache entry derived from one collection.
    pub fn collection(name: &str) -> Self {
        Self(format!("collection:{name}"))
    }

    /// Every cache entry derived from one entry.
    pub fn entry(id: Uuid) -> Self {
        Self(format!("entry:{id}"))
    }

    /// All URI-keyed lookups. Flushed broadly on entry mutation because URI
    /// computation may depend on fields the invalidation call cannot see.
    pub fn uris() -> Self {
        Self("uris".to_string())
    }

    /// All global-set caches.
    pub fn globals() -> Self {
        Self(NS_GLOBALS.to_string())
    }

    /// Every cache entry derived from one global set.
    pub fn global(handle: &str) -> Self {
        Self(format!("global:{handle}"))
    }

    /// All fieldset caches, including the `all` listing.
    pub fn fieldsets() -> Self {
        Self(NS_FIELDSETS.to_string())
    }

    /// Every cache entry derived from one fieldset.
    pub fn fieldset(handle: &str) -> Self {
        Self(format!("fieldset:{handle}"))
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Digest
// ============================================================================

/// Order-sensitive digest over discriminator parts.
///
/// Each part is length-prefixed before hashing so `["ab", "c"]` and
/// `["a", "bc"]` cannot produce the same digest. The output is the first
/// 128 bits of SHA-256, hex encoded.
fn digest(parts: &[String]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    let output = hasher.finalize();
    hex::encode(&output[..16])
}
