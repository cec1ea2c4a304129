//! Domain records mirrored from the host's persistent storage.
//!
//! These are deliberately thin: the cache layer treats record contents as
//! opaque payloads and only reads the identifying fields (id, collection,
//! handle, uri, site) that key derivation and invalidation need.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A content entry belonging to a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub id: Uuid,
    pub collection: String,
    pub slug: String,
    pub uri: String,
    pub site: String,
    pub data: serde_json::Value,
    pub published: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The variables of one global set, per site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalVariablesRecord {
    pub handle: String,
    pub site: String,
    pub data: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A reusable field definition group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldsetRecord {
    pub handle: String,
    pub title: String,
    pub fields: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}
