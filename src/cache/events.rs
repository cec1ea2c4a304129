//! Domain mutation events and the invalidation sets they imply.
//!
//! Each event knows which tags a tagging backend must flush and which
//! exact keys a non-tagging backend can still forget. Everything here is
//! pure; applying the sets is the trigger's job.

use uuid::Uuid;

use crate::domain::types::EntityClass;

use super::keys::{CacheKey, DEFAULT_SITE, Tag};

/// A mutation of an underlying record, as reported by the host.
///
/// Carries exactly the identifying data needed to compute the affected
/// tags and keys: handle, collection name, id, uri, site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationEvent {
    /// An entry was created or updated.
    EntrySaved {
        id: Uuid,
        collection: String,
        uri: String,
        site: String,
    },
    /// An entry was deleted.
    EntryDeleted {
        id: Uuid,
        collection: String,
        uri: String,
        site: String,
    },
    /// URIs of a collection were recomputed in bulk.
    UrisUpdated { collection: String },
    /// A global set's definition was saved.
    GlobalSetSaved { handle: String },
    /// A global set's variables were saved.
    GlobalVariablesSaved { handle: String },
    /// A fieldset was created or updated.
    FieldsetSaved { handle: String },
    /// A fieldset was deleted.
    FieldsetDeleted { handle: String },
}

impl MutationEvent {
    /// The entity class the event belongs to.
    pub fn class(&self) -> EntityClass {
        match self {
            MutationEvent::EntrySaved { .. }
            | MutationEvent::EntryDeleted { .. }
            | MutationEvent::UrisUpdated { .. } => EntityClass::Entries,
            MutationEvent::GlobalSetSaved { .. } | MutationEvent::GlobalVariablesSaved { .. } => {
                EntityClass::Globals
            }
            MutationEvent::FieldsetSaved { .. } | MutationEvent::FieldsetDeleted { .. } => {
                EntityClass::Fieldsets
            }
        }
    }

    /// The exclusion discriminator for the mutated record, if any.
    pub fn subject(&self) -> Option<&str> {
        match self {
            MutationEvent::EntrySaved { collection, .. }
            | MutationEvent::EntryDeleted { collection, .. }
            | MutationEvent::UrisUpdated { collection } => Some(collection),
            MutationEvent::GlobalSetSaved { handle }
            | MutationEvent::GlobalVariablesSaved { handle } => Some(handle),
            MutationEvent::FieldsetSaved { .. } | MutationEvent::FieldsetDeleted { .. } => None,
        }
    }

    /// Tags a tagging backend must flush for this event.
    ///
    /// Entry mutations flush both the entity-scoped and collection-scoped
    /// tags (the write may affect single lookups and membership queries),
    /// plus the broad `uris` tag: URI computation can depend on slugs and
    /// routing rules this event cannot see, so no attempt is made to track
    /// that dependency precisely.
    pub fn affected_tags(&self) -> Vec<Tag> {
        match self {
            MutationEvent::EntrySaved { id, collection, .. }
            | MutationEvent::EntryDeleted { id, collection, .. } => vec![
                Tag::entry(*id),
                Tag::collection(collection),
                Tag::uris(),
            ],
            MutationEvent::UrisUpdated { .. } => vec![Tag::uris()],
            MutationEvent::GlobalSetSaved { handle }
            | MutationEvent::GlobalVariablesSaved { handle } => vec![Tag::global(handle)],
            MutationEvent::FieldsetSaved { .. } | MutationEvent::FieldsetDeleted { .. } => {
                // The `all` listing depends on every fieldset, so the whole
                // class tag goes.
                vec![Tag::fieldsets()]
            }
        }
    }

    /// Exact keys a non-tagging backend can forget for this event.
    ///
    /// This is the reduced-coverage fallback: ID-list and foreign-site URI
    /// lookups are not reconstructible here and stay cached until TTL.
    pub fn affected_keys(&self) -> Vec<CacheKey> {
        match self {
            MutationEvent::EntrySaved {
                id,
                collection,
                uri,
                site,
            }
            | MutationEvent::EntryDeleted {
                id,
                collection,
                uri,
                site,
            } => {
                let mut keys = vec![
                    CacheKey::entry_collection(collection),
                    CacheKey::entry(*id),
                    CacheKey::entry_uri(uri, Some(site)),
                ];
                if site != DEFAULT_SITE {
                    keys.push(CacheKey::entry_uri(uri, None));
                }
                keys
            }
            MutationEvent::UrisUpdated { .. } => Vec::new(),
            MutationEvent::GlobalSetSaved { handle }
            | MutationEvent::GlobalVariablesSaved { handle } => {
                vec![CacheKey::global_set(handle)]
            }
            MutationEvent::FieldsetSaved { handle } | MutationEvent::FieldsetDeleted { handle } => {
                vec![CacheKey::fieldset_all(), CacheKey::fieldset_handle(handle)]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_save_flushes_entity_collection_and_uris() {
        let id = Uuid::new_v4();
        let event = MutationEvent::EntrySaved {
            id,
            collection: "articles".to_string(),
            uri: "/articles/hello".to_string(),
            site: "default".to_string(),
        };

        assert_eq!(event.class(), EntityClass::Entries);
        assert_eq!(
            event.affected_tags(),
            vec![Tag::entry(id), Tag::collection("articles"), Tag::uris()]
        );
    }

    #[test]
    fn entry_fallback_keys_are_reconstructible() {
        let id = Uuid::new_v4();
        let event = MutationEvent::EntryDeleted {
            id,
            collection: "articles".to_string(),
            uri: "/articles/hello".to_string(),
            site: "en".to_string(),
        };

        let keys = event.affected_keys();
        assert!(keys.contains(&CacheKey::entry_collection("articles")));
        assert!(keys.contains(&CacheKey::entry(id)));
        assert!(keys.contains(&CacheKey::entry_uri("/articles/hello", Some("en"))));
        // The siteless variant is also forgotten for non-default sites.
        assert!(keys.contains(&CacheKey::entry_uri("/articles/hello", None)));
    }

    #[test]
    fn default_site_keys_are_not_duplicated() {
        let event = MutationEvent::EntrySaved {
            id: Uuid::new_v4(),
            collection: "articles".to_string(),
            uri: "/a".to_string(),
            site: DEFAULT_SITE.to_string(),
        };
        let keys = event.affected_keys();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn uri_recompute_has_no_exact_fallback() {
        let event = MutationEvent::UrisUpdated {
            collection: "articles".to_string(),
        };
        assert_eq!(event.affected_tags(), vec![Tag::uris()]);
        assert!(event.affected_keys().is_empty());
    }

    #[test]
    fn global_events_target_one_handle() {
        for event in [
            MutationEvent::GlobalSetSaved {
                handle: "footer".to_string(),
            },
            MutationEvent::GlobalVariablesSaved {
                handle: "footer".to_string(),
            },
        ] {
            assert_eq!(event.class(), EntityClass::Globals);
            assert_eq!(event.affected_tags(), vec![Tag::global("footer")]);
            assert_eq!(event.affected_keys(), vec![CacheKey::global_set("footer")]);
        }
    }

    #[test]
    fn fieldset_events_flush_the_whole_class() {
        let event = MutationEvent::FieldsetSaved {
            handle: "hero".to_string(),
        };
        assert_eq!(event.affected_tags(), vec![Tag::fieldsets()]);
        assert_eq!(
            event.affected_keys(),
            vec![CacheKey::fieldset_all(), CacheKey::fieldset_handle("hero")]
        );
    }
}
