//! Caching policy: per-class enablement, TTLs, and exclusions.
//!
//! Policies are immutable once constructed. The engine consults them on
//! every read; they perform no I/O.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::domain::types::EntityClass;

// Per-class TTL defaults applied when no duration is configured.
const DEFAULT_ENTRIES_TTL_SECS: u64 = 300;
const DEFAULT_GLOBALS_TTL_SECS: u64 = 86_400;
const DEFAULT_FIELDSETS_TTL_SECS: u64 = 86_400;

/// Caching policy for one entity class.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    /// Master switch for the class.
    pub enabled: bool,
    /// Configured TTL; `None` falls back to the class default.
    pub ttl_seconds: Option<u64>,
    /// Identifiers (collection names, set handles) exempt from caching.
    pub exclude: BTreeSet<String>,
    /// Skip caching entirely when the backend cannot tag entries.
    pub tagged_only: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: None,
            exclude: BTreeSet::new(),
            tagged_only: false,
        }
    }
}

impl CachePolicy {
    /// Policy that bypasses the cache for every read of the class.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Resolves per-call cacheability and TTLs from the immutable policy set.
#[derive(Debug, Clone, Default)]
pub struct PolicyResolver {
    entries: CachePolicy,
    globals: CachePolicy,
    fieldsets: CachePolicy,
}

impl PolicyResolver {
    pub fn new(entries: CachePolicy, globals: CachePolicy, fieldsets: CachePolicy) -> Self {
        Self {
            entries,
            globals,
            fieldsets,
        }
    }

    fn policy(&self, class: EntityClass) -> &CachePolicy {
        match class {
            EntityClass::Entries => &self.entries,
            EntityClass::Globals => &self.globals,
            EntityClass::Fieldsets => &self.fieldsets,
        }
    }

    /// Whether the class's master switch is on at all.
    pub fn class_enabled(&self, class: EntityClass) -> bool {
        self.policy(class).enabled
    }

    /// Decide whether a read should go through the cache.
    ///
    /// `subject` is the exclusion discriminator for the call: the collection
    /// name for entries, the set handle for globals. Reads with no natural
    /// subject (fieldset listings) pass `None` and only the class switches
    /// apply. `tags_supported` is the memoized backend capability.
    pub fn should_cache(
        &self,
        class: EntityClass,
        subject: Option<&str>,
        tags_supported: bool,
    ) -> bool {
        let policy = self.policy(class);

        if !policy.enabled {
            return false;
        }

        if let Some(subject) = subject
            && policy.exclude.contains(subject)
        {
            return false;
        }

        if policy.tagged_only && !tags_supported {
            return false;
        }

        true
    }

    /// Effective TTL for the class: configured duration or class default.
    pub fn ttl(&self, class: EntityClass) -> Duration {
        let default_secs = match class {
            EntityClass::Entries => DEFAULT_ENTRIES_TTL_SECS,
            EntityClass::Globals => DEFAULT_GLOBALS_TTL_SECS,
            EntityClass::Fieldsets => DEFAULT_FIELDSETS_TTL_SECS,
        };
        Duration::from_secs(self.policy(class).ttl_seconds.unwrap_or(default_secs))
    }
}
