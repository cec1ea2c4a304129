//! Configuration layer: typed settings with layered precedence (file → env).
//!
//! Settings are read once at startup and converted into the immutable
//! policy set the engine is constructed with. Absent values fall back to
//! the documented per-class defaults; a missing configuration file is not
//! an error.

use std::collections::BTreeSet;
use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::cache::{CachePolicy, PolicyResolver};

const LOCAL_CONFIG_BASENAME: &str = "scorta";
const ENV_PREFIX: &str = "SCORTA";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
}

/// Typed settings for the three entity classes.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub entries: ClassSettings,
    pub globals: ClassSettings,
    pub fieldsets: ClassSettings,
}

/// Per-class cache settings as configured.
///
/// `cache_duration` is kept optional here; the TTL default is applied at
/// policy-resolution time so it lives in exactly one place.
#[derive(Debug, Clone)]
pub struct ClassSettings {
    pub enabled: bool,
    pub cache_duration: Option<u64>,
    pub exclude: BTreeSet<String>,
    pub tagged_only: bool,
}

impl Default for ClassSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            cache_duration: None,
            exclude: BTreeSet::new(),
            tagged_only: false,
        }
    }
}

impl ClassSettings {
    fn policy(&self) -> CachePolicy {
        CachePolicy {
            enabled: self.enabled,
            ttl_seconds: self.cache_duration,
            exclude: self.exclude.clone(),
            tagged_only: self.tagged_only,
        }
    }
}

impl Settings {
    /// Load settings using the configured precedence (file → environment).
    ///
    /// `scorta.toml` in the working directory is picked up when present;
    /// an explicitly named file must exist. Environment variables use the
    /// `SCORTA` prefix with `__` as section separator
    /// (`SCORTA_ENTRIES__CACHE_DURATION=60`).
    pub fn load(config_file: Option<&Path>) -> Result<Self, LoadError> {
        let mut builder = Config::builder()
            .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

        let raw: RawSettings = builder.build()?.try_deserialize()?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawSettings) -> Self {
        Self {
            entries: ClassSettings {
                enabled: raw.entries.enabled.unwrap_or(true),
                cache_duration: raw.entries.cache_duration,
                exclude: raw.entries.exclude_collections.into_iter().collect(),
                tagged_only: raw.entries.tagged_only.unwrap_or(false),
            },
            globals: ClassSettings {
                enabled: raw.globals.enabled.unwrap_or(true),
                cache_duration: raw.globals.cache_duration,
                exclude: raw.globals.exclude_handles.into_iter().collect(),
                tagged_only: false,
            },
            fieldsets: ClassSettings {
                enabled: raw.fieldsets.enabled.unwrap_or(true),
                cache_duration: raw.fieldsets.cache_duration,
                exclude: BTreeSet::new(),
                tagged_only: false,
            },
        }
    }

    /// The immutable policy set the engine is constructed with.
    pub fn policies(&self) -> PolicyResolver {
        PolicyResolver::new(
            self.entries.policy(),
            self.globals.policy(),
            self.fieldsets.policy(),
        )
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    entries: RawEntriesSettings,
    globals: RawGlobalsSettings,
    fieldsets: RawFieldsetsSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawEntriesSettings {
    enabled: Option<bool>,
    cache_duration: Option<u64>,
    exclude_collections: Vec<String>,
    tagged_only: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawGlobalsSettings {
    enabled: Option<bool>,
    cache_duration: Option<u64>,
    exclude_handles: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawFieldsetsSettings {
    enabled: Option<bool>,
    cache_duration: Option<u64>,
}
