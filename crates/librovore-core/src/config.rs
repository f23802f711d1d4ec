//! Configuration for the librovore core: registered extensions and cache
//! tuning.
//!
//! ## Configuration Hierarchy
//!
//! 1. **Global config**: platform config directory, `config.toml`.
//! 2. **Local override**: `config.local.toml` in the same directory, merged
//!    on top of the global file.
//! 3. **Environment variables**: `LIBROVORE_*` prefix, highest precedence.
//!
//! ## Example Configuration File
//!
//! ```toml
//! [[extensions]]
//! name = "sphinx"
//! enabled = true
//!
//! [cache]
//! probe_entries_max = 1000
//! content_memory_max = 33554432
//! success_ttl_seconds = 300
//! error_ttl_seconds = 30
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// An entry in the `extensions` list (spec §6).
///
/// Entries without a `package` name a built-in processor and are simply
/// enabled/disabled. Entries naming a `package` would be installed by an
/// external package manager; that installation path is out of scope for
/// this build, so such entries are accepted but logged as unsupported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionEntry {
    /// The processor name (matches a built-in registry name, or a future
    /// third-party package's declared name).
    pub name: String,
    /// Whether this processor should be registered.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// An external package to install before registration. Built-in
    /// processors leave this unset.
    #[serde(default)]
    pub package: Option<String>,
    /// Arguments forwarded to the processor constructor, if any.
    #[serde(default)]
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

const fn default_true() -> bool {
    true
}

/// Tuning knobs for the three cache-proxy caches (spec §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum entry count for the probe cache before LRU eviction.
    pub probe_entries_max: usize,
    /// Maximum total bytes for the content cache before LRU eviction.
    pub content_memory_max: usize,
    /// TTL, in seconds, for successfully cached values.
    pub success_ttl_seconds: f64,
    /// TTL, in seconds, for cached errors (shorter, so transient failures
    /// are retried sooner than successes are re-probed).
    pub error_ttl_seconds: f64,
    /// TTL, in seconds, for a fetched `robots.txt` parser.
    pub robots_ttl_seconds: f64,
    /// TTL, in seconds, for the permissive sentinel installed when
    /// `robots.txt` could not be fetched.
    pub robots_error_ttl_seconds: f64,
    /// Maximum duration, in seconds, for a probe request.
    pub probe_duration_max_seconds: f64,
    /// Maximum duration, in seconds, for a retrieve request.
    pub retrieve_duration_max_seconds: f64,
    /// Maximum duration, in seconds, for a `robots.txt` fetch.
    pub robots_duration_max_seconds: f64,
    /// TTL, in seconds, for the processor detection cache.
    pub detection_ttl_seconds: f64,
    /// User agent sent with outbound HTTP requests.
    pub user_agent: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            probe_entries_max: 1000,
            content_memory_max: 32 * 1024 * 1024,
            success_ttl_seconds: 300.0,
            error_ttl_seconds: 30.0,
            robots_ttl_seconds: 3600.0,
            robots_error_ttl_seconds: 300.0,
            probe_duration_max_seconds: 10.0,
            retrieve_duration_max_seconds: 30.0,
            robots_duration_max_seconds: 2.5,
            detection_ttl_seconds: 3600.0,
            user_agent: "librovore/0.1".to_string(),
        }
    }
}

/// Global configuration for librovore.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Registered processor extensions.
    pub extensions: Vec<ExtensionEntry>,
    /// Cache-proxy tuning.
    pub cache: CacheConfig,
}

impl Config {
    /// Loads configuration from the platform config directory, merging a
    /// `config.local.toml` override and `LIBROVORE_*` environment variables
    /// on top. Returns defaults if no config file exists.
    pub fn load() -> Result<Self> {
        let dir = Self::config_dir()?;
        let mut config = Self::load_from_dir(&dir)?;
        config.apply_env_overrides();
        config.warn_unsupported_extensions();
        Ok(config)
    }

    /// Loads configuration from an explicit directory, for tests.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let mut config = Self::read_toml(&dir.join("config.toml"))?.unwrap_or_default();
        if let Some(local) = Self::read_toml(&dir.join("config.local.toml"))? {
            config.merge(local);
        }
        Ok(config)
    }

    fn config_dir() -> Result<PathBuf> {
        ProjectDirs::from("", "", "librovore")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| Error::Config("could not determine config directory".into()))
    }

    fn read_toml(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(path)
            .map_err(|err| Error::Config(format!("reading {}: {err}", path.display())))?;
        let config: Self = toml::from_str(&text)
            .map_err(|err| Error::Config(format!("parsing {}: {err}", path.display())))?;
        Ok(Some(config))
    }

    /// Merges `other` on top of `self`: a non-empty `extensions` list
    /// replaces the base list entirely (overrides are whole-list, not
    /// per-entry); `cache` fields are replaced wholesale as well, since the
    /// override file is expected to be complete for any section it mentions.
    fn merge(&mut self, other: Self) {
        if !other.extensions.is_empty() {
            self.extensions = other.extensions;
        }
        self.cache = other.cache;
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("LIBROVORE_CACHE_PROBE_ENTRIES_MAX") {
            if let Ok(parsed) = value.parse() {
                self.cache.probe_entries_max = parsed;
            }
        }
        if let Ok(value) = std::env::var("LIBROVORE_CACHE_CONTENT_MEMORY_MAX") {
            if let Ok(parsed) = value.parse() {
                self.cache.content_memory_max = parsed;
            }
        }
        if let Ok(value) = std::env::var("LIBROVORE_USER_AGENT") {
            self.cache.user_agent = value;
        }
    }

    fn warn_unsupported_extensions(&self) {
        for entry in &self.extensions {
            if entry.package.is_some() {
                warn!(
                    name = %entry.name,
                    "extension package installation is not supported in this build; \
                     register built-in processors only"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_constants() {
        let cache = CacheConfig::default();
        assert_eq!(cache.probe_entries_max, 1000);
        assert_eq!(cache.content_memory_max, 32 * 1024 * 1024);
        assert!(cache.success_ttl_seconds > cache.error_ttl_seconds);
    }

    #[test]
    fn load_from_dir_without_files_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap();
        assert!(config.extensions.is_empty());
    }

    #[test]
    fn local_override_replaces_cache_section() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.toml"),
            "[[extensions]]\nname = \"sphinx\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("config.local.toml"),
            "[cache]\nprobe_entries_max = 5\n",
        )
        .unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap();
        assert_eq!(config.extensions.len(), 1);
        assert_eq!(config.cache.probe_entries_max, 5);
    }
}
