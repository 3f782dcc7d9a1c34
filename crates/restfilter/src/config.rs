//! Filter configuration loaded from TOML.
//!
//! One file describes every filterable scope of an API:
//!
//! ```toml
//! version = 1
//! max_depth = 32
//! max_terms = 256
//!
//! [scopes.users]
//! allowed_keys = ["id", "name", "created_at"]
//!
//! [scopes.audit]
//! allowed_keys = ["*"]
//! max_depth = 8
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parser::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_TERMS};
use crate::Filter;

/// Current config file version.
const CONFIG_VERSION: u32 = 1;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The config file is not valid TOML for [`Config`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// No scope with the requested name.
    #[error("unknown filter scope: {0}")]
    UnknownScope(String),
}

/// Configuration file structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Default nesting limit for every scope.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Default predicate limit for every scope.
    #[serde(default = "default_max_terms")]
    pub max_terms: usize,

    /// Filterable scopes by name.
    #[serde(default)]
    pub scopes: BTreeMap<String, ScopeConfig>,
}

/// Settings for one filterable scope (usually a table).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Field names clients may reference; `"*"` allows all.
    #[serde(default)]
    pub allowed_keys: Vec<String>,

    /// Overrides the top-level nesting limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,

    /// Overrides the top-level predicate limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_terms: Option<usize>,
}

/// Returns the current config version (used by serde default).
fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_max_terms() -> usize {
    DEFAULT_MAX_TERMS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            max_depth: DEFAULT_MAX_DEPTH,
            max_terms: DEFAULT_MAX_TERMS,
            scopes: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content)?;
        config.version = CONFIG_VERSION;
        Ok(config)
    }

    /// Loads the configuration from disk.
    ///
    /// A missing file yields the default configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Serializes the configuration back to TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Builds the [`Filter`] for a named scope.
    pub fn filter(&self, scope: &str) -> Result<Filter, ConfigError> {
        let settings = self
            .scopes
            .get(scope)
            .ok_or_else(|| ConfigError::UnknownScope(scope.to_string()))?;

        Ok(Filter::new(scope, settings.allowed_keys.iter().map(String::as_str))
            .with_max_depth(settings.max_depth.unwrap_or(self.max_depth))
            .with_max_terms(settings.max_terms.unwrap_or(self.max_terms)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
max_depth = 16

[scopes.foo]
allowed_keys = ["id", "x", "y"]
max_terms = 10

[scopes.bar]
allowed_keys = ["*"]
max_depth = 4
"#;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, 1);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.max_terms, DEFAULT_MAX_TERMS);
        assert!(config.scopes.is_empty());
    }

    #[test]
    fn test_parse_scopes() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.version, 1);
        assert_eq!(config.max_depth, 16);
        assert_eq!(config.scopes["foo"].allowed_keys, vec!["id", "x", "y"]);
        assert_eq!(config.scopes["bar"].max_depth, Some(4));
    }

    #[test]
    fn test_filter_for_scope() {
        let config = Config::from_toml_str(SAMPLE).unwrap();

        let foo = config.filter("foo").unwrap();
        assert_eq!(foo.scope(), "foo");
        assert_eq!(foo.max_depth(), 16);
        assert_eq!(foo.max_terms(), 10);
        assert!(foo.allowed_keys().contains("x"));
        assert!(!foo.allowed_keys().contains("z"));

        let bar = config.filter("bar").unwrap();
        assert!(bar.allowed_keys().is_wildcard());
        assert_eq!(bar.max_depth(), 4);
        assert_eq!(bar.max_terms(), DEFAULT_MAX_TERMS);
    }

    #[test]
    fn test_unknown_scope() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        let err = config.filter("baz").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownScope(ref s) if s == "baz"));
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml_str("scopes = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_toml_roundtrip_keeps_scopes() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        let text = config.to_toml_string().unwrap();
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }
}
