//! Runtime configuration for the core crate.
//!
//! # Responsibility
//! - Describe where the store lives, how logging is set up and the
//!   per-architecture capacity limits enforced by services.
//! - Read overrides from `BLACKMANE_*` environment variables.
//!
//! # Invariants
//! - Every field has a default; an empty environment yields
//!   `CoreConfig::default()`.
//! - Malformed values are reported, never silently replaced by defaults.

use crate::logging::default_log_level;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "BLACKMANE_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "BLACKMANE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "BLACKMANE_LOG_DIR";
pub const ENV_MAX_ZONES: &str = "BLACKMANE_MAX_ZONES";
pub const ENV_MAX_COMPONENTS: &str = "BLACKMANE_MAX_COMPONENTS";
pub const ENV_MAX_FLOWS: &str = "BLACKMANE_MAX_FLOWS";

const DEFAULT_DB_FILE: &str = "blackmane.db";

/// Errors from configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid value `{value}` for {key}: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Per-architecture entity ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModelLimits {
    pub max_zones: u32,
    pub max_components: u32,
    pub max_flows: u32,
}

impl Default for ModelLimits {
    fn default() -> Self {
        Self {
            max_zones: 50,
            max_components: 500,
            max_flows: 1000,
        }
    }
}

/// Core runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub limits: ModelLimits,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            log_level: default_log_level().to_string(),
            log_dir: None,
            limits: ModelLimits::default(),
        }
    }
}

impl CoreConfig {
    /// Builds configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(value) = read(ENV_MAX_ZONES) {
            config.limits.max_zones = parse_limit(ENV_MAX_ZONES, value)?;
        }
        if let Some(value) = read(ENV_MAX_COMPONENTS) {
            config.limits.max_components = parse_limit(ENV_MAX_COMPONENTS, value)?;
        }
        if let Some(value) = read(ENV_MAX_FLOWS) {
            config.limits.max_flows = parse_limit(ENV_MAX_FLOWS, value)?;
        }
        Ok(config)
    }
}

fn parse_limit(key: &'static str, value: String) -> Result<u32, ConfigError> {
    match value.parse::<u32>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            key,
            value,
            reason: "limit must be at least 1".to_string(),
        }),
        Ok(limit) => Ok(limit),
        Err(err) => Err(ConfigError::InvalidValue {
            key,
            value,
            reason: err.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ConfigError, CoreConfig, ModelLimits, ENV_DB_PATH, ENV_LOG_DIR, ENV_MAX_FLOWS,
        ENV_MAX_ZONES,
    };
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = CoreConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.limits, ModelLimits::default());
        assert_eq!(config.limits.max_zones, 50);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn overrides_are_applied_and_blank_values_ignored() {
        let config = CoreConfig::from_lookup(lookup_from(&[
            (ENV_DB_PATH, "/var/lib/blackmane/store.db"),
            (ENV_LOG_DIR, "   "),
            (ENV_MAX_FLOWS, " 20 "),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/blackmane/store.db"));
        assert!(config.log_dir.is_none());
        assert_eq!(config.limits.max_flows, 20);
        assert_eq!(config.limits.max_components, 500);
    }

    #[test]
    fn malformed_limit_is_reported() {
        let err = CoreConfig::from_lookup(lookup_from(&[(ENV_MAX_ZONES, "many")])).unwrap_err();
        let ConfigError::InvalidValue { key, value, .. } = err;
        assert_eq!(key, ENV_MAX_ZONES);
        assert_eq!(value, "many");

        assert!(CoreConfig::from_lookup(lookup_from(&[(ENV_MAX_ZONES, "0")])).is_err());
    }

    #[test]
    fn deserializes_partial_document_with_defaults() {
        let config: CoreConfig =
            serde_json::from_str(r#"{"db_path":"x.db","limits":{"max_zones":3}}"#).unwrap();
        assert_eq!(config.db_path, PathBuf::from("x.db"));
        assert_eq!(config.limits.max_zones, 3);
        assert_eq!(config.limits.max_flows, 1000);
    }
}
