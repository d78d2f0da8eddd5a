//! Configuration system for GridPlace.
//!
//! Load the zone geometry table, swap policy and server settings from TOML
//! or YAML files without code changes.
//!
//! # Examples
//!
//! Load configuration from a TOML string:
//!
//! ```
//! use gridplace_config::{AtomicSwapPolicy, GridConfig};
//!
//! let config = GridConfig::from_toml_str(r#"
//!     [swap]
//!     atomic = "required"
//!
//!     [zones]
//!     default_max_col = 30
//!
//!     [zones.zones.soi6]
//!     max_col = 20
//!     rows = [{ min_row = 1, max_row = 2 }]
//! "#).unwrap();
//!
//! assert_eq!(config.swap.atomic, AtomicSwapPolicy::Required);
//! assert_eq!(config.zone_table().effective("soi6").max_col, 20);
//! assert_eq!(config.zone_table().effective("other").max_col, 30);
//! ```
//!
//! Use the default config when the file is missing:
//!
//! ```
//! use gridplace_config::GridConfig;
//!
//! let config = GridConfig::load("gridplace.toml").unwrap_or_default();
//! assert!(config.swap.serialize_zones);
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use gridplace_core::geometry::ZoneTable;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(test)]
mod tests;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main service configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GridConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Swap execution policy.
    #[serde(default)]
    pub swap: SwapConfig,

    /// Zone geometry. Falls back to the built-in floor plans when absent.
    #[serde(default)]
    pub zones: Option<ZoneTable>,
}

impl GridConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file, picking the format by extension.
    ///
    /// `.yaml`/`.yml` files are read as YAML, anything else as TOML.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist, fails to parse, or describes
    /// an inconsistent zone table.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the zone table.
    pub fn with_zones(mut self, zones: ZoneTable) -> Self {
        self.zones = Some(zones);
        self
    }

    /// Sets the atomic swap policy.
    pub fn with_atomic_policy(mut self, policy: AtomicSwapPolicy) -> Self {
        self.swap.atomic = policy;
        self
    }

    /// Returns the zone table in effect.
    pub fn zone_table(&self) -> ZoneTable {
        self.zones.clone().unwrap_or_else(ZoneTable::builtin)
    }

    /// Checks the zone table for impossible geometry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Some(table) = &self.zones else {
            return Ok(());
        };
        if table.default_max_col == 0 {
            return Err(ConfigError::Invalid(
                "default_max_col must be at least 1".to_string(),
            ));
        }
        for (name, zone) in &table.zones {
            if zone.max_col == 0 {
                return Err(ConfigError::Invalid(format!(
                    "zone {name}: max_col must be at least 1"
                )));
            }
            for rule in &zone.rows {
                if rule.min_row == 0 || rule.min_row > rule.max_row {
                    return Err(ConfigError::Invalid(format!(
                        "zone {name}: bad row band {}-{}",
                        rule.min_row, rule.max_row
                    )));
                }
                let min_col = rule.min_col.unwrap_or(1);
                let max_col = rule.max_col.unwrap_or(zone.max_col);
                if min_col == 0 || min_col > max_col || max_col > zone.max_col {
                    return Err(ConfigError::Invalid(format!(
                        "zone {name}: rows {}-{} have bad columns {}-{} (zone max {})",
                        rule.min_row, rule.max_row, min_col, max_col, zone.max_col
                    )));
                }
            }
        }
        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    /// Address the server binds to.
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// JSON file with establishments and users to load at startup.
    #[serde(default)]
    pub seed: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            seed: None,
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Swap execution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SwapConfig {
    /// Whether the atomic store procedure may be skipped.
    #[serde(default)]
    pub atomic: AtomicSwapPolicy,

    /// Serialize all mutations of a zone behind a per-zone lock.
    #[serde(default = "default_true")]
    pub serialize_zones: bool,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            atomic: AtomicSwapPolicy::default(),
            serialize_zones: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// How the swap executor treats the atomic store procedure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AtomicSwapPolicy {
    /// Try the atomic procedure, fall back to compensated sequential writes.
    #[default]
    Preferred,

    /// The atomic procedure is mandatory; its failure fails the swap.
    Required,
}
