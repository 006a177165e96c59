//! Configuration for the directory service.
//!
//! Configuration is stored in TOML format at `~/.config/orgdir/config.toml`
//! (or XDG equivalent). Every key is optional.
//!
//! # Example Configuration
//!
//! ```toml
//! [data]
//! dir = "/srv/orgdir"
//! organizations = "organizations.json"
//! locations = "locations.json"
//! infra = "infra.json"
//! identifiers = "identifiers.json"
//!
//! [query]
//! default_page_size = 25
//! facet_limit = 20
//! summary_limit = 10
//! infra_top_limit = 10
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when loading or saving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DirectoryConfig {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub query: QueryConfig,
}

/// Where the row files live. Relative file names resolve against `dir`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    /// Base directory; defaults to the platform data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    #[serde(default = "default_organizations_file")]
    pub organizations: PathBuf,

    #[serde(default = "default_locations_file")]
    pub locations: PathBuf,

    #[serde(default = "default_infra_file")]
    pub infra: PathBuf,

    #[serde(default = "default_identifiers_file")]
    pub identifiers: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: None,
            organizations: default_organizations_file(),
            locations: default_locations_file(),
            infra: default_infra_file(),
            identifiers: default_identifiers_file(),
        }
    }
}

fn default_organizations_file() -> PathBuf {
    PathBuf::from("organizations.json")
}

fn default_locations_file() -> PathBuf {
    PathBuf::from("locations.json")
}

fn default_infra_file() -> PathBuf {
    PathBuf::from("infra.json")
}

fn default_identifiers_file() -> PathBuf {
    PathBuf::from("identifiers.json")
}

/// Limits applied by listing and aggregate queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueryConfig {
    /// Page size used when the caller's value is missing or malformed.
    pub default_page_size: usize,
    /// Number of entries returned by facet listings.
    pub facet_limit: usize,
    /// Cap on countries and cities in region/country summaries.
    pub summary_limit: usize,
    /// Cap on top services/content types in infra profiles.
    pub infra_top_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_page_size: 25,
            facet_limit: 20,
            summary_limit: 10,
            infra_top_limit: 10,
        }
    }
}

/// Fully resolved row file locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub organizations: PathBuf,
    pub locations: PathBuf,
    pub infra: PathBuf,
    pub identifiers: PathBuf,
}

impl DataConfig {
    /// Resolves file names against `dir_override`, then `dir`, then `default_dir`.
    pub fn resolve(&self, dir_override: Option<&Path>, default_dir: &Path) -> DataPaths {
        let base = dir_override
            .map(Path::to_path_buf)
            .or_else(|| self.dir.clone())
            .unwrap_or_else(|| default_dir.to_path_buf());
        DataPaths {
            organizations: base.join(&self.organizations),
            locations: base.join(&self.locations),
            infra: base.join(&self.infra),
            identifiers: base.join(&self.identifiers),
        }
    }
}

impl DirectoryConfig {
    /// Load configuration from the default location.
    ///
    /// Returns the default config if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file absent, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the default configuration file path.
    ///
    /// Uses XDG conventions:
    /// - Primary: `$XDG_CONFIG_HOME/orgdir/config.toml`
    /// - Fallback: platform-specific config dir
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg_config).join("orgdir").join("config.toml"));
        }

        dirs::config_dir()
            .map(|p| p.join("orgdir").join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let files = [
            ("organizations", &self.data.organizations),
            ("locations", &self.data.locations),
            ("infra", &self.data.infra),
            ("identifiers", &self.data.identifiers),
        ];
        for (name, path) in files {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "data.{name} cannot be empty"
                )));
            }
        }

        let limits = [
            ("default_page_size", self.query.default_page_size),
            ("facet_limit", self.query.facet_limit),
            ("summary_limit", self.query.summary_limit),
            ("infra_top_limit", self.query.infra_top_limit),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(ConfigError::Validation(format!(
                    "query.{name} must be at least 1"
                )));
            }
        }

        Ok(())
    }
}
