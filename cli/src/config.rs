//! Configuration file for the `invent` binary.
//!
//! # Example YAML
//!
//! ```yaml
//! database: sqlite:///srv/invent/invent.db
//! inventory_number_format: "{prefix}-{id:06X}"
//! default_limit: 50
//! renderer:
//!   converter: rsvg-convert
//!   dpi: [300, 300]
//!   timeout_secs: 30
//!   template_dir: /srv/invent/labels
//! ```
//!
//! Every key is optional. Command-line flags and environment variables take
//! precedence over the file.

use std::path::{Path, PathBuf};

use invent_core::{
    DEFAULT_INVENTORY_NUMBER_FORMAT, DEFAULT_LIST_LIMIT, InventoryNumberError,
    InventoryNumberFormat,
};
use invent_label::RendererConfig;
use serde::Deserialize;
use thiserror::Error;

/// Connection string used when neither flag, environment nor file names one.
pub const DEFAULT_DATABASE: &str = "sqlite://invent.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    NumberFormat(#[from] InventoryNumberError),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database: String,
    pub inventory_number_format: String,
    pub default_limit: i64,
    pub renderer: RendererConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            inventory_number_format: DEFAULT_INVENTORY_NUMBER_FORMAT.to_string(),
            default_limit: DEFAULT_LIST_LIMIT as i64,
            renderer: RendererConfig::default(),
        }
    }
}

impl Config {
    /// Loads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.number_format()?;
        Ok(config)
    }

    /// Loads `path` if given, otherwise returns the defaults.
    pub fn load_optional(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn parse(raw: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document means "all defaults".
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    pub fn number_format(&self) -> Result<InventoryNumberFormat, InventoryNumberError> {
        self.inventory_number_format.parse()
    }
}
