//! Application configuration management.
//!
//! Settings are layered with figment, later layers overriding earlier ones:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. A TOML file (the platform config path, or `--config <FILE>`)
//! 3. `RMDUPES_*` environment variables
//! 4. Command-line flags (applied by the caller)
//!
//! Example `config.toml`:
//!
//! ```toml
//! workers = 16
//! queue_capacity = 100
//! algorithm = "blake3"
//! read_buffer_size = 131072
//! ```

use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::duplicates::{DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS};
use crate::scanner::{DigestAlgorithm, DEFAULT_READ_BUFFER_SIZE, MAX_READ_BUFFER_SIZE};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "RMDUPES_";

/// Errors raised while loading or validating configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A layer could not be parsed or has values of the wrong type.
    #[error("Invalid configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// A value parsed but is out of range.
    #[error("Invalid value for `{field}`: {reason}")]
    Invalid {
        /// Offending setting
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// The configuration could not be rendered as TOML.
    #[error("Cannot render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of concurrent digest workers.
    pub workers: usize,
    /// Capacity of each inter-stage queue.
    pub queue_capacity: usize,
    /// Digest function.
    pub algorithm: DigestAlgorithm,
    /// Read buffer size per worker, in bytes.
    pub read_buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            algorithm: DigestAlgorithm::default(),
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

impl Config {
    /// Build the layered figment: defaults, then the TOML file, then environment.
    ///
    /// When `path` is `None` the platform default path is used if it can be
    /// determined. A missing file contributes nothing.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = path.map(Path::to_path_buf).or_else(Self::default_path) {
            log::debug!("Config file: {}", file.display());
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any layer is malformed or a value is out
    /// of range.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment(path))
    }

    /// Extract and validate a configuration from an arbitrary figment.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config = Self::extract(figment)?;
        config.validate()?;
        Ok(config)
    }

    /// Extract without range checks, for callers that still apply overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if any layer is malformed.
    pub fn extract(figment: &Figment) -> Result<Self, ConfigError> {
        Ok(figment.extract().map_err(Box::new)?)
    }

    /// Platform-specific default config file (`<config dir>/rmdupes/config.toml`).
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "rmdupes").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero worker count, queue
    /// capacity or buffer size, or a buffer above [`MAX_READ_BUFFER_SIZE`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("workers", self.workers),
            ("queue_capacity", self.queue_capacity),
            ("read_buffer_size", self.read_buffer_size),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        if self.read_buffer_size > MAX_READ_BUFFER_SIZE {
            return Err(ConfigError::Invalid {
                field: "read_buffer_size",
                reason: format!("must be at most {}", ByteSize(MAX_READ_BUFFER_SIZE as u64)),
            });
        }
        Ok(())
    }

    /// Render as TOML, suitable for writing a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Render`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
