//! Store configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::store::{DATABASE_SCHEMA, IN_MEMORY};

/// Environment variable overriding [`StoreConfig::data_dir`].
pub const DATA_DIR_ENV: &str = "RESULT_STORE_DATA_DIR";

/// Data directory used when neither a config file, the environment nor a
/// flag names one. Relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Where and how the result database is opened.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the database file. `None` keeps it in memory,
    /// which only [`StoreConfig::in_memory`] produces.
    #[serde(default = "default_data_dir")]
    data_dir: Option<PathBuf>,

    /// Logical database name; the file is `<name>.sqlite3`.
    ///
    /// Any value other than `database` puts the records in a file that other
    /// readers of the layout will not find.
    #[serde(default = "default_database_name")]
    database_name: String,

    /// How long a write waits on a locked database, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    busy_timeout_ms: u64,
}

#[instrument]
fn default_data_dir() -> Option<PathBuf> {
    Some(PathBuf::from(DEFAULT_DATA_DIR))
}

#[instrument]
fn default_database_name() -> String {
    DATABASE_SCHEMA.name.to_string()
}

#[instrument]
fn default_busy_timeout_ms() -> u64 {
    5000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_name: default_database_name(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StoreConfig {
    /// Configuration for a database file inside `data_dir`.
    #[instrument(skip(data_dir), fields(data_dir = %data_dir.as_ref().display()))]
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: Some(data_dir.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    /// Configuration for a private in-memory database.
    #[instrument]
    pub fn in_memory() -> Self {
        Self {
            data_dir: None,
            ..Self::default()
        }
    }

    /// Builds the configuration from an optional file, then the
    /// [`DATA_DIR_ENV`] value, then an explicit data directory. Later sources
    /// win.
    #[instrument(skip(config_file))]
    pub fn resolve(
        config_file: Option<&Path>,
        env_data_dir: Option<String>,
        flag_data_dir: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let mut config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config = config.with_data_dir_from(env_data_dir);
        if let Some(dir) = flag_data_dir {
            config = config.with_data_dir(dir);
        }
        debug!(database_url = %config.database_url(), "Resolved store config");
        Ok(config)
    }

    /// [`StoreConfig::resolve`] with the environment read from the process.
    #[instrument(skip(config_file))]
    pub fn load(
        config_file: Option<&Path>,
        flag_data_dir: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let env_data_dir = std::env::var(DATA_DIR_ENV).ok();
        Self::resolve(config_file, env_data_dir, flag_data_dir)
    }

    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::new(format!("Failed to read config file: {}", e))
        })?;

        let config = Self::from_toml(&content)?;
        info!(data_dir = ?config.data_dir, "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))
    }

    /// Applies [`DATA_DIR_ENV`] when it is set and non-empty.
    #[instrument(skip(self))]
    pub fn with_env_overrides(self) -> Self {
        self.with_data_dir_from(std::env::var(DATA_DIR_ENV).ok())
    }

    fn with_data_dir_from(mut self, env_data_dir: Option<String>) -> Self {
        if let Some(dir) = env_data_dir.filter(|d| !d.is_empty()) {
            debug!(dir = %dir, "Data dir overridden from environment");
            self.data_dir = Some(PathBuf::from(dir));
        }
        self
    }

    /// Replaces the data directory.
    #[instrument(skip(self))]
    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = Some(data_dir);
        self
    }

    /// Database file path, or `None` for an in-memory database.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.data_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.sqlite3", self.database_name)))
    }

    /// Location string handed to the engine.
    #[instrument(skip(self))]
    pub fn database_url(&self) -> String {
        match self.database_path() {
            Some(path) => path.to_string_lossy().into_owned(),
            None => IN_MEMORY.to_string(),
        }
    }

    /// Busy timeout as a [`Duration`].
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
