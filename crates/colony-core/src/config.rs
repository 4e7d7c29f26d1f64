//! Configuration loading and typed config structures for Colony.
//!
//! The canonical configuration lives in `colony-config.yaml` next to the
//! engine binary. This module defines strongly-typed structs that mirror the
//! YAML structure, and provides a loader that reads, overrides from the
//! environment, and validates the file.
//!
//! Every field has a default, so an empty document (or no file at all) is a
//! valid configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Environment variable overriding [`StorageConfig::database_url`].
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Environment variable overriding [`ServerConfig::port`].
pub const PORT_ENV: &str = "COLONY_PORT";

/// Environment variable naming the config file to load.
pub const CONFIG_PATH_ENV: &str = "COLONY_CONFIG";

/// Config file loaded when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "colony-config.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is not usable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level Colony configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ColonyConfig {
    /// Grid dimensions and random seed.
    #[serde(default)]
    pub grid: GridConfig,

    /// Tick and broadcast timing.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// HTTP / `WebSocket` server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Persistence settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ColonyConfig {
    /// Load the config file named by `COLONY_CONFIG` (default
    /// `colony-config.yaml`). A missing file yields the defaults, still
    /// subject to environment overrides and validation.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`ColonyConfig::from_file`].
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
        let path = Path::new(&path);
        if path.exists() {
            tracing::info!(path = %path.display(), "Loading configuration file");
            Self::from_file(path)
        } else {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `DATABASE_URL` overrides `storage.database_url`
    /// - `COLONY_PORT` overrides `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying environment
    /// overrides and validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Override values from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `COLONY_PORT` is not a port number.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_with(|key| std::env::var(key).ok())
    }

    /// Override values using `lookup` in place of the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the port override is not a port
    /// number.
    pub fn apply_overrides_with(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup(DATABASE_URL_ENV) {
            self.storage.database_url = url;
        }
        if let Some(port) = lookup(PORT_ENV) {
            self.server.port = port.parse().map_err(|e| ConfigError::Invalid {
                reason: format!("{PORT_ENV}={port} is not a port number: {e}"),
            })?;
        }
        Ok(())
    }

    /// Check cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            (self.grid.size == 0, "grid.size must be at least 1"),
            (
                self.simulation.tick_interval_ms == 0,
                "simulation.tick_interval_ms must be at least 1",
            ),
            (
                self.simulation.broadcast_interval_ms == 0,
                "simulation.broadcast_interval_ms must be at least 1",
            ),
            (
                self.server.subscriber_queue == 0,
                "server.subscriber_queue must be at least 1",
            ),
            (
                self.server.send_timeout_ms == 0,
                "server.send_timeout_ms must be at least 1",
            ),
            (
                self.server.max_spawn_cells == 0,
                "server.max_spawn_cells must be at least 1",
            ),
            (
                self.storage.max_connections == 0,
                "storage.max_connections must be at least 1",
            ),
            (
                self.storage.persist_queue == 0,
                "storage.persist_queue must be at least 1",
            ),
        ];
        match checks.iter().find(|(failed, _)| *failed) {
            Some((_, reason)) => Err(ConfigError::Invalid {
                reason: (*reason).to_owned(),
            }),
            None => Ok(()),
        }
    }
}

/// Grid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GridConfig {
    /// Side length N of the N×N grid.
    #[serde(default = "default_grid_size")]
    pub size: usize,

    /// Seed for the color-inheritance random source. `None` seeds from the
    /// operating system.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: default_grid_size(),
            seed: None,
        }
    }
}

/// Simulation and broadcast timing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Real-time milliseconds between generations.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Real-time milliseconds between snapshot broadcasts.
    #[serde(default = "default_broadcast_interval_ms")]
    pub broadcast_interval_ms: u64,
}

impl SimulationConfig {
    /// Tick interval as a [`Duration`].
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Broadcast interval as a [`Duration`].
    pub const fn broadcast_interval(&self) -> Duration {
        Duration::from_millis(self.broadcast_interval_ms)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            broadcast_interval_ms: default_broadcast_interval_ms(),
        }
    }
}

/// HTTP and `WebSocket` server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: String,

    /// The TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Snapshots buffered per subscriber before frames are dropped for it.
    #[serde(default = "default_subscriber_queue")]
    pub subscriber_queue: usize,

    /// Upper bound on a single socket send before the session is closed.
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,

    /// Most ad-hoc cells a single `spawn` message may list.
    #[serde(default = "default_max_spawn_cells")]
    pub max_spawn_cells: usize,
}

impl ServerConfig {
    /// Send timeout as a [`Duration`].
    pub const fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            subscriber_queue: default_subscriber_queue(),
            send_timeout_ms: default_send_timeout_ms(),
            max_spawn_cells: default_max_spawn_cells(),
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// `SQLite` connection URL, e.g. `sqlite://grid.db`.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Capacity of the queue between the mutation gateway and the
    /// persistence writer.
    #[serde(default = "default_persist_queue")]
    pub persist_queue: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            max_connections: default_max_connections(),
            persist_queue: default_persist_queue(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_grid_size() -> usize {
    100
}

const fn default_tick_interval_ms() -> u64 {
    1_000
}

const fn default_broadcast_interval_ms() -> u64 {
    1_000
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8000
}

const fn default_subscriber_queue() -> usize {
    4
}

const fn default_send_timeout_ms() -> u64 {
    2_000
}

const fn default_max_spawn_cells() -> usize {
    1_024
}

fn default_database_url() -> String {
    "sqlite://grid.db".to_owned()
}

const fn default_max_connections() -> u32 {
    5
}

const fn default_persist_queue() -> usize {
    1024
}

fn default_log_level() -> String {
    "info".to_owned()
}
