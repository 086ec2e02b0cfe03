//! Configuration loading and typed config structures for the lifesync client.
//!
//! Configuration lives in a YAML file (`lifesync.yaml` by default). Every
//! field has a default matching the reference deployment: a 32x32 board,
//! a one-second scheduler tick, and the adaptive `3, 15, 30, 60` second
//! polling ladder.

use std::path::Path;

use serde::Deserialize;

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

    /// The configuration parsed but describes an unusable setup.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LifesyncConfig {
    /// Remote simulation server.
    #[serde(default)]
    pub server: ServerConfig,

    /// Board dimensions.
    #[serde(default)]
    pub grid: GridConfig,

    /// Synchronization cadence.
    #[serde(default)]
    pub poll: PollConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LifesyncConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `LIFESYNC_SERVER_URL` overrides `server.base_url`
    /// - `LIFESYNC_LOG_LEVEL` overrides `logging.level`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse, apply environment overrides, and validate a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Override selected values with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LIFESYNC_SERVER_URL") {
            self.server.base_url = val;
        }
        if let Ok(val) = std::env::var("LIFESYNC_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    /// Check cross-field invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.columns == 0 || self.grid.rows == 0 {
            return Err(invalid("grid.columns and grid.rows must be at least 1"));
        }
        if self.server.base_url.trim().is_empty() {
            return Err(invalid("server.base_url must not be empty"));
        }
        for (name, path) in [
            ("server.data_path", &self.server.data_path),
            ("server.step_path", &self.server.step_path),
            ("server.set_cells_path", &self.server.set_cells_path),
        ] {
            if !path.starts_with('/') {
                return Err(invalid(&format!("{name} must start with '/': {path}")));
            }
        }
        if self.poll.tick_ms == 0 {
            return Err(invalid("poll.tick_ms must be at least 1"));
        }
        match self.poll.mode {
            PollMode::Adaptive => {
                if self.poll.initial_countdown_secs == 0 {
                    return Err(invalid("poll.initial_countdown_secs must be at least 1"));
                }
                validate_ladder(&self.poll.backoff_secs)?;
            }
            PollMode::FixedDual => {
                if self.poll.fetch_interval_secs == 0 || self.poll.step_interval_secs == 0 {
                    return Err(invalid(
                        "poll.fetch_interval_secs and poll.step_interval_secs must be at least 1",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Check that a backoff ladder is non-empty, positive, and never decreases.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] if any of those properties fails.
pub fn validate_ladder(rungs: &[u64]) -> Result<(), ConfigError> {
    if rungs.is_empty() {
        return Err(invalid("poll.backoff_secs must not be empty"));
    }
    if rungs.contains(&0) {
        return Err(invalid("poll.backoff_secs entries must be at least 1"));
    }
    if rungs.windows(2).any(|pair| matches!(pair, [a, b] if b < a)) {
        return Err(invalid("poll.backoff_secs must be non-decreasing"));
    }
    Ok(())
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.to_owned(),
    }
}

/// Remote simulation server endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Base URL, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the fetch-snapshot operation.
    #[serde(default = "default_data_path")]
    pub data_path: String,

    /// Path of the request-step operation (`/step` or `/cmd/step`).
    #[serde(default = "default_step_path")]
    pub step_path: String,

    /// Path of the push-cells operation (`/setcells` or `/cmd/setcells`).
    #[serde(default = "default_set_cells_path")]
    pub set_cells_path: String,

    /// Per-request timeout applied by the HTTP transport (0 = none).
    #[serde(default)]
    pub request_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            data_path: default_data_path(),
            step_path: default_step_path(),
            set_cells_path: default_set_cells_path(),
            request_timeout_ms: 0,
        }
    }
}

/// Board dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GridConfig {
    /// Extent of the outer index `i`.
    #[serde(default = "default_grid_extent")]
    pub columns: usize,

    /// Extent of the inner index `j`.
    #[serde(default = "default_grid_extent")]
    pub rows: usize,
}

impl GridConfig {
    /// Number of cells, `columns * rows` (saturating).
    pub const fn cell_count(&self) -> usize {
        self.columns.saturating_mul(self.rows)
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: default_grid_extent(),
            rows: default_grid_extent(),
        }
    }
}

/// Which cadence the poll scheduler follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollMode {
    /// One countdown whose interval escalates along `backoff_secs`.
    #[default]
    Adaptive,
    /// Two fixed timers: one for fetches, one for steps.
    FixedDual,
}

/// Synchronization cadence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PollConfig {
    /// Wall-clock length of one scheduler tick in milliseconds.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Cadence mode.
    #[serde(default)]
    pub mode: PollMode,

    /// Ticks before the first due event (adaptive mode).
    #[serde(default = "default_initial_countdown_secs")]
    pub initial_countdown_secs: u64,

    /// Escalating intervals after the first due event (adaptive mode).
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: Vec<u64>,

    /// Fetch period (fixed dual mode).
    #[serde(default = "default_fetch_interval_secs")]
    pub fetch_interval_secs: u64,

    /// Step period (fixed dual mode).
    #[serde(default = "default_step_interval_secs")]
    pub step_interval_secs: u64,

    /// Whether the engine fetches a snapshot as soon as it starts.
    #[serde(default = "default_true")]
    pub fetch_on_startup: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            mode: PollMode::Adaptive,
            initial_countdown_secs: default_initial_countdown_secs(),
            backoff_secs: default_backoff_secs(),
            fetch_interval_secs: default_fetch_interval_secs(),
            step_interval_secs: default_step_interval_secs(),
            fetch_on_startup: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG`
    /// is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_owned()
}

fn default_data_path() -> String {
    "/data".to_owned()
}

fn default_step_path() -> String {
    "/step".to_owned()
}

fn default_set_cells_path() -> String {
    "/setcells".to_owned()
}

const fn default_grid_extent() -> usize {
    32
}

const fn default_tick_ms() -> u64 {
    1000
}

const fn default_initial_countdown_secs() -> u64 {
    3
}

fn default_backoff_secs() -> Vec<u64> {
    vec![15, 30, 60]
}

const fn default_fetch_interval_secs() -> u64 {
    30
}

const fn default_step_interval_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}
