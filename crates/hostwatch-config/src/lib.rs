//! Shared configuration for the hostwatch CLI.
//!
//! TOML file + `HOSTWATCH_*` environment overrides, layered with figment,
//! and translation to `hostwatch_core::MonitorConfig`. The CLI applies its
//! own flag overrides on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hostwatch_core::MonitorConfig;
use hostwatch_core::config::{
    DEFAULT_MAX_CONCURRENT_PROBES, DEFAULT_POLL_INTERVAL, DEFAULT_PROBE_TIMEOUT,
};

/// Environment variable prefix. Nested keys use `__`
/// (`HOSTWATCH_DEFAULTS__OUTPUT=json`).
pub const ENV_PREFIX: &str = "HOSTWATCH_";

/// File name of the persisted registry inside the data directory.
pub const DATA_FILE_NAME: &str = "ipList.json";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Registry document. Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,

    /// Seconds between background poll cycles. 0 disables them.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Per-probe timeout in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Echo requests sent per probe before giving up.
    #[serde(default = "default_probe_attempts")]
    pub probe_attempts: u16,

    #[serde(default = "default_max_concurrent_probes")]
    pub max_concurrent_probes: usize,

    /// Replies slower than this count as unreachable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_round_trip_ms: Option<u64>,

    #[serde(default)]
    pub defaults: Defaults,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: None,
            poll_interval_secs: default_poll_interval_secs(),
            probe_timeout_ms: default_probe_timeout_ms(),
            probe_attempts: default_probe_attempts(),
            max_concurrent_probes: default_max_concurrent_probes(),
            max_round_trip_ms: None,
            defaults: Defaults::default(),
        }
    }
}

/// Output defaults for the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}
fn default_probe_timeout_ms() -> u64 {
    u64::try_from(DEFAULT_PROBE_TIMEOUT.as_millis()).unwrap_or(2_000)
}
fn default_probe_attempts() -> u16 {
    1
}
fn default_max_concurrent_probes() -> usize {
    DEFAULT_MAX_CONCURRENT_PROBES
}
fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

impl Config {
    /// Reject values the monitor cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &str, reason: &str| {
            Err(ConfigError::Validation {
                field: field.into(),
                reason: reason.into(),
            })
        };
        if self.probe_timeout_ms == 0 {
            return invalid("probe_timeout_ms", "must be greater than zero");
        }
        if self.probe_attempts == 0 {
            return invalid("probe_attempts", "must be at least 1");
        }
        if self.max_concurrent_probes == 0 {
            return invalid("max_concurrent_probes", "must be at least 1");
        }
        if self.max_round_trip_ms == Some(0) {
            return invalid("max_round_trip_ms", "must be greater than zero when set");
        }
        Ok(())
    }

    /// Registry document location: configured path or the platform default.
    pub fn data_file_path(&self) -> PathBuf {
        self.data_file.clone().unwrap_or_else(default_data_path)
    }

    /// Translate into the core's runtime configuration.
    pub fn to_monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            probe_timeout: Duration::from_millis(self.probe_timeout_ms),
            max_concurrent_probes: self.max_concurrent_probes,
            max_round_trip: self.max_round_trip_ms.map(Duration::from_millis),
        }
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "hostwatch", "hostwatch")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default registry document path in the platform data directory.
pub fn default_data_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".local/share").join(DATA_FILE_NAME),
        |dirs| dirs.data_dir().join(DATA_FILE_NAME),
    )
}

fn dirs_fallback(base: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(base);
    p.push("hostwatch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config: defaults, then the TOML file, then environment.
///
/// `path` overrides the platform config path. A missing file is not an
/// error.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);

    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;

    config.validate()?;
    Ok(config)
}

/// Load config, returning the defaults if anything goes wrong.
pub fn load_config_or_default(path: Option<&Path>) -> Config {
    load_config(path).unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path` (or the canonical path).
///
/// Returns the path written.
pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(path)
}
