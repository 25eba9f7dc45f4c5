//! CLI configuration: thin wrapper around `hostwatch_config`.
//!
//! Re-exports the shared types and layers `GlobalOpts` flag overrides
//! (`--data-file`, `--timeout-ms`, `--output`, `--color`) on top.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

use hostwatch_core::MonitorConfig;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use hostwatch_config::{Config, Defaults, config_path, default_data_path, load_config, save_config};

/// Everything a command needs after flags, env and file are merged.
#[derive(Debug)]
pub struct Settings {
    pub config: Config,
    pub data_file: PathBuf,
    pub monitor: MonitorConfig,
    pub output: OutputFormat,
    pub color: ColorMode,
}

impl Settings {
    /// Load the config file named by `--config` (or the platform default)
    /// and apply flag overrides.
    pub fn resolve(global: &GlobalOpts) -> Result<Self, CliError> {
        let config = load_config(global.config.as_deref())?;
        Self::from_config(config, global)
    }

    pub fn from_config(config: Config, global: &GlobalOpts) -> Result<Self, CliError> {
        let data_file = global
            .data_file
            .clone()
            .unwrap_or_else(|| config.data_file_path());

        let mut monitor = config.to_monitor_config();
        if let Some(ms) = global.timeout_ms {
            if ms == 0 {
                return Err(CliError::Validation {
                    field: "timeout-ms".into(),
                    reason: "must be greater than zero".into(),
                });
            }
            monitor.probe_timeout = Duration::from_millis(ms);
        }

        let output = match global.output {
            Some(o) => o,
            None => parse_enum("defaults.output", &config.defaults.output)?,
        };
        let color = match global.color {
            Some(c) => c,
            None => parse_enum("defaults.color", &config.defaults.color)?,
        };

        Ok(Self {
            config,
            data_file,
            monitor,
            output,
            color,
        })
    }

    pub fn probe_attempts(&self) -> u16 {
        self.config.probe_attempts
    }
}

fn parse_enum<T: ValueEnum>(field: &str, value: &str) -> Result<T, CliError> {
    T::from_str(value, true).map_err(|_| {
        let expected: Vec<String> = T::value_variants()
            .iter()
            .filter_map(|v| v.to_possible_value().map(|p| p.get_name().to_owned()))
            .collect();
        CliError::Validation {
            field: field.into(),
            reason: format!("expected one of {}, got '{value}'", expected.join(", ")),
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn global() -> GlobalOpts {
        GlobalOpts {
            config: None,
            data_file: None,
            output: None,
            color: None,
            verbose: 0,
            quiet: false,
            yes: false,
            timeout_ms: None,
        }
    }

    #[test]
    fn config_defaults_drive_output_and_color() {
        let mut config = Config::default();
        config.defaults.output = "JSON".into();
        config.defaults.color = "never".into();

        let settings = Settings::from_config(config, &global()).unwrap();

        assert_eq!(settings.output, OutputFormat::Json);
        assert_eq!(settings.color, ColorMode::Never);
    }

    #[test]
    fn flags_override_config() {
        let config = Config {
            data_file: Some("/from/config.json".into()),
            ..Config::default()
        };
        let opts = GlobalOpts {
            data_file: Some("/from/flag.json".into()),
            output: Some(OutputFormat::Plain),
            timeout_ms: Some(150),
            ..global()
        };

        let settings = Settings::from_config(config, &opts).unwrap();

        assert_eq!(settings.data_file, PathBuf::from("/from/flag.json"));
        assert_eq!(settings.output, OutputFormat::Plain);
        assert_eq!(settings.monitor.probe_timeout, Duration::from_millis(150));
    }

    #[test]
    fn unknown_output_in_config_is_a_validation_error() {
        let mut config = Config::default();
        config.defaults.output = "xml".into();

        let err = Settings::from_config(config, &global()).unwrap_err();

        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "defaults.output"));
    }

    #[test]
    fn zero_timeout_flag_is_rejected() {
        let opts = GlobalOpts {
            timeout_ms: Some(0),
            ..global()
        };
        assert!(Settings::from_config(Config::default(), &opts).is_err());
    }
}
