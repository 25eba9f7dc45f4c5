//! Config subcommand handlers.

use std::io::{self, IsTerminal};

use dialoguer::{Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Defaults, Settings};
use crate::error::CliError;
use crate::output;

const OUTPUT_CHOICES: [&str; 5] = ["table", "json", "json-compact", "yaml", "plain"];
const COLOR_CHOICES: [&str; 3] = ["auto", "always", "never"];

// ── Helpers ─────────────────────────────────────────────────────────

fn render_toml(cfg: &Config) -> Result<String, CliError> {
    toml::to_string_pretty(cfg)
        .map(|s| s.trim_end().to_owned())
        .map_err(|e| CliError::Render(e.to_string()))
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn non_zero(value: &u64) -> Result<(), &'static str> {
    if *value == 0 {
        Err("must be greater than zero")
    } else {
        Ok(())
    }
}

/// Walk through the settings that matter for a first run.
fn wizard() -> Result<Config, CliError> {
    let base = Config::default();

    let data_file: String = Input::new()
        .with_prompt("Registry file")
        .default(config::default_data_path().display().to_string())
        .interact_text()
        .map_err(prompt_err)?;

    let poll_interval_secs: u64 = Input::new()
        .with_prompt("Seconds between polls (0 disables background polling)")
        .default(base.poll_interval_secs)
        .interact_text()
        .map_err(prompt_err)?;

    let probe_timeout_ms: u64 = Input::new()
        .with_prompt("Probe timeout (ms)")
        .default(base.probe_timeout_ms)
        .validate_with(non_zero)
        .interact_text()
        .map_err(prompt_err)?;

    let output = Select::new()
        .with_prompt("Default output format")
        .items(&OUTPUT_CHOICES)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let color = Select::new()
        .with_prompt("Color")
        .items(&COLOR_CHOICES)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    Ok(Config {
        data_file: Some(data_file.into()),
        poll_interval_secs,
        probe_timeout_ms,
        defaults: Defaults {
            output: OUTPUT_CHOICES[output].into(),
            color: COLOR_CHOICES[color].into(),
        },
        ..base
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init { defaults, force } => {
            let path = global.config.clone().unwrap_or_else(config::config_path);
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }

            let cfg = if defaults {
                Config::default()
            } else if io::stdin().is_terminal() {
                eprintln!("hostwatch configuration");
                eprintln!("   Config path: {}\n", path.display());
                wizard()?
            } else {
                return Err(CliError::Validation {
                    field: "interactive".into(),
                    reason: "guided setup needs a terminal; pass --defaults".into(),
                });
            };

            cfg.validate()?;
            let written = config::save_config(&cfg, Some(&path))?;
            output::print_note(&format!("Wrote {}", written.display()), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let settings = Settings::resolve(global)?;
            let mut cfg = settings.config.clone();
            cfg.data_file = Some(settings.data_file.clone());
            cfg.probe_timeout_ms =
                u64::try_from(settings.monitor.probe_timeout.as_millis()).unwrap_or(u64::MAX);

            let text = render_toml(&cfg)?;
            let out = output::render_single(
                settings.output,
                &cfg,
                |_| text.clone(),
                |c| {
                    c.data_file
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default()
                },
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            let path = global.config.clone().unwrap_or_else(config::config_path);
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }
    }
}
