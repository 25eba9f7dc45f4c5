//! Periodic polling with a live change feed.
//!
//! Prints the first cycle as a table, then one line per status flip until
//! Ctrl-C. JSON formats stream one compact object per line (NDJSON); YAML
//! streams one `---` document per change.

use chrono::{DateTime, Local, Utc};
use owo_colors::OwoColorize;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use hostwatch_core::{DeviceStatus, Monitor, StatusChange};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

use super::devices;

#[derive(Serialize)]
struct ChangeLine<'a> {
    at: DateTime<Utc>,
    #[serde(flatten)]
    change: &'a StatusChange,
}

pub async fn handle(
    monitor: &Monitor,
    args: &WatchArgs,
    settings: &Settings,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let interval = monitor.config().poll_interval;
    if interval.is_zero() {
        return Err(CliError::Validation {
            field: "poll_interval_secs".into(),
            reason: "is 0, which disables polling; pass --interval".into(),
        });
    }

    if !args.no_initial {
        let polled = monitor.poll_now().await?;
        devices::print_devices(&polled, settings, global)?;
    }

    let mut events = monitor.subscribe();
    let mut last_poll = monitor.last_poll();
    monitor.start().await;
    output::print_note(
        &format!(
            "Watching {} device(s) every {}s. Press Ctrl-C to stop.",
            monitor.list_active().len(),
            interval.as_secs()
        ),
        global.quiet,
    );

    let color = output::should_color(settings.color);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let result = loop {
        tokio::select! {
            biased;
            res = &mut ctrl_c => {
                if let Err(e) = res {
                    warn!(error = %e, "failed to listen for Ctrl-C");
                }
                break Ok(());
            }
            event = events.recv() => match event {
                Ok(change) => {
                    let line = format_change(&change, Utc::now(), settings.output, color)?;
                    output::print_output(&line, global.quiet);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "fell behind on status changes");
                }
                Err(RecvError::Closed) => break Ok(()),
            },
            Ok(()) = last_poll.changed() => {
                if let Some(at) = *last_poll.borrow_and_update() {
                    debug!(at = %at, "poll cycle complete");
                }
            }
        }
    };

    monitor.shutdown().await;
    result
}

fn format_change(
    change: &StatusChange,
    at: DateTime<Utc>,
    format: OutputFormat,
    color: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table | OutputFormat::Plain => {
            let stamp = at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");
            let arrow = if color {
                arrow_for(change.to).to_string()
            } else {
                "->".to_owned()
            };
            Ok(format!(
                "{stamp}  {} ({})  {} {arrow} {}",
                change.name,
                change.ip,
                output::paint_status(change.from, color),
                output::paint_status(change.to, color),
            ))
        }
        OutputFormat::Json | OutputFormat::JsonCompact => {
            output::render_json(&ChangeLine { at, change }, true)
        }
        OutputFormat::Yaml => {
            let doc = output::render_yaml(&ChangeLine { at, change })?;
            Ok(format!("---\n{}", doc.trim_end()))
        }
    }
}

fn arrow_for(to: DeviceStatus) -> String {
    match to {
        DeviceStatus::Connected => "->".green().to_string(),
        DeviceStatus::Disconnected => "->".red().to_string(),
        DeviceStatus::Pending => "->".dimmed().to_string(),
    }
}
