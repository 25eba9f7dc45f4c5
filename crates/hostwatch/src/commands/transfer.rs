//! CSV import and export handlers.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};

use tabled::Tabled;

use hostwatch_core::{ImportReport, Monitor, transfer};

use crate::cli::{ExportArgs, GlobalOpts, ImportArgs, OutputFormat};
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

use super::devices;

#[derive(Tabled)]
struct RejectedRowView {
    #[tabled(rename = "Line")]
    line: u64,
    #[tabled(rename = "Reason")]
    reason: String,
}

pub fn import(
    monitor: &Monitor,
    args: &ImportArgs,
    settings: &Settings,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let file = File::open(&args.file)?;
    let report = monitor.import_csv(BufReader::new(file))?;

    match settings.output {
        OutputFormat::Table | OutputFormat::Plain => {
            devices::print_devices(&report.added, settings, global)?;
            if !report.is_clean() {
                let out = output::render_list(
                    settings.output,
                    &report.rejected,
                    |r| RejectedRowView {
                        line: r.line,
                        reason: r.reason.clone(),
                    },
                    |r| format!("line {}: {}", r.line, r.reason),
                )?;
                output::print_note(&out, global.quiet);
            }
        }
        format => {
            let out = output::render_single(format, &report, |_| String::new(), |_| String::new())?;
            output::print_output(&out, global.quiet);
        }
    }

    output::print_note(&summary(&report), global.quiet);
    Ok(())
}

pub fn export(monitor: &Monitor, args: &ExportArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let records = if args.trash {
        monitor.list_trash()
    } else {
        monitor.list_active()
    };

    match &args.file {
        Some(path) => {
            let mut out = BufWriter::new(File::create(path)?);
            transfer::export_csv(&records, &mut out)?;
            out.flush()?;
            output::print_note(
                &format!("Exported {} device(s) to {}", records.len(), path.display()),
                global.quiet,
            );
        }
        None => {
            let stdout = io::stdout().lock();
            transfer::export_csv(&records, stdout)?;
        }
    }
    Ok(())
}

fn summary(report: &ImportReport) -> String {
    match report.rejected.len() {
        0 => format!("Imported {} device(s)", report.added.len()),
        n => format!(
            "Imported {} device(s), skipped {n} row(s)",
            report.added.len()
        ),
    }
}
