//! Trash command handlers.

use hostwatch_core::Monitor;

use crate::cli::{GlobalOpts, TrashArgs, TrashCommand};
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

use super::{devices, util};

pub fn handle(
    monitor: &Monitor,
    args: TrashArgs,
    settings: &Settings,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        TrashCommand::List => devices::print_devices(&monitor.list_trash(), settings, global),

        TrashCommand::Restore { ip } => {
            let device = monitor.restore(&ip)?;
            output::print_note(
                &format!("Restored {} ({})", device.name, device.ip),
                global.quiet,
            );
            devices::print_device(&device, settings, global)
        }

        TrashCommand::Purge { ip } => {
            if !util::confirm(
                &format!("Permanently delete {ip}? This cannot be undone"),
                "trash purge",
                global.yes,
            )? {
                return Ok(());
            }
            let device = monitor.purge(&ip)?;
            output::print_note(
                &format!("Purged {} ({})", device.name, device.ip),
                global.quiet,
            );
            Ok(())
        }

        TrashCommand::Empty => {
            let pending = monitor.list_trash().len();
            if pending == 0 {
                output::print_note("Trash is already empty", global.quiet);
                return Ok(());
            }
            if !util::confirm(
                &format!("Permanently delete {pending} device(s) from the trash?"),
                "trash empty",
                global.yes,
            )? {
                return Ok(());
            }
            let removed = monitor.empty_trash()?;
            output::print_note(&format!("Purged {removed} device(s)"), global.quiet);
            Ok(())
        }
    }
}
