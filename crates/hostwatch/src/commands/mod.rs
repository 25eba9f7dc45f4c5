//! Command dispatch: bridges CLI args -> Monitor operations -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod poll;
pub mod transfer;
pub mod trash;
pub mod util;
pub mod watch;

use hostwatch_core::Monitor;

use crate::cli::{Command, GlobalOpts};
use crate::config::Settings;
use crate::error::CliError;

/// Dispatch a registry-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    monitor: &Monitor,
    settings: &Settings,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(monitor, args, settings, global),
        Command::Trash(args) => trash::handle(monitor, args, settings, global),
        Command::Poll => poll::handle(monitor, settings, global).await,
        Command::Watch(args) => watch::handle(monitor, &args, settings, global).await,
        Command::Import(args) => transfer::import(monitor, &args, settings, global),
        Command::Export(args) => transfer::export(monitor, &args, global),
        // Config and Completions are handled before the registry is opened
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
