mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hostwatch_core::{IcmpProbe, JsonFileStorage, Monitor};

use crate::cli::{Cli, Command, WatchArgs};
use crate::config::Settings;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // stdout carries command output, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands never touch the registry
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "hostwatch", &mut std::io::stdout());
            Ok(())
        }

        // Everything else works on the registry
        cmd => {
            let mut settings = Settings::resolve(&cli.global)?;
            if let Command::Watch(WatchArgs {
                interval: Some(secs),
                ..
            }) = &cmd
            {
                settings.monitor.poll_interval = Duration::from_secs(*secs);
            }

            let storage = Arc::new(JsonFileStorage::new(&settings.data_file));
            let monitor = Monitor::open(
                settings.monitor.clone(),
                storage,
                IcmpProbe::new(settings.probe_attempts()),
            )?;

            tracing::debug!(
                command = ?cmd,
                data_file = %settings.data_file.display(),
                "dispatching command"
            );
            commands::dispatch(cmd, &monitor, &settings, &cli.global).await
        }
    }
}
