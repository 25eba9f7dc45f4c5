//! Clap derive structures for the `hostwatch` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// hostwatch -- keep a list of devices and see which ones answer ping
#[derive(Debug, Parser)]
#[command(
    name = "hostwatch",
    version,
    about = "Track network devices and poll their reachability",
    long_about = "Keeps an ordered registry of IP-addressed devices with a recoverable trash,\n\
        and checks every device concurrently with ICMP echo, either on demand\n\
        (`hostwatch poll`) or on a fixed interval (`hostwatch watch`).",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "HOSTWATCH_CONFIG", global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Registry document (overrides `data_file` from the config)
    #[arg(long, env = "HOSTWATCH_DATA_FILE", global = true, value_name = "PATH")]
    pub data_file: Option<PathBuf>,

    /// Output format (defaults to `defaults.output` from the config)
    #[arg(long, short = 'o', env = "HOSTWATCH_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Per-probe timeout in milliseconds (overrides `probe_timeout_ms`)
    #[arg(long, env = "HOSTWATCH_TIMEOUT_MS", global = true, value_name = "MS")]
    pub timeout_ms: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one IP per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage registered devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Inspect, restore and purge deleted devices
    #[command(alias = "t")]
    Trash(TrashArgs),

    /// Probe every device once and print the result
    #[command(alias = "p")]
    Poll,

    /// Poll on an interval and report status changes until Ctrl-C
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Add devices from a CSV file
    Import(ImportArgs),

    /// Write the registry as CSV
    Export(ExportArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List registered devices in insertion order
    #[command(alias = "ls")]
    List {
        /// Only show devices with this status
        #[arg(long, short = 's')]
        status: Option<StatusFilter>,
    },

    /// Show one device
    Get {
        /// Device IP address
        ip: String,
    },

    /// Register a device (status starts as Pending)
    Add {
        /// Display name
        name: String,

        /// IPv4 or IPv6 address; unique among registered devices
        ip: String,

        #[command(flatten)]
        meta: DeviceMeta,
    },

    /// Change a device's name or metadata
    Edit {
        /// Device IP address
        ip: String,

        /// New display name
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        meta: DeviceMeta,

        /// Remove the site
        #[arg(long, conflicts_with = "site")]
        clear_site: bool,

        /// Remove the location
        #[arg(long, conflicts_with = "location")]
        clear_location: bool,

        /// Remove the device type
        #[arg(long, conflicts_with = "device_type")]
        clear_type: bool,
    },

    /// Move a device to the trash
    #[command(alias = "rm")]
    Delete {
        /// Device IP address
        ip: String,
    },
}

/// Optional free-form metadata shared by `add` and `edit`.
#[derive(Debug, Args)]
pub struct DeviceMeta {
    /// Site the device belongs to
    #[arg(long)]
    pub site: Option<String>,

    /// Physical location
    #[arg(long)]
    pub location: Option<String>,

    /// Device type (router, switch, printer, ...)
    #[arg(long = "type", id = "device_type", value_name = "TYPE")]
    pub device_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusFilter {
    Pending,
    Connected,
    Disconnected,
}

// ── Trash ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TrashArgs {
    #[command(subcommand)]
    pub command: TrashCommand,
}

#[derive(Debug, Subcommand)]
pub enum TrashCommand {
    /// List deleted devices, oldest first
    #[command(alias = "ls")]
    List,

    /// Move a deleted device back to the end of the registry
    Restore {
        /// Device IP address
        ip: String,
    },

    /// Permanently remove a deleted device
    Purge {
        /// Device IP address
        ip: String,
    },

    /// Permanently remove every deleted device
    Empty,
}

// ── Polling ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between cycles (overrides `poll_interval_secs`)
    #[arg(long, short = 'i', value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Skip the immediate first cycle and wait one interval instead
    #[arg(long)]
    pub no_initial: bool,
}

// ── Transfer ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// CSV file with a header row (name, ip, site, location, type)
    pub file: PathBuf,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Destination file (stdout if omitted)
    pub file: Option<PathBuf>,

    /// Export the trash instead of the registry
    #[arg(long)]
    pub trash: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create the config file with guided setup
    Init {
        /// Write defaults without prompting
        #[arg(long)]
        defaults: bool,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Display the resolved configuration
    Show,

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
