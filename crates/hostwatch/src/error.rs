//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use hostwatch_config::ConfigError;
use hostwatch_core::{Collection, CoreError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(unused_assignments)]
pub enum CliError {
    // ── Resources ────────────────────────────────────────────────────
    #[error("No device with IP {ip} in the {collection}")]
    #[diagnostic(
        code(hostwatch::not_found),
        help("Run: hostwatch {list_command} to see what is there")
    )]
    NotFound {
        ip: String,
        collection: String,
        list_command: String,
    },

    #[error("A device with IP {ip} is already registered")]
    #[diagnostic(
        code(hostwatch::conflict),
        help(
            "IPs are unique among registered devices.\n\
             Edit the existing entry with: hostwatch devices edit {ip}"
        )
    )]
    Conflict { ip: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(hostwatch::validation))]
    Validation { field: String, reason: String },

    #[error("Could not read CSV at line {line}: {reason}")]
    #[diagnostic(
        code(hostwatch::import),
        help("The first row must name at least the 'name' and 'ip' columns.")
    )]
    Import { line: u64, reason: String },

    // ── Storage ──────────────────────────────────────────────────────
    #[error("Could not access the registry at {path}")]
    #[diagnostic(
        code(hostwatch::storage),
        help(
            "{reason}\n\
             Check permissions, or point elsewhere with --data-file."
        )
    )]
    Storage { path: String, reason: String },

    #[error("Export failed: {0}")]
    #[diagnostic(code(hostwatch::export))]
    Export(String),

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(hostwatch::config),
        help("Inspect the resolved settings with: hostwatch config show")
    )]
    Config(#[from] ConfigError),

    #[error("Configuration file already exists at {path}")]
    #[diagnostic(
        code(hostwatch::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(hostwatch::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(hostwatch::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::Import { .. } | Self::NonInteractiveRequiresYes { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { field, message } => CliError::Validation {
                field,
                reason: message,
            },

            CoreError::DuplicateKey { ip } => CliError::Conflict { ip },

            CoreError::NotFound { ip, collection } => CliError::NotFound {
                ip,
                list_command: match collection {
                    Collection::Registry => "devices list".into(),
                    Collection::Trash => "trash list".into(),
                },
                collection: collection.to_string(),
            },

            CoreError::Persistence { path, reason } => CliError::Storage {
                path: path.display().to_string(),
                reason,
            },

            CoreError::Import { line, reason } => CliError::Import { line, reason },

            CoreError::Export(reason) => CliError::Export(reason),
        }
    }
}
