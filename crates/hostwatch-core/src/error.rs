// ── Core error types ──
//
// User-facing errors from hostwatch-core. Probe failures are absent:
// they never leave the poller and always collapse into
// `DeviceStatus::Disconnected`.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::store::Collection;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input errors ─────────────────────────────────────────────────
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Device with IP {ip} is already registered")]
    DuplicateKey { ip: String },

    #[error("No device with IP {ip} in the {collection}")]
    NotFound { ip: String, collection: Collection },

    // ── Storage errors ───────────────────────────────────────────────
    #[error("Storage failure at {}: {reason}", path.display())]
    Persistence { path: PathBuf, reason: String },

    // ── Bulk transfer errors ─────────────────────────────────────────
    #[error("Malformed record on line {line}: {reason}")]
    Import { line: u64, reason: String },

    #[error("Export failed: {0}")]
    Export(String),
}

impl CoreError {
    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_owned(),
            message: message.into(),
        }
    }

    pub(crate) fn persistence(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::Persistence {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// The IP the error refers to, when it is about a specific record.
    pub fn ip(&self) -> Option<&str> {
        match self {
            Self::DuplicateKey { ip } | Self::NotFound { ip, .. } => Some(ip),
            _ => None,
        }
    }
}

impl From<csv::Error> for CoreError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map_or(0, csv::Position::line);
        Self::Import {
            line,
            reason: err.to_string(),
        }
    }
}
