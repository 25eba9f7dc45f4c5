// ── Persistence backends ──
//
// The registry mirrors both collections to a `Storage` after every
// mutation. The document is always rewritten in full.

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;
use crate::model::DeviceRecord;

/// Everything that is persisted: the active list and the trash.
///
/// Field names match the on-disk document (`ipList` / `deletedIps`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "ipList", default)]
    pub active: Vec<DeviceRecord>,
    #[serde(rename = "deletedIps", default)]
    pub trash: Vec<DeviceRecord>,
}

/// Durable home for a [`Snapshot`].
pub trait Storage: Send + Sync + 'static {
    fn load(&self) -> Result<Snapshot, CoreError>;

    fn save(&self, snapshot: &Snapshot) -> Result<(), CoreError>;

    /// Human-readable location, used in logs.
    fn location(&self) -> String;
}

// ── JSON file ───────────────────────────────────────────────────────

/// Pretty-printed JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl Storage for JsonFileStorage {
    /// A missing file is an empty registry.
    fn load(&self) -> Result<Snapshot, CoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "data file absent, starting empty");
                return Ok(Snapshot::default());
            }
            Err(e) => return Err(CoreError::persistence(&self.path, e)),
        };

        if raw.trim().is_empty() {
            return Ok(Snapshot::default());
        }

        serde_json::from_str(&raw).map_err(|e| CoreError::persistence(&self.path, e))
    }

    /// Write to a sibling temp file, then rename over the original so a
    /// crash mid-write never leaves a truncated document behind.
    fn save(&self, snapshot: &Snapshot) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CoreError::persistence(parent, e))?;
        }

        let body = serde_json::to_string_pretty(snapshot)
            .map_err(|e| CoreError::persistence(&self.path, e))?;

        let tmp = self.temp_path();
        fs::write(&tmp, body).map_err(|e| CoreError::persistence(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| CoreError::persistence(&self.path, e))?;

        debug!(
            path = %self.path.display(),
            active = snapshot.active.len(),
            trash = snapshot.trash.len(),
            "registry saved"
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

// ── In-memory ───────────────────────────────────────────────────────

/// Process-local storage for tests and dry runs.
///
/// Saves can be forced to fail with [`set_fail_saves`](Self::set_fail_saves).
#[derive(Debug, Default)]
pub struct MemoryStorage {
    snapshot: Mutex<Snapshot>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            ..Self::default()
        }
    }

    /// Make every subsequent `save` fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Last successfully saved snapshot.
    pub fn stored(&self) -> Snapshot {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> Result<Snapshot, CoreError> {
        Ok(self.stored())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), CoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(CoreError::Persistence {
                path: PathBuf::from("<memory>"),
                reason: "storage is read-only".into(),
            });
        }
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = snapshot.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".into()
    }
}
