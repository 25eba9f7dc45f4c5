// ── Device registry ──
//
// Active list + trash, guarded by a single lock and mirrored to storage
// after every mutation. Mutations run against a candidate copy; the
// candidate only replaces the live state once the save succeeded.

mod collection;
mod refresh;
pub mod storage;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use strum::Display;
use tracing::{debug, error, info};

use crate::error::CoreError;
use crate::model::{DeviceRecord, DeviceUpdate, NewDevice, normalize_key};

use self::collection::DeviceCollection;
use self::storage::{Snapshot, Storage};

/// Which of the two collections an operation looked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Registry,
    Trash,
}

#[derive(Debug, Clone, Default)]
struct RegistryState {
    active: DeviceCollection,
    trash: Vec<DeviceRecord>,
}

impl RegistryState {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        let (active, displaced) = DeviceCollection::from_records(snapshot.active);
        let mut trash = snapshot.trash;
        for record in &mut trash {
            record.ip = normalize_key(&record.ip);
        }
        // duplicates from the active list stay recoverable
        trash.extend(displaced);
        Self { active, trash }
    }

    fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            active: self.active.records(),
            trash: self.trash.clone(),
        }
    }

    /// Index of the oldest trashed record with this IP.
    fn trash_position(&self, ip: &str) -> Result<usize, CoreError> {
        self.trash
            .iter()
            .position(|r| r.ip == ip)
            .ok_or_else(|| CoreError::NotFound {
                ip: ip.to_owned(),
                collection: Collection::Trash,
            })
    }
}

/// The persisted device registry.
pub struct Registry {
    state: Mutex<RegistryState>,
    storage: Arc<dyn Storage>,
}

impl Registry {
    /// Load the registry from `storage`.
    pub fn load(storage: Arc<dyn Storage>) -> Result<Self, CoreError> {
        let snapshot = storage.load()?;
        info!(
            location = %storage.location(),
            active = snapshot.active.len(),
            trash = snapshot.trash.len(),
            "registry loaded"
        );
        Ok(Self {
            state: Mutex::new(RegistryState::from_snapshot(snapshot)),
            storage,
        })
    }

    /// Where the registry is persisted.
    pub fn location(&self) -> String {
        self.storage.location()
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn list_active(&self) -> Vec<DeviceRecord> {
        self.lock().active.records()
    }

    pub fn list_trash(&self) -> Vec<DeviceRecord> {
        self.lock().trash.clone()
    }

    pub fn get(&self, ip: &str) -> Result<DeviceRecord, CoreError> {
        let key = normalize_key(ip);
        self.lock()
            .active
            .get(&key)
            .cloned()
            .ok_or(CoreError::NotFound {
                ip: key,
                collection: Collection::Registry,
            })
    }

    pub fn active_len(&self) -> usize {
        self.lock().active.len()
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Append a new `Pending` record.
    ///
    /// Duplicates are only checked against active records; an IP that sits
    /// in the trash may be added again.
    pub fn add(&self, device: NewDevice) -> Result<DeviceRecord, CoreError> {
        let record = device.into_record()?;
        self.mutate("add", |state| {
            if !state.active.push(record.clone()) {
                return Err(CoreError::DuplicateKey { ip: record.ip.clone() });
            }
            debug!(ip = %record.ip, name = %record.name, "device added");
            Ok(record.clone())
        })
    }

    /// Replace the mutable fields of an active record in place.
    pub fn edit(&self, ip: &str, update: DeviceUpdate) -> Result<DeviceRecord, CoreError> {
        let key = normalize_key(ip);
        self.mutate("edit", |state| {
            let record = state.active.get_mut(&key).ok_or_else(|| CoreError::NotFound {
                ip: key.clone(),
                collection: Collection::Registry,
            })?;
            update.apply_to(record)?;
            debug!(ip = %key, "device edited");
            Ok(record.clone())
        })
    }

    /// Move an active record to the trash.
    pub fn soft_delete(&self, ip: &str) -> Result<DeviceRecord, CoreError> {
        let key = normalize_key(ip);
        self.mutate("delete", |state| {
            let record = state.active.remove(&key).ok_or_else(|| CoreError::NotFound {
                ip: key.clone(),
                collection: Collection::Registry,
            })?;
            state.trash.push(record.clone());
            debug!(ip = %key, "device moved to trash");
            Ok(record)
        })
    }

    /// Move a trashed record back to the end of the active list.
    ///
    /// Fails with `DuplicateKey` if the IP was re-added in the meantime.
    pub fn restore(&self, ip: &str) -> Result<DeviceRecord, CoreError> {
        let key = normalize_key(ip);
        self.mutate("restore", |state| {
            let pos = state.trash_position(&key)?;
            if state.active.contains(&key) {
                return Err(CoreError::DuplicateKey { ip: key.clone() });
            }
            let record = state.trash.remove(pos);
            state.active.push(record.clone());
            debug!(ip = %key, "device restored");
            Ok(record)
        })
    }

    /// Permanently drop a trashed record.
    pub fn purge(&self, ip: &str) -> Result<DeviceRecord, CoreError> {
        let key = normalize_key(ip);
        self.mutate("purge", |state| {
            let pos = state.trash_position(&key)?;
            let record = state.trash.remove(pos);
            debug!(ip = %key, "device purged");
            Ok(record)
        })
    }

    /// Purge every trashed record in one write. Returns how many went.
    pub fn empty_trash(&self) -> Result<usize, CoreError> {
        self.mutate("empty-trash", |state| {
            let count = state.trash.len();
            state.trash.clear();
            Ok(count)
        })
    }

    // ── Internals ────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` to a copy of the state, persist the copy, then commit it.
    ///
    /// Errors from `f` or from the save leave the live state untouched.
    fn mutate<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut RegistryState) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let mut state = self.lock();
        let mut candidate = state.clone();
        let out = f(&mut candidate)?;

        if let Err(e) = self.storage.save(&candidate.to_snapshot()) {
            error!(operation, error = %e, "failed to persist registry, change discarded");
            return Err(e);
        }

        *state = candidate;
        Ok(out)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("Registry")
            .field("location", &self.storage.location())
            .field("active", &state.active.len())
            .field("trash", &state.trash.len())
            .finish()
    }
}
