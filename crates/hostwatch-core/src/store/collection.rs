// ── Ordered device collection ──
//
// Insertion-ordered storage keyed by IP with O(1) lookups. Removal
// shifts later entries down so the remaining order is preserved.

use indexmap::IndexMap;
use tracing::warn;

use crate::model::{DeviceRecord, normalize_key};

/// The active registry: unique by IP, insertion-ordered.
#[derive(Debug, Clone, Default)]
pub(crate) struct DeviceCollection {
    by_ip: IndexMap<String, DeviceRecord>,
}

impl DeviceCollection {
    /// Build from persisted records.
    ///
    /// Keys are rewritten to canonical form first, so `2001:DB8::1` and
    /// ` 10.0.0.7` in a hand-edited file match what lookups produce. Later
    /// records whose canonical IP is already taken are handed back instead
    /// of being inserted (first one wins).
    pub(crate) fn from_records(records: Vec<DeviceRecord>) -> (Self, Vec<DeviceRecord>) {
        let mut by_ip = IndexMap::with_capacity(records.len());
        let mut displaced = Vec::new();
        for mut record in records {
            record.ip = normalize_key(&record.ip);
            if by_ip.contains_key(&record.ip) {
                warn!(
                    ip = %record.ip,
                    name = %record.name,
                    "duplicate IP in stored registry, moving later entry to the trash"
                );
                displaced.push(record);
                continue;
            }
            by_ip.insert(record.ip.clone(), record);
        }
        (Self { by_ip }, displaced)
    }

    pub(crate) fn contains(&self, ip: &str) -> bool {
        self.by_ip.contains_key(ip)
    }

    pub(crate) fn get(&self, ip: &str) -> Option<&DeviceRecord> {
        self.by_ip.get(ip)
    }

    pub(crate) fn get_mut(&mut self, ip: &str) -> Option<&mut DeviceRecord> {
        self.by_ip.get_mut(ip)
    }

    /// Append at the end. Returns `false` (and does nothing) if the IP is taken.
    pub(crate) fn push(&mut self, record: DeviceRecord) -> bool {
        if self.by_ip.contains_key(&record.ip) {
            return false;
        }
        self.by_ip.insert(record.ip.clone(), record);
        true
    }

    /// Remove by IP, keeping the relative order of the rest.
    pub(crate) fn remove(&mut self, ip: &str) -> Option<DeviceRecord> {
        self.by_ip.shift_remove(ip)
    }

    /// Owned copy of every record, in order.
    pub(crate) fn records(&self) -> Vec<DeviceRecord> {
        self.by_ip.values().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_ip.len()
    }
}
