// ── Poll result merge-back ──
//
// A poll cycle works on a snapshot taken before the probes went out. By
// the time it finishes, the registry may have gained, lost or edited
// records. Results are matched back by IP and only the status is written,
// so concurrent CRUD changes survive the merge.

use tracing::{debug, info};

use super::Registry;
use crate::error::CoreError;
use crate::model::{DeviceRecord, StatusChange};

impl Registry {
    /// Write polled statuses onto the matching active records and persist.
    ///
    /// Results whose IP is no longer active are dropped. Returns the devices
    /// whose status actually changed, in registry order.
    pub fn merge_statuses(&self, polled: &[DeviceRecord]) -> Result<Vec<StatusChange>, CoreError> {
        self.mutate("merge-poll", |state| {
            let mut changes = Vec::new();
            let mut dropped = 0usize;

            for result in polled {
                let Some(record) = state.active.get_mut(&result.ip) else {
                    dropped += 1;
                    continue;
                };
                if record.status != result.status {
                    changes.push(StatusChange {
                        ip: record.ip.clone(),
                        name: record.name.clone(),
                        from: record.status,
                        to: result.status,
                    });
                    record.status = result.status;
                }
            }

            if dropped > 0 {
                debug!(dropped, "poll results for devices no longer registered");
            }
            for change in &changes {
                info!(ip = %change.ip, name = %change.name, from = %change.from, to = %change.to, "status changed");
            }
            Ok(changes)
        })
    }
}
