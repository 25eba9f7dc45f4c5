// ── Monitor ──
//
// Owning facade over the registry and the poller. Cheaply cloneable via
// `Arc<MonitorInner>`; clones share state, the cycle lock and the
// background task.

use std::collections::HashSet;
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::error::CoreError;
use crate::model::{DeviceRecord, DeviceUpdate, NewDevice, StatusChange};
use crate::poller::Poller;
use crate::probe::{IcmpProbe, Probe};
use crate::store::Registry;
use crate::store::storage::Storage;
use crate::transfer::{self, ImportReport};

const EVENT_CHANNEL_SIZE: usize = 256;

/// The main entry point for consumers.
///
/// Holds the registry, the poller and the background poll task. Construct
/// with [`open()`](Self::open); periodic polling only runs after
/// [`start()`](Self::start).
pub struct Monitor<P: Probe = IcmpProbe> {
    inner: Arc<MonitorInner<P>>,
}

impl<P: Probe> Clone for Monitor<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct MonitorInner<P> {
    config: MonitorConfig,
    registry: Registry,
    poller: Poller<P>,
    /// Held for the whole of a cycle so cycles never overlap.
    cycle_lock: Mutex<()>,
    event_tx: broadcast::Sender<StatusChange>,
    last_poll: watch::Sender<Option<DateTime<Utc>>>,
    cancel: CancellationToken,
    /// Child token for the running background task. Replaced on `start`.
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl<P: Probe> Monitor<P> {
    /// Load the persisted registry and wire up the poller.
    ///
    /// Does not start polling.
    pub fn open(
        config: MonitorConfig,
        storage: Arc<dyn Storage>,
        probe: P,
    ) -> Result<Self, CoreError> {
        let registry = Registry::load(storage)?;
        let poller = Poller::new(Arc::new(probe), &config);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let (last_poll, _) = watch::channel(None);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Ok(Self {
            inner: Arc::new(MonitorInner {
                config,
                registry,
                poller,
                cycle_lock: Mutex::new(()),
                event_tx,
                last_poll,
                cancel,
                cancel_child: Mutex::new(cancel_child),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    // ── Registry operations ──────────────────────────────────────

    pub fn list_active(&self) -> Vec<DeviceRecord> {
        self.inner.registry.list_active()
    }

    pub fn list_trash(&self) -> Vec<DeviceRecord> {
        self.inner.registry.list_trash()
    }

    pub fn get(&self, ip: &str) -> Result<DeviceRecord, CoreError> {
        self.inner.registry.get(ip)
    }

    pub fn add(&self, device: NewDevice) -> Result<DeviceRecord, CoreError> {
        self.inner.registry.add(device)
    }

    pub fn edit(&self, ip: &str, update: DeviceUpdate) -> Result<DeviceRecord, CoreError> {
        self.inner.registry.edit(ip, update)
    }

    pub fn soft_delete(&self, ip: &str) -> Result<DeviceRecord, CoreError> {
        self.inner.registry.soft_delete(ip)
    }

    pub fn restore(&self, ip: &str) -> Result<DeviceRecord, CoreError> {
        self.inner.registry.restore(ip)
    }

    pub fn purge(&self, ip: &str) -> Result<DeviceRecord, CoreError> {
        self.inner.registry.purge(ip)
    }

    pub fn empty_trash(&self) -> Result<usize, CoreError> {
        self.inner.registry.empty_trash()
    }

    /// Bulk-add from CSV. See [`transfer::import_csv`].
    pub fn import_csv<R: Read>(&self, reader: R) -> Result<ImportReport, CoreError> {
        transfer::import_csv(&self.inner.registry, reader)
    }

    /// Write the active registry as CSV.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<(), CoreError> {
        transfer::export_csv(&self.inner.registry.list_active(), writer)
    }

    // ── Polling ──────────────────────────────────────────────────

    /// Run one poll cycle and return the devices it probed.
    ///
    /// Records come from the registry after the merge, so edits made while
    /// the probes were in flight show up. Devices added mid-cycle were not
    /// probed and are left out; devices deleted mid-cycle are gone.
    pub async fn poll_now(&self) -> Result<Vec<DeviceRecord>, CoreError> {
        let _cycle = self.inner.cycle_lock.lock().await;
        let (probed, _) = self.cycle().await?;
        Ok(self
            .inner
            .registry
            .list_active()
            .into_iter()
            .filter(|record| probed.contains(&record.ip))
            .collect())
    }

    /// Run exactly one poll cycle and return the status changes it caused.
    ///
    /// Waits for any cycle already in flight to finish first.
    pub async fn run_cycle(&self) -> Result<Vec<StatusChange>, CoreError> {
        let _cycle = self.inner.cycle_lock.lock().await;
        let (_, changes) = self.cycle().await?;
        Ok(changes)
    }

    /// Snapshot → probe → merge → publish. Caller holds the cycle lock.
    ///
    /// Returns the probed IPs alongside the changes.
    async fn cycle(&self) -> Result<(HashSet<String>, Vec<StatusChange>), CoreError> {
        let snapshot = self.inner.registry.list_active();
        let polled = self.inner.poller.poll(snapshot).await;
        let probed: HashSet<String> = polled.iter().map(|r| r.ip.clone()).collect();

        // The merge saves to storage; keep that file I/O off the runtime.
        let inner = Arc::clone(&self.inner);
        let changes = tokio::task::spawn_blocking(move || inner.registry.merge_statuses(&polled))
            .await
            .map_err(|e| CoreError::Persistence {
                path: self.inner.registry.location().into(),
                reason: format!("merge task did not complete: {e}"),
            })??;

        for change in &changes {
            // No subscribers is fine.
            let _ = self.inner.event_tx.send(change.clone());
        }
        self.inner.last_poll.send_replace(Some(Utc::now()));
        Ok((probed, changes))
    }

    // ── Background task lifecycle ────────────────────────────────

    /// Spawn the periodic poll task.
    ///
    /// The first cycle runs one `poll_interval` after this call. A zero
    /// interval disables the task. Calling `start` while the task is
    /// already running does nothing.
    pub async fn start(&self) {
        let interval = self.inner.config.poll_interval;
        if interval.is_zero() {
            info!("poll interval is zero, background polling disabled");
            return;
        }

        let mut handles = self.inner.task_handles.lock().await;
        if handles.iter().any(|h| !h.is_finished()) {
            debug!("background poll task already running");
            return;
        }
        handles.clear();

        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        handles.push(tokio::spawn(poll_task(self.clone(), interval, child)));
        info!(interval_secs = interval.as_secs_f64(), "background polling started");
    }

    /// Cancel the background task and wait for it to exit.
    ///
    /// A cycle that is already running completes first.
    pub async fn shutdown(&self) {
        self.inner.cancel_child.lock().await.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "background poll task ended abnormally");
            }
        }
        debug!("background polling stopped");
    }

    /// `true` while the background task is alive.
    pub async fn is_running(&self) -> bool {
        self.inner
            .task_handles
            .lock()
            .await
            .iter()
            .any(|h| !h.is_finished())
    }

    // ── Subscriptions ────────────────────────────────────────────

    /// Receive a [`StatusChange`] for every device whose status a cycle flipped.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusChange> {
        self.inner.event_tx.subscribe()
    }

    /// Completion time of the most recent cycle.
    pub fn last_poll(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.inner.last_poll.subscribe()
    }
}

impl<P: Probe> std::fmt::Debug for Monitor<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("config", &self.inner.config)
            .field("registry", &self.inner.registry)
            .finish_non_exhaustive()
    }
}

async fn poll_task<P: Probe>(monitor: Monitor<P>, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                match monitor.run_cycle().await {
                    Ok(changes) => debug!(changed = changes.len(), "periodic poll done"),
                    Err(e) => warn!(error = %e, "periodic poll failed"),
                }
            }
        }
    }
}
