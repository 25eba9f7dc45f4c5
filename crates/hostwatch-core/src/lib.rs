//! Device registry and reachability polling for `hostwatch`.
//!
//! This crate owns the domain model, the persisted registry, and the
//! polling machinery consumed by the CLI:
//!
//! - **[`Monitor`]**: central facade. [`Monitor::open()`] loads the
//!   persisted registry through an injected [`Storage`], exposes the CRUD
//!   contract, runs on-demand poll cycles via
//!   [`poll_now()`](Monitor::poll_now) and spawns the periodic background
//!   poll task with [`start()`](Monitor::start).
//!
//! - **[`Registry`]**: ordered active collection plus the trash, mirrored to
//!   storage after every mutation. A mutation only lands in memory once the
//!   save succeeded.
//!
//! - **[`Poller`]**: pure reconciliation. It fans out one [`Probe`] per device,
//!   waits for all of them, and returns the snapshot with fresh statuses.
//!
//! - **[`transfer`]**: CSV bulk import/export, row-by-row through the same
//!   validation as [`Monitor::add`].

pub mod config;
pub mod error;
pub mod model;
pub mod monitor;
pub mod poller;
pub mod probe;
pub mod store;
pub mod transfer;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::MonitorConfig;
pub use error::CoreError;
pub use model::{DeviceRecord, DeviceStatus, DeviceUpdate, NewDevice, StatusChange};
pub use monitor::Monitor;
pub use poller::Poller;
pub use probe::{IcmpProbe, Probe, ProbeError, ProbeReply};
pub use store::storage::{JsonFileStorage, MemoryStorage, Snapshot, Storage};
pub use store::{Collection, Registry};
pub use transfer::{ImportReport, RejectedRow};
