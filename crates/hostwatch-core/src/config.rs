// ── Runtime monitor configuration ──
//
// Describes *how* to poll. The CLI builds a `MonitorConfig` from the
// config file and flags and hands it in; core never reads config files.

use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_CONCURRENT_PROBES: usize = 64;

/// Configuration for a single [`Monitor`](crate::Monitor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Period of the background poll task. `Duration::ZERO` disables it.
    pub poll_interval: Duration,
    /// Upper bound for a single probe.
    pub probe_timeout: Duration,
    /// Maximum number of probes in flight during one cycle.
    pub max_concurrent_probes: usize,
    /// Replies slower than this are treated as unreachable.
    pub max_round_trip: Option<Duration>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            max_concurrent_probes: DEFAULT_MAX_CONCURRENT_PROBES,
            max_round_trip: None,
        }
    }
}
