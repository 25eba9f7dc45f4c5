// ── Reachability poller ──
//
// One cycle: take an ordered snapshot, probe every record concurrently
// (bounded), wait for all probes to settle, return the snapshot with each
// status overwritten. The poller never reads or writes the registry.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use futures_util::stream;
use tracing::{debug, warn};

use crate::config::MonitorConfig;
use crate::model::{DeviceRecord, DeviceStatus};
use crate::probe::{Probe, ProbeError, ProbeReply};

/// Runs poll cycles with a shared [`Probe`].
#[derive(Debug)]
pub struct Poller<P> {
    probe: Arc<P>,
    probe_timeout: Duration,
    max_concurrent: usize,
    max_round_trip: Option<Duration>,
}

impl<P> Clone for Poller<P> {
    fn clone(&self) -> Self {
        Self {
            probe: Arc::clone(&self.probe),
            probe_timeout: self.probe_timeout,
            max_concurrent: self.max_concurrent,
            max_round_trip: self.max_round_trip,
        }
    }
}

impl<P: Probe> Poller<P> {
    pub fn new(probe: Arc<P>, config: &MonitorConfig) -> Self {
        Self {
            probe,
            probe_timeout: config.probe_timeout,
            max_concurrent: config.max_concurrent_probes.max(1),
            max_round_trip: config.max_round_trip,
        }
    }

    /// Probe every record and return a new list, same order and length,
    /// with only `status` replaced.
    pub async fn poll(&self, snapshot: Vec<DeviceRecord>) -> Vec<DeviceRecord> {
        if snapshot.is_empty() {
            return snapshot;
        }

        let started = Instant::now();
        let total = snapshot.len();

        // `buffered` keeps output order equal to input order while running
        // up to `max_concurrent` probes at once.
        let results: Vec<DeviceRecord> = stream::iter(snapshot)
            .map(|record| {
                let poller = self.clone();
                async move {
                    let status = poller.status_of(&record).await;
                    DeviceRecord { status, ..record }
                }
            })
            .buffered(self.max_concurrent)
            .collect()
            .await;

        let connected = results.iter().filter(|r| r.status.is_connected()).count();
        debug!(
            total,
            connected,
            disconnected = total - connected,
            elapsed_ms = started.elapsed().as_millis(),
            "poll cycle complete"
        );
        results
    }

    async fn status_of(&self, record: &DeviceRecord) -> DeviceStatus {
        let Some(ip) = record.addr() else {
            warn!(ip = %record.ip, name = %record.name, "stored IP does not parse, marking disconnected");
            return DeviceStatus::Disconnected;
        };

        match self.probe_bounded(ip).await {
            Ok(reply) => self.verdict(ip, reply),
            Err(e) => {
                debug!(%ip, error = %e, "probe failed");
                DeviceStatus::Disconnected
            }
        }
    }

    async fn probe_bounded(&self, ip: IpAddr) -> Result<ProbeReply, ProbeError> {
        tokio::time::timeout(self.probe_timeout, self.probe.probe(ip, self.probe_timeout))
            .await
            .map_err(|_| ProbeError::Timeout(self.probe_timeout))?
    }

    fn verdict(&self, ip: IpAddr, reply: ProbeReply) -> DeviceStatus {
        if !reply.alive {
            return DeviceStatus::Disconnected;
        }
        match (reply.round_trip, self.max_round_trip) {
            (Some(rtt), Some(ceiling)) if rtt >= ceiling => {
                debug!(%ip, ?rtt, ?ceiling, "reply slower than ceiling");
                DeviceStatus::Disconnected
            }
            _ => DeviceStatus::Connected,
        }
    }
}
