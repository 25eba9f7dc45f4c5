// ── Liveness probes ──
//
// A `Probe` answers "is this address alive right now?". Errors never
// escape the poller: every `ProbeError` collapses into `Disconnected`.

use std::future::Future;
use std::net::IpAddr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence, SurgeError};
use thiserror::Error;
use tracing::{trace, warn};

/// Outcome of a single probe that completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeReply {
    pub alive: bool,
    pub round_trip: Option<Duration>,
}

impl ProbeReply {
    pub fn alive(round_trip: Duration) -> Self {
        Self {
            alive: true,
            round_trip: Some(round_trip),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            alive: false,
            round_trip: None,
        }
    }
}

/// Why a probe produced no verdict.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("probe unavailable: {0}")]
    Unavailable(String),

    #[error("probe failed: {0}")]
    Failed(String),
}

/// Liveness check for one address.
pub trait Probe: Send + Sync + 'static {
    fn probe(
        &self,
        ip: IpAddr,
        timeout: Duration,
    ) -> impl Future<Output = Result<ProbeReply, ProbeError>> + Send;
}

// ── ICMP echo ───────────────────────────────────────────────────────

const PAYLOAD: [u8; 56] = [0; 56];

/// ICMP echo probe backed by `surge-ping`.
///
/// Sockets are opened on first use per address family, inside the runtime.
/// Opening raw (or unprivileged datagram) ICMP sockets can fail, e.g.
/// without `CAP_NET_RAW` or when `net.ipv4.ping_group_range` excludes the
/// user. That failure is logged once and every later probe to that family
/// reports [`ProbeError::Unavailable`].
pub struct IcmpProbe {
    v4: OnceLock<Result<Client, String>>,
    v6: OnceLock<Result<Client, String>>,
    attempts: u16,
    next_id: AtomicU16,
}

impl IcmpProbe {
    /// `attempts` is clamped to at least 1.
    pub fn new(attempts: u16) -> Self {
        Self {
            v4: OnceLock::new(),
            v6: OnceLock::new(),
            attempts: attempts.max(1),
            next_id: AtomicU16::new(seed_identifier()),
        }
    }

    fn client(&self, ip: IpAddr) -> Result<&Client, ProbeError> {
        let client = match ip {
            IpAddr::V4(_) => self.v4.get_or_init(|| open_client(ICMP::V4)),
            IpAddr::V6(_) => self.v6.get_or_init(|| open_client(ICMP::V6)),
        };
        client
            .as_ref()
            .map_err(|reason| ProbeError::Unavailable(reason.clone()))
    }
}

impl Default for IcmpProbe {
    fn default() -> Self {
        Self::new(1)
    }
}

impl std::fmt::Debug for IcmpProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = |slot: &OnceLock<Result<Client, String>>| match slot.get() {
            None => "idle",
            Some(Ok(_)) => "open",
            Some(Err(_)) => "unavailable",
        };
        f.debug_struct("IcmpProbe")
            .field("v4", &state(&self.v4))
            .field("v6", &state(&self.v6))
            .field("attempts", &self.attempts)
            .finish_non_exhaustive()
    }
}

impl Probe for IcmpProbe {
    /// `timeout` bounds the whole probe; it is split evenly across attempts.
    async fn probe(&self, ip: IpAddr, timeout: Duration) -> Result<ProbeReply, ProbeError> {
        let client = self.client(ip)?;
        let per_attempt = timeout / u32::from(self.attempts);
        let identifier = PingIdentifier(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut pinger = client.pinger(ip, identifier).await;
        pinger.timeout(per_attempt);

        for seq in 0..self.attempts {
            match pinger.ping(PingSequence(seq), &PAYLOAD).await {
                Ok((_, rtt)) => {
                    trace!(%ip, ?rtt, seq, "echo reply");
                    return Ok(ProbeReply::alive(rtt));
                }
                Err(SurgeError::Timeout { .. }) => {
                    trace!(%ip, seq, "echo timed out");
                }
                Err(e) => return Err(ProbeError::Failed(e.to_string())),
            }
        }
        Ok(ProbeReply::unreachable())
    }
}

fn open_client(kind: ICMP) -> Result<Client, String> {
    let family = match kind {
        ICMP::V4 => "IPv4",
        ICMP::V6 => "IPv6",
    };
    let config = Config::builder().kind(kind).build();
    Client::new(&config).map_err(|e| {
        warn!(family, error = %e, "ICMP socket unavailable, probes will report Disconnected");
        format!("{family} ICMP socket: {e}")
    })
}

/// Identifier seed so concurrent hostwatch processes rarely collide.
fn seed_identifier() -> u16 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    u16::try_from((nanos ^ std::process::id()) & 0xFFFF).unwrap_or_default()
}

// ── Test double ─────────────────────────────────────────────────────
