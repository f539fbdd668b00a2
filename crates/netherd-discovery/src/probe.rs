//! Per-host reachability probing
//!
//! One probe = one ping plus one neighbour-table lookup. A host only
//! counts as discovered when both succeed; everything else (timeout,
//! unreachable, unresolved MAC) is an expected miss. Retries, if any,
//! belong to the caller.

use crate::arp::resolve_mac;
use async_trait::async_trait;
use netherd_core::MacAddr;
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::time::timeout;
use tracing::trace;

/// Probes a single candidate address.
///
/// Trait seam so the scan orchestrator can be exercised without
/// touching the network.
#[async_trait]
pub trait Prober: Send + Sync {
    /// `Some(mac)` when the host answered and its MAC resolved,
    /// `None` otherwise.
    async fn probe(&self, ip: Ipv4Addr) -> Option<MacAddr>;
}

/// Probes with the system `ping` binary and the kernel neighbour table.
#[derive(Debug, Clone)]
pub struct PingProber {
    /// Per-ping reply timeout handed to `ping -W`, in seconds
    pub ping_timeout_secs: u64,
    /// Overall ceiling on one probe, bounding the worst case even when
    /// the ping process itself stalls
    pub call_ceiling: Duration,
}

impl Default for PingProber {
    fn default() -> Self {
        Self {
            ping_timeout_secs: 1,
            call_ceiling: Duration::from_secs(2),
        }
    }
}

impl PingProber {
    async fn ping(&self, ip: Ipv4Addr) -> bool {
        let result = tokio::process::Command::new("ping")
            .args([
                "-c",
                "1",
                "-W",
                &self.ping_timeout_secs.to_string(),
                &ip.to_string(),
            ])
            .output()
            .await;

        match result {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl Prober for PingProber {
    async fn probe(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        let alive = match timeout(self.call_ceiling, self.ping(ip)).await {
            Ok(alive) => alive,
            Err(_) => {
                trace!(ip = %ip, "Probe hit call ceiling");
                false
            }
        };
        if !alive {
            return None;
        }
        resolve_mac(ip).await
    }
}
