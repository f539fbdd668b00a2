//! Batch scan orchestration
//!
//! Drives the prober over the whole enumerated range in fixed-size
//! batches: every probe within a batch runs concurrently, and the
//! batch is joined completely before the next one starts. That bounds
//! outstanding pings (sockets, child processes, segment traffic) at
//! `batch_size` without pipelining complexity.

use crate::error::DiscoveryError;
use crate::iface::{local_interface, InterfaceInfo};
use crate::probe::{PingProber, Prober};
use crate::range::HostRange;
use crate::subnet::{compute_range, SubnetRange};
use netherd_core::{DiscoveredDevice, MacAddr};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Hosts probed concurrently in one batch
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Overrides for scanning a subnet other than the local one
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Address inside the target subnet; picks the local interface
    /// when absent
    pub target_ip: Option<Ipv4Addr>,
    /// Netmask for the target subnet; defaults to /24 when only an
    /// address override is given
    pub target_mask: Option<Ipv4Addr>,
    pub batch_size: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            target_ip: None,
            target_mask: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Progress hooks invoked at batch and per-device granularity.
///
/// All callbacks run on the orchestrator task, after the batch join
/// point; implementations need no internal synchronization.
pub trait ScanObserver: Send + Sync {
    fn scan_started(&self, _range: &SubnetRange, _total_hosts: u64) {}
    fn device_found(&self, _device: &DiscoveredDevice) {}
    fn batch_complete(&self, _probed: usize, _total: usize) {}
    fn scan_complete(&self, _found: usize) {}
}

/// Observer that reports nothing
pub struct NullObserver;

impl ScanObserver for NullObserver {}

/// One-shot subnet scanner
pub struct Scanner<P: Prober> {
    prober: Arc<P>,
    observer: Box<dyn ScanObserver>,
    options: ScanOptions,
}

impl Scanner<PingProber> {
    /// Scanner with the system-ping prober and no progress reporting.
    pub fn new(options: ScanOptions) -> Self {
        Self::with_prober(PingProber::default(), Box::new(NullObserver), options)
    }
}

impl<P: Prober + 'static> Scanner<P> {
    pub fn with_prober(prober: P, observer: Box<dyn ScanObserver>, options: ScanOptions) -> Self {
        Self {
            prober: Arc::new(prober),
            observer,
            options,
        }
    }

    /// The interface (or override) this scan will cover.
    ///
    /// Computed fresh per call; an override with no mask assumes /24,
    /// matching home-router defaults.
    pub fn interface_info(&self) -> Result<InterfaceInfo, DiscoveryError> {
        match self.options.target_ip {
            Some(ip) => {
                let netmask = self
                    .options
                    .target_mask
                    .unwrap_or(Ipv4Addr::new(255, 255, 255, 0));
                Ok(InterfaceInfo::new("target".to_string(), ip, netmask))
            }
            None => {
                let mut info = local_interface()?;
                if let Some(mask) = self.options.target_mask {
                    info = InterfaceInfo::new(info.name, info.ip, mask);
                }
                Ok(info)
            }
        }
    }

    /// Probe every candidate host address and collect the responsive
    /// ones with resolved MACs.
    ///
    /// An empty result is a valid outcome. Element order follows batch
    /// order but is unspecified within a batch.
    pub async fn run(&self) -> Result<Vec<DiscoveredDevice>, DiscoveryError> {
        let info = self.interface_info()?;
        let range = compute_range(info.ip, info.netmask);

        info!(
            interface = %info.name,
            cidr = %info.cidr,
            network = %range.network,
            broadcast = %range.broadcast,
            hosts = range.usable_hosts,
            "Starting subnet scan"
        );
        self.observer.scan_started(&range, range.usable_hosts);

        if range.usable_hosts == 0 {
            // Host-only mask (/31, /32): nothing to enumerate.
            warn!(cidr = %info.cidr, "Subnet has no usable host addresses");
            self.observer.scan_complete(0);
            return Ok(Vec::new());
        }

        let batch_size = self.options.batch_size.max(1);
        let total = range.usable_hosts as usize;
        let mut hosts = HostRange::new(range.network, range.broadcast);
        let mut devices = Vec::new();
        let mut probed = 0usize;

        loop {
            let batch: Vec<Ipv4Addr> = hosts.by_ref().take(batch_size).collect();
            if batch.is_empty() {
                break;
            }

            let found = self.probe_batch(&batch).await;
            probed += batch.len();

            for device in found {
                debug!(ip = %device.ip, mac = %device.mac, "Host discovered");
                self.observer.device_found(&device);
                devices.push(device);
            }
            self.observer.batch_complete(probed, total);
        }

        info!(found = devices.len(), probed = probed, "Subnet scan complete");
        self.observer.scan_complete(devices.len());
        Ok(devices)
    }

    /// Run one batch to completion and aggregate its hits.
    ///
    /// Joining here is the synchronization barrier between batches;
    /// aggregation happens only on this task.
    async fn probe_batch(&self, batch: &[Ipv4Addr]) -> Vec<DiscoveredDevice> {
        let mut tasks: JoinSet<Option<(Ipv4Addr, MacAddr)>> = JoinSet::new();

        for &ip in batch {
            let prober = Arc::clone(&self.prober);
            tasks.spawn(async move { prober.probe(ip).await.map(|mac| (ip, mac)) });
        }

        let mut found = Vec::new();
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(Some((ip, mac))) => found.push(DiscoveredDevice { ip, mac }),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Probe task panicked"),
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Prober scripted with a fixed ip -> mac table.
    struct ScriptedProber {
        alive: HashMap<Ipv4Addr, MacAddr>,
    }

    impl ScriptedProber {
        fn new(alive: &[(Ipv4Addr, &str)]) -> Self {
            Self {
                alive: alive
                    .iter()
                    .map(|(ip, mac)| (*ip, mac.parse().unwrap()))
                    .collect(),
            }
        }
    }

    #[async_trait::async_trait]
    impl Prober for ScriptedProber {
        async fn probe(&self, ip: Ipv4Addr) -> Option<MacAddr> {
            tokio::task::yield_now().await;
            self.alive.get(&ip).cloned()
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        batches: Mutex<Vec<(usize, usize)>>,
        found: Mutex<Vec<Ipv4Addr>>,
    }

    impl ScanObserver for RecordingObserver {
        fn device_found(&self, device: &DiscoveredDevice) {
            self.found.lock().unwrap().push(device.ip);
        }
        fn batch_complete(&self, probed: usize, total: usize) {
            self.batches.lock().unwrap().push((probed, total));
        }
    }

    fn options(ip: [u8; 4], mask: [u8; 4], batch_size: usize) -> ScanOptions {
        ScanOptions {
            target_ip: Some(Ipv4Addr::from(ip)),
            target_mask: Some(Ipv4Addr::from(mask)),
            batch_size,
        }
    }

    #[tokio::test]
    async fn test_scan_finds_scripted_hosts() {
        let prober = ScriptedProber::new(&[
            (Ipv4Addr::new(10, 0, 0, 3), "aa:aa:aa:aa:aa:aa"),
            (Ipv4Addr::new(10, 0, 0, 9), "bb:bb:bb:bb:bb:bb"),
        ]);
        let scanner = Scanner::with_prober(
            prober,
            Box::new(NullObserver),
            options([10, 0, 0, 1], [255, 255, 255, 240], 4),
        );

        let mut devices = scanner.run().await.unwrap();
        devices.sort_by_key(|d| d.ip);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].ip, Ipv4Addr::new(10, 0, 0, 3));
        assert_eq!(devices[1].mac.to_string(), "bb:bb:bb:bb:bb:bb");
    }

    #[tokio::test]
    async fn test_empty_scan_is_not_an_error() {
        let scanner = Scanner::with_prober(
            ScriptedProber::new(&[]),
            Box::new(NullObserver),
            options([192, 168, 5, 1], [255, 255, 255, 0], 50),
        );
        let devices = scanner.run().await.unwrap();
        assert!(devices.is_empty());
    }

    #[tokio::test]
    async fn test_batches_partition_the_range() {
        let observer = Arc::new(RecordingObserver::default());

        struct SharedObserver(Arc<RecordingObserver>);
        impl ScanObserver for SharedObserver {
            fn device_found(&self, device: &DiscoveredDevice) {
                self.0.device_found(device);
            }
            fn batch_complete(&self, probed: usize, total: usize) {
                self.0.batch_complete(probed, total);
            }
        }

        // /28 -> 14 hosts, batch size 5 -> batches of 5, 5, 4.
        let scanner = Scanner::with_prober(
            ScriptedProber::new(&[]),
            Box::new(SharedObserver(Arc::clone(&observer))),
            options([10, 0, 0, 1], [255, 255, 255, 240], 5),
        );
        scanner.run().await.unwrap();

        let batches = observer.batches.lock().unwrap().clone();
        assert_eq!(batches, vec![(5, 14), (10, 14), (14, 14)]);
    }

    #[tokio::test]
    async fn test_host_only_mask_scans_nothing() {
        let scanner = Scanner::with_prober(
            ScriptedProber::new(&[]),
            Box::new(NullObserver),
            options([10, 0, 0, 1], [255, 255, 255, 255], 50),
        );
        let devices = scanner.run().await.unwrap();
        assert!(devices.is_empty());
    }

    #[tokio::test]
    async fn test_override_without_mask_defaults_to_slash24() {
        let scanner = Scanner::with_prober(
            ScriptedProber::new(&[]),
            Box::new(NullObserver),
            ScanOptions {
                target_ip: Some(Ipv4Addr::new(172, 16, 4, 20)),
                target_mask: None,
                batch_size: DEFAULT_BATCH_SIZE,
            },
        );
        let info = scanner.interface_info().unwrap();
        assert_eq!(info.netmask, Ipv4Addr::new(255, 255, 255, 0));
        assert_eq!(info.cidr, "172.16.4.20/24");
    }
}
