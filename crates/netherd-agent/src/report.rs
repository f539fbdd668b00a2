//! Console reporting for scan results

use netherd_core::DiscoveredDevice;
use netherd_discovery::{ScanObserver, SubnetRange};

/// Observer printing scan progress to stderr.
pub struct ProgressReporter;

impl ScanObserver for ProgressReporter {
    fn scan_started(&self, range: &SubnetRange, total_hosts: u64) {
        eprintln!(
            "Scanning {} - {} ({} hosts)...",
            range.network, range.broadcast, total_hosts
        );
    }

    fn batch_complete(&self, probed: usize, total: usize) {
        eprintln!("  probed {probed}/{total}");
    }

    fn scan_complete(&self, found: usize) {
        eprintln!("Scan complete: {found} device(s) found");
    }
}

/// Aligned IP/MAC table, sorted by numeric IP.
pub fn print_devices(devices: &[DiscoveredDevice]) {
    if devices.is_empty() {
        println!("No devices discovered");
        return;
    }

    let mut sorted: Vec<&DiscoveredDevice> = devices.iter().collect();
    sorted.sort_by_key(|d| d.ip);

    println!("{}", "-".repeat(38));
    println!("{:<18}{:<20}", "IP Address", "MAC Address");
    println!("{}", "-".repeat(38));
    for device in sorted {
        println!("{:<18}{:<20}", device.ip.to_string(), device.mac.to_string());
    }
    println!("{}", "-".repeat(38));
}
