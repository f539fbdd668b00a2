//! MAC resolution from the kernel neighbour table
//!
//! After a successful ping the kernel has (usually) learned the
//! target's link-layer address. This module reads it back: `ip neigh`
//! on Linux, `arp -n` elsewhere. Entries without a resolved address
//! (INCOMPLETE/FAILED) are treated as misses.

use netherd_core::MacAddr;
use std::net::Ipv4Addr;
use std::str::FromStr;
use tracing::trace;

/// Look up the MAC address for `ip` in the local neighbour table.
///
/// Returns `None` when the table has no usable entry, including the
/// race where the kernel has not populated it yet.
pub async fn resolve_mac(ip: Ipv4Addr) -> Option<MacAddr> {
    let output = neighbour_query(ip).await?;
    let mac = parse_neighbour_output(&output);
    match &mac {
        Some(mac) => trace!(ip = %ip, mac = %mac, "Resolved neighbour entry"),
        None => trace!(ip = %ip, "No usable neighbour entry"),
    }
    mac
}

#[cfg(target_os = "linux")]
async fn neighbour_query(ip: Ipv4Addr) -> Option<String> {
    let output = tokio::process::Command::new("ip")
        .args(["neigh", "show", &ip.to_string()])
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(not(target_os = "linux"))]
async fn neighbour_query(ip: Ipv4Addr) -> Option<String> {
    let output = tokio::process::Command::new("arp")
        .args(["-n", &ip.to_string()])
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Extract a MAC from neighbour-table output for a single address.
///
/// Both query commands are already filtered to one IP, so this only
/// has to skip unresolved entries and find the token that parses as a
/// MAC. Covers `ip neigh` lines
/// (`192.168.1.7 dev eth0 lladdr aa:bb:cc:dd:ee:ff REACHABLE`) and
/// `arp -n` lines (`? (192.168.1.7) at aa:bb:cc:dd:ee:ff on en0 ...`).
fn parse_neighbour_output(output: &str) -> Option<MacAddr> {
    for line in output.lines() {
        if line.contains("FAILED") || line.contains("INCOMPLETE") || line.contains("incomplete") {
            continue;
        }
        for token in line.split_whitespace() {
            if let Ok(mac) = MacAddr::from_str(token) {
                return Some(mac);
            }
        }
    }
    None
}
