//! Local interface selection

use crate::error::DiscoveryError;
use crate::subnet::prefix_len;
use network_interface::{Addr, NetworkInterface, NetworkInterfaceConfig};
use std::net::Ipv4Addr;
use tracing::debug;

/// The interface a scan runs against, captured once at scan start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub name: String,
    pub ip: Ipv4Addr,
    pub netmask: Ipv4Addr,
    /// `<ip>/<prefix>` notation, for logging and reporting
    pub cidr: String,
}

impl InterfaceInfo {
    pub fn new(name: String, ip: Ipv4Addr, netmask: Ipv4Addr) -> Self {
        let cidr = format!("{}/{}", ip, prefix_len(netmask));
        Self {
            name,
            ip,
            netmask,
            cidr,
        }
    }
}

/// Pick the first non-loopback IPv4 interface with a netmask.
pub fn local_interface() -> Result<InterfaceInfo, DiscoveryError> {
    let interfaces = NetworkInterface::show()
        .map_err(|e| DiscoveryError::InterfaceEnumeration(e.to_string()))?;

    for interface in interfaces {
        for addr in &interface.addr {
            let Addr::V4(v4) = addr else {
                continue;
            };
            if v4.ip.is_loopback() {
                continue;
            }
            let Some(netmask) = v4.netmask else {
                continue;
            };
            let info = InterfaceInfo::new(interface.name.clone(), v4.ip, netmask);
            debug!(
                interface = %info.name,
                cidr = %info.cidr,
                "Selected local interface"
            );
            return Ok(info);
        }
    }

    Err(DiscoveryError::NoLocalNetwork)
}
