//! Subnet arithmetic
//!
//! Pure octet math deriving the scan range from a local address and
//! netmask. The network address is the per-octet AND of address and
//! mask; the broadcast address ORs in the inverted mask.

use crate::error::DiscoveryError;
use std::net::Ipv4Addr;

/// The scannable extent of one subnet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubnetRange {
    /// Network address (first address, itself not a host)
    pub network: Ipv4Addr,
    /// Broadcast address (last address, itself not a host)
    pub broadcast: Ipv4Addr,
    /// Host addresses between the two, zero for /31 and /32 masks
    pub usable_hosts: u64,
}

/// Derive the subnet range containing `ip` under `netmask`.
pub fn compute_range(ip: Ipv4Addr, netmask: Ipv4Addr) -> SubnetRange {
    let ip_octets = ip.octets();
    let mask_octets = netmask.octets();

    let mut network = [0u8; 4];
    let mut broadcast = [0u8; 4];
    for i in 0..4 {
        network[i] = ip_octets[i] & mask_octets[i];
        broadcast[i] = ip_octets[i] | !mask_octets[i];
    }

    // Addresses spanned by the unmasked bits, minus network and
    // broadcast. Saturates to zero for host-only masks.
    let total: u64 = mask_octets
        .iter()
        .map(|&octet| 256 - u64::from(octet))
        .product();
    let usable_hosts = total.saturating_sub(2);

    SubnetRange {
        network: Ipv4Addr::from(network),
        broadcast: Ipv4Addr::from(broadcast),
        usable_hosts,
    }
}

/// CIDR prefix length of a netmask: the count of set bits.
pub fn prefix_len(netmask: Ipv4Addr) -> u8 {
    u32::from(netmask).count_ones() as u8
}

/// Parse a dotted-quad string at the configuration boundary.
pub fn parse_ipv4(s: &str) -> Result<Ipv4Addr, DiscoveryError> {
    s.trim()
        .parse()
        .map_err(|_| DiscoveryError::InvalidAddress(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_range_slash24() {
        let range = compute_range(
            Ipv4Addr::new(192, 168, 1, 50),
            Ipv4Addr::new(255, 255, 255, 0),
        );
        assert_eq!(range.network, Ipv4Addr::new(192, 168, 1, 0));
        assert_eq!(range.broadcast, Ipv4Addr::new(192, 168, 1, 255));
        assert_eq!(range.usable_hosts, 254);
    }

    #[test]
    fn test_compute_range_slash16() {
        let range = compute_range(
            Ipv4Addr::new(10, 20, 30, 40),
            Ipv4Addr::new(255, 255, 0, 0),
        );
        assert_eq!(range.network, Ipv4Addr::new(10, 20, 0, 0));
        assert_eq!(range.broadcast, Ipv4Addr::new(10, 20, 255, 255));
        assert_eq!(range.usable_hosts, 65_534);
    }

    #[test]
    fn test_host_only_mask_has_no_usable_hosts() {
        let range = compute_range(
            Ipv4Addr::new(192, 168, 1, 50),
            Ipv4Addr::new(255, 255, 255, 255),
        );
        assert_eq!(range.network, Ipv4Addr::new(192, 168, 1, 50));
        assert_eq!(range.broadcast, Ipv4Addr::new(192, 168, 1, 50));
        assert_eq!(range.usable_hosts, 0);
    }

    #[test]
    fn test_prefix_len() {
        assert_eq!(prefix_len(Ipv4Addr::new(255, 255, 255, 0)), 24);
        assert_eq!(prefix_len(Ipv4Addr::new(255, 255, 0, 0)), 16);
        assert_eq!(prefix_len(Ipv4Addr::new(255, 255, 255, 252)), 30);
        assert_eq!(prefix_len(Ipv4Addr::new(0, 0, 0, 0)), 0);
    }

    #[test]
    fn test_parse_ipv4() {
        assert_eq!(
            parse_ipv4("192.168.1.1").unwrap(),
            Ipv4Addr::new(192, 168, 1, 1)
        );
        assert!(matches!(
            parse_ipv4("192.168.1"),
            Err(DiscoveryError::InvalidAddress(_))
        ));
        assert!(matches!(
            parse_ipv4("192.168.1.300"),
            Err(DiscoveryError::InvalidAddress(_))
        ));
    }
}
