//! Host address enumeration
//!
//! Expands a (network, broadcast) pair into the candidate host
//! addresses between them, both endpoints excluded. Steps a u32 rather
//! than materializing a Vec, so a /16 costs nothing up front.

use std::net::Ipv4Addr;

/// Ascending iterator over the host addresses of a subnet.
///
/// Cloneable and restartable; no hidden state beyond the cursor.
#[derive(Debug, Clone)]
pub struct HostRange {
    next: u32,
    broadcast: u32,
}

impl HostRange {
    /// Hosts strictly between `network` and `broadcast`.
    ///
    /// A degenerate range (/31, /32, or an inverted pair) yields
    /// nothing.
    pub fn new(network: Ipv4Addr, broadcast: Ipv4Addr) -> Self {
        let network = u32::from(network);
        let broadcast = u32::from(broadcast);
        Self {
            next: network.saturating_add(1),
            broadcast,
        }
    }

    /// Remaining host count without consuming the iterator.
    pub fn remaining(&self) -> u64 {
        if self.next < self.broadcast {
            u64::from(self.broadcast - self.next)
        } else {
            0
        }
    }
}

impl Iterator for HostRange {
    type Item = Ipv4Addr;

    fn next(&mut self) -> Option<Ipv4Addr> {
        if self.next >= self.broadcast {
            return None;
        }
        let ip = Ipv4Addr::from(self.next);
        self.next += 1;
        Some(ip)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining() as usize;
        (remaining, Some(remaining))
    }
}
