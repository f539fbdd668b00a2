//! Discovery error taxonomy
//!
//! Per-host probe failures are deliberately not represented here: an
//! unreachable or unresolvable host is an expected outcome and surfaces
//! as an absent entry in the scan result, never as an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("invalid IPv4 address: {0:?}")]
    InvalidAddress(String),
    #[error("no non-loopback IPv4 interface found")]
    NoLocalNetwork,
    #[error("failed to enumerate network interfaces: {0}")]
    InterfaceEnumeration(String),
}
