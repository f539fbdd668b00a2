//! Netherd Discovery - Subnet scanning for device inventory
//!
//! This crate turns a local interface (or an explicit target subnet)
//! into a set of live hosts with resolved MAC addresses:
//! - subnet arithmetic (network/broadcast/usable-host derivation)
//! - host range enumeration
//! - per-host probing (system ping + kernel neighbour table)
//! - a batch orchestrator bounding concurrent probes

pub mod arp;
pub mod error;
pub mod iface;
pub mod probe;
pub mod range;
pub mod scanner;
pub mod subnet;

pub use error::DiscoveryError;
pub use iface::{local_interface, InterfaceInfo};
pub use probe::{PingProber, Prober};
pub use range::HostRange;
pub use scanner::{NullObserver, ScanObserver, ScanOptions, Scanner};
pub use subnet::{compute_range, parse_ipv4, prefix_len, SubnetRange};
