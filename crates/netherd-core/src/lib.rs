//! Netherd Core - Device inventory types and reconciliation
//!
//! This crate provides the foundational pieces of the netherd system:
//! - Device model types (discovered devices, registered devices, states)
//! - MAC address identity (normalized, the durable key across scans)
//! - The `DeviceRegistry` contract toward the persistent store
//! - The reconciliation engine that diffs a scan result against the registry

pub mod device;
pub mod mac;
pub mod memory;
pub mod reconcile;
pub mod registry;

pub use device::{
    DeviceState, DeviceUpdate, DiscoveredDevice, NewDevice, ReconciliationOutcome,
    RegisteredDevice,
};
pub use mac::{MacAddr, MacParseError};
pub use memory::MemoryRegistry;
pub use reconcile::sync_devices;
pub use registry::{DeviceIdentity, DeviceRegistry, RegistryError};
