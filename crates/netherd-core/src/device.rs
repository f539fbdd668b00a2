//! Device types for tracking discovered and registered hardware

use crate::mac::MacAddr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use uuid::Uuid;

/// Current state of a registered device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceState {
    /// Device responded to the most recent scan
    Online,
    /// Device was absent from the most recent scan
    Offline,
}

/// A host found during a single scan pass.
///
/// Ephemeral: it carries no identity beyond the pass that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
}

/// A device as the registry knows it.
///
/// At most one record exists per (network, MAC) pair. The IP address is
/// transient and is cleared whenever the device goes offline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredDevice {
    pub id: Uuid,
    pub network_id: Uuid,
    pub ip: Option<Ipv4Addr>,
    pub mac: MacAddr,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub state: DeviceState,
    pub last_seen: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Insert shape for a device seen for the first time on a network
#[derive(Debug, Clone, Serialize)]
pub struct NewDevice {
    pub network_id: Uuid,
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub state: DeviceState,
    pub last_seen: DateTime<Utc>,
}

/// Update shape for an existing device.
///
/// `ip` is always written: `Some` when the device came online with a
/// (possibly new) address, `None` to clear it on deactivation.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceUpdate {
    pub ip: Option<Ipv4Addr>,
    pub state: DeviceState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

impl DeviceUpdate {
    /// The device reappeared in a scan at `ip`.
    pub fn online(ip: Ipv4Addr, last_seen: DateTime<Utc>) -> Self {
        Self {
            ip: Some(ip),
            state: DeviceState::Online,
            last_seen: Some(last_seen),
        }
    }

    /// The device was absent from a scan; clear its address so it
    /// cannot masquerade as a routable host.
    pub fn offline() -> Self {
        Self {
            ip: None,
            state: DeviceState::Offline,
            last_seen: None,
        }
    }
}

/// Summary of one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconciliationOutcome {
    /// Known devices re-seen and set online
    pub updated: usize,
    /// Devices registered for the first time on this network
    pub added: usize,
    /// Previously-online devices flipped offline
    pub deactivated: usize,
}
