//! Contract toward the persistent network/device registry
//!
//! The store itself lives outside this crate (HTTP backend, database,
//! in-memory test double). Reconciliation only ever talks to it through
//! this trait.

use crate::device::{DeviceUpdate, NewDevice, RegisteredDevice};
use crate::mac::MacAddr;
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("network {0:?} not found in registry")]
    NetworkNotFound(String),
    #[error("device {0} not found in registry")]
    DeviceNotFound(Uuid),
    #[error("registry backend error: {0}")]
    Backend(String),
}

/// Name/brand carried over from a device already known elsewhere in the
/// registry. Used to pre-fill a fresh record when the same MAC shows up
/// on another network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub name: Option<String>,
    pub brand: Option<String>,
}

/// Query/update contract consumed by the reconciliation engine.
///
/// Each write may fail independently; callers decide how tolerant to be.
/// No method is transactional across records.
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Resolve a network name to its id.
    async fn find_network_id(&self, name: &str) -> Result<Uuid, RegistryError>;

    /// All devices currently registered for a network.
    async fn list_devices(&self, network_id: Uuid) -> Result<Vec<RegisteredDevice>, RegistryError>;

    /// Look up a name/brand for a MAC across every network, skipping
    /// records without a name. Read-only; `Ok(None)` on miss.
    async fn find_identity_by_mac(
        &self,
        mac: &MacAddr,
    ) -> Result<Option<DeviceIdentity>, RegistryError>;

    /// Register a device seen for the first time on its network.
    async fn insert_device(&self, device: NewDevice) -> Result<(), RegistryError>;

    /// Apply an update to a single existing device.
    async fn update_device(&self, id: Uuid, update: DeviceUpdate) -> Result<(), RegistryError>;
}
