//! In-memory registry, used by tests and dry runs

use crate::device::{DeviceState, DeviceUpdate, NewDevice, RegisteredDevice};
use crate::mac::MacAddr;
use crate::registry::{DeviceIdentity, DeviceRegistry, RegistryError};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// A `DeviceRegistry` backed by process-local maps.
///
/// Mirrors the persisted shape closely enough for reconciliation tests:
/// networks keyed by name, devices keyed by generated id, uniqueness on
/// (network, MAC) left to callers as in the real backend.
#[derive(Default)]
pub struct MemoryRegistry {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    networks: HashMap<String, Uuid>,
    devices: HashMap<Uuid, RegisteredDevice>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a network and return its id.
    pub fn add_network(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.inner
            .lock()
            .unwrap()
            .networks
            .insert(name.to_string(), id);
        id
    }

    /// Seed a device record directly, bypassing reconciliation.
    pub fn seed_device(&self, device: RegisteredDevice) {
        self.inner.lock().unwrap().devices.insert(device.id, device);
    }

    /// Snapshot of a single device by (network, MAC).
    pub fn device_by_mac(&self, network_id: Uuid, mac: &MacAddr) -> Option<RegisteredDevice> {
        self.inner
            .lock()
            .unwrap()
            .devices
            .values()
            .find(|d| d.network_id == network_id && &d.mac == mac)
            .cloned()
    }
}

#[async_trait]
impl DeviceRegistry for MemoryRegistry {
    async fn find_network_id(&self, name: &str) -> Result<Uuid, RegistryError> {
        self.inner
            .lock()
            .unwrap()
            .networks
            .get(name)
            .copied()
            .ok_or_else(|| RegistryError::NetworkNotFound(name.to_string()))
    }

    async fn list_devices(&self, network_id: Uuid) -> Result<Vec<RegisteredDevice>, RegistryError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .devices
            .values()
            .filter(|d| d.network_id == network_id)
            .cloned()
            .collect())
    }

    async fn find_identity_by_mac(
        &self,
        mac: &MacAddr,
    ) -> Result<Option<DeviceIdentity>, RegistryError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .devices
            .values()
            .find(|d| &d.mac == mac && d.name.is_some())
            .map(|d| DeviceIdentity {
                name: d.name.clone(),
                brand: d.brand.clone(),
            }))
    }

    async fn insert_device(&self, device: NewDevice) -> Result<(), RegistryError> {
        let record = RegisteredDevice {
            id: Uuid::new_v4(),
            network_id: device.network_id,
            ip: Some(device.ip),
            mac: device.mac,
            name: device.name,
            brand: device.brand,
            state: device.state,
            last_seen: Some(device.last_seen),
            created_at: Utc::now(),
        };
        self.inner.lock().unwrap().devices.insert(record.id, record);
        Ok(())
    }

    async fn update_device(&self, id: Uuid, update: DeviceUpdate) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock().unwrap();
        let device = inner
            .devices
            .get_mut(&id)
            .ok_or(RegistryError::DeviceNotFound(id))?;
        device.ip = update.ip;
        device.state = update.state;
        if update.last_seen.is_some() {
            device.last_seen = update.last_seen;
        }
        Ok(())
    }
}
