//! Reconciliation: diffing a scan result against the registry
//!
//! Compares the set of devices discovered in one scan pass with the
//! registry's current devices for a target network and applies three
//! disjoint action categories, keyed by normalized MAC:
//!
//! - seen and known: set online with the current IP
//! - seen and unknown: register, inheriting a name/brand if the same
//!   MAC is already named on any other network
//! - known, online, and not seen: set offline and clear the IP
//!
//! Devices already offline stay untouched, so a repeated run with an
//! unchanged discovered set deactivates nothing. Individual write
//! failures are logged and skipped; only failing to resolve the target
//! network aborts the whole call.

use crate::device::{DeviceState, DeviceUpdate, DiscoveredDevice, NewDevice, ReconciliationOutcome};
use crate::mac::MacAddr;
use crate::registry::{DeviceRegistry, RegistryError};
use chrono::Utc;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Reconcile one scan pass against the registry for `network_name`.
///
/// Returns the counts of actions that actually succeeded. An empty
/// `discovered` set is valid and deactivates every online device.
pub async fn sync_devices(
    registry: &dyn DeviceRegistry,
    network_name: &str,
    discovered: &[DiscoveredDevice],
) -> Result<ReconciliationOutcome, RegistryError> {
    let network_id = registry.find_network_id(network_name).await?;
    let existing = registry.list_devices(network_id).await?;

    let discovered_by_mac: HashMap<&MacAddr, &DiscoveredDevice> =
        discovered.iter().map(|d| (&d.mac, d)).collect();

    info!(
        network = network_name,
        discovered = discovered.len(),
        registered = existing.len(),
        "Reconciling device states"
    );

    let now = Utc::now();
    let mut outcome = ReconciliationOutcome::default();

    // Known devices seen in this pass come (back) online with their
    // current address.
    for device in &existing {
        let Some(seen) = discovered_by_mac.get(&device.mac) else {
            continue;
        };
        match registry
            .update_device(device.id, DeviceUpdate::online(seen.ip, now))
            .await
        {
            Ok(()) => {
                debug!(mac = %device.mac, ip = %seen.ip, "Device online");
                outcome.updated += 1;
            }
            Err(e) => warn!(mac = %device.mac, error = %e, "Failed to update device, skipping"),
        }
    }

    // Unknown MACs get a fresh record. Iterating the by-MAC map keeps
    // one insert per MAC even if a scan pass somehow reported the same
    // MAC under two addresses. A name/brand already attached to the
    // same MAC on another network is carried over; the lookup never
    // blocks the insert.
    for device in discovered_by_mac.values() {
        if existing.iter().any(|d| d.mac == device.mac) {
            continue;
        }
        let identity = match registry.find_identity_by_mac(&device.mac).await {
            Ok(identity) => identity,
            Err(e) => {
                warn!(mac = %device.mac, error = %e, "Identity lookup failed, inserting unnamed");
                None
            }
        };
        if let Some(identity) = &identity {
            debug!(
                mac = %device.mac,
                name = identity.name.as_deref().unwrap_or("-"),
                "Inheriting identity from another network"
            );
        }
        let (name, brand) = identity.map(|i| (i.name, i.brand)).unwrap_or((None, None));
        let record = NewDevice {
            network_id,
            ip: device.ip,
            mac: device.mac.clone(),
            name,
            brand,
            state: DeviceState::Online,
            last_seen: now,
        };
        match registry.insert_device(record).await {
            Ok(()) => {
                debug!(mac = %device.mac, ip = %device.ip, "Device registered");
                outcome.added += 1;
            }
            Err(e) => warn!(mac = %device.mac, error = %e, "Failed to insert device, skipping"),
        }
    }

    // Online devices absent from this pass go offline with their IP
    // cleared. Already-offline records are left alone.
    for device in &existing {
        if device.state != DeviceState::Online || discovered_by_mac.contains_key(&device.mac) {
            continue;
        }
        match registry.update_device(device.id, DeviceUpdate::offline()).await {
            Ok(()) => {
                debug!(mac = %device.mac, "Device offline");
                outcome.deactivated += 1;
            }
            Err(e) => warn!(mac = %device.mac, error = %e, "Failed to deactivate device, skipping"),
        }
    }

    info!(
        updated = outcome.updated,
        added = outcome.added,
        deactivated = outcome.deactivated,
        "Reconciliation complete"
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRegistry;
    use crate::registry::DeviceIdentity;
    use std::net::Ipv4Addr;
    use uuid::Uuid;

    fn mac(s: &str) -> MacAddr {
        s.parse().unwrap()
    }

    fn found(ip: [u8; 4], mac_str: &str) -> DiscoveredDevice {
        DiscoveredDevice {
            ip: Ipv4Addr::from(ip),
            mac: mac(mac_str),
        }
    }

    fn seed(
        registry: &MemoryRegistry,
        network_id: Uuid,
        mac_str: &str,
        state: DeviceState,
        name: Option<&str>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        registry.seed_device(crate::device::RegisteredDevice {
            id,
            network_id,
            ip: match state {
                DeviceState::Online => Some(Ipv4Addr::new(192, 168, 1, 99)),
                DeviceState::Offline => None,
            },
            mac: mac(mac_str),
            name: name.map(String::from),
            brand: None,
            state,
            last_seen: None,
            created_at: Utc::now(),
        });
        id
    }

    #[tokio::test]
    async fn test_unknown_network_is_fatal() {
        let registry = MemoryRegistry::new();
        let err = sync_devices(&registry, "nowhere", &[]).await.unwrap_err();
        assert!(matches!(err, RegistryError::NetworkNotFound(_)));
    }

    #[tokio::test]
    async fn test_update_add_deactivate_partition() {
        let registry = MemoryRegistry::new();
        let network_id = registry.add_network("home");
        seed(&registry, network_id, "aa:aa:aa:aa:aa:aa", DeviceState::Online, None);
        seed(&registry, network_id, "bb:bb:bb:bb:bb:bb", DeviceState::Online, None);

        let discovered = vec![
            found([192, 168, 1, 20], "aa:aa:aa:aa:aa:aa"),
            found([192, 168, 1, 30], "cc:cc:cc:cc:cc:cc"),
        ];
        let outcome = sync_devices(&registry, "home", &discovered).await.unwrap();
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.deactivated, 1);

        let aa = registry
            .device_by_mac(network_id, &mac("aa:aa:aa:aa:aa:aa"))
            .unwrap();
        assert_eq!(aa.state, DeviceState::Online);
        assert_eq!(aa.ip, Some(Ipv4Addr::new(192, 168, 1, 20)));

        let bb = registry
            .device_by_mac(network_id, &mac("bb:bb:bb:bb:bb:bb"))
            .unwrap();
        assert_eq!(bb.state, DeviceState::Offline);
        assert_eq!(bb.ip, None);

        let cc = registry
            .device_by_mac(network_id, &mac("cc:cc:cc:cc:cc:cc"))
            .unwrap();
        assert_eq!(cc.state, DeviceState::Online);
        assert_eq!(cc.ip, Some(Ipv4Addr::new(192, 168, 1, 30)));
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let registry = MemoryRegistry::new();
        let network_id = registry.add_network("home");
        seed(&registry, network_id, "aa:aa:aa:aa:aa:aa", DeviceState::Online, None);
        seed(&registry, network_id, "bb:bb:bb:bb:bb:bb", DeviceState::Online, None);

        let discovered = vec![found([192, 168, 1, 20], "aa:aa:aa:aa:aa:aa")];
        let first = sync_devices(&registry, "home", &discovered).await.unwrap();
        assert_eq!(first.deactivated, 1);

        let second = sync_devices(&registry, "home", &discovered).await.unwrap();
        assert_eq!(second.updated, 1);
        assert_eq!(second.added, 0);
        assert_eq!(second.deactivated, 0);
    }

    #[tokio::test]
    async fn test_offline_then_rediscovered_round_trip() {
        let registry = MemoryRegistry::new();
        let network_id = registry.add_network("home");

        let discovered = vec![found([192, 168, 1, 20], "aa:aa:aa:aa:aa:aa")];
        sync_devices(&registry, "home", &discovered).await.unwrap();

        // Absent on the next scan: offline, IP cleared.
        sync_devices(&registry, "home", &[]).await.unwrap();
        let device = registry
            .device_by_mac(network_id, &mac("aa:aa:aa:aa:aa:aa"))
            .unwrap();
        assert_eq!(device.state, DeviceState::Offline);
        assert_eq!(device.ip, None);

        // Back on a third scan, with a new DHCP lease.
        let rediscovered = vec![found([192, 168, 1, 77], "aa:aa:aa:aa:aa:aa")];
        let outcome = sync_devices(&registry, "home", &rediscovered).await.unwrap();
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.added, 0);

        let device = registry
            .device_by_mac(network_id, &mac("aa:aa:aa:aa:aa:aa"))
            .unwrap();
        assert_eq!(device.state, DeviceState::Online);
        assert_eq!(device.ip, Some(Ipv4Addr::new(192, 168, 1, 77)));
    }

    #[tokio::test]
    async fn test_cross_network_name_inheritance() {
        let registry = MemoryRegistry::new();
        let office_id = registry.add_network("office");
        let home_id = registry.add_network("home");
        seed(&registry, office_id, "dd:dd:dd:dd:dd:dd", DeviceState::Online, Some("Printer"));

        let discovered = vec![found([10, 0, 0, 5], "dd:dd:dd:dd:dd:dd")];
        let outcome = sync_devices(&registry, "home", &discovered).await.unwrap();
        assert_eq!(outcome.added, 1);

        let inherited = registry
            .device_by_mac(home_id, &mac("dd:dd:dd:dd:dd:dd"))
            .unwrap();
        assert_eq!(inherited.name.as_deref(), Some("Printer"));

        // The source record was only read, never written.
        let source = registry
            .device_by_mac(office_id, &mac("dd:dd:dd:dd:dd:dd"))
            .unwrap();
        assert_eq!(source.name.as_deref(), Some("Printer"));
        assert_eq!(source.state, DeviceState::Online);
    }

    #[tokio::test]
    async fn test_no_inheritance_on_miss() {
        let registry = MemoryRegistry::new();
        let network_id = registry.add_network("home");

        let discovered = vec![found([10, 0, 0, 5], "ee:ee:ee:ee:ee:ee")];
        sync_devices(&registry, "home", &discovered).await.unwrap();

        let device = registry
            .device_by_mac(network_id, &mac("ee:ee:ee:ee:ee:ee"))
            .unwrap();
        assert_eq!(device.name, None);
        assert_eq!(device.brand, None);
    }

    #[tokio::test]
    async fn test_empty_scan_deactivates_all_online() {
        let registry = MemoryRegistry::new();
        let network_id = registry.add_network("home");
        seed(&registry, network_id, "aa:aa:aa:aa:aa:aa", DeviceState::Online, None);
        seed(&registry, network_id, "bb:bb:bb:bb:bb:bb", DeviceState::Online, None);
        seed(&registry, network_id, "cc:cc:cc:cc:cc:cc", DeviceState::Offline, None);

        let outcome = sync_devices(&registry, "home", &[]).await.unwrap();
        assert_eq!(outcome.updated, 0);
        assert_eq!(outcome.added, 0);
        assert_eq!(outcome.deactivated, 2);
    }

    /// Registry double whose writes always fail; reads delegate to a
    /// seeded MemoryRegistry.
    struct FailingWrites(MemoryRegistry);

    #[async_trait::async_trait]
    impl DeviceRegistry for FailingWrites {
        async fn find_network_id(&self, name: &str) -> Result<Uuid, RegistryError> {
            self.0.find_network_id(name).await
        }
        async fn list_devices(
            &self,
            network_id: Uuid,
        ) -> Result<Vec<crate::device::RegisteredDevice>, RegistryError> {
            self.0.list_devices(network_id).await
        }
        async fn find_identity_by_mac(
            &self,
            mac: &MacAddr,
        ) -> Result<Option<DeviceIdentity>, RegistryError> {
            self.0.find_identity_by_mac(mac).await
        }
        async fn insert_device(&self, _device: NewDevice) -> Result<(), RegistryError> {
            Err(RegistryError::Backend("insert rejected".into()))
        }
        async fn update_device(&self, _id: Uuid, _update: DeviceUpdate) -> Result<(), RegistryError> {
            Err(RegistryError::Backend("update rejected".into()))
        }
    }

    #[tokio::test]
    async fn test_write_failures_are_skipped_not_fatal() {
        let inner = MemoryRegistry::new();
        let network_id = inner.add_network("home");
        seed(&inner, network_id, "aa:aa:aa:aa:aa:aa", DeviceState::Online, None);
        let registry = FailingWrites(inner);

        let discovered = vec![
            found([192, 168, 1, 20], "aa:aa:aa:aa:aa:aa"),
            found([192, 168, 1, 30], "cc:cc:cc:cc:cc:cc"),
        ];
        let outcome = sync_devices(&registry, "home", &discovered).await.unwrap();
        // Every write failed, so every count reports zero successes.
        assert_eq!(outcome, ReconciliationOutcome::default());
    }
}
