//! HTTP implementation of the device registry contract
//!
//! Speaks a PostgREST-style API: row filters in the query string,
//! `apikey` plus bearer auth headers, JSON row arrays in and out.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use netherd_core::{
    DeviceIdentity, DeviceRegistry, DeviceState, DeviceUpdate, MacAddr, NewDevice,
    RegisteredDevice, RegistryError,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use tracing::debug;
use uuid::Uuid;

pub struct HttpRegistry {
    client: reqwest::Client,
    base_url: String,
}

/// Wire shape of a device row
#[derive(Debug, Deserialize)]
struct DeviceRow {
    id: Uuid,
    network_id: Uuid,
    ip: Option<Ipv4Addr>,
    mac: MacAddr,
    name: Option<String>,
    brand: Option<String>,
    state: DeviceState,
    last_seen: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct NetworkRow {
    id: Uuid,
}

#[derive(Debug, Deserialize)]
struct IdentityRow {
    name: Option<String>,
    brand: Option<String>,
}

#[derive(Debug, Serialize)]
struct InsertRow {
    network_id: Uuid,
    ip: Ipv4Addr,
    mac: MacAddr,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    brand: Option<String>,
    state: DeviceState,
    last_seen: DateTime<Utc>,
}

impl From<DeviceRow> for RegisteredDevice {
    fn from(row: DeviceRow) -> Self {
        Self {
            id: row.id,
            network_id: row.network_id,
            ip: row.ip,
            mac: row.mac,
            name: row.name,
            brand: row.brand,
            state: row.state,
            last_seen: row.last_seen,
            created_at: row.created_at,
        }
    }
}

impl HttpRegistry {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, RegistryError> {
        let mut headers = HeaderMap::new();
        let key_value = HeaderValue::from_str(api_key)
            .map_err(|e| RegistryError::Backend(format!("invalid api key: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| RegistryError::Backend(format!("invalid api key: {e}")))?;
        headers.insert("apikey", key_value);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| RegistryError::Backend(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn fetch_rows<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, RegistryError> {
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| RegistryError::Backend(e.to_string()))?
            .error_for_status()
            .map_err(|e| RegistryError::Backend(e.to_string()))?;
        response
            .json()
            .await
            .map_err(|e| RegistryError::Backend(e.to_string()))
    }
}

#[async_trait]
impl DeviceRegistry for HttpRegistry {
    async fn find_network_id(&self, name: &str) -> Result<Uuid, RegistryError> {
        let rows: Vec<NetworkRow> = self
            .fetch_rows(
                "networks",
                &[
                    ("name", format!("eq.{name}")),
                    ("select", "id".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        rows.into_iter()
            .next()
            .map(|row| row.id)
            .ok_or_else(|| RegistryError::NetworkNotFound(name.to_string()))
    }

    async fn list_devices(&self, network_id: Uuid) -> Result<Vec<RegisteredDevice>, RegistryError> {
        let rows: Vec<DeviceRow> = self
            .fetch_rows("devices", &[("network_id", format!("eq.{network_id}"))])
            .await?;
        debug!(network_id = %network_id, devices = rows.len(), "Fetched registered devices");
        Ok(rows.into_iter().map(RegisteredDevice::from).collect())
    }

    async fn find_identity_by_mac(
        &self,
        mac: &MacAddr,
    ) -> Result<Option<DeviceIdentity>, RegistryError> {
        let rows: Vec<IdentityRow> = self
            .fetch_rows(
                "devices",
                &[
                    ("mac", format!("eq.{mac}")),
                    ("name", "not.is.null".to_string()),
                    ("select", "name,brand".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next().map(|row| DeviceIdentity {
            name: row.name,
            brand: row.brand,
        }))
    }

    async fn insert_device(&self, device: NewDevice) -> Result<(), RegistryError> {
        let row = InsertRow {
            network_id: device.network_id,
            ip: device.ip,
            mac: device.mac,
            name: device.name,
            brand: device.brand,
            state: device.state,
            last_seen: device.last_seen,
        };
        self.client
            .post(self.url("devices"))
            .json(&row)
            .send()
            .await
            .map_err(|e| RegistryError::Backend(e.to_string()))?
            .error_for_status()
            .map_err(|e| RegistryError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn update_device(&self, id: Uuid, update: DeviceUpdate) -> Result<(), RegistryError> {
        self.client
            .patch(self.url("devices"))
            .query(&[("id", format!("eq.{id}"))])
            .json(&update)
            .send()
            .await
            .map_err(|e| RegistryError::Backend(e.to_string()))?
            .error_for_status()
            .map_err(|e| RegistryError::Backend(e.to_string()))?;
        Ok(())
    }
}
