use std::str::FromStr;

use async_trait::async_trait;
use invsync_common::config::{DeviceFilter, MerakiSettings};
use invsync_common::error::SourceError;
use invsync_common::inventory::device::{Coordinates, Network, SourceDevice, Vlan};
use invsync_common::source::InventorySource;
use invsync_common::utils::ip::parse_optional_ip;
use pnet::util::MacAddr;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, LINK};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::{REQUEST_TIMEOUT, describe_failure, retry_after};

const PAGE_SIZE: &str = "1000";
const MAX_THROTTLE_RETRIES: u32 = 5;

#[derive(Debug, Deserialize)]
struct OrganizationRecord {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceRecord {
    serial: String,
    name: Option<String>,
    mac: Option<String>,
    network_id: Option<String>,
    model: Option<String>,
    product_type: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    lan_ip: Option<String>,
    address: Option<String>,
}

impl From<DeviceRecord> for SourceDevice {
    fn from(record: DeviceRecord) -> Self {
        let name = record
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| record.serial.clone());
        let coordinates = match (record.lat, record.lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        };

        SourceDevice {
            mac: record.mac.as_deref().and_then(|mac| MacAddr::from_str(mac).ok()),
            network_id: record.network_id,
            model: record.model.unwrap_or_default(),
            product_type: record.product_type,
            coordinates,
            lan_ip: parse_optional_ip(record.lan_ip.as_deref()),
            address: record.address.filter(|address| !address.is_empty()),
            serial: record.serial,
            name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NetworkRecord {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VlanRecord {
    /// Sent as a number by some API versions and as a string by others.
    id: serde_json::Value,
    #[serde(default)]
    name: String,
    appliance_ip: Option<String>,
    subnet: Option<String>,
}

impl From<VlanRecord> for Vlan {
    fn from(record: VlanRecord) -> Self {
        let id = match record.id {
            serde_json::Value::String(id) => id,
            other => other.to_string(),
        };
        Vlan {
            id,
            name: record.name,
            appliance_ip: parse_optional_ip(record.appliance_ip.as_deref()),
            subnet: record.subnet,
        }
    }
}

/// Meraki Dashboard API client, bound to the first organization the API key can see.
pub struct MerakiClient {
    http: Client,
    base_url: String,
    organization_id: String,
}

impl MerakiClient {
    /// Builds the client and resolves the organization.
    ///
    /// # Errors
    /// * `SourceError::Unauthorized` - The API key is rejected.
    /// * `SourceError::NoOrganization` - The key has no organization.
    pub async fn connect(settings: &MerakiSettings) -> Result<Self, SourceError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", settings.api_key.expose()))
            .map_err(|_| SourceError::Unauthorized)?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .user_agent(concat!("invsync/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SourceError::Request(e.to_string()))?;

        let mut client = Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            organization_id: String::new(),
        };

        let url = format!("{}/organizations", client.base_url);
        let organizations: Vec<OrganizationRecord> = client.fetch_json(&url, &[]).await?;
        let organization = organizations.into_iter().next().ok_or(SourceError::NoOrganization)?;
        info!("Using organization {} ({})", organization.name, organization.id);
        client.organization_id = organization.id;

        Ok(client)
    }

    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    /// GET with throttling handled: a 429 is retried after its `Retry-After` delay.
    async fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Response, SourceError> {
        let mut throttled = 0;
        loop {
            let response = self
                .http
                .get(url)
                .query(query)
                .send()
                .await
                .map_err(|e| SourceError::Request(e.to_string()))?;

            match response.status() {
                StatusCode::TOO_MANY_REQUESTS if throttled < MAX_THROTTLE_RETRIES => {
                    throttled += 1;
                    let wait = retry_after(&response);
                    warn!("Throttled by management API, retry {throttled}/{MAX_THROTTLE_RETRIES} in {wait:?}");
                    tokio::time::sleep(wait).await;
                }
                StatusCode::UNAUTHORIZED => return Err(SourceError::Unauthorized),
                status if status.is_success() => return Ok(response),
                _ => return Err(SourceError::Request(describe_failure(response).await)),
            }
        }
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T, SourceError> {
        self.get(url, query)
            .await?
            .json()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))
    }

    /// Fetches every page of a listing by following `Link: <...>; rel=next`.
    async fn fetch_all<T: DeserializeOwned>(&self, url: &str, query: Vec<(&str, String)>) -> Result<Vec<T>, SourceError> {
        let mut items = Vec::new();
        let mut response = self.get(url, &query).await?;

        loop {
            let next = next_page(&response);
            let page: Vec<T> = response.json().await.map_err(|e| SourceError::Decode(e.to_string()))?;
            debug!("Fetched page of {} items from {url}", page.len());
            items.extend(page);

            match next {
                // The next link already carries the query string.
                Some(next) => response = self.get(&next, &[]).await?,
                None => return Ok(items),
            }
        }
    }
}

/// Target of the `rel=next` entry of a `Link` header.
fn next_page(response: &Response) -> Option<String> {
    let header = response.headers().get(LINK)?.to_str().ok()?;
    header.split(',').find_map(|entry| {
        let (target, params) = entry.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|param| matches!(param.trim(), "rel=next" | "rel=\"next\""));
        is_next.then(|| target.trim().trim_start_matches('<').trim_end_matches('>').to_string())
    })
}

#[async_trait]
impl InventorySource for MerakiClient {
    async fn list_devices(&self, filter: &DeviceFilter) -> Result<Vec<SourceDevice>, SourceError> {
        let mut query = vec![("perPage", PAGE_SIZE.to_string())];
        match filter {
            DeviceFilter::All => {}
            DeviceFilter::Models(models) => query.extend(models.iter().map(|model| ("models[]", model.clone()))),
            DeviceFilter::ProductType(product_type) => {
                query.push(("productTypes[]", product_type.as_str().to_string()))
            }
        }

        let url = format!("{}/organizations/{}/devices", self.base_url, self.organization_id);
        let records: Vec<DeviceRecord> = self.fetch_all(&url, query).await?;
        Ok(records.into_iter().map(SourceDevice::from).collect())
    }

    async fn list_networks(&self) -> Result<Vec<Network>, SourceError> {
        let url = format!("{}/organizations/{}/networks", self.base_url, self.organization_id);
        let records: Vec<NetworkRecord> = self.fetch_all(&url, vec![("perPage", PAGE_SIZE.to_string())]).await?;
        Ok(records
            .into_iter()
            .map(|record| Network {
                id: record.id,
                name: record.name,
            })
            .collect())
    }

    async fn list_vlans(&self, network_id: &str) -> Result<Vec<Vlan>, SourceError> {
        let url = format!("{}/networks/{network_id}/appliance/vlans", self.base_url);
        let records: Vec<VlanRecord> = self.fetch_json(&url, &[]).await?;
        Ok(records.into_iter().map(Vlan::from).collect())
    }
}
