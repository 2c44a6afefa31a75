//! SolarWinds Information Service (SWIS) REST client.
//!
//! Every endpoint hangs off `.../SolarWinds/InformationService/v3/Json`. Entity URIs returned by
//! the service (`swis://host/Orion/Orion.Nodes/NodeID=42`) are appended verbatim to that base to
//! address the entity itself.

use std::net::IpAddr;

use async_trait::async_trait;
use invsync_common::config::{OrionSettings, Secret, SnmpCredentials};
use invsync_common::error::GatewayError;
use invsync_common::gateway::MonitoringGateway;
use invsync_common::inventory::discovery::{DiscoveryJob, DiscoveryRequest};
use invsync_common::inventory::node::{
    CreatedNode, CustomProperties, MonitoredDevice, NewNode, NodeProperty, TargetInventory,
};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{REQUEST_TIMEOUT, describe_failure};

const NODE_QUERY: &str = "SELECT n.NodeID, n.IP, n.Caption, n.DNS, n.SysName, n.ObjectSubType, \
     n.SNMPVersion, n.Community, n.Uri, \
     n.CustomProperties.Network AS Network, n.CustomProperties.Country AS Country, \
     n.CustomProperties.State AS State, n.CustomProperties.City AS City, \
     n.CustomProperties.Serial AS Serial \
     FROM Orion.Nodes n";

/// Failure of a single SWIS call, before it is given its gateway meaning.
#[derive(Debug)]
enum CallError {
    Unauthorized,
    Failed(String),
}

impl CallError {
    fn into_gateway(self, wrap: impl FnOnce(String) -> GatewayError) -> GatewayError {
        match self {
            CallError::Unauthorized => GatewayError::Unauthorized,
            CallError::Failed(reason) => wrap(reason),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NodeRow {
    #[serde(rename = "NodeID")]
    node_id: u64,
    #[serde(rename = "IP")]
    ip: Option<String>,
    caption: Option<String>,
    #[serde(rename = "DNS")]
    dns: Option<String>,
    sys_name: Option<String>,
    object_sub_type: Option<String>,
    #[serde(rename = "SNMPVersion")]
    snmp_version: Option<u8>,
    community: Option<String>,
    uri: String,
    network: Option<String>,
    country: Option<String>,
    state: Option<String>,
    city: Option<String>,
    serial: Option<String>,
}

impl NodeRow {
    fn into_node(self) -> Option<MonitoredDevice> {
        let ip: IpAddr = match self.ip.as_deref().map(str::parse) {
            Some(Ok(ip)) => ip,
            _ => {
                warn!("Node {} has no usable IP ({:?}), ignoring it", self.node_id, self.ip);
                return None;
            }
        };

        Some(MonitoredDevice {
            node_id: self.node_id,
            ip,
            uri: self.uri,
            caption: self.caption.unwrap_or_default(),
            dns: self.dns,
            sys_name: self.sys_name,
            object_sub_type: self.object_sub_type.unwrap_or_default(),
            snmp_version: self.snmp_version.unwrap_or_default(),
            community: self.community,
            custom: CustomProperties {
                network: self.network,
                country: self.country,
                state: self.state,
                city: self.city,
                serial: self.serial,
            },
        })
    }
}

#[derive(Debug, Serialize)]
struct BulkAddress {
    #[serde(rename = "Address")]
    address: IpAddr,
}

#[derive(Debug, Serialize)]
struct CredentialEntry {
    #[serde(rename = "CredentialID")]
    credential_id: u32,
    #[serde(rename = "Order")]
    order: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CorePluginContext {
    bulk_list: Vec<BulkAddress>,
    credentials: Vec<CredentialEntry>,
    wmi_retries_count: u32,
    wmi_retry_interval_miliseconds: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PluginConfiguration {
    plugin_configuration_item: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct StartDiscoveryProfile<'a> {
    name: &'a str,
    #[serde(rename = "EngineID")]
    engine_id: u32,
    job_timeout_seconds: u32,
    search_timeout_miliseconds: u32,
    snmp_timeout_miliseconds: u32,
    snmp_retries: u32,
    repeat_interval_miliseconds: u32,
    snmp_port: u16,
    hop_count: u32,
    preferred_snmp_version: &'a str,
    disable_icmp: bool,
    allow_duplicate_nodes: bool,
    is_auto_import: bool,
    is_hidden: bool,
    plugin_configurations: Vec<PluginConfiguration>,
}

/// Orion node management over SWIS, with HTTP basic auth.
pub struct SwisClient {
    http: Client,
    base_url: String,
    username: String,
    password: Secret,
}

impl SwisClient {
    pub fn new(settings: &OrionSettings) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        Ok(Self {
            http,
            base_url: settings.base_url(),
            username: settings.username.clone(),
            password: settings.password.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.base_url, path))
            .basic_auth(&self.username, Some(self.password.expose()))
    }

    async fn send(request: RequestBuilder) -> Result<Response, CallError> {
        let response = request.send().await.map_err(|e| CallError::Failed(e.to_string()))?;
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(CallError::Unauthorized),
            status if status.is_success() => Ok(response),
            _ => Err(CallError::Failed(describe_failure(response).await)),
        }
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, CallError> {
        Self::send(request)
            .await?
            .json()
            .await
            .map_err(|e| CallError::Failed(format!("unreadable response: {e}")))
    }

    /// Runs a SWQL query.
    pub async fn query<T: DeserializeOwned>(&self, swql: &str) -> Result<Vec<T>, GatewayError> {
        let request = self
            .request(Method::POST, "Query")
            .json(&json!({ "query": swql, "parameters": {} }));
        let response: QueryResponse<T> = Self::send_json(request)
            .await
            .map_err(|e| e.into_gateway(GatewayError::Request))?;
        Ok(response.results)
    }

    /// Creates an entity and returns its URI.
    async fn create(&self, entity: &str, properties: &Value) -> Result<String, CallError> {
        Self::send_json(self.request(Method::POST, &format!("Create/{entity}")).json(properties)).await
    }

    /// Writes `properties` onto the entity at `uri`.
    async fn update(&self, uri: &str, properties: &Value) -> Result<(), CallError> {
        Self::send(self.request(Method::POST, uri).json(properties)).await.map(drop)
    }

    async fn delete(&self, uri: &str) -> Result<(), CallError> {
        Self::send(self.request(Method::DELETE, uri)).await.map(drop)
    }

    /// Calls a verb; SWIS takes the arguments as a positional JSON array.
    async fn invoke(&self, entity: &str, verb: &str, arguments: Value) -> Result<Value, CallError> {
        Self::send_json(self.request(Method::POST, &format!("Invoke/{entity}/{verb}")).json(&arguments)).await
    }
}

/// Properties of a new node for the configured SNMP version.
fn node_properties(node: &NewNode) -> Value {
    let mut properties = json!({
        "IPAddress": node.ip.to_string(),
        "EngineID": node.engine_id,
        "ObjectSubType": "SNMP",
        "SNMPVersion": node.snmp.version().number(),
        "DNS": "",
        "SysName": node.sys_name,
    });

    match &node.snmp {
        SnmpCredentials::V2c { community } => {
            properties["Community"] = json!(community.expose());
        }
        SnmpCredentials::V3 { username, auth_password } => {
            properties["SNMPV3Username"] = json!(username);
            properties["SNMPV3AuthKey"] = json!(auth_password.expose());
            properties["SNMPV3AuthKeyIsPwd"] = json!(true);
            properties["SNMPV3AuthMethod"] = json!("SHA1");
            properties["SNMPV3PrivMethod"] = json!("None");
        }
    }
    properties
}

/// Node id at the end of a node URI (`...NodeID=42`).
fn node_id_from_uri(uri: &str) -> Option<u64> {
    let digits = uri.chars().rev().take_while(char::is_ascii_digit).count();
    uri[uri.len() - digits..].parse().ok()
}

#[async_trait]
impl MonitoringGateway for SwisClient {
    async fn list_nodes(&self) -> Result<TargetInventory, GatewayError> {
        let rows: Vec<NodeRow> = self.query(NODE_QUERY).await?;
        debug!("Platform returned {} nodes", rows.len());
        Ok(TargetInventory::from_nodes(rows.into_iter().filter_map(NodeRow::into_node)))
    }

    async fn create_node(&self, node: &NewNode) -> Result<CreatedNode, GatewayError> {
        let ip = node.ip;
        let uri = self
            .create("Orion.Nodes", &node_properties(node))
            .await
            .map_err(|e| e.into_gateway(|reason| GatewayError::RemoteCreate { ip, reason }))?;
        let node_id = node_id_from_uri(&uri).ok_or_else(|| GatewayError::RemoteCreate {
            ip,
            reason: format!("no node id in returned URI '{uri}'"),
        })?;

        Ok(CreatedNode { node_id, uri })
    }

    async fn create_poller(&self, node_id: u64, poller_type: &str, enabled: bool) -> Result<(), GatewayError> {
        let poller = json!({
            "PollerType": poller_type,
            "NetObject": format!("N:{node_id}"),
            "NetObjectType": "N",
            "NetObjectID": node_id,
            "Enabled": enabled,
        });
        self.create("Orion.Pollers", &poller)
            .await
            .map(drop)
            .map_err(|e| e.into_gateway(|reason| GatewayError::Request(format!("poller {poller_type}: {reason}"))))
    }

    async fn update_node_property(
        &self,
        node_uri: &str,
        property: NodeProperty,
        value: &str,
    ) -> Result<(), GatewayError> {
        let target = if property.is_custom() {
            format!("{node_uri}/CustomProperties")
        } else {
            node_uri.to_string()
        };
        let mut properties = json!({});
        properties[property.name()] = json!(value);

        self.update(&target, &properties).await.map_err(|e| {
            e.into_gateway(|reason| GatewayError::RemoteUpdate {
                uri: node_uri.to_string(),
                property,
                reason,
            })
        })
    }

    async fn delete_node(&self, node_uri: &str) -> Result<(), GatewayError> {
        self.delete(node_uri).await.map_err(|e| {
            e.into_gateway(|reason| GatewayError::RemoteDelete {
                uri: node_uri.to_string(),
                reason,
            })
        })
    }

    async fn submit_discovery(&self, request: &DiscoveryRequest) -> Result<DiscoveryJob, GatewayError> {
        let context = CorePluginContext {
            bulk_list: request
                .addresses()
                .iter()
                .map(|&address| BulkAddress { address })
                .collect(),
            credentials: request
                .credentials
                .iter()
                .map(|c| CredentialEntry {
                    credential_id: c.credential_id,
                    order: c.order,
                })
                .collect(),
            wmi_retries_count: request.wmi_retries,
            wmi_retry_interval_miliseconds: request.wmi_retry_interval_ms,
        };
        let configuration = self
            .invoke("Orion.Discovery", "CreateCorePluginConfiguration", json!([context]))
            .await
            .map_err(|e| e.into_gateway(GatewayError::Discovery))?;

        let profile = &request.profile;
        let start = StartDiscoveryProfile {
            name: &profile.name,
            engine_id: profile.engine_id,
            job_timeout_seconds: profile.job_timeout_secs,
            search_timeout_miliseconds: profile.search_timeout_ms,
            snmp_timeout_miliseconds: profile.snmp_timeout_ms,
            snmp_retries: profile.snmp_retries,
            repeat_interval_miliseconds: profile.repeat_interval_ms,
            snmp_port: profile.snmp_port,
            hop_count: profile.hop_count,
            preferred_snmp_version: &profile.preferred_snmp_version,
            disable_icmp: profile.disable_icmp,
            allow_duplicate_nodes: profile.allow_duplicate_nodes,
            is_auto_import: profile.is_auto_import,
            is_hidden: profile.is_hidden,
            plugin_configurations: vec![PluginConfiguration {
                plugin_configuration_item: configuration,
            }],
        };
        let profile_id = self
            .invoke("Orion.Discovery", "StartDiscovery", json!([start]))
            .await
            .map_err(|e| e.into_gateway(GatewayError::Discovery))?;

        let profile_id = match profile_id {
            Value::String(id) => id,
            other => other.to_string(),
        };
        Ok(DiscoveryJob { profile_id })
    }
}
