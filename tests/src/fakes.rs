use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use invsync_common::config::{DeviceFilter, DiscoverySettings, Mode, Secret, SnmpCredentials};
use invsync_common::error::{GatewayError, GeocodeError, SourceError};
use invsync_common::gateway::MonitoringGateway;
use invsync_common::geocoder::ReverseGeocoder;
use invsync_common::inventory::device::{Coordinates, Network, SourceDevice, SourceSnapshot, Vlan};
use invsync_common::inventory::discovery::{DiscoveryJob, DiscoveryRequest};
use invsync_common::inventory::location::{AddressComponents, GeocodedPlace};
use invsync_common::inventory::node::{
    CreatedNode, CustomProperties, MonitoredDevice, NewNode, NodeProperty, TargetInventory,
};
use invsync_common::source::InventorySource;
use invsync_core::cache::LocationCache;
use invsync_core::engine::{EngineSettings, ReconciliationEngine};
use invsync_core::report::RunReport;

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

pub fn settings() -> EngineSettings {
    EngineSettings {
        snmp: Some(SnmpCredentials::V2c {
            community: Secret::new("public"),
        }),
        limit: None,
        discovery: DiscoverySettings::default(),
        engine_id: 1,
    }
}

/// An SNMP node with no custom properties.
pub fn node(node_id: u64, addr: &str, caption: &str) -> MonitoredDevice {
    MonitoredDevice {
        node_id,
        ip: ip(addr),
        uri: format!("swis://orion/Orion/Orion.Nodes/NodeID={node_id}"),
        caption: caption.to_string(),
        dns: None,
        sys_name: None,
        object_sub_type: "SNMP".to_string(),
        snmp_version: 2,
        community: None,
        custom: CustomProperties::default(),
    }
}

/// Runs one pass of `mode` the way the binary does: fresh snapshots, cache loaded from disk.
pub async fn run(
    mode: Mode,
    source: &FakeSource,
    gateway: &FakeGateway,
    geocoder: &FakeGeocoder,
    cache_path: &Path,
    settings: EngineSettings,
) -> RunReport {
    let snapshot = source.snapshot();
    let target = gateway.list_nodes().await.unwrap();
    let mut cache = LocationCache::load(cache_path);

    let mut engine = ReconciliationEngine::new(source, gateway, &mut cache, geocoder, settings);
    engine.run(mode, &snapshot, &target).await
}

#[derive(Default)]
pub struct FakeSource {
    pub devices: Vec<SourceDevice>,
    pub networks: Vec<Network>,
    /// VLANs per network id. Networks missing here fail like a network without VLANs enabled.
    pub vlans: HashMap<String, Vec<Vlan>>,
    vlan_calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(devices: Vec<SourceDevice>) -> Self {
        Self {
            devices,
            ..Default::default()
        }
    }

    pub fn with_network(mut self, id: &str, name: &str) -> Self {
        self.networks.push(Network {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn with_vlans(mut self, network_id: &str, vlans: Vec<Vlan>) -> Self {
        self.vlans.insert(network_id.to_string(), vlans);
        self
    }

    pub fn snapshot(&self) -> SourceSnapshot {
        SourceSnapshot::new(self.devices.clone(), self.networks.clone())
    }

    pub fn vlan_calls(&self) -> usize {
        self.vlan_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InventorySource for FakeSource {
    async fn list_devices(&self, _filter: &DeviceFilter) -> Result<Vec<SourceDevice>, SourceError> {
        Ok(self.devices.clone())
    }

    async fn list_networks(&self) -> Result<Vec<Network>, SourceError> {
        Ok(self.networks.clone())
    }

    async fn list_vlans(&self, network_id: &str) -> Result<Vec<Vlan>, SourceError> {
        self.vlan_calls.fetch_add(1, Ordering::SeqCst);
        self.vlans
            .get(network_id)
            .cloned()
            .ok_or_else(|| SourceError::Request("VLANs are not enabled for this network".to_string()))
    }
}

/// A mutating call received by [`FakeGateway`].
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    CreateNode(IpAddr),
    CreatePoller { node_id: u64, poller_type: String, enabled: bool },
    UpdateProperty { uri: String, property: NodeProperty, value: String },
    DeleteNode(String),
    SubmitDiscovery(Vec<IpAddr>),
}

#[derive(Default)]
struct GatewayState {
    nodes: Vec<MonitoredDevice>,
    next_id: u64,
    calls: Vec<GatewayCall>,
}

/// Monitoring platform that keeps its nodes in memory and applies every successful write.
#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<GatewayState>,
    failing_properties: HashSet<NodeProperty>,
    failing_creates: HashSet<IpAddr>,
}

impl FakeGateway {
    pub fn new(nodes: Vec<MonitoredDevice>) -> Self {
        let next_id = nodes.iter().map(|n| n.node_id).max().unwrap_or(0) + 1;
        Self {
            state: Mutex::new(GatewayState {
                nodes,
                next_id,
                calls: Vec::new(),
            }),
            ..Default::default()
        }
    }

    /// Every write of `property` fails.
    pub fn failing_property(mut self, property: NodeProperty) -> Self {
        self.failing_properties.insert(property);
        self
    }

    /// Node creation for `ip` fails.
    pub fn failing_create(mut self, ip: IpAddr) -> Self {
        self.failing_creates.insert(ip);
        self
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn nodes(&self) -> Vec<MonitoredDevice> {
        self.state.lock().unwrap().nodes.clone()
    }

    pub fn node_at(&self, addr: &str) -> Option<MonitoredDevice> {
        self.nodes().into_iter().find(|n| n.ip == ip(addr))
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }
}

#[async_trait]
impl MonitoringGateway for FakeGateway {
    async fn list_nodes(&self) -> Result<TargetInventory, GatewayError> {
        Ok(TargetInventory::from_nodes(self.nodes()))
    }

    async fn create_node(&self, new: &NewNode) -> Result<CreatedNode, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(GatewayCall::CreateNode(new.ip));
        if self.failing_creates.contains(&new.ip) {
            return Err(GatewayError::RemoteCreate {
                ip: new.ip,
                reason: "engine is not responding".to_string(),
            });
        }

        let node_id = state.next_id;
        state.next_id += 1;
        let mut created = node(node_id, &new.ip.to_string(), &new.sys_name);
        created.snmp_version = new.snmp.version().number();
        let uri = created.uri.clone();
        state.nodes.push(created);

        Ok(CreatedNode { node_id, uri })
    }

    async fn create_poller(&self, node_id: u64, poller_type: &str, enabled: bool) -> Result<(), GatewayError> {
        self.state.lock().unwrap().calls.push(GatewayCall::CreatePoller {
            node_id,
            poller_type: poller_type.to_string(),
            enabled,
        });
        Ok(())
    }

    async fn update_node_property(&self, node_uri: &str, property: NodeProperty, value: &str) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(GatewayCall::UpdateProperty {
            uri: node_uri.to_string(),
            property,
            value: value.to_string(),
        });

        let failure = |reason: &str| GatewayError::RemoteUpdate {
            uri: node_uri.to_string(),
            property,
            reason: reason.to_string(),
        };
        if self.failing_properties.contains(&property) {
            return Err(failure("property is read-only"));
        }
        let Some(node) = state.nodes.iter_mut().find(|n| n.uri == node_uri) else {
            return Err(failure("no such node"));
        };

        let value = Some(value.to_string());
        match property {
            NodeProperty::Caption => node.caption = value.unwrap_or_default(),
            NodeProperty::Network => node.custom.network = value,
            NodeProperty::Country => node.custom.country = value,
            NodeProperty::State => node.custom.state = value,
            NodeProperty::City => node.custom.city = value,
            NodeProperty::Serial => node.custom.serial = value,
        }
        Ok(())
    }

    async fn delete_node(&self, node_uri: &str) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(GatewayCall::DeleteNode(node_uri.to_string()));

        let before = state.nodes.len();
        state.nodes.retain(|n| n.uri != node_uri);
        if state.nodes.len() == before {
            return Err(GatewayError::RemoteDelete {
                uri: node_uri.to_string(),
                reason: "no such node".to_string(),
            });
        }
        Ok(())
    }

    async fn submit_discovery(&self, request: &DiscoveryRequest) -> Result<DiscoveryJob, GatewayError> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(GatewayCall::SubmitDiscovery(request.addresses().to_vec()));
        Ok(DiscoveryJob {
            profile_id: "42".to_string(),
        })
    }
}

/// Geocoder that answers every lookup with the same place and counts the lookups.
#[derive(Default)]
pub struct FakeGeocoder {
    place: Option<GeocodedPlace>,
    calls: AtomicUsize,
}

impl FakeGeocoder {
    pub fn ottawa() -> Self {
        Self {
            place: Some(GeocodedPlace {
                display_name: "1 Main St, Ottawa, Ontario, Canada".to_string(),
                address: AddressComponents {
                    city: Some("Ottawa".to_string()),
                    state: Some("Ontario".to_string()),
                    country: Some("Canada".to_string()),
                    ..Default::default()
                },
            }),
            calls: AtomicUsize::new(0),
        }
    }

    /// Every lookup fails.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReverseGeocoder for FakeGeocoder {
    async fn reverse(&self, coordinates: Coordinates) -> Result<GeocodedPlace, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.place
            .clone()
            .ok_or_else(|| GeocodeError::NotFound(format!("nothing at {coordinates}")))
    }
}
