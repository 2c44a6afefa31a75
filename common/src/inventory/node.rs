use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;

use tracing::warn;

use crate::config::SnmpCredentials;
use crate::inventory::location::LocationRecord;

/// Node custom properties the sync owns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomProperties {
    pub network: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub serial: Option<String>,
}

/// A node as stored by the monitoring platform.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoredDevice {
    pub node_id: u64,
    pub ip: IpAddr,
    pub uri: String,
    pub caption: String,
    pub dns: Option<String>,
    pub sys_name: Option<String>,
    /// Monitoring protocol of the node (`SNMP`, `ICMP`, `WMI`, `Agent`).
    pub object_sub_type: String,
    pub snmp_version: u8,
    pub community: Option<String>,
    pub custom: CustomProperties,
}

impl MonitoredDevice {
    pub fn uses_snmp(&self) -> bool {
        self.object_sub_type == "SNMP"
    }

    pub fn node_ref(&self) -> NodeRef {
        NodeRef {
            node_id: self.node_id,
            uri: self.uri.clone(),
            caption: self.caption.clone(),
            ip: self.ip,
        }
    }

    /// Current value of `property` on this node, `None` when unset.
    pub fn property(&self, property: NodeProperty) -> Option<&str> {
        match property {
            NodeProperty::Caption => Some(self.caption.as_str()),
            NodeProperty::Network => self.custom.network.as_deref(),
            NodeProperty::Country => self.custom.country.as_deref(),
            NodeProperty::State => self.custom.state.as_deref(),
            NodeProperty::City => self.custom.city.as_deref(),
            NodeProperty::Serial => self.custom.serial.as_deref(),
        }
    }
}

/// Monitored nodes keyed by IP, in the order the platform listed them.
#[derive(Debug, Clone, Default)]
pub struct TargetInventory {
    nodes: Vec<MonitoredDevice>,
    by_ip: HashMap<IpAddr, usize>,
}

impl TargetInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = MonitoredDevice>) -> Self {
        let mut inventory = Self::new();
        for node in nodes {
            inventory.insert(node);
        }
        inventory
    }

    /// Adds `node`; a second node with the same IP is dropped with a warning.
    pub fn insert(&mut self, node: MonitoredDevice) {
        if let Some(&existing) = self.by_ip.get(&node.ip) {
            warn!(
                "Node {} shares {} with node {}, ignoring it",
                node.node_id, node.ip, self.nodes[existing].node_id
            );
            return;
        }
        self.by_ip.insert(node.ip, self.nodes.len());
        self.nodes.push(node);
    }

    pub fn get(&self, ip: &IpAddr) -> Option<&MonitoredDevice> {
        self.by_ip.get(ip).map(|&idx| &self.nodes[idx])
    }

    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.by_ip.contains_key(ip)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonitoredDevice> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Handle on an existing node, enough to update or delete it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRef {
    pub node_id: u64,
    pub uri: String,
    pub caption: String,
    pub ip: IpAddr,
}

/// The node properties written by the sync. Everything but `Caption` is a custom property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeProperty {
    Caption,
    Network,
    Country,
    State,
    City,
    Serial,
}

impl NodeProperty {
    pub const ALL: [NodeProperty; 6] = [
        NodeProperty::Caption,
        NodeProperty::Network,
        NodeProperty::Country,
        NodeProperty::State,
        NodeProperty::City,
        NodeProperty::Serial,
    ];

    /// Property name as the platform spells it.
    pub const fn name(&self) -> &'static str {
        match self {
            NodeProperty::Caption => "Caption",
            NodeProperty::Network => "Network",
            NodeProperty::Country => "Country",
            NodeProperty::State => "State",
            NodeProperty::City => "City",
            NodeProperty::Serial => "Serial",
        }
    }

    pub const fn is_custom(&self) -> bool {
        !matches!(self, NodeProperty::Caption)
    }
}

impl fmt::Display for NodeProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single property write. Updates are never batched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChange {
    pub property: NodeProperty,
    pub value: String,
}

impl PropertyChange {
    pub fn new(property: NodeProperty, value: impl Into<String>) -> Self {
        Self {
            property,
            value: value.into(),
        }
    }
}

/// Desired state of a node, derived from a source device.
///
/// Fields left `None` are unknown for this run and are neither written nor compared.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeAttributes {
    pub caption: String,
    pub network: Option<String>,
    pub serial: String,
    pub location: Option<LocationRecord>,
}

impl NodeAttributes {
    /// Every known property, in write order.
    pub fn property_changes(&self) -> Vec<PropertyChange> {
        let mut changes = vec![PropertyChange::new(NodeProperty::Caption, &self.caption)];
        if let Some(network) = &self.network {
            changes.push(PropertyChange::new(NodeProperty::Network, network));
        }
        if let Some(location) = &self.location {
            changes.push(PropertyChange::new(NodeProperty::Country, &location.country));
            changes.push(PropertyChange::new(NodeProperty::State, &location.state));
            changes.push(PropertyChange::new(NodeProperty::City, &location.city));
        }
        changes.push(PropertyChange::new(NodeProperty::Serial, &self.serial));
        changes
    }

    /// Properties whose current value on `node` is not exactly the desired value.
    pub fn diff(&self, node: &MonitoredDevice) -> Vec<PropertyChange> {
        self.property_changes()
            .into_iter()
            .filter(|change| node.property(change.property) != Some(change.value.as_str()))
            .collect()
    }
}

/// Everything needed to register a new SNMP node.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNode {
    pub ip: IpAddr,
    pub sys_name: String,
    pub engine_id: u32,
    pub snmp: SnmpCredentials,
}

/// Result of a successful node creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedNode {
    pub node_id: u64,
    pub uri: String,
}

/// Pollers registered on every node the sync creates, with their enabled flag.
pub const DEFAULT_POLLERS: [(&str, bool); 11] = [
    ("N.Status.ICMP.Native", true),
    ("N.Status.SNMP.Native", true),
    ("N.ResponseTime.ICMP.Native", true),
    ("N.ResponseTime.SNMP.Native", true),
    ("N.Details.SNMP.Generic", true),
    ("N.Uptime.SNMP.Generic", true),
    ("N.Cpu.SNMP.HrProcessorLoad", true),
    ("N.Memory.SNMP.NetSnmpReal", true),
    ("N.AssetInventory.Snmp.Generic", true),
    ("N.Topology_Layer3.SNMP.ipNetToMedia", false),
    ("N.Routing.SNMP.Ipv4CidrRoutingTable", false),
];
