use std::net::IpAddr;

use pnet::util::MacAddr;

use crate::inventory::device::{Coordinates, SourceDevice};
use crate::inventory::location::LocationRecord;
use crate::inventory::node::{MonitoredDevice, NewNode, NodeAttributes, NodeRef, PropertyChange};

/// One change to push to the monitoring platform. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconciliationAction {
    /// Register a new node, then write `properties` on it one by one.
    Add {
        ip: IpAddr,
        node: NewNode,
        properties: Vec<PropertyChange>,
    },
    /// Write `changes` on an existing node, one call per property.
    Update {
        target: NodeRef,
        changes: Vec<PropertyChange>,
    },
    Remove { target: NodeRef },
}

impl ReconciliationAction {
    pub fn kind(&self) -> &'static str {
        match self {
            ReconciliationAction::Add { .. } => "add",
            ReconciliationAction::Update { .. } => "update",
            ReconciliationAction::Remove { .. } => "remove",
        }
    }
}

/// Everything known about a device once its IP and location are resolved.
///
/// Printed as-is in dry mode, pushed to the node in update mode.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReport {
    pub name: String,
    pub serial: String,
    pub mac: Option<MacAddr>,
    pub ip: IpAddr,
    pub model: String,
    pub network: Option<String>,
    pub coordinates: Coordinates,
    pub country: String,
    pub state: String,
    pub address: String,
    pub city: String,
    pub uri: String,
}

impl DeviceReport {
    pub fn new(
        device: &SourceDevice,
        ip: IpAddr,
        network: Option<&str>,
        location: &LocationRecord,
        node: &MonitoredDevice,
    ) -> Self {
        Self {
            name: device.name.clone(),
            serial: device.serial.clone(),
            mac: device.mac,
            ip,
            model: device.model.clone(),
            network: network.map(str::to_string),
            coordinates: device
                .coordinates
                .unwrap_or_else(|| Coordinates::new(location.lat, location.lng)),
            country: location.country.clone(),
            state: location.state.clone(),
            address: location.address.clone(),
            city: location.city.clone(),
            uri: node.uri.clone(),
        }
    }

    pub fn attributes(&self) -> NodeAttributes {
        NodeAttributes {
            caption: self.name.clone(),
            network: self.network.clone(),
            serial: self.serial.clone(),
            location: Some(LocationRecord {
                serial: self.serial.clone(),
                lat: self.coordinates.lat,
                lng: self.coordinates.lng,
                country: self.country.clone(),
                state: self.state.clone(),
                city: self.city.clone(),
                address: self.address.clone(),
            }),
        }
    }
}
