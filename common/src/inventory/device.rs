use std::collections::{HashMap, HashSet};
use std::fmt;
use std::net::IpAddr;

use pnet::util::MacAddr;

/// Latitude / longitude pair as reported by the management API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.lat, self.lng)
    }
}

/// A device as reported by the cloud management API.
///
/// VLANs are deliberately absent: they are fetched lazily, and only for devices that lack a
/// directly assigned LAN address.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDevice {
    pub serial: String,
    pub name: String,
    pub mac: Option<MacAddr>,
    pub network_id: Option<String>,
    pub model: String,
    pub product_type: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub lan_ip: Option<IpAddr>,
    pub address: Option<String>,
}

impl SourceDevice {
    /// Minimal device, mostly useful to build fixtures.
    pub fn new(serial: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            name: name.into(),
            mac: None,
            network_id: None,
            model: String::new(),
            product_type: None,
            coordinates: None,
            lan_ip: None,
            address: None,
        }
    }

    pub fn with_lan_ip(mut self, ip: IpAddr) -> Self {
        self.lan_ip = Some(ip);
        self
    }

    pub fn with_network(mut self, network_id: impl Into<String>) -> Self {
        self.network_id = Some(network_id.into());
        self
    }

    pub fn with_coordinates(mut self, lat: f64, lng: f64) -> Self {
        self.coordinates = Some(Coordinates::new(lat, lng));
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_mac(mut self, mac: MacAddr) -> Self {
        self.mac = Some(mac);
        self
    }
}

/// A management-API network, only needed for its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub id: String,
    pub name: String,
}

/// An appliance VLAN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vlan {
    pub id: String,
    pub name: String,
    /// Gateway address of the VLAN on the appliance; `None` when absent or unparsable.
    pub appliance_ip: Option<IpAddr>,
    pub subnet: Option<String>,
}

impl Vlan {
    pub fn new(id: impl Into<String>, name: impl Into<String>, appliance_ip: Option<IpAddr>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            appliance_ip,
            subnet: None,
        }
    }
}

/// Everything fetched from the management API at startup.
#[derive(Debug, Clone, Default)]
pub struct SourceSnapshot {
    /// Devices in upstream order. Processing never re-sorts them.
    pub devices: Vec<SourceDevice>,
    pub networks: HashMap<String, Network>,
}

impl SourceSnapshot {
    pub fn new(devices: Vec<SourceDevice>, networks: Vec<Network>) -> Self {
        Self {
            devices,
            networks: networks.into_iter().map(|n| (n.id.clone(), n)).collect(),
        }
    }

    pub fn network_name(&self, device: &SourceDevice) -> Option<&str> {
        device
            .network_id
            .as_ref()
            .and_then(|id| self.networks.get(id))
            .map(|network| network.name.as_str())
    }
}

/// Source devices keyed by their resolved monitoring IP, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct SourceInventory {
    entries: Vec<(IpAddr, SourceDevice)>,
    ips: HashSet<IpAddr>,
}

impl SourceInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `device` under `ip`. Returns `false` (and keeps the first device) when `ip` is taken.
    pub fn insert(&mut self, ip: IpAddr, device: SourceDevice) -> bool {
        if !self.ips.insert(ip) {
            return false;
        }
        self.entries.push((ip, device));
        true
    }

    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.ips.contains(ip)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IpAddr, &SourceDevice)> {
        self.entries.iter().map(|(ip, device)| (ip, device))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
