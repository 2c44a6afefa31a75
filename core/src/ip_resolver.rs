//! Picks the IP a source device is monitored on.
//!
//! Priority: the directly assigned LAN IP, then the gateway of the `Enterprise Client Network`
//! VLAN, then the gateway of the first VLAN inside `10.0.0.0/8`. VLANs cost one remote call per
//! device, so they are only fetched when the LAN IP is missing.

use std::fmt;
use std::net::IpAddr;

use invsync_common::error::SourceError;
use invsync_common::inventory::device::{SourceDevice, Vlan};
use invsync_common::source::InventorySource;
use invsync_common::utils::ip;
use tracing::warn;

pub const ENTERPRISE_VLAN_NAME: &str = "Enterprise Client Network";

/// Where a resolved address came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpOrigin {
    LanIp,
    EnterpriseVlan,
    PrivateVlan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnresolvedReason {
    /// No LAN IP and no network to fetch VLANs from.
    NoNetwork,
    VlanFetchFailed(SourceError),
    NoMatchingVlan,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::NoNetwork => f.write_str("no LAN IP and no network assigned"),
            UnresolvedReason::VlanFetchFailed(e) => write!(f, "could not fetch VLANs: {e}"),
            UnresolvedReason::NoMatchingVlan => f.write_str("no usable VLAN gateway address"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IpResolution {
    Resolved { ip: IpAddr, origin: IpOrigin },
    Unresolved(UnresolvedReason),
}

impl IpResolution {
    pub fn ip(&self) -> Option<IpAddr> {
        match self {
            IpResolution::Resolved { ip, .. } => Some(*ip),
            IpResolution::Unresolved(_) => None,
        }
    }
}

pub struct IpResolver<'a> {
    source: &'a dyn InventorySource,
}

impl<'a> IpResolver<'a> {
    pub fn new(source: &'a dyn InventorySource) -> Self {
        Self { source }
    }

    /// Resolves the monitoring IP of `device`. An unresolved device is logged by name.
    pub async fn resolve(&self, device: &SourceDevice) -> IpResolution {
        if let Some(ip) = device.lan_ip {
            return IpResolution::Resolved {
                ip,
                origin: IpOrigin::LanIp,
            };
        }

        let resolution = match &device.network_id {
            None => IpResolution::Unresolved(UnresolvedReason::NoNetwork),
            Some(network_id) => match self.source.list_vlans(network_id).await {
                Ok(vlans) => select_vlan_ip(&vlans),
                Err(e) => IpResolution::Unresolved(UnresolvedReason::VlanFetchFailed(e)),
            },
        };

        if let IpResolution::Unresolved(reason) = &resolution {
            warn!("Could not find IP for device {}: {reason}", device.name);
        }
        resolution
    }
}

/// Applies the VLAN fallback chain to an already fetched VLAN list.
pub fn select_vlan_ip(vlans: &[Vlan]) -> IpResolution {
    let enterprise = vlans
        .iter()
        .find(|vlan| vlan.name == ENTERPRISE_VLAN_NAME)
        .and_then(|vlan| vlan.appliance_ip);
    if let Some(ip) = enterprise {
        return IpResolution::Resolved {
            ip,
            origin: IpOrigin::EnterpriseVlan,
        };
    }

    vlans
        .iter()
        .filter_map(|vlan| vlan.appliance_ip)
        .find(ip::is_private_class_a)
        .map(|ip| IpResolution::Resolved {
            ip,
            origin: IpOrigin::PrivateVlan,
        })
        .unwrap_or(IpResolution::Unresolved(UnresolvedReason::NoMatchingVlan))
}
