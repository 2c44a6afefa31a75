//! Per-run statistics.

use std::fmt;
use std::net::IpAddr;

use invsync_common::error::GatewayError;
use invsync_common::inventory::action::DeviceReport;
use invsync_common::inventory::discovery::DiscoveryJob;
use invsync_common::inventory::node::NodeRef;

use crate::ip_resolver::UnresolvedReason;

/// Why a source device produced no action.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Unresolved(UnresolvedReason),
    /// The device's IP is already claimed by an earlier device.
    DuplicateIp(IpAddr),
    NotMonitored(IpAddr),
    Geolocation(String),
    /// A node would have to be created but no SNMP credentials were given.
    NoSnmpCredentials(IpAddr),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unresolved(reason) => write!(f, "unresolved IP ({reason})"),
            SkipReason::DuplicateIp(ip) => write!(f, "{ip} already used by another device"),
            SkipReason::NotMonitored(ip) => write!(f, "{ip} is not monitored"),
            SkipReason::Geolocation(e) => write!(f, "no location ({e})"),
            SkipReason::NoSnmpCredentials(ip) => write!(f, "{ip} is not monitored and no SNMP credentials are set"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedDevice {
    pub name: String,
    pub reason: SkipReason,
}

/// Outcome of one run, whatever the mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Source devices considered, after `--limit`.
    pub devices_seen: usize,
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    pub skipped: Vec<SkippedDevice>,
    /// Every gateway call that failed. Processing went on after each of them.
    pub failures: Vec<GatewayError>,
    /// Nodes whose IP is no longer in the source, left untouched by `discover`.
    pub decommission_candidates: Vec<NodeRef>,
    pub discovery: Option<DiscoveryJob>,
    /// Addresses queued in the discovery request.
    pub discovery_addresses: usize,
    /// Per-device reports produced by `dry`.
    pub reports: Vec<DeviceReport>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip(&mut self, name: impl Into<String>, reason: SkipReason) {
        self.skipped.push(SkippedDevice {
            name: name.into(),
            reason,
        });
    }

    pub fn fail(&mut self, error: GatewayError) {
        self.failures.push(error);
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of mutations issued.
    pub fn actions(&self) -> usize {
        self.added + self.updated + self.removed
    }
}
