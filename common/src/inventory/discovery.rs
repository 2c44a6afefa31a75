use std::net::IpAddr;

use crate::config::DiscoverySettings;

/// A discovery credential and its try order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialOrder {
    pub credential_id: u32,
    pub order: u32,
}

/// Scan parameters of the discovery profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryProfile {
    pub name: String,
    pub engine_id: u32,
    pub job_timeout_secs: u32,
    pub search_timeout_ms: u32,
    pub snmp_timeout_ms: u32,
    pub snmp_retries: u32,
    pub repeat_interval_ms: u32,
    pub snmp_port: u16,
    pub hop_count: u32,
    pub preferred_snmp_version: String,
    pub disable_icmp: bool,
    pub allow_duplicate_nodes: bool,
    pub is_auto_import: bool,
    pub is_hidden: bool,
}

impl DiscoveryProfile {
    pub fn new(name: impl Into<String>, engine_id: u32) -> Self {
        Self {
            name: name.into(),
            engine_id,
            job_timeout_secs: 3600,
            search_timeout_ms: 5000,
            snmp_timeout_ms: 5000,
            snmp_retries: 2,
            repeat_interval_ms: 1800,
            snmp_port: 161,
            hop_count: 0,
            preferred_snmp_version: "SNMP2c".to_string(),
            disable_icmp: false,
            allow_duplicate_nodes: false,
            is_auto_import: true,
            is_hidden: false,
        }
    }
}

/// The single bulk-discovery job submitted by a `discover` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRequest {
    addresses: Vec<IpAddr>,
    pub credentials: Vec<CredentialOrder>,
    pub wmi_retries: u32,
    pub wmi_retry_interval_ms: u32,
    pub profile: DiscoveryProfile,
}

impl DiscoveryRequest {
    /// Empty request; credentials are tried in the order they are configured.
    pub fn new(settings: &DiscoverySettings) -> Self {
        let credentials = settings
            .credential_ids
            .iter()
            .zip(1..)
            .map(|(&credential_id, order)| CredentialOrder { credential_id, order })
            .collect();

        Self {
            addresses: Vec::new(),
            credentials,
            wmi_retries: 0,
            wmi_retry_interval_ms: 1000,
            profile: DiscoveryProfile::new(&settings.profile_name, settings.engine_id),
        }
    }

    /// Queues `ip` for discovery. Returns `false` if it was already queued.
    pub fn push(&mut self, ip: IpAddr) -> bool {
        if self.addresses.contains(&ip) {
            return false;
        }
        self.addresses.push(ip);
        true
    }

    pub fn addresses(&self) -> &[IpAddr] {
        &self.addresses
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// Handle of a started discovery job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryJob {
    pub profile_id: String,
}
