//! Recoverable error taxonomy.
//!
//! Every variant here is contained at device or property level by the engine, with the exception
//! of the startup paths (`Unauthorized`, `NoOrganization`, [`ConfigError`]) which the binary treats
//! as fatal.

use std::net::IpAddr;

use thiserror::Error;

use crate::inventory::node::NodeProperty;

/// Failures reported by the cloud management API.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    #[error("management API rejected the API key")]
    Unauthorized,
    #[error("API key has no access to any organization")]
    NoOrganization,
    #[error("management API request failed: {0}")]
    Request(String),
    #[error("unexpected payload from management API: {0}")]
    Decode(String),
}

/// Failures reported by the monitoring platform.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    #[error("monitoring platform rejected the credentials")]
    Unauthorized,
    #[error("monitoring platform request failed: {0}")]
    Request(String),
    #[error("unexpected payload from monitoring platform: {0}")]
    Decode(String),
    #[error("failed to create node for {ip}: {reason}")]
    RemoteCreate { ip: IpAddr, reason: String },
    #[error("failed to set {property} on {uri}: {reason}")]
    RemoteUpdate {
        uri: String,
        property: NodeProperty,
        reason: String,
    },
    #[error("failed to delete {uri}: {reason}")]
    RemoteDelete { uri: String, reason: String },
    #[error("failed to start discovery: {0}")]
    Discovery(String),
}

/// Failures of a single reverse-geocoding lookup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeocodeError {
    #[error("geocoder request failed: {0}")]
    Request(String),
    #[error("geocoder returned no result: {0}")]
    NotFound(String),
    #[error("unexpected payload from geocoder: {0}")]
    Decode(String),
}

/// Invalid or contradictory run configuration. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    #[error("invalid mode '{0}': expected one of add, discover, update, dry")]
    InvalidMode(String),
    #[error("invalid SNMP version '{0}': expected 2 or 3")]
    InvalidSnmpVersion(String),
    #[error("invalid product type '{0}'")]
    InvalidProductType(String),
    #[error("device models and product types are mutually exclusive")]
    ConflictingFilters,
}
