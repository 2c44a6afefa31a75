//! # Run Configuration
//!
//! [`SyncConfig`] is the fully merged, validated configuration of one run. The CLI builds it from
//! command-line flags layered over an optional TOML [`FileConfig`]. Secrets (API key, passwords,
//! SNMP credentials) never come from the file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_CACHE_PATH: &str = "locations.csv";
pub const DEFAULT_MERAKI_BASE_URL: &str = "https://api.meraki.com/api/v1";
pub const DEFAULT_SWIS_PORT: u16 = 17774;

/// What a run does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Add missing nodes, update drifted ones, remove decommissioned ones.
    Add,
    /// Queue unmonitored devices into a single bulk-discovery job.
    Discover,
    /// Push device metadata and location onto already monitored nodes.
    Update,
    /// Compute what `update` would push for the first few devices, touching nothing.
    Dry,
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "add" => Ok(Mode::Add),
            "discover" => Ok(Mode::Discover),
            "update" => Ok(Mode::Update),
            "dry" => Ok(Mode::Dry),
            _ => Err(ConfigError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Add => "add",
            Mode::Discover => "discover",
            Mode::Update => "update",
            Mode::Dry => "dry",
        };
        f.write_str(name)
    }
}

/// A string that never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"***\"")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnmpVersion {
    V2c,
    V3,
}

impl SnmpVersion {
    pub const fn number(&self) -> u8 {
        match self {
            SnmpVersion::V2c => 2,
            SnmpVersion::V3 => 3,
        }
    }
}

impl FromStr for SnmpVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "2" | "2c" | "v2c" => Ok(SnmpVersion::V2c),
            "3" | "v3" => Ok(SnmpVersion::V3),
            _ => Err(ConfigError::InvalidSnmpVersion(s.to_string())),
        }
    }
}

/// Credentials put on every node the sync creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnmpCredentials {
    V2c { community: Secret },
    V3 { username: String, auth_password: Secret },
}

impl SnmpCredentials {
    /// Picks the credential fields that belong to `version`, failing if they are missing.
    pub fn from_parts(
        version: SnmpVersion,
        community: Option<String>,
        auth_username: Option<String>,
        auth_password: Option<String>,
    ) -> Result<Self, ConfigError> {
        match version {
            SnmpVersion::V2c => {
                let community = community.ok_or(ConfigError::Missing("snmp community"))?;
                Ok(SnmpCredentials::V2c {
                    community: Secret::new(community),
                })
            }
            SnmpVersion::V3 => {
                let username = auth_username.ok_or(ConfigError::Missing("snmp auth username"))?;
                let auth_password = auth_password.ok_or(ConfigError::Missing("snmp auth password"))?;
                Ok(SnmpCredentials::V3 {
                    username,
                    auth_password: Secret::new(auth_password),
                })
            }
        }
    }

    pub fn version(&self) -> SnmpVersion {
        match self {
            SnmpCredentials::V2c { .. } => SnmpVersion::V2c,
            SnmpCredentials::V3 { .. } => SnmpVersion::V3,
        }
    }
}

/// Product families the management API can filter devices on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductType {
    Wireless,
    Appliance,
    Switch,
    SystemsManager,
    Camera,
    CellularGateway,
    Sensor,
    WirelessController,
    CampusGateway,
    SecureConnect,
}

impl ProductType {
    pub const ALL: [ProductType; 10] = [
        ProductType::Wireless,
        ProductType::Appliance,
        ProductType::Switch,
        ProductType::SystemsManager,
        ProductType::Camera,
        ProductType::CellularGateway,
        ProductType::Sensor,
        ProductType::WirelessController,
        ProductType::CampusGateway,
        ProductType::SecureConnect,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ProductType::Wireless => "wireless",
            ProductType::Appliance => "appliance",
            ProductType::Switch => "switch",
            ProductType::SystemsManager => "systemsManager",
            ProductType::Camera => "camera",
            ProductType::CellularGateway => "cellularGateway",
            ProductType::Sensor => "sensor",
            ProductType::WirelessController => "wirelessController",
            ProductType::CampusGateway => "campusGateway",
            ProductType::SecureConnect => "secureConnect",
        }
    }
}

impl FromStr for ProductType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductType::ALL
            .into_iter()
            .find(|product_type| product_type.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::InvalidProductType(s.to_string()))
    }
}

/// Which devices to pull from the management API.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeviceFilter {
    #[default]
    All,
    Models(Vec<String>),
    ProductType(ProductType),
}

impl DeviceFilter {
    pub fn from_parts(models: Vec<String>, product_type: Option<ProductType>) -> Result<Self, ConfigError> {
        match (models.is_empty(), product_type) {
            (true, None) => Ok(DeviceFilter::All),
            (false, None) => Ok(DeviceFilter::Models(models)),
            (true, Some(product_type)) => Ok(DeviceFilter::ProductType(product_type)),
            (false, Some(_)) => Err(ConfigError::ConflictingFilters),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MerakiSettings {
    pub base_url: String,
    pub api_key: Secret,
}

#[derive(Debug, Clone)]
pub struct OrionSettings {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: Secret,
    /// Orion ships with a self-signed certificate, so this defaults to `true`.
    pub accept_invalid_certs: bool,
    pub engine_id: u32,
}

impl OrionSettings {
    pub fn base_url(&self) -> String {
        if self.server.starts_with("http://") || self.server.starts_with("https://") {
            format!("{}/SolarWinds/InformationService/v3/Json", self.server.trim_end_matches('/'))
        } else {
            format!(
                "https://{}:{}/SolarWinds/InformationService/v3/Json",
                self.server, self.port
            )
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeocoderSettings {
    pub base_url: String,
    pub user_agent: String,
    pub language: String,
    pub timeout_secs: u64,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "invsync".to_string(),
            language: "en".to_string(),
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    pub profile_name: String,
    /// Primary then fallback credential id.
    pub credential_ids: [u32; 2],
    pub engine_id: u32,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            profile_name: "Meraki MX Discovery".to_string(),
            credential_ids: [12, 15],
            engine_id: 1,
        }
    }
}

/// The merged configuration of one run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub mode: Mode,
    /// Caps the number of source devices considered, in every mode.
    pub limit: Option<usize>,
    /// Credentials of the nodes `add` creates. The other modes never create nodes.
    pub snmp: Option<SnmpCredentials>,
    pub filter: DeviceFilter,
    pub cache_path: PathBuf,
    pub meraki: MerakiSettings,
    pub orion: OrionSettings,
    pub geocoder: GeocoderSettings,
    pub discovery: DiscoverySettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MerakiFileSettings {
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OrionFileSettings {
    pub port: Option<u16>,
    pub accept_invalid_certs: Option<bool>,
    pub engine_id: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheFileSettings {
    pub path: Option<PathBuf>,
}

/// Non-secret tunables read from `--config <file>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub meraki: MerakiFileSettings,
    pub orion: OrionFileSettings,
    pub geocoder: GeocoderSettings,
    pub discovery: DiscoverySettings,
    pub cache: CacheFileSettings,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content, path)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}
