pub mod sync;

use std::path::PathBuf;

use clap::Parser;
use invsync_common::config::{
    DEFAULT_CACHE_PATH, DEFAULT_MERAKI_BASE_URL, DEFAULT_SWIS_PORT, DeviceFilter, FileConfig, MerakiSettings, Mode,
    OrionSettings, ProductType, Secret, SnmpCredentials, SnmpVersion, SyncConfig,
};
use invsync_common::error::ConfigError;

#[derive(Parser, Debug)]
#[command(name = "invsync", version)]
#[command(about = "Keeps the monitoring platform in sync with the Meraki device inventory.")]
pub struct CommandLine {
    /// What to do: add, discover, update or dry
    #[arg(long, value_parser = parse_mode)]
    pub mode: Mode,

    /// Meraki Dashboard API key
    #[arg(long, env = "MERAKI_DASHBOARD_API_KEY", hide_env_values = true)]
    pub meraki_token: Option<String>,

    /// Only sync these device models (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub meraki_device_models: Vec<String>,

    /// Only sync this product type
    #[arg(long, value_parser = parse_product_type)]
    pub meraki_product_types: Option<ProductType>,

    /// Orion server address or base URL
    #[arg(long, env = "NPM_SERVER")]
    pub npm_server: Option<String>,

    #[arg(long, env = "NPM_USERNAME")]
    pub npm_username: Option<String>,

    #[arg(long, env = "NPM_PASSWORD", hide_env_values = true)]
    pub npm_password: Option<String>,

    /// SNMP version of created nodes (2 or 3)
    #[arg(long, default_value = "2", value_parser = parse_snmp_version)]
    pub snmp_version: SnmpVersion,

    #[arg(long, env = "SNMP_COMMUNITY", hide_env_values = true)]
    pub snmp_community: Option<String>,

    #[arg(long, env = "SNMP_AUTH_USERNAME")]
    pub snmp_auth_username: Option<String>,

    #[arg(long, env = "SNMP_AUTH_PASSWORD", hide_env_values = true)]
    pub snmp_auth_password: Option<String>,

    /// Only consider the first N devices
    #[arg(long)]
    pub limit: Option<usize>,

    /// Location cache file
    #[arg(long)]
    pub cache_file: Option<PathBuf>,

    /// TOML file with non-secret settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Merges the command line over `file` into a validated run configuration.
    ///
    /// Secrets and credentials only ever come from the command line or the environment.
    pub fn into_config(self, file: FileConfig) -> Result<SyncConfig, ConfigError> {
        let snmp = match self.mode {
            Mode::Add => Some(SnmpCredentials::from_parts(
                self.snmp_version,
                self.snmp_community,
                self.snmp_auth_username,
                self.snmp_auth_password,
            )?),
            Mode::Discover | Mode::Update | Mode::Dry => None,
        };
        let filter = DeviceFilter::from_parts(self.meraki_device_models, self.meraki_product_types)?;

        let meraki = MerakiSettings {
            base_url: file.meraki.base_url.unwrap_or_else(|| DEFAULT_MERAKI_BASE_URL.to_string()),
            api_key: Secret::new(self.meraki_token.ok_or(ConfigError::Missing("meraki token"))?),
        };
        let orion = OrionSettings {
            server: self.npm_server.ok_or(ConfigError::Missing("npm server"))?,
            port: file.orion.port.unwrap_or(DEFAULT_SWIS_PORT),
            username: self.npm_username.ok_or(ConfigError::Missing("npm username"))?,
            password: Secret::new(self.npm_password.ok_or(ConfigError::Missing("npm password"))?),
            accept_invalid_certs: file.orion.accept_invalid_certs.unwrap_or(true),
            engine_id: file.orion.engine_id.unwrap_or(file.discovery.engine_id),
        };

        Ok(SyncConfig {
            mode: self.mode,
            limit: self.limit,
            snmp,
            filter,
            cache_path: self
                .cache_file
                .or(file.cache.path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_PATH)),
            meraki,
            orion,
            geocoder: file.geocoder,
            discovery: file.discovery,
        })
    }
}

fn parse_mode(value: &str) -> Result<Mode, ConfigError> {
    value.parse()
}

fn parse_snmp_version(value: &str) -> Result<SnmpVersion, ConfigError> {
    value.parse()
}

fn parse_product_type(value: &str) -> Result<ProductType, ConfigError> {
    value.parse()
}
