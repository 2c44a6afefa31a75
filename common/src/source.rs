use async_trait::async_trait;

use crate::config::DeviceFilter;
use crate::error::SourceError;
use crate::inventory::device::{Network, SourceDevice, Vlan};

/// Defines the contract for reading the cloud management API.
///
/// Pagination is the implementation's business: every listing returns the complete sequence.
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Lists the organization's devices matching `filter`, in upstream order.
    async fn list_devices(&self, filter: &DeviceFilter) -> Result<Vec<SourceDevice>, SourceError>;

    /// Lists the organization's networks.
    async fn list_networks(&self) -> Result<Vec<Network>, SourceError>;

    /// Lists the appliance VLANs of a network.
    ///
    /// This is one remote call per invocation and fails for networks without VLANs enabled.
    async fn list_vlans(&self, network_id: &str) -> Result<Vec<Vlan>, SourceError>;
}
