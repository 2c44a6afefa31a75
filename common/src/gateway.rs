use async_trait::async_trait;

use crate::error::GatewayError;
use crate::inventory::discovery::{DiscoveryJob, DiscoveryRequest};
use crate::inventory::node::{CreatedNode, NewNode, NodeProperty, TargetInventory};

/// Defines the contract for talking to the monitoring platform.
///
/// Every call may fail on its own. Nothing is atomic across calls: two property writes on the
/// same node can end with one applied and the other not.
#[async_trait]
pub trait MonitoringGateway: Send + Sync {
    /// Lists every monitored node, keyed by IP.
    async fn list_nodes(&self) -> Result<TargetInventory, GatewayError>;

    /// Registers a new SNMP node.
    async fn create_node(&self, node: &NewNode) -> Result<CreatedNode, GatewayError>;

    /// Attaches a poller to a node.
    async fn create_poller(&self, node_id: u64, poller_type: &str, enabled: bool) -> Result<(), GatewayError>;

    /// Writes a single property of a node.
    ///
    /// # Errors
    /// * `GatewayError::RemoteUpdate` - The platform refused or never received the write.
    async fn update_node_property(
        &self,
        node_uri: &str,
        property: NodeProperty,
        value: &str,
    ) -> Result<(), GatewayError>;

    /// Deletes a node.
    ///
    /// # Errors
    /// * `GatewayError::RemoteDelete` - The node could not be deleted.
    async fn delete_node(&self, node_uri: &str) -> Result<(), GatewayError>;

    /// Starts a bulk-discovery job.
    async fn submit_discovery(&self, request: &DiscoveryRequest) -> Result<DiscoveryJob, GatewayError>;
}
