use invsync_common::inventory::action::ReconciliationAction;
use invsync_common::inventory::node::{DEFAULT_POLLERS, PropertyChange};
use tracing::{error, info, warn};

use super::ReconciliationEngine;
use crate::report::RunReport;

impl ReconciliationEngine<'_> {
    /// Pushes `actions` to the platform, in order.
    ///
    /// Each action maps onto its own gateway calls. An `Add` registers the node, its pollers,
    /// then writes its properties. Property writes are one call each and a failed write does
    /// not stop the next one.
    pub async fn apply(&self, actions: &[ReconciliationAction], report: &mut RunReport) {
        for action in actions {
            match action {
                ReconciliationAction::Add { ip, node, properties } => {
                    let created = match self.gateway.create_node(node).await {
                        Ok(created) => created,
                        Err(e) => {
                            error!("{e}");
                            report.fail(e);
                            continue;
                        }
                    };
                    info!("Added {} ({ip}) as node {}", node.sys_name, created.node_id);
                    report.added += 1;

                    self.register_pollers(created.node_id, report).await;
                    self.write_properties(&created.uri, properties, report).await;
                }
                ReconciliationAction::Update { target, changes } => {
                    let written = self.write_properties(&target.uri, changes, report).await;
                    if written > 0 {
                        info!("Updated {written}/{} properties of {}", changes.len(), target.caption);
                        report.updated += 1;
                    }
                }
                ReconciliationAction::Remove { target } => match self.gateway.delete_node(&target.uri).await {
                    Ok(()) => {
                        info!("Removed {} ({})", target.caption, target.ip);
                        report.removed += 1;
                    }
                    Err(e) => {
                        error!("{e}");
                        report.fail(e);
                    }
                },
            }
        }
    }

    async fn register_pollers(&self, node_id: u64, report: &mut RunReport) {
        for (poller_type, enabled) in DEFAULT_POLLERS {
            if let Err(e) = self.gateway.create_poller(node_id, poller_type, enabled).await {
                warn!("Could not register poller {poller_type} on node {node_id}: {e}");
                report.fail(e);
            }
        }
    }

    /// Writes every change with its own call. Returns how many succeeded.
    async fn write_properties(&self, uri: &str, changes: &[PropertyChange], report: &mut RunReport) -> usize {
        let mut written = 0;
        for change in changes {
            match self
                .gateway
                .update_node_property(uri, change.property, &change.value)
                .await
            {
                Ok(()) => written += 1,
                Err(e) => {
                    warn!("{e}");
                    report.fail(e);
                }
            }
        }
        written
    }
}
