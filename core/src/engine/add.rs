use invsync_common::inventory::action::ReconciliationAction;
use invsync_common::inventory::device::{SourceDevice, SourceSnapshot};
use invsync_common::inventory::node::{NewNode, NodeAttributes, TargetInventory};
use tracing::{debug, info, warn};

use super::{ReconciliationEngine, count_kind};
use crate::geolocation::GeolocationError;
use crate::report::{RunReport, SkipReason};

impl ReconciliationEngine<'_> {
    /// Plans a full `add` pass.
    ///
    /// * Resolved IP unknown to the platform: `Add` with the configured SNMP credentials.
    /// * Resolved IP already monitored: `Update` with the properties that differ, if any.
    /// * Monitored IP no source device resolves to: `Remove`, unless `limit` hides part of the
    ///   source inventory.
    ///
    /// Actions come out in source order, removals last in platform order.
    pub async fn plan_add(
        &mut self,
        snapshot: &SourceSnapshot,
        target: &TargetInventory,
        report: &mut RunReport,
    ) -> Vec<ReconciliationAction> {
        let inventory = self.resolve_inventory(self.devices(snapshot), report).await;
        let mut actions = Vec::new();

        for (&ip, device) in inventory.iter() {
            let attributes = self.desired_attributes(snapshot, device).await;

            match target.get(&ip) {
                None => {
                    let Some(snmp) = self.settings.snmp.clone() else {
                        warn!("{} ({ip}) is not monitored but no SNMP credentials are set", device.name);
                        report.skip(&device.name, SkipReason::NoSnmpCredentials(ip));
                        continue;
                    };
                    actions.push(ReconciliationAction::Add {
                        ip,
                        node: NewNode {
                            ip,
                            sys_name: device.name.clone(),
                            engine_id: self.settings.engine_id,
                            snmp,
                        },
                        properties: attributes.property_changes(),
                    });
                }
                Some(node) => {
                    let changes = attributes.diff(node);
                    if changes.is_empty() {
                        debug!("{} ({ip}) is up to date", device.name);
                    } else {
                        actions.push(ReconciliationAction::Update {
                            target: node.node_ref(),
                            changes,
                        });
                    }
                }
            }
        }

        if self.is_partial(snapshot) {
            info!("Run is limited to part of the source inventory, leaving unmatched nodes in place");
        } else {
            actions.extend(
                target
                    .iter()
                    .filter(|node| !inventory.contains(&node.ip))
                    .map(|node| ReconciliationAction::Remove { target: node.node_ref() }),
            );
        }

        info!(
            "Planned {} additions, {} updates and {} removals",
            count_kind(&actions, "add"),
            count_kind(&actions, "update"),
            count_kind(&actions, "remove")
        );
        actions
    }

    /// What the node of `device` should look like. The location is best effort.
    async fn desired_attributes(&mut self, snapshot: &SourceSnapshot, device: &SourceDevice) -> NodeAttributes {
        let location = match self.geolocation.resolve(&device.serial, device.coordinates).await {
            Ok(location) => Some(location),
            Err(GeolocationError::MissingCoordinates) => None,
            Err(e) => {
                debug!("No location for {}, leaving location fields alone: {e}", device.name);
                None
            }
        };

        NodeAttributes {
            caption: device.name.clone(),
            network: snapshot.network_name(device).map(str::to_string),
            serial: device.serial.clone(),
            location,
        }
    }
}
