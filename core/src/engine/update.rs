use std::net::IpAddr;

use invsync_common::inventory::action::{DeviceReport, ReconciliationAction};
use invsync_common::inventory::device::{SourceDevice, SourceSnapshot};
use invsync_common::inventory::node::{MonitoredDevice, TargetInventory};
use tracing::{info, warn};

use super::{DRY_RUN_CAP, ReconciliationEngine};
use crate::ip_resolver::IpResolution;
use crate::report::{RunReport, SkipReason};

impl ReconciliationEngine<'_> {
    /// Plans an `update` pass: every monitored device gets its full metadata pushed again.
    ///
    /// Devices that are unresolved, not monitored or without a location are skipped.
    pub async fn plan_update(
        &mut self,
        snapshot: &SourceSnapshot,
        target: &TargetInventory,
        report: &mut RunReport,
    ) -> Vec<ReconciliationAction> {
        let inventory = self.resolve_inventory(self.devices(snapshot), report).await;
        let mut actions = Vec::new();

        for (&ip, device) in inventory.iter() {
            let Some(node) = monitored_node(target, device, ip, report) else {
                continue;
            };
            if let Some(device_report) = self.device_report(snapshot, node, device, ip, report).await {
                actions.push(ReconciliationAction::Update {
                    target: node.node_ref(),
                    changes: device_report.attributes().property_changes(),
                });
            }
        }

        info!("Planned {} updates", actions.len());
        actions
    }

    /// Computes what `update` would push for the first [`DRY_RUN_CAP`] devices.
    ///
    /// Unresolved devices count toward the cap. Nothing is ever written to the platform.
    pub async fn dry_run(
        &mut self,
        snapshot: &SourceSnapshot,
        target: &TargetInventory,
        report: &mut RunReport,
    ) -> Vec<DeviceReport> {
        let mut reports = Vec::new();

        for device in self.devices(snapshot).iter().take(DRY_RUN_CAP) {
            let ip = match self.resolver.resolve(device).await {
                IpResolution::Resolved { ip, .. } => ip,
                IpResolution::Unresolved(reason) => {
                    report.skip(&device.name, SkipReason::Unresolved(reason));
                    continue;
                }
            };
            let Some(node) = monitored_node(target, device, ip, report) else {
                continue;
            };
            if let Some(device_report) = self.device_report(snapshot, node, device, ip, report).await {
                reports.push(device_report);
            }
        }

        reports
    }

    /// Locates `device` and builds its report, or records why it is skipped.
    async fn device_report(
        &mut self,
        snapshot: &SourceSnapshot,
        node: &MonitoredDevice,
        device: &SourceDevice,
        ip: IpAddr,
        report: &mut RunReport,
    ) -> Option<DeviceReport> {
        match self.geolocation.resolve(&device.serial, device.coordinates).await {
            Ok(location) => Some(DeviceReport::new(
                device,
                ip,
                snapshot.network_name(device),
                &location,
                node,
            )),
            Err(e) => {
                warn!("Could not locate {}, skipping: {e}", device.name);
                report.skip(&device.name, SkipReason::Geolocation(e.to_string()));
                None
            }
        }
    }
}

fn monitored_node<'t>(
    target: &'t TargetInventory,
    device: &SourceDevice,
    ip: IpAddr,
    report: &mut RunReport,
) -> Option<&'t MonitoredDevice> {
    let node = target.get(&ip);
    if node.is_none() {
        info!("{} ({ip}) is not monitored, skipping", device.name);
        report.skip(&device.name, SkipReason::NotMonitored(ip));
    }
    node
}
