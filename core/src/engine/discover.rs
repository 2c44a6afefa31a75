use invsync_common::inventory::action::ReconciliationAction;
use invsync_common::inventory::device::SourceSnapshot;
use invsync_common::inventory::discovery::DiscoveryRequest;
use invsync_common::inventory::node::TargetInventory;
use tracing::{error, info, warn};

use super::ReconciliationEngine;
use crate::report::RunReport;

/// Output of a `discover` pass: stale nodes to delete first, then the one discovery job.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryPlan {
    /// Nodes monitored over something other than SNMP whose address gets rediscovered.
    pub removals: Vec<ReconciliationAction>,
    pub request: DiscoveryRequest,
}

impl ReconciliationEngine<'_> {
    /// Plans a `discover` pass.
    ///
    /// Every resolved address that is not monitored, or not monitored over SNMP, is queued in a
    /// single [`DiscoveryRequest`]. Nodes of the second kind are removed first so discovery can
    /// import them again. Monitored addresses no device resolves to are only reported.
    pub async fn plan_discovery(
        &mut self,
        snapshot: &SourceSnapshot,
        target: &TargetInventory,
        report: &mut RunReport,
    ) -> DiscoveryPlan {
        let inventory = self.resolve_inventory(self.devices(snapshot), report).await;
        let mut request = DiscoveryRequest::new(&self.settings.discovery);
        let mut removals = Vec::new();

        for (&ip, _) in inventory.iter() {
            match target.get(&ip) {
                None => {
                    request.push(ip);
                }
                Some(node) if !node.uses_snmp() => {
                    info!(
                        "{} ({ip}) is monitored over {}, rediscovering it over SNMP",
                        node.caption, node.object_sub_type
                    );
                    removals.push(ReconciliationAction::Remove { target: node.node_ref() });
                    request.push(ip);
                }
                Some(_) => {}
            }
        }

        if !self.is_partial(snapshot) {
            report.decommission_candidates = target
                .iter()
                .filter(|node| !inventory.contains(&node.ip))
                .map(|node| node.node_ref())
                .collect();
        }
        if !report.decommission_candidates.is_empty() {
            info!(
                "{} monitored nodes have no matching device and were left in place",
                report.decommission_candidates.len()
            );
        }

        report.discovery_addresses = request.addresses().len();
        info!("Queued {} addresses for discovery", report.discovery_addresses);
        DiscoveryPlan { removals, request }
    }

    /// Submits the discovery job. Exactly one job is started per `discover` run.
    pub(super) async fn submit_discovery(&self, plan: DiscoveryPlan, report: &mut RunReport) {
        if plan.request.is_empty() {
            warn!("Discovery request is empty, starting the job anyway");
        }

        match self.gateway.submit_discovery(&plan.request).await {
            Ok(job) => {
                info!("Discovery job {} started", job.profile_id);
                report.discovery = Some(job);
            }
            Err(e) => {
                error!("{e}");
                report.fail(e);
            }
        }
    }
}
