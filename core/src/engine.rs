//! # Reconciliation Engine
//!
//! Matches source devices against monitored nodes by IP and turns the differences into
//! [`ReconciliationAction`]s. Each mode lives in its own submodule and is split in two halves:
//! a `plan_*` step that only reads (IP and location resolution may still hit the source API,
//! the geocoder and the location cache), and [`ReconciliationEngine::apply`], which maps every
//! action onto gateway calls.
//!
//! Everything runs sequentially in source order. No failure of a single device, node or
//! property aborts the pass; they all end up in the [`RunReport`].

use invsync_common::config::{DiscoverySettings, Mode, SnmpCredentials, SyncConfig};
use invsync_common::gateway::MonitoringGateway;
use invsync_common::geocoder::ReverseGeocoder;
use invsync_common::inventory::action::ReconciliationAction;
use invsync_common::inventory::device::{SourceDevice, SourceInventory, SourceSnapshot};
use invsync_common::inventory::node::TargetInventory;
use invsync_common::source::InventorySource;
use tracing::{debug, info, warn};

use crate::cache::LocationCache;
use crate::geolocation::GeolocationResolver;
use crate::ip_resolver::{IpResolution, IpResolver};
use crate::report::{RunReport, SkipReason};

mod add;
mod apply;
mod discover;
mod update;

pub use discover::DiscoveryPlan;

/// Dry runs stop after this many source devices, resolved or not.
pub const DRY_RUN_CAP: usize = 11;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Credentials of the nodes created in `add` mode.
    pub snmp: Option<SnmpCredentials>,
    pub limit: Option<usize>,
    pub discovery: DiscoverySettings,
    /// Polling engine new nodes are assigned to.
    pub engine_id: u32,
}

impl EngineSettings {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            snmp: config.snmp.clone(),
            limit: config.limit,
            discovery: config.discovery.clone(),
            engine_id: config.orion.engine_id,
        }
    }
}

pub struct ReconciliationEngine<'a> {
    resolver: IpResolver<'a>,
    geolocation: GeolocationResolver<'a>,
    gateway: &'a dyn MonitoringGateway,
    settings: EngineSettings,
}

impl<'a> ReconciliationEngine<'a> {
    pub fn new(
        source: &'a dyn InventorySource,
        gateway: &'a dyn MonitoringGateway,
        cache: &'a mut LocationCache,
        geocoder: &'a dyn ReverseGeocoder,
        settings: EngineSettings,
    ) -> Self {
        Self {
            resolver: IpResolver::new(source),
            geolocation: GeolocationResolver::new(cache, geocoder),
            gateway,
            settings,
        }
    }

    /// Runs one full pass of `mode` over the fetched snapshots.
    pub async fn run(&mut self, mode: Mode, snapshot: &SourceSnapshot, target: &TargetInventory) -> RunReport {
        let mut report = RunReport::new();
        report.devices_seen = self.devices(snapshot).len();
        info!(
            "Reconciling {} devices against {} monitored nodes ({mode} mode)",
            report.devices_seen,
            target.len()
        );

        match mode {
            Mode::Add => {
                let actions = self.plan_add(snapshot, target, &mut report).await;
                self.apply(&actions, &mut report).await;
            }
            Mode::Discover => {
                let plan = self.plan_discovery(snapshot, target, &mut report).await;
                self.apply(&plan.removals, &mut report).await;
                self.submit_discovery(plan, &mut report).await;
            }
            Mode::Update => {
                let actions = self.plan_update(snapshot, target, &mut report).await;
                self.apply(&actions, &mut report).await;
            }
            Mode::Dry => {
                report.reports = self.dry_run(snapshot, target, &mut report).await;
            }
        }

        report
    }

    /// Source devices this run looks at, after `limit`.
    fn devices<'s>(&self, snapshot: &'s SourceSnapshot) -> &'s [SourceDevice] {
        let count = self
            .settings
            .limit
            .map_or(snapshot.devices.len(), |limit| limit.min(snapshot.devices.len()));
        &snapshot.devices[..count]
    }

    /// Whether `limit` leaves some source devices out of this run.
    fn is_partial(&self, snapshot: &SourceSnapshot) -> bool {
        self.devices(snapshot).len() < snapshot.devices.len()
    }

    /// Resolves every device's IP into the source mapping.
    ///
    /// Unresolved devices are skipped. When two devices resolve to the same IP the first one
    /// keeps it.
    async fn resolve_inventory(&self, devices: &[SourceDevice], report: &mut RunReport) -> SourceInventory {
        let mut inventory = SourceInventory::new();
        for device in devices {
            match self.resolver.resolve(device).await {
                IpResolution::Resolved { ip, origin } => {
                    debug!("{} resolved to {ip} ({origin:?})", device.name);
                    if !inventory.insert(ip, device.clone()) {
                        warn!("{} resolves to {ip}, which is already taken by another device", device.name);
                        report.skip(&device.name, SkipReason::DuplicateIp(ip));
                    }
                }
                IpResolution::Unresolved(reason) => report.skip(&device.name, SkipReason::Unresolved(reason)),
            }
        }
        inventory
    }
}

/// Shorthand used by the planners.
fn count_kind(actions: &[ReconciliationAction], kind: &str) -> usize {
    actions.iter().filter(|action| action.kind() == kind).count()
}
