use std::time::{Duration, Instant};

use anyhow::Context;
use colored::*;
use invsync_common::config::{Mode, SyncConfig};
use invsync_common::gateway::MonitoringGateway;
use invsync_common::inventory::device::SourceSnapshot;
use invsync_common::inventory::node::TargetInventory;
use invsync_common::source::InventorySource;
use invsync_core::cache::LocationCache;
use invsync_core::clients::{MerakiClient, NominatimClient, SwisClient};
use invsync_core::engine::{EngineSettings, ReconciliationEngine};
use invsync_core::report::RunReport;
use tracing::{info, warn};

use crate::iprint;
use crate::terminal::{colors, format, print, spinner};

struct Loaded {
    source: MerakiClient,
    gateway: SwisClient,
    snapshot: SourceSnapshot,
    target: TargetInventory,
}

/// Runs one reconciliation pass as configured.
pub async fn sync(config: SyncConfig) -> anyhow::Result<RunReport> {
    let start_time = Instant::now();
    let mut cache = LocationCache::load(&config.cache_path);
    info!("{} cached locations in {}", cache.len(), cache.path().display());

    let geocoder = NominatimClient::new(&config.geocoder).context("could not set up the geocoder")?;

    print::header("loading inventories");
    let loaded = load(&config).await;
    spinner::stop();
    let Loaded {
        source,
        gateway,
        snapshot,
        target,
    } = loaded?;
    info!(
        "Fetched {} devices in {} networks and {} monitored nodes",
        snapshot.devices.len(),
        snapshot.networks.len(),
        target.len()
    );

    print::header(&format!("{} run", config.mode));
    let mut engine = ReconciliationEngine::new(
        &source,
        &gateway,
        &mut cache,
        &geocoder,
        EngineSettings::from_config(&config),
    );
    let report = engine.run(config.mode, &snapshot, &target).await;

    print_report(config.mode, &report, start_time.elapsed());
    Ok(report)
}

async fn load(config: &SyncConfig) -> anyhow::Result<Loaded> {
    spinner::start("Connecting to the Meraki Dashboard...");
    let source = MerakiClient::connect(&config.meraki)
        .await
        .context("could not connect to the Meraki Dashboard")?;
    let gateway = SwisClient::new(&config.orion).context("could not set up the Orion client")?;

    spinner::set_message("Fetching devices...");
    let devices = source
        .list_devices(&config.filter)
        .await
        .context("could not list devices")?;

    spinner::set_message("Fetching networks...");
    let networks = source.list_networks().await.context("could not list networks")?;

    spinner::set_message("Fetching monitored nodes...");
    let target = gateway.list_nodes().await.context("could not list monitored nodes")?;

    Ok(Loaded {
        source,
        gateway,
        snapshot: SourceSnapshot::new(devices, networks),
        target,
    })
}

fn print_report(mode: Mode, report: &RunReport, total_time: Duration) {
    if mode == Mode::Dry {
        print_device_reports(report);
    }

    if !report.skipped.is_empty() {
        print::header("skipped devices");
        for skipped in &report.skipped {
            print::print_status(format!("{}: {}", skipped.name, skipped.reason));
        }
    }

    if !report.failures.is_empty() {
        print::header("failed calls");
        for failure in &report.failures {
            print::print_status(failure.to_string().color(colors::FAILURE).to_string());
        }
    }

    if let Some(job) = &report.discovery {
        print::print_status(format!(
            "Discovery profile {} started for {} addresses",
            job.profile_id.color(colors::ACCENT),
            report.discovery_addresses
        ));
    }
    if !report.decommission_candidates.is_empty() {
        warn!(
            "{} monitored nodes no longer match any device",
            report.decommission_candidates.len()
        );
    }

    print_summary(mode, report, total_time);
}

fn print_device_reports(report: &RunReport) {
    if report.reports.is_empty() {
        print::print_status("No monitored device could be resolved");
        return;
    }

    for (idx, device_report) in report.reports.iter().enumerate() {
        print::tree_head(idx, &device_report.name);
        print::as_tree_one_level(format::device_report_details(device_report));
        if idx + 1 != report.reports.len() {
            iprint!();
        }
    }
}

fn print_summary(mode: Mode, report: &RunReport, total_time: Duration) {
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let outcome: String = match mode {
        Mode::Dry => format!("{} devices reported", report.reports.len()),
        Mode::Discover => format!("{} addresses queued", report.discovery_addresses),
        Mode::Add | Mode::Update => format!(
            "{} added, {} updated, {} removed",
            report.added, report.updated, report.removed
        ),
    };
    let failures: ColoredString = match report.failures.len() {
        0 => "no failures".green(),
        n => format!("{n} failed calls").color(colors::WARNING).bold(),
    };

    let output: ColoredString = format!(
        "{} in {total_time}: {}, {} skipped, {failures}",
        "Run complete".bold().green(),
        outcome,
        report.skipped.len()
    )
    .color(colors::TEXT_DEFAULT);

    print::fat_separator();
    print::centerln(&output.to_string());
}
