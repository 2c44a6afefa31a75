use invsync_common::config::Mode;
use invsync_common::error::GatewayError;
use invsync_common::inventory::device::{SourceDevice, Vlan};
use invsync_common::inventory::node::{DEFAULT_POLLERS, MonitoredDevice, NodeProperty};
use invsync_core::ip_resolver::{ENTERPRISE_VLAN_NAME, UnresolvedReason};
use invsync_core::report::SkipReason;
use tempfile::TempDir;

use super::located;
use crate::fakes::{FakeGateway, FakeGeocoder, FakeSource, GatewayCall, ip, node, run, settings};

fn up_to_date_node() -> MonitoredDevice {
    let mut current = node(3, "10.0.0.2", "mx-b");
    current.custom.network = Some("Store 12".into());
    current.custom.serial = Some("Q2BB".into());
    current
}

#[tokio::test]
async fn add_creates_missing_nodes_and_removes_stale_ones() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource::new(vec![
        located("Q2AA", "mx-a", "10.0.0.1"),
        SourceDevice::new("Q2BB", "mx-b")
            .with_lan_ip(ip("10.0.0.2"))
            .with_network("N_1"),
    ])
    .with_network("N_1", "Store 12");
    let gateway = FakeGateway::new(vec![up_to_date_node(), node(9, "10.0.0.9", "gone")]);
    let geocoder = FakeGeocoder::ottawa();

    let report = run(Mode::Add, &source, &gateway, &geocoder, &dir.path().join("cache.csv"), settings()).await;

    assert_eq!((report.added, report.updated, report.removed), (1, 0, 1));
    assert!(report.is_clean(), "unexpected failures: {:?}", report.failures);

    let calls = gateway.calls();
    assert_eq!(calls[0], GatewayCall::CreateNode(ip("10.0.0.1")));

    let pollers: Vec<&GatewayCall> = calls
        .iter()
        .filter(|c| matches!(c, GatewayCall::CreatePoller { node_id: 10, .. }))
        .collect();
    assert_eq!(pollers.len(), DEFAULT_POLLERS.len());

    let created = gateway.node_at("10.0.0.1").unwrap();
    assert_eq!(created.caption, "mx-a");
    assert_eq!(created.custom.network.as_deref(), Some("Store 12"));
    assert_eq!(created.custom.country.as_deref(), Some("Canada"));
    assert_eq!(created.custom.state.as_deref(), Some("Ontario"));
    assert_eq!(created.custom.city.as_deref(), Some("Ottawa"));
    assert_eq!(created.custom.serial.as_deref(), Some("Q2AA"));

    assert_eq!(
        calls.last(),
        Some(&GatewayCall::DeleteNode("swis://orion/Orion/Orion.Nodes/NodeID=9".into()))
    );
    assert!(gateway.node_at("10.0.0.9").is_none());

    // mx-b is already up to date and has no coordinates
    assert!(!calls.iter().any(|c| matches!(c, GatewayCall::UpdateProperty { uri, .. } if uri.ends_with("NodeID=3"))));
    assert_eq!(geocoder.calls(), 1);
}

#[tokio::test]
async fn add_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("cache.csv");
    let source = FakeSource::new(vec![
        located("Q2AA", "mx-a", "10.0.0.1"),
        located("Q2CC", "mx-c", "10.0.0.3"),
    ])
    .with_network("N_1", "Store 12");
    let gateway = FakeGateway::new(vec![node(4, "10.0.0.3", "old caption"), node(9, "10.0.0.9", "gone")]);
    let geocoder = FakeGeocoder::ottawa();

    let first = run(Mode::Add, &source, &gateway, &geocoder, &cache_path, settings()).await;
    assert_eq!((first.added, first.updated, first.removed), (1, 1, 1));

    gateway.clear_calls();
    let second = run(Mode::Add, &source, &gateway, &geocoder, &cache_path, settings()).await;

    assert_eq!((second.added, second.updated, second.removed), (0, 0, 0));
    assert!(gateway.calls().is_empty(), "second run wrote: {:?}", gateway.calls());
    assert_eq!(geocoder.calls(), 2, "locations must come from the cache on the second run");
}

#[tokio::test]
async fn existing_node_only_gets_differing_properties() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource::new(vec![
        SourceDevice::new("Q2BB", "mx-b-renamed")
            .with_lan_ip(ip("10.0.0.2"))
            .with_network("N_1"),
    ])
    .with_network("N_1", "Store 12");
    let gateway = FakeGateway::new(vec![up_to_date_node()]);
    let geocoder = FakeGeocoder::ottawa();

    let report = run(Mode::Add, &source, &gateway, &geocoder, &dir.path().join("cache.csv"), settings()).await;

    assert_eq!(report.updated, 1);
    assert_eq!(
        gateway.calls(),
        vec![GatewayCall::UpdateProperty {
            uri: "swis://orion/Orion/Orion.Nodes/NodeID=3".into(),
            property: NodeProperty::Caption,
            value: "mx-b-renamed".into(),
        }]
    );
}

#[tokio::test]
async fn failed_property_write_does_not_stop_the_run() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource::new(vec![
        located("Q2AA", "mx-a", "10.0.0.1"),
        SourceDevice::new("Q2CC", "mx-c").with_lan_ip(ip("10.0.0.3")),
    ]);
    let mut stale_caption = node(4, "10.0.0.3", "old caption");
    stale_caption.custom.serial = Some("Q2CC".into());
    let gateway = FakeGateway::new(vec![stale_caption]).failing_property(NodeProperty::City);
    let geocoder = FakeGeocoder::ottawa();

    let report = run(Mode::Add, &source, &gateway, &geocoder, &dir.path().join("cache.csv"), settings()).await;

    assert_eq!(report.added, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        &report.failures[0],
        GatewayError::RemoteUpdate { property: NodeProperty::City, .. }
    ));

    let created = gateway.node_at("10.0.0.1").unwrap();
    assert_eq!(created.custom.city, None);
    assert_eq!(created.custom.serial.as_deref(), Some("Q2AA"));
    assert_eq!(gateway.node_at("10.0.0.3").unwrap().caption, "mx-c");
}

#[tokio::test]
async fn failed_create_skips_pollers_and_properties() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource::new(vec![
        located("Q2AA", "mx-a", "10.0.0.1"),
        located("Q2BB", "mx-b", "10.0.0.2"),
    ]);
    let gateway = FakeGateway::new(vec![]).failing_create(ip("10.0.0.1"));
    let geocoder = FakeGeocoder::ottawa();

    let report = run(Mode::Add, &source, &gateway, &geocoder, &dir.path().join("cache.csv"), settings()).await;

    assert_eq!(report.added, 1);
    assert!(matches!(&report.failures[..], [GatewayError::RemoteCreate { .. }]));
    assert!(gateway.node_at("10.0.0.1").is_none());
    assert!(gateway.node_at("10.0.0.2").is_some());

    let calls = gateway.calls();
    assert_eq!(calls[0], GatewayCall::CreateNode(ip("10.0.0.1")));
    assert_eq!(calls[1], GatewayCall::CreateNode(ip("10.0.0.2")));
}

#[tokio::test]
async fn unresolved_and_duplicate_devices_are_skipped() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource::new(vec![
        located("Q2AA", "mx-a", "10.0.0.1"),
        SourceDevice::new("Q2DD", "mx-orphan"),
        located("Q2EE", "mx-twin", "10.0.0.1"),
    ]);
    let gateway = FakeGateway::new(vec![]);
    let geocoder = FakeGeocoder::ottawa();

    let report = run(Mode::Add, &source, &gateway, &geocoder, &dir.path().join("cache.csv"), settings()).await;

    assert_eq!(report.devices_seen, 3);
    assert_eq!(report.added, 1);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.skipped[0].name, "mx-orphan");
    assert_eq!(report.skipped[0].reason, SkipReason::Unresolved(UnresolvedReason::NoNetwork));
    assert_eq!(report.skipped[1].name, "mx-twin");
    assert_eq!(report.skipped[1].reason, SkipReason::DuplicateIp(ip("10.0.0.1")));
    assert_eq!(gateway.node_at("10.0.0.1").unwrap().caption, "mx-a");
}

#[tokio::test]
async fn devices_without_lan_ip_are_added_on_their_vlan_address() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource::new(vec![SourceDevice::new("Q2AA", "mx-a").with_network("N_1")])
        .with_network("N_1", "Store 12")
        .with_vlans(
            "N_1",
            vec![
                Vlan::new("1", "Guest", Some(ip("192.168.1.1"))),
                Vlan::new("10", ENTERPRISE_VLAN_NAME, Some(ip("10.20.30.1"))),
            ],
        );
    let gateway = FakeGateway::new(vec![]);
    let geocoder = FakeGeocoder::ottawa();

    let report = run(Mode::Add, &source, &gateway, &geocoder, &dir.path().join("cache.csv"), settings()).await;

    assert_eq!(report.added, 1);
    assert_eq!(gateway.calls()[0], GatewayCall::CreateNode(ip("10.20.30.1")));
    assert_eq!(source.vlan_calls(), 1);
    // no coordinates, so no location properties either
    assert_eq!(geocoder.calls(), 0);
    assert_eq!(gateway.node_at("10.20.30.1").unwrap().custom.country, None);
}

#[tokio::test]
async fn limit_caps_the_devices_considered() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource::new(vec![
        located("Q2AA", "mx-a", "10.0.0.1"),
        located("Q2BB", "mx-b", "10.0.0.2"),
        located("Q2CC", "mx-c", "10.0.0.3"),
    ]);
    let gateway = FakeGateway::new(vec![]);
    let geocoder = FakeGeocoder::ottawa();
    let mut limited = settings();
    limited.limit = Some(2);

    let report = run(Mode::Add, &source, &gateway, &geocoder, &dir.path().join("cache.csv"), limited).await;

    assert_eq!(report.devices_seen, 2);
    assert_eq!(report.added, 2);
    assert!(gateway.node_at("10.0.0.3").is_none());
}

#[tokio::test]
async fn limited_run_keeps_nodes_of_devices_past_the_limit() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource::new(vec![
        located("Q2AA", "mx-a", "10.0.0.1"),
        located("Q2BB", "mx-b", "10.0.0.2"),
        located("Q2CC", "mx-c", "10.0.0.3"),
    ]);
    let gateway = FakeGateway::new(vec![node(7, "10.0.0.3", "mx-c"), node(9, "10.0.0.9", "gone")]);
    let geocoder = FakeGeocoder::ottawa();
    let mut limited = settings();
    limited.limit = Some(2);

    let report = run(Mode::Add, &source, &gateway, &geocoder, &dir.path().join("cache.csv"), limited).await;

    assert_eq!(report.added, 2);
    assert_eq!(report.removed, 0);
    assert!(gateway.node_at("10.0.0.3").is_some());
    assert!(gateway.node_at("10.0.0.9").is_some());
    assert!(!gateway.calls().iter().any(|c| matches!(c, GatewayCall::DeleteNode(_))));
}

#[tokio::test]
async fn limit_covering_every_device_still_removes_stale_nodes() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource::new(vec![located("Q2AA", "mx-a", "10.0.0.1")]);
    let gateway = FakeGateway::new(vec![node(9, "10.0.0.9", "gone")]);
    let geocoder = FakeGeocoder::ottawa();
    let mut limited = settings();
    limited.limit = Some(5);

    let report = run(Mode::Add, &source, &gateway, &geocoder, &dir.path().join("cache.csv"), limited).await;

    assert_eq!(report.removed, 1);
    assert!(gateway.node_at("10.0.0.9").is_none());
}

#[tokio::test]
async fn add_without_snmp_credentials_still_updates_existing_nodes() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource::new(vec![
        SourceDevice::new("Q2AA", "mx-a").with_lan_ip(ip("10.0.0.1")),
        SourceDevice::new("Q2BB", "mx-b-renamed")
            .with_lan_ip(ip("10.0.0.2"))
            .with_network("N_1"),
    ])
    .with_network("N_1", "Store 12");
    let gateway = FakeGateway::new(vec![up_to_date_node()]);
    let geocoder = FakeGeocoder::ottawa();
    let mut anonymous = settings();
    anonymous.snmp = None;

    let report = run(Mode::Add, &source, &gateway, &geocoder, &dir.path().join("cache.csv"), anonymous).await;

    assert_eq!((report.added, report.updated), (0, 1));
    assert_eq!(report.skipped[0].name, "mx-a");
    assert_eq!(report.skipped[0].reason, SkipReason::NoSnmpCredentials(ip("10.0.0.1")));
    assert!(!gateway.calls().iter().any(|c| matches!(c, GatewayCall::CreateNode(_))));
}
