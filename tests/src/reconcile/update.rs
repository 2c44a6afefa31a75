use invsync_common::config::Mode;
use invsync_common::inventory::device::SourceDevice;
use invsync_common::inventory::node::NodeProperty;
use invsync_core::report::SkipReason;
use tempfile::TempDir;

use super::located;
use crate::fakes::{FakeGateway, FakeGeocoder, FakeSource, GatewayCall, ip, node, run, settings};

#[tokio::test]
async fn update_pushes_every_property_of_monitored_devices() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource::new(vec![located("Q2AA", "mx-a", "10.0.0.1")]).with_network("N_1", "Store 12");
    let gateway = FakeGateway::new(vec![node(5, "10.0.0.1", "mx-a")]);
    let geocoder = FakeGeocoder::ottawa();

    let report = run(Mode::Update, &source, &gateway, &geocoder, &dir.path().join("cache.csv"), settings()).await;

    assert_eq!(report.updated, 1);
    let written: Vec<(NodeProperty, String)> = gateway
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            GatewayCall::UpdateProperty { property, value, .. } => Some((property, value)),
            _ => None,
        })
        .collect();
    assert_eq!(
        written,
        vec![
            (NodeProperty::Caption, "mx-a".to_string()),
            (NodeProperty::Network, "Store 12".to_string()),
            (NodeProperty::Country, "Canada".to_string()),
            (NodeProperty::State, "Ontario".to_string()),
            (NodeProperty::City, "Ottawa".to_string()),
            (NodeProperty::Serial, "Q2AA".to_string()),
        ]
    );
}

#[tokio::test]
async fn update_never_adds_or_removes_nodes() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource::new(vec![
        located("Q2AA", "mx-a", "10.0.0.1"),
        SourceDevice::new("Q2BB", "mx-nowhere").with_lan_ip(ip("10.0.0.2")),
        located("Q2CC", "mx-c", "10.0.0.3"),
    ]);
    let gateway = FakeGateway::new(vec![node(5, "10.0.0.2", "mx-nowhere"), node(9, "10.0.0.9", "gone")]);
    let geocoder = FakeGeocoder::ottawa();

    let report = run(Mode::Update, &source, &gateway, &geocoder, &dir.path().join("cache.csv"), settings()).await;

    assert_eq!((report.added, report.updated, report.removed), (0, 0, 0));
    assert!(gateway.calls().is_empty());
    assert_eq!(gateway.nodes().len(), 2);

    let reasons: Vec<(&str, &SkipReason)> = report
        .skipped
        .iter()
        .map(|skipped| (skipped.name.as_str(), &skipped.reason))
        .collect();
    assert_eq!(reasons.len(), 3);
    assert_eq!(reasons[0], ("mx-a", &SkipReason::NotMonitored(ip("10.0.0.1"))));
    assert_eq!(reasons[1].0, "mx-nowhere");
    assert!(matches!(reasons[1].1, SkipReason::Geolocation(_)));
    assert_eq!(reasons[2], ("mx-c", &SkipReason::NotMonitored(ip("10.0.0.3"))));
}

#[tokio::test]
async fn update_skips_devices_the_geocoder_cannot_place() {
    let dir = TempDir::new().unwrap();
    let source = FakeSource::new(vec![located("Q2AA", "mx-a", "10.0.0.1")]);
    let gateway = FakeGateway::new(vec![node(5, "10.0.0.1", "mx-a")]);
    let geocoder = FakeGeocoder::unavailable();

    let report = run(Mode::Update, &source, &gateway, &geocoder, &dir.path().join("cache.csv"), settings()).await;

    assert_eq!(report.updated, 0);
    assert!(matches!(report.skipped[0].reason, SkipReason::Geolocation(_)));
    assert!(gateway.calls().is_empty());
    assert_eq!(geocoder.calls(), 1);
}
