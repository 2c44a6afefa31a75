use colored::*;
use invsync_common::inventory::action::DeviceReport;

use crate::terminal::colors;

type Detail = (String, ColoredString);

fn detail(key: &str, value: ColoredString) -> Detail {
    (key.to_string(), value)
}

/// Everything a dry run shows about one device, in display order.
pub fn device_report_details(report: &DeviceReport) -> Vec<Detail> {
    let mut details: Vec<Detail> = vec![
        detail("Serial", report.serial.normal()),
        detail("IPv4", report.ip.to_string().color(colors::IPV4_ADDR)),
    ];

    if let Some(mac) = report.mac {
        details.push(detail("MAC", mac.to_string().color(colors::MAC_ADDR)));
    }
    if !report.model.is_empty() {
        details.push(detail("Model", report.model.normal()));
    }
    details.push(detail(
        "Network",
        match &report.network {
            Some(network) => network.normal(),
            None => "unknown".dimmed(),
        },
    ));

    details.push(detail("Coords", report.coordinates.to_string().color(colors::LOCATION)));
    details.push(detail("City", report.city.color(colors::LOCATION)));
    details.push(detail("State", report.state.color(colors::LOCATION)));
    details.push(detail("Country", report.country.color(colors::LOCATION)));
    details.push(detail("Address", report.address.dimmed()));
    details.push(detail("Node", report.uri.color(colors::ACCENT)));
    details
}
