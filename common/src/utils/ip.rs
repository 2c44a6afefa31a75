use std::net::{IpAddr, Ipv4Addr};

use pnet::ipnetwork::Ipv4Network;

/// Returns `true` when `ip` is an IPv4 address inside `10.0.0.0/8`.
pub fn is_private_class_a(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4_addr) => Ipv4Network::new(Ipv4Addr::new(10, 0, 0, 0), 8)
            .map(|net| net.contains(*ipv4_addr))
            .unwrap_or(false),
        IpAddr::V6(_) => false,
    }
}

/// Lenient address parser for vendor payloads, which send `""` or `null` for "no address".
pub fn parse_optional_ip(raw: Option<&str>) -> Option<IpAddr> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<IpAddr>().ok())
}
