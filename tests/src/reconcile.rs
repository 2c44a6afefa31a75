#![cfg(test)]
mod add;
mod update;

use invsync_common::inventory::device::SourceDevice;

use crate::fakes::ip;

/// A device with a LAN address, attached to network `N_1`, at fixed coordinates.
fn located(serial: &str, name: &str, addr: &str) -> SourceDevice {
    SourceDevice::new(serial, name)
        .with_lan_ip(ip(addr))
        .with_network("N_1")
        .with_coordinates(45.42, -75.69)
}
