//! # Inventory Models
//!
//! The entities on both sides of a reconciliation.
//!
//! * [`device::SourceDevice`]: a device as the cloud management API reports it.
//! * [`node::MonitoredDevice`]: a node as the monitoring platform stores it.
//! * [`location::LocationRecord`]: a cached reverse-geocoding result.
//! * [`action::ReconciliationAction`]: one change to push to the monitoring platform.
//! * [`discovery::DiscoveryRequest`]: the single bulk-discovery job of a run.
//!
//! Both inventories are snapshots: fetched once at startup and never refreshed mid-run.

pub mod action;
pub mod device;
pub mod discovery;
pub mod location;
pub mod node;
