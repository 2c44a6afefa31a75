//! # invsync core
//!
//! The reconciliation use cases and the infrastructure behind them.
//!
//! * **[`cache`]**: the append-only location cache.
//! * **[`ip_resolver`]**: picks the monitoring IP of a source device.
//! * **[`geolocation`]**: cache-first reverse geocoding.
//! * **[`engine`]**: plans and applies the actions of a run.
//! * **[`clients`]**: HTTP implementations of the `invsync-common` ports.

pub mod cache;
pub mod clients;
pub mod engine;
pub mod geolocation;
pub mod ip_resolver;
pub mod report;
