//! # invsync common
//!
//! Shared vocabulary of the workspace.
//!
//! * **[`inventory`]**: the entities on both sides of a reconciliation (source devices,
//!   monitored nodes, locations, actions).
//! * **[`config`]**: the merged run configuration and the optional TOML file layer.
//! * **[`error`]**: the recoverable error taxonomy shared by ports and adapters.
//! * **[`source`]**, **[`gateway`]**, **[`geocoder`]**: the port traits the engine depends on.
//!   Concrete HTTP implementations live in `invsync-core`.

pub mod config;
pub mod error;
pub mod gateway;
pub mod geocoder;
pub mod inventory;
pub mod source;
pub mod utils;
