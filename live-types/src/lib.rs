//! # live-types
//!
//! Wire format types for the repeater live status protocol.
//!
//! This crate provides the foundational types shared by the live sync crates:
//! - [`StatusSnapshot`] - The complete device status record (pull endpoint)
//! - [`StatusDelta`] - Sparse updates carried by push frames
//! - [`Preferences`] / [`PreferenceUpdate`] - Preference fetch and update bodies
//! - [`SystemInfo`] - Header banner information
//! - [`Field`] - Names of the observable snapshot fields
//! - [`WireError`] - Decoding errors
//!
//! The firmware is loose about value types (booleans arrive as `true` or
//! `"true"`, RSSI as `1234` or `"1234 raw"`), so decoding is lenient where
//! the device is known to vary and strict about the payload being an object.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod delta;
mod error;
mod field;
pub mod flex;
mod preferences;
mod snapshot;
mod system_info;

pub use delta::{StatusDelta, BEACON_STATE};
pub use error::WireError;
pub use field::Field;
pub use preferences::{PreferenceUpdate, Preferences};
pub use snapshot::{BeaconCountdown, StatusSnapshot};
pub use system_info::SystemInfo;
