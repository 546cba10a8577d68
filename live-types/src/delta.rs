//! Sparse status updates carried by push frames.

use serde::{Deserialize, Serialize};

use crate::{flex, WireError};

/// A push frame: any subset of the live status fields.
///
/// A key absent from the frame is `None` and must leave the snapshot
/// untouched. Keys the engine does not know are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDelta {
    /// Raw RSSI reading.
    #[serde(
        default,
        deserialize_with = "flex::opt_rssi_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub rssi: Option<i64>,
    /// Carrier detect line.
    #[serde(
        default,
        deserialize_with = "flex::opt_bool_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub carrier: Option<bool>,
    /// PTT line.
    #[serde(
        default,
        deserialize_with = "flex::opt_bool_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub ptt: Option<bool>,
    /// Courtesy tone enabled.
    #[serde(
        default,
        deserialize_with = "flex::opt_bool_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub courtesy_enabled: Option<bool>,
    /// Repeater state.
    #[serde(
        default,
        deserialize_with = "flex::opt_string_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub repeater_state: Option<String>,
    /// Beacon message.
    #[serde(
        default,
        deserialize_with = "flex::opt_string_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub beacon_message: Option<String>,
    /// Beacon countdown text.
    #[serde(
        default,
        deserialize_with = "flex::opt_string_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub beacon_countdown_formatted: Option<String>,
}

/// Repeater state the firmware reports while a beacon is on air.
pub const BEACON_STATE: &str = "BEACON";

impl StatusDelta {
    /// Decode a push frame.
    pub fn from_json(text: &str) -> Result<Self, WireError> {
        flex::decode_object(text)
    }

    /// True when the frame carries no known field.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether the same frame reports a beacon on air.
    ///
    /// The countdown's active flag is derived per frame from this, not from
    /// the snapshot's repeater state.
    pub fn beacon_on_air(&self) -> bool {
        self.repeater_state.as_deref() == Some(BEACON_STATE)
    }
}
