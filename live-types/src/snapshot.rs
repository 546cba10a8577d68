//! The canonical device status record.

use serde::{Deserialize, Serialize};

use crate::{flex, WireError};

/// Complete status of the repeater controller.
///
/// Decoding never produces a partial record: every key missing from the pull
/// response takes its conservative default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusSnapshot {
    /// Repeater state. Open set; unknown values are kept verbatim.
    #[serde(deserialize_with = "flex::string_lenient")]
    pub repeater_state: String,
    /// Current operating mode (e.g. `Carrier`).
    #[serde(deserialize_with = "flex::string_lenient")]
    pub current_mode: String,
    /// Operation state, a display axis independent of `repeater_state`.
    #[serde(deserialize_with = "flex::string_lenient")]
    pub operation_state: String,
    /// Carrier detect line.
    #[serde(deserialize_with = "flex::bool_lenient")]
    pub carrier_detect: bool,
    /// PTT line.
    #[serde(deserialize_with = "flex::bool_lenient")]
    pub ptt_status: bool,
    /// Courtesy tone enabled.
    #[serde(deserialize_with = "flex::bool_lenient")]
    pub courtesy_enabled: bool,
    /// Tail tone enabled.
    #[serde(deserialize_with = "flex::bool_lenient")]
    pub tail_tone_enabled: bool,
    /// User lock active.
    #[serde(deserialize_with = "flex::bool_lenient")]
    pub user_lock_active: bool,
    /// Raw RSSI in ADC units (nominal 0..4095).
    ///
    /// An unreadable value (`""`, `null`, `"n/a"`) reads as 0 so the rest
    /// of the pull still lands; push frames stay strict.
    #[serde(alias = "rssiValue", deserialize_with = "flex::rssi_or_zero")]
    pub rssi: i64,
    /// Time-out timer status (`Normal` or `Reached`).
    #[serde(deserialize_with = "flex::string_lenient")]
    pub tot_status: String,
    /// Time-out timer elapsed time, possibly empty.
    #[serde(deserialize_with = "flex::string_lenient")]
    pub tot_time: String,
    /// Beacon status (`Idle` or `Sending`).
    #[serde(deserialize_with = "flex::string_lenient")]
    pub beacon_status: String,
    /// Callsign plus the end message for the current lock state.
    #[serde(deserialize_with = "flex::string_lenient")]
    pub beacon_message: String,
    /// Beacon interval as `M:SS`.
    #[serde(deserialize_with = "flex::string_lenient")]
    pub beacon_interval_formatted: String,
    /// Beacon countdown. Only the push channel carries it.
    #[serde(skip)]
    pub countdown: BeaconCountdown,
}

/// Beacon countdown as last reported by the push channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeaconCountdown {
    /// Countdown text (`MM:SS`), empty until first reported.
    pub formatted: String,
    /// Whether a beacon is being transmitted right now.
    pub active: bool,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            repeater_state: "Stand By".to_string(),
            current_mode: "Carrier".to_string(),
            operation_state: "Stand By".to_string(),
            carrier_detect: false,
            ptt_status: false,
            courtesy_enabled: true,
            tail_tone_enabled: true,
            user_lock_active: false,
            rssi: 0,
            tot_status: "Normal".to_string(),
            tot_time: String::new(),
            beacon_status: "Idle".to_string(),
            beacon_message: String::new(),
            beacon_interval_formatted: "0:00".to_string(),
            countdown: BeaconCountdown::default(),
        }
    }
}

impl StatusSnapshot {
    /// Decode a pull response body.
    pub fn from_json(text: &str) -> Result<Self, WireError> {
        flex::decode_object(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let snapshot = StatusSnapshot::from_json("{}").unwrap();
        assert_eq!(snapshot, StatusSnapshot::default());
    }

    #[test]
    fn decodes_firmware_response() {
        let body = r#"{
            "repeaterState": "Repeating",
            "currentMode": "Carrier",
            "operationState": "Repeating",
            "totStatus": "Normal",
            "totTime": "",
            "beaconStatus": "Idle",
            "rssiValue": "2048 raw",
            "carrierDetect": true,
            "pttStatus": "true",
            "courtesyEnabled": "false",
            "tailToneEnabled": true
        }"#;

        let snapshot = StatusSnapshot::from_json(body).unwrap();
        assert_eq!(snapshot.repeater_state, "Repeating");
        assert_eq!(snapshot.rssi, 2048);
        assert!(snapshot.carrier_detect);
        assert!(snapshot.ptt_status);
        assert!(!snapshot.courtesy_enabled);
        assert!(snapshot.tail_tone_enabled);
        // Missing keys keep their defaults
        assert_eq!(snapshot.beacon_interval_formatted, "0:00");
    }

    #[test]
    fn numeric_rssi_accepted() {
        let snapshot = StatusSnapshot::from_json(r#"{"rssi": 77}"#).unwrap();
        assert_eq!(snapshot.rssi, 77);
    }

    #[test]
    fn unknown_state_kept_verbatim() {
        let snapshot = StatusSnapshot::from_json(r#"{"repeaterState": "Warming Up"}"#).unwrap();
        assert_eq!(snapshot.repeater_state, "Warming Up");
    }

    #[test]
    fn countdown_is_never_read_from_pull() {
        let body = r#"{"countdown": {"formatted": "01:00", "active": true}}"#;
        let snapshot = StatusSnapshot::from_json(body).unwrap();
        assert_eq!(snapshot.countdown, BeaconCountdown::default());
    }

    #[test]
    fn unreadable_rssi_reads_as_zero() {
        for raw in [r#""""#, "null", r#""n/a""#] {
            let body = format!(r#"{{"repeaterState": "Repeating", "pttStatus": true, "rssiValue": {raw}}}"#);
            let snapshot = StatusSnapshot::from_json(&body).unwrap();
            assert_eq!(snapshot.rssi, 0, "rssiValue {raw}");
            assert_eq!(snapshot.repeater_state, "Repeating");
            assert!(snapshot.ptt_status);
        }
    }

    #[test]
    fn non_object_is_rejected() {
        let result = StatusSnapshot::from_json(r#""Repeating""#);
        assert!(matches!(result, Err(WireError::NotAnObject("string"))));
    }
}
