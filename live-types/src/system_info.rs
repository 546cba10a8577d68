//! Header banner information from `GET /api/system-info`.

use serde::{Deserialize, Serialize};

use crate::{flex, WireError};

/// Callsign, firmware version and status banner.
///
/// Not part of the status snapshot; shown alongside it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemInfo {
    /// Station callsign.
    #[serde(deserialize_with = "flex::string_lenient")]
    pub callsign: String,
    /// Firmware version.
    #[serde(deserialize_with = "flex::string_lenient")]
    pub version: String,
    /// Status banner text.
    #[serde(deserialize_with = "flex::string_lenient")]
    pub status: String,
    /// Presentation class of the banner.
    #[serde(deserialize_with = "flex::string_lenient")]
    pub status_class: String,
}

impl SystemInfo {
    /// Decode a system info response body.
    pub fn from_json(text: &str) -> Result<Self, WireError> {
        flex::decode_object(text)
    }

    /// Placeholder shown when the endpoint is unreachable.
    pub fn fallback() -> Self {
        Self {
            callsign: "{CALLSIGN}".to_string(),
            version: "unknown".to_string(),
            status: String::new(),
            status_class: String::new(),
        }
    }

    /// The banner is only shown when both text and class are present.
    pub fn has_banner(&self) -> bool {
        !self.status.is_empty() && !self.status_class.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_banner() {
        let info = SystemInfo::from_json(
            r#"{"callsign": "YO3XYZ", "version": "2.0.0", "status": "Online", "statusClass": "ok"}"#,
        )
        .unwrap();
        assert_eq!(info.callsign, "YO3XYZ");
        assert_eq!(info.status_class, "ok");
        assert!(info.has_banner());
    }

    #[test]
    fn banner_needs_class() {
        let info = SystemInfo::from_json(r#"{"status": "Online"}"#).unwrap();
        assert!(!info.has_banner());
    }
}
