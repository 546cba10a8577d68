//! Preference fetch and update bodies.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{flex, WireError};

/// Preferences returned by `GET /api/preferences`.
///
/// None of these travel on the push channel; the pull cycle derives the
/// beacon message, interval text and tone flags from them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Courtesy tone enabled.
    #[serde(rename = "CourtesyEnable", deserialize_with = "flex::bool_lenient")]
    pub courtesy_enable: bool,
    /// Tail tone enabled.
    #[serde(rename = "TailToneEnable", deserialize_with = "flex::bool_lenient")]
    pub tail_tone_enable: bool,
    /// User lock active.
    #[serde(rename = "userLockActive", deserialize_with = "flex::bool_lenient")]
    pub user_lock_active: bool,
    /// Station callsign.
    #[serde(rename = "Callsign", deserialize_with = "flex::string_lenient")]
    pub callsign: String,
    /// Beacon end message while locked.
    #[serde(
        rename = "BeaconEndMessageLocked",
        deserialize_with = "flex::string_lenient"
    )]
    pub end_message_locked: String,
    /// Beacon end message while active.
    #[serde(
        rename = "BeaconEndMessageActive",
        deserialize_with = "flex::string_lenient"
    )]
    pub end_message_active: String,
    /// Beacon interval in minutes, possibly fractional.
    #[serde(rename = "BeacInterval", deserialize_with = "flex::f64_lenient")]
    pub beacon_interval_minutes: f64,
}

impl Preferences {
    /// Decode a preferences response body.
    pub fn from_json(text: &str) -> Result<Self, WireError> {
        flex::decode_object(text)
    }
}

/// Body of `POST /api/preferences/update`: any subset of preference keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PreferenceUpdate {
    fields: Map<String, Value>,
}

impl PreferenceUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a preference key, replacing any earlier value for it.
    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Parse a `KEY=VALUE` assignment.
    ///
    /// `true`/`false` become booleans and numbers become numbers; everything
    /// else is sent as a string.
    pub fn parse_assignment(assignment: &str) -> Result<(String, Value), WireError> {
        let (key, raw) = assignment
            .split_once('=')
            .ok_or_else(|| WireError::InvalidAssignment(assignment.to_string()))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(WireError::InvalidAssignment(assignment.to_string()));
        }

        let raw = raw.trim();
        let value = match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => match serde_json::from_str::<serde_json::Number>(raw) {
                Ok(n) => Value::Number(n),
                Err(_) => Value::String(raw.to_string()),
            },
        };
        Ok((key.to_string(), value))
    }

    /// Build an update from `KEY=VALUE` assignments.
    pub fn from_assignments<I, S>(assignments: I) -> Result<Self, WireError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut update = Self::new();
        for assignment in assignments {
            let (key, value) = Self::parse_assignment(assignment.as_ref())?;
            update.fields.insert(key, value);
        }
        Ok(update)
    }

    /// True when no key is set.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Keys set on this update.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}
