//! Names of the observable snapshot fields.

use serde::{Serialize, Serializer};
use std::fmt;

/// An observable field of [`StatusSnapshot`](crate::StatusSnapshot).
///
/// The name of each field is its wire key on the pull endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// Repeater state (open set of strings)
    RepeaterState,
    /// Current operating mode
    CurrentMode,
    /// Operation state (independent of repeater state)
    OperationState,
    /// Carrier detect line
    CarrierDetect,
    /// PTT line
    PttStatus,
    /// Courtesy tone enabled
    CourtesyEnabled,
    /// Tail tone enabled
    TailToneEnabled,
    /// User lock active
    UserLockActive,
    /// Raw RSSI reading
    Rssi,
    /// Time-out timer status
    TotStatus,
    /// Time-out timer elapsed time
    TotTime,
    /// Beacon status
    BeaconStatus,
    /// Composed beacon message
    BeaconMessage,
    /// Beacon interval as `M:SS`
    BeaconIntervalFormatted,
    /// Beacon countdown text and active flag
    BeaconCountdown,
}

impl Field {
    /// Every field, in display order.
    pub const ALL: [Field; 15] = [
        Field::RepeaterState,
        Field::CurrentMode,
        Field::OperationState,
        Field::CarrierDetect,
        Field::PttStatus,
        Field::CourtesyEnabled,
        Field::TailToneEnabled,
        Field::UserLockActive,
        Field::Rssi,
        Field::TotStatus,
        Field::TotTime,
        Field::BeaconStatus,
        Field::BeaconMessage,
        Field::BeaconIntervalFormatted,
        Field::BeaconCountdown,
    ];

    /// Wire name of the field.
    pub fn name(self) -> &'static str {
        match self {
            Field::RepeaterState => "repeaterState",
            Field::CurrentMode => "currentMode",
            Field::OperationState => "operationState",
            Field::CarrierDetect => "carrierDetect",
            Field::PttStatus => "pttStatus",
            Field::CourtesyEnabled => "courtesyEnabled",
            Field::TailToneEnabled => "tailToneEnabled",
            Field::UserLockActive => "userLockActive",
            Field::Rssi => "rssi",
            Field::TotStatus => "totStatus",
            Field::TotTime => "totTime",
            Field::BeaconStatus => "beaconStatus",
            Field::BeaconMessage => "beaconMessage",
            Field::BeaconIntervalFormatted => "beaconIntervalFormatted",
            Field::BeaconCountdown => "beaconCountdownFormatted",
        }
    }

    /// Look a field up by wire name.
    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.iter().copied().find(|f| f.name() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique() {
        let names: HashSet<_> = Field::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(names.len(), Field::ALL.len());
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(Field::from_name("rssi"), Some(Field::Rssi));
        assert_eq!(
            Field::from_name("beaconCountdownFormatted"),
            Some(Field::BeaconCountdown)
        );
        assert_eq!(Field::from_name("RSSI"), None);
    }

    #[test]
    fn display_uses_wire_name() {
        assert_eq!(Field::PttStatus.to_string(), "pttStatus");
    }
}
