//! View projection and change notification.
//!
//! Every observable field is projected to a value, a presentation bucket and
//! a display text. The [`ChangeNotifier`] compares snapshots around each
//! write and emits [`ViewEffect`]s for the fields that moved.

use live_types::{Field, StatusSnapshot};
use serde::Serialize;

use crate::connection::ConnectionState;
use crate::countdown::{CountdownDisplay, CountdownEffect, PulseToken, HIDDEN_PLACEHOLDER};

/// Full-scale raw RSSI reading.
pub const RSSI_FULL_SCALE: f64 = 4095.0;

/// Signal strength tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalLevel {
    /// Above 70%.
    Strong,
    /// Above 30%.
    Medium,
    /// Everything else.
    Weak,
}

/// Presentation bucket of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// Repeating, or a boolean that is on.
    Active,
    /// Idle states and unrecognized values.
    Standby,
    /// Locked, time-out reached.
    Error,
    /// Beacon or receive activity.
    Beacon,
    /// A boolean that is off, or an idle beacon.
    Inactive,
    /// Free text with no status meaning.
    Neutral,
    /// Signal meter.
    Signal(SignalLevel),
}

impl Bucket {
    /// CSS class the device page uses for this bucket.
    pub fn css_class(self) -> &'static str {
        match self {
            Bucket::Active => "status-active",
            Bucket::Standby => "status-standby",
            Bucket::Error => "status-error",
            Bucket::Beacon => "status-beacon",
            Bucket::Inactive => "status-inactive",
            Bucket::Neutral => "",
            Bucket::Signal(SignalLevel::Strong) => "signal-strong",
            Bucket::Signal(SignalLevel::Medium) => "signal-medium",
            Bucket::Signal(SignalLevel::Weak) => "signal-weak",
        }
    }
}

/// The value of one field, as the view sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// String field.
    Text(String),
    /// Boolean field.
    Flag(bool),
    /// Numeric reading.
    Level(i64),
    /// Countdown text and beacon flag.
    Countdown {
        /// `MM:SS` text.
        formatted: String,
        /// Beacon on air.
        active: bool,
    },
}

/// Read `field` out of `snapshot`.
pub fn field_value(snapshot: &StatusSnapshot, field: Field) -> FieldValue {
    match field {
        Field::RepeaterState => FieldValue::Text(snapshot.repeater_state.clone()),
        Field::CurrentMode => FieldValue::Text(snapshot.current_mode.clone()),
        Field::OperationState => FieldValue::Text(snapshot.operation_state.clone()),
        Field::CarrierDetect => FieldValue::Flag(snapshot.carrier_detect),
        Field::PttStatus => FieldValue::Flag(snapshot.ptt_status),
        Field::CourtesyEnabled => FieldValue::Flag(snapshot.courtesy_enabled),
        Field::TailToneEnabled => FieldValue::Flag(snapshot.tail_tone_enabled),
        Field::UserLockActive => FieldValue::Flag(snapshot.user_lock_active),
        Field::Rssi => FieldValue::Level(snapshot.rssi),
        Field::TotStatus => FieldValue::Text(snapshot.tot_status.clone()),
        Field::TotTime => FieldValue::Text(snapshot.tot_time.clone()),
        Field::BeaconStatus => FieldValue::Text(snapshot.beacon_status.clone()),
        Field::BeaconMessage => FieldValue::Text(snapshot.beacon_message.clone()),
        Field::BeaconIntervalFormatted => {
            FieldValue::Text(snapshot.beacon_interval_formatted.clone())
        }
        Field::BeaconCountdown => FieldValue::Countdown {
            formatted: snapshot.countdown.formatted.clone(),
            active: snapshot.countdown.active,
        },
    }
}

/// RSSI as a percentage of full scale, clamped to 0..=100.
pub fn rssi_percent(rssi: i64) -> f64 {
    (rssi as f64 / RSSI_FULL_SCALE * 100.0).clamp(0.0, 100.0)
}

/// Map a field value to its presentation bucket.
///
/// Tables match exact values; anything unrecognized lands in the field's
/// default bucket.
pub fn classify(field: Field, value: &FieldValue) -> Bucket {
    match (field, value) {
        (Field::RepeaterState, FieldValue::Text(s)) => match s.as_str() {
            "Repeating" | "REPEATING" => Bucket::Active,
            "Locked" | "LOCKED" => Bucket::Error,
            "Active" | "RECEIVING" => Bucket::Beacon,
            _ => Bucket::Standby,
        },
        (Field::OperationState, FieldValue::Text(s)) => match s.as_str() {
            "Repeating" => Bucket::Active,
            "ToT Reached" => Bucket::Error,
            "Sending Beacon" => Bucket::Beacon,
            _ => Bucket::Standby,
        },
        (Field::TotStatus, FieldValue::Text(s)) => match s.as_str() {
            "Reached" => Bucket::Error,
            _ => Bucket::Standby,
        },
        (Field::BeaconStatus, FieldValue::Text(s)) => match s.as_str() {
            "Sending" => Bucket::Beacon,
            _ => Bucket::Inactive,
        },
        (_, FieldValue::Flag(true)) => Bucket::Active,
        (_, FieldValue::Flag(false)) => Bucket::Inactive,
        (_, FieldValue::Level(rssi)) => {
            let percent = rssi_percent(*rssi);
            let level = if percent > 70.0 {
                SignalLevel::Strong
            } else if percent > 30.0 {
                SignalLevel::Medium
            } else {
                SignalLevel::Weak
            };
            Bucket::Signal(level)
        }
        (_, FieldValue::Countdown { active: true, .. }) => Bucket::Beacon,
        _ => Bucket::Neutral,
    }
}

/// Text to render for a field value.
pub fn display_text(field: Field, value: &FieldValue) -> String {
    match (field, value) {
        (Field::UserLockActive, FieldValue::Flag(locked)) => pick(*locked, "Locked", "Unlocked"),
        (Field::CourtesyEnabled | Field::TailToneEnabled, FieldValue::Flag(on)) => {
            pick(*on, "Enabled", "Disabled")
        }
        (_, FieldValue::Flag(on)) => pick(*on, "Active", "Inactive"),
        (_, FieldValue::Level(rssi)) => format!("{rssi} raw"),
        (Field::BeaconMessage, FieldValue::Text(s)) if s.is_empty() => "{CALLSIGN}".to_string(),
        (Field::BeaconIntervalFormatted, FieldValue::Text(s)) if s.is_empty() => {
            "00:00".to_string()
        }
        (_, FieldValue::Text(s)) => s.clone(),
        (_, FieldValue::Countdown { formatted, .. }) if formatted.is_empty() => {
            HIDDEN_PLACEHOLDER.to_string()
        }
        (_, FieldValue::Countdown { formatted, .. }) => formatted.clone(),
    }
}

fn pick(flag: bool, yes: &str, no: &str) -> String {
    let text = if flag { yes } else { no };
    text.to_string()
}

/// One projected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldView {
    /// Which field.
    pub field: Field,
    /// Its value.
    pub value: FieldValue,
    /// Its bucket.
    pub bucket: Bucket,
    /// Its display text.
    pub text: String,
}

/// Project every field of a snapshot, in display order.
pub fn project(snapshot: &StatusSnapshot) -> Vec<FieldView> {
    Field::ALL
        .iter()
        .map(|&field| {
            let value = field_value(snapshot, field);
            FieldView {
                field,
                bucket: classify(field, &value),
                text: display_text(field, &value),
                value,
            }
        })
        .collect()
}

/// A field whose value changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    /// Which field.
    pub field: Field,
    /// Value before.
    pub old: FieldValue,
    /// Value after.
    pub new: FieldValue,
    /// Bucket of the new value.
    pub bucket: Bucket,
    /// Display text of the new value.
    pub text: String,
}

/// Something the display must do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum ViewEffect {
    /// A field changed.
    Changed(FieldChange),
    /// Countdown repaint signal.
    Countdown(CountdownEffect),
    /// Push connection health.
    Health(ConnectionState),
}

/// Turns snapshot writes into view effects.
#[derive(Debug, Clone, Default)]
pub struct ChangeNotifier {
    countdown: CountdownDisplay,
}

impl ChangeNotifier {
    /// Fresh notifier; nothing displayed yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Effects for a write from `old` to `new` that assigned `touched`.
    ///
    /// Ordinary fields notify only when their value differs. The countdown
    /// notifies on every touch, so an unchanged repeat still pulses.
    pub fn notify(
        &mut self,
        old: &StatusSnapshot,
        new: &StatusSnapshot,
        touched: &[Field],
    ) -> Vec<ViewEffect> {
        let mut effects = Vec::new();

        for &field in touched {
            if field == Field::BeaconCountdown {
                let countdown = &new.countdown;
                if let Some(effect) = self
                    .countdown
                    .on_countdown(&countdown.formatted, countdown.active)
                {
                    effects.push(ViewEffect::Countdown(effect));
                }
                continue;
            }

            let before = field_value(old, field);
            let after = field_value(new, field);
            if before != after {
                effects.push(ViewEffect::Changed(FieldChange {
                    field,
                    bucket: classify(field, &after),
                    text: display_text(field, &after),
                    old: before,
                    new: after,
                }));
            }
        }

        effects
    }

    /// The pulse timer for `token` elapsed.
    pub fn pulse_finished(&mut self, token: PulseToken) -> Option<ViewEffect> {
        self.countdown.pulse_finished(token).map(ViewEffect::Countdown)
    }

    /// Countdown display state.
    pub fn countdown(&self) -> &CountdownDisplay {
        &self.countdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::StateMerger;
    use live_types::StatusDelta;

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    // =========================================================================
    // Classification
    // =========================================================================

    #[test]
    fn repeater_state_table() {
        let cases = [
            ("Repeating", Bucket::Active),
            ("REPEATING", Bucket::Active),
            ("Locked", Bucket::Error),
            ("LOCKED", Bucket::Error),
            ("Active", Bucket::Beacon),
            ("RECEIVING", Bucket::Beacon),
            ("Stand By", Bucket::Standby),
            ("Warming Up", Bucket::Standby),
        ];
        for (value, bucket) in cases {
            assert_eq!(classify(Field::RepeaterState, &text(value)), bucket, "{value}");
        }
    }

    #[test]
    fn operation_and_timer_tables() {
        assert_eq!(classify(Field::OperationState, &text("ToT Reached")), Bucket::Error);
        assert_eq!(
            classify(Field::OperationState, &text("Sending Beacon")),
            Bucket::Beacon
        );
        assert_eq!(classify(Field::TotStatus, &text("Reached")), Bucket::Error);
        assert_eq!(classify(Field::TotStatus, &text("Normal")), Bucket::Standby);
        assert_eq!(classify(Field::BeaconStatus, &text("Sending")), Bucket::Beacon);
        assert_eq!(classify(Field::BeaconStatus, &text("Idle")), Bucket::Inactive);
    }

    #[test]
    fn rssi_levels() {
        assert_eq!(
            classify(Field::Rssi, &FieldValue::Level(4000)),
            Bucket::Signal(SignalLevel::Strong)
        );
        assert_eq!(
            classify(Field::Rssi, &FieldValue::Level(2048)),
            Bucket::Signal(SignalLevel::Medium)
        );
        assert_eq!(
            classify(Field::Rssi, &FieldValue::Level(100)),
            Bucket::Signal(SignalLevel::Weak)
        );
        assert_eq!(rssi_percent(-20), 0.0);
        assert_eq!(rssi_percent(9000), 100.0);
    }

    #[test]
    fn display_texts() {
        assert_eq!(display_text(Field::PttStatus, &FieldValue::Flag(true)), "Active");
        assert_eq!(
            display_text(Field::CourtesyEnabled, &FieldValue::Flag(false)),
            "Disabled"
        );
        assert_eq!(
            display_text(Field::UserLockActive, &FieldValue::Flag(true)),
            "Locked"
        );
        assert_eq!(display_text(Field::Rssi, &FieldValue::Level(512)), "512 raw");
        assert_eq!(display_text(Field::BeaconMessage, &text("")), "{CALLSIGN}");
        assert_eq!(display_text(Field::BeaconIntervalFormatted, &text("")), "00:00");
        assert_eq!(
            display_text(
                Field::BeaconCountdown,
                &FieldValue::Countdown {
                    formatted: String::new(),
                    active: false
                }
            ),
            "--:--"
        );
    }

    #[test]
    fn projection_covers_every_field() {
        let views = project(&StatusSnapshot::default());
        assert_eq!(views.len(), Field::ALL.len());
        assert_eq!(views[0].field, Field::RepeaterState);
        assert_eq!(views[0].bucket, Bucket::Standby);
        assert_eq!(views[0].text, "Stand By");
    }

    // =========================================================================
    // Change notification
    // =========================================================================

    #[test]
    fn only_changed_fields_notify() {
        let mut merger = StateMerger::new();
        let mut notifier = ChangeNotifier::new();
        let delta = StatusDelta::from_json(r#"{"ptt": true, "carrier": false}"#).unwrap();

        let report = merger.merge_delta(&delta);
        let effects = notifier.notify(&report.previous, merger.snapshot(), &report.touched);

        assert_eq!(effects.len(), 1);
        match &effects[0] {
            ViewEffect::Changed(change) => {
                assert_eq!(change.field, Field::PttStatus);
                assert_eq!(change.old, FieldValue::Flag(false));
                assert_eq!(change.new, FieldValue::Flag(true));
                assert_eq!(change.bucket, Bucket::Active);
            }
            other => panic!("unexpected effect {other:?}"),
        }
    }

    #[test]
    fn countdown_repeats_pulse_through_notifier() {
        let mut merger = StateMerger::new();
        let mut notifier = ChangeNotifier::new();
        let mut effects = Vec::new();

        for text in ["01:30", "01:30", "01:29"] {
            let delta = StatusDelta {
                beacon_countdown_formatted: Some(text.to_string()),
                ..StatusDelta::default()
            };
            let report = merger.merge_delta(&delta);
            effects.extend(notifier.notify(&report.previous, merger.snapshot(), &report.touched));
        }

        assert!(matches!(
            effects[1],
            ViewEffect::Countdown(CountdownEffect::PulseStarted { .. })
        ));
        assert!(matches!(
            &effects[2],
            ViewEffect::Countdown(CountdownEffect::Updated { text, .. }) if text == "01:29"
        ));
        assert_eq!(effects.len(), 3);
    }

    #[test]
    fn pull_does_not_touch_countdown() {
        let mut merger = StateMerger::new();
        let mut notifier = ChangeNotifier::new();

        let report = merger.replace_all(StatusSnapshot::default());
        let effects = notifier.notify(&report.previous, merger.snapshot(), &report.touched);

        assert!(effects.is_empty());
        assert_eq!(notifier.countdown().last_displayed(), None);
    }

    #[test]
    fn effects_serialize_for_consumers() {
        let effect = ViewEffect::Health(ConnectionState::Connected);
        let json = serde_json::to_value(&effect).unwrap();
        assert_eq!(json["effect"], "health");
        assert_eq!(json["state"], "connected");
    }
}
