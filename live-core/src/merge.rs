//! The single writer of the status snapshot.
//!
//! Precedence between the two channels is a contract, not an accident of
//! arrival order:
//!
//! - A push delta overwrites exactly the fields it carries.
//! - A pull `replace_all` overwrites every field the pull carries, reverting
//!   any push-written value for those fields.
//! - The countdown belongs to the push channel and survives `replace_all`.

use std::collections::BTreeMap;

use live_types::{Field, StatusDelta, StatusSnapshot};
use serde::Serialize;

/// Which channel last wrote a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Periodic full-state pull.
    Pull,
    /// Push delta.
    Push,
}

/// Result of a merge: what the snapshot was, and what was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// Snapshot before the write.
    pub previous: StatusSnapshot,
    /// Fields the write assigned (whether or not the value changed).
    pub touched: Vec<Field>,
    /// Channel that performed the write.
    pub source: Source,
}

impl MergeReport {
    /// Whether a field was assigned by this write.
    pub fn touched(&self, field: Field) -> bool {
        self.touched.contains(&field)
    }
}

/// Owns the canonical snapshot and the provenance of each field.
#[derive(Debug, Clone, Default)]
pub struct StateMerger {
    snapshot: StatusSnapshot,
    provenance: BTreeMap<Field, Source>,
}

impl StateMerger {
    /// Start from the conservative defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> &StatusSnapshot {
        &self.snapshot
    }

    /// Channel that last wrote `field`, if any has.
    pub fn last_writer(&self, field: Field) -> Option<Source> {
        self.provenance.get(&field).copied()
    }

    /// Overwrite every pull-carried field with `incoming`.
    ///
    /// `incoming` must already carry the derived fields; the countdown is
    /// taken from the current snapshot.
    pub fn replace_all(&mut self, mut incoming: StatusSnapshot) -> MergeReport {
        incoming.countdown = self.snapshot.countdown.clone();
        let previous = std::mem::replace(&mut self.snapshot, incoming);

        let touched: Vec<Field> = Field::ALL
            .iter()
            .copied()
            .filter(|f| *f != Field::BeaconCountdown)
            .collect();
        self.record(&touched, Source::Pull);

        MergeReport {
            previous,
            touched,
            source: Source::Pull,
        }
    }

    /// Overwrite only the fields present in `delta`.
    pub fn merge_delta(&mut self, delta: &StatusDelta) -> MergeReport {
        let previous = self.snapshot.clone();
        let mut touched = Vec::new();
        let snapshot = &mut self.snapshot;

        if let Some(rssi) = delta.rssi {
            snapshot.rssi = rssi;
            touched.push(Field::Rssi);
        }
        if let Some(carrier) = delta.carrier {
            snapshot.carrier_detect = carrier;
            touched.push(Field::CarrierDetect);
        }
        if let Some(ptt) = delta.ptt {
            snapshot.ptt_status = ptt;
            touched.push(Field::PttStatus);
        }
        if let Some(courtesy) = delta.courtesy_enabled {
            snapshot.courtesy_enabled = courtesy;
            touched.push(Field::CourtesyEnabled);
        }
        if let Some(state) = &delta.repeater_state {
            snapshot.repeater_state = state.clone();
            touched.push(Field::RepeaterState);
        }
        if let Some(message) = &delta.beacon_message {
            snapshot.beacon_message = message.clone();
            touched.push(Field::BeaconMessage);
        }
        if let Some(countdown) = &delta.beacon_countdown_formatted {
            snapshot.countdown.formatted = countdown.clone();
            snapshot.countdown.active = delta.beacon_on_air();
            touched.push(Field::BeaconCountdown);
        }

        self.record(&touched, Source::Push);

        MergeReport {
            previous,
            touched,
            source: Source::Push,
        }
    }

    fn record(&mut self, fields: &[Field], source: Source) {
        for field in fields {
            self.provenance.insert(*field, source);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(json: &str) -> StatusDelta {
        StatusDelta::from_json(json).unwrap()
    }

    fn pulled(state: &str) -> StatusSnapshot {
        StatusSnapshot {
            repeater_state: state.to_string(),
            rssi: 1200,
            ..StatusSnapshot::default()
        }
    }

    // =========================================================================
    // Delta merges
    // =========================================================================

    #[test]
    fn empty_delta_is_noop() {
        let mut merger = StateMerger::new();
        merger.replace_all(pulled("Repeating"));
        let before = merger.snapshot().clone();

        let report = merger.merge_delta(&StatusDelta::default());

        assert_eq!(merger.snapshot(), &before);
        assert!(report.touched.is_empty());
        assert_eq!(report.previous, before);
    }

    #[test]
    fn delta_only_touches_present_fields() {
        let mut merger = StateMerger::new();
        merger.replace_all(pulled("Repeating"));

        let report = merger.merge_delta(&delta(r#"{"ptt": true, "rssi": 3000}"#));

        assert_eq!(report.touched, vec![Field::Rssi, Field::PttStatus]);
        assert!(merger.snapshot().ptt_status);
        assert_eq!(merger.snapshot().rssi, 3000);
        assert_eq!(merger.snapshot().repeater_state, "Repeating");
    }

    #[test]
    fn disjoint_deltas_commute() {
        let a = delta(r#"{"carrier": true}"#);
        let b = delta(r#"{"repeaterState": "RECEIVING", "rssi": 900}"#);

        let mut first = StateMerger::new();
        first.merge_delta(&a);
        first.merge_delta(&b);

        let mut second = StateMerger::new();
        second.merge_delta(&b);
        second.merge_delta(&a);

        assert_eq!(first.snapshot(), second.snapshot());
    }

    #[test]
    fn countdown_active_follows_same_frame() {
        let mut merger = StateMerger::new();

        merger.merge_delta(&delta(
            r#"{"repeaterState": "BEACON", "beaconCountdownFormatted": "00:00"}"#,
        ));
        assert!(merger.snapshot().countdown.active);

        // Repeater state is still BEACON in the snapshot, but this frame
        // does not say so.
        merger.merge_delta(&delta(r#"{"beaconCountdownFormatted": "09:59"}"#));
        assert!(!merger.snapshot().countdown.active);
        assert_eq!(merger.snapshot().countdown.formatted, "09:59");
        assert_eq!(merger.snapshot().repeater_state, "BEACON");
    }

    // =========================================================================
    // Pull replacement and precedence
    // =========================================================================

    #[test]
    fn pull_wins_on_overlap() {
        let mut merger = StateMerger::new();
        merger.replace_all(pulled("Repeating"));
        merger.merge_delta(&delta(r#"{"repeaterState": "LOCKED"}"#));
        assert_eq!(merger.snapshot().repeater_state, "LOCKED");
        assert_eq!(
            merger.last_writer(Field::RepeaterState),
            Some(Source::Push)
        );

        let report = merger.replace_all(pulled("Repeating"));

        assert_eq!(merger.snapshot().repeater_state, "Repeating");
        assert_eq!(report.previous.repeater_state, "LOCKED");
        assert_eq!(
            merger.last_writer(Field::RepeaterState),
            Some(Source::Pull)
        );
    }

    #[test]
    fn replace_all_carries_countdown_forward() {
        let mut merger = StateMerger::new();
        merger.merge_delta(&delta(r#"{"beaconCountdownFormatted": "04:12"}"#));

        let report = merger.replace_all(pulled("Stand By"));

        assert_eq!(merger.snapshot().countdown.formatted, "04:12");
        assert!(!report.touched(Field::BeaconCountdown));
        assert_eq!(
            merger.last_writer(Field::BeaconCountdown),
            Some(Source::Push)
        );
    }

    #[test]
    fn replace_all_touches_every_pull_field() {
        let mut merger = StateMerger::new();
        let report = merger.replace_all(pulled("Stand By"));

        assert_eq!(report.touched.len(), Field::ALL.len() - 1);
        assert_eq!(report.source, Source::Pull);
    }

    #[test]
    fn no_writer_before_first_write() {
        let merger = StateMerger::new();
        assert_eq!(merger.last_writer(Field::Rssi), None);
    }

    #[test]
    fn snapshot_stays_complete_across_sequences() {
        let mut merger = StateMerger::new();
        let frames = [
            r#"{"rssi": "17"}"#,
            r#"{"carrier": "true", "ptt": "false"}"#,
            r#"{"beaconMessage": "YO3XYZ QRV"}"#,
            r#"{}"#,
            r#"{"unknownKey": 12}"#,
        ];
        for frame in frames {
            merger.merge_delta(&delta(frame));
        }
        merger.replace_all(StatusSnapshot::from_json("{}").unwrap());
        merger.merge_delta(&delta(r#"{"courtesyEnabled": false}"#));

        let snapshot = merger.snapshot();
        // Defaults survive where nothing wrote them
        assert_eq!(snapshot.tot_status, "Normal");
        assert_eq!(snapshot.beacon_status, "Idle");
        assert!(!snapshot.courtesy_enabled);
        // The pull reverted the push-written rssi
        assert_eq!(snapshot.rssi, 0);
    }
}
