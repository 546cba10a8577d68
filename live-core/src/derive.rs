//! Fields the pull cycle derives from preferences.

use live_types::{Preferences, StatusSnapshot};

/// Compose the beacon message: callsign plus the end message for the
/// current lock state. No trailing separator when the end message is empty.
pub fn beacon_message(prefs: &Preferences) -> String {
    let end = if prefs.user_lock_active {
        &prefs.end_message_locked
    } else {
        &prefs.end_message_active
    };

    if end.is_empty() {
        prefs.callsign.clone()
    } else {
        format!("{} {}", prefs.callsign, end)
    }
}

/// Render a minute count as `M:SS`.
///
/// Seconds are the rounded fractional part; 60 carries into the minute.
/// Negative and non-finite inputs render as `0:00`.
pub fn format_beacon_interval(minutes: f64) -> String {
    if !minutes.is_finite() || minutes <= 0.0 {
        return "0:00".to_string();
    }

    let mut whole = minutes.trunc() as u64;
    let mut seconds = ((minutes - minutes.trunc()) * 60.0).round() as u64;
    if seconds >= 60 {
        whole += 1;
        seconds -= 60;
    }
    format!("{whole}:{seconds:02}")
}

/// Layer the preference-derived fields onto a freshly pulled snapshot.
pub fn fold_preferences(snapshot: &mut StatusSnapshot, prefs: &Preferences) {
    snapshot.beacon_message = beacon_message(prefs);
    snapshot.beacon_interval_formatted = format_beacon_interval(prefs.beacon_interval_minutes);
    snapshot.courtesy_enabled = prefs.courtesy_enable;
    snapshot.tail_tone_enabled = prefs.tail_tone_enable;
    snapshot.user_lock_active = prefs.user_lock_active;
}
