//! Beacon countdown repaint signal.
//!
//! The push channel resends the countdown even when it has not moved. A
//! repeat of the displayed text triggers a short emphasis pulse instead of
//! a rewrite, so the viewer can see the device is alive:
//!
//! ```text
//! Idle ──same text──► Pulsing(token) ──pulse_finished(token)──► Idle
//!   ▲                      │
//!   └─── different text ───┘   (pulse cleared, stale token ignored)
//! ```

use serde::Serialize;

/// Shown in place of an empty countdown.
pub const HIDDEN_PLACEHOLDER: &str = "--:--";

/// Identifies one emphasis pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PulseToken(pub u64);

/// What the display must do for a countdown report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CountdownEffect {
    /// Repaint with new text.
    Updated {
        /// Text to show.
        text: String,
        /// Beacon on air.
        beacon_active: bool,
    },
    /// Same text again: dim, then restore after the pulse duration.
    PulseStarted {
        /// Text being shown.
        text: String,
        /// Beacon on air.
        beacon_active: bool,
        /// Pass back to [`CountdownDisplay::pulse_finished`].
        token: PulseToken,
    },
    /// Restore full emphasis.
    PulseEnded {
        /// Pulse that ended.
        token: PulseToken,
    },
    /// Nothing to show.
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pulse {
    Idle,
    Pulsing(PulseToken),
}

/// Tracks what the display last showed.
#[derive(Debug, Clone)]
pub struct CountdownDisplay {
    last_displayed: Option<String>,
    pulse: Pulse,
    next_token: u64,
}

impl CountdownDisplay {
    /// Nothing displayed yet.
    pub fn new() -> Self {
        Self {
            last_displayed: None,
            pulse: Pulse::Idle,
            next_token: 0,
        }
    }

    /// Text currently on the display.
    pub fn last_displayed(&self) -> Option<&str> {
        self.last_displayed.as_deref()
    }

    /// Whether a pulse is in progress.
    pub fn is_pulsing(&self) -> bool {
        matches!(self.pulse, Pulse::Pulsing(_))
    }

    /// Handle a countdown report.
    pub fn on_countdown(&mut self, text: &str, active: bool) -> Option<CountdownEffect> {
        if text.is_empty() || text == HIDDEN_PLACEHOLDER {
            return Some(CountdownEffect::Hidden);
        }

        if self.last_displayed.as_deref() != Some(text) {
            self.last_displayed = Some(text.to_string());
            self.pulse = Pulse::Idle;
            return Some(CountdownEffect::Updated {
                text: text.to_string(),
                beacon_active: active,
            });
        }

        match self.pulse {
            Pulse::Pulsing(_) => None,
            Pulse::Idle => {
                let token = PulseToken(self.next_token);
                self.next_token += 1;
                self.pulse = Pulse::Pulsing(token);
                Some(CountdownEffect::PulseStarted {
                    text: text.to_string(),
                    beacon_active: active,
                    token,
                })
            }
        }
    }

    /// The pulse timer for `token` elapsed.
    pub fn pulse_finished(&mut self, token: PulseToken) -> Option<CountdownEffect> {
        if self.pulse == Pulse::Pulsing(token) {
            self.pulse = Pulse::Idle;
            Some(CountdownEffect::PulseEnded { token })
        } else {
            None
        }
    }
}

impl Default for CountdownDisplay {
    fn default() -> Self {
        Self::new()
    }
}
