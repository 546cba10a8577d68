//! Push connection state machine.
//!
//! This module provides a pure, side-effect-free state machine for the push
//! channel's lifecycle. The state machine takes events as input and produces
//! a new state plus a list of actions to execute.
//!
//! The actual I/O (opening the socket, arming the retry timer) is performed
//! by live-client, not by this module.
//!
//! ```text
//! Disconnected ──connect──► Connecting ──opened──► Connected
//!      ▲                      │    ▲                  │
//!      │ give up              │    │ timer            │ closed / error
//!      │                      ▼    │                  ▼
//!      └─────────────────── Retrying ◄────────── (Disconnected)
//! ```
//!
//! At most one retry timer is ever outstanding: a close reported while
//! already `Retrying` produces no action.

use serde::Serialize;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Connection health of the push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection and no retry pending.
    Disconnected,
    /// Connection attempt in progress.
    Connecting {
        /// Retry number of this attempt (0 for an explicit connect).
        attempt: u32,
    },
    /// Push frames are live.
    Connected,
    /// Waiting for the retry timer.
    Retrying {
        /// Retry number the timer will start.
        attempt: u32,
    },
}

impl ConnectionState {
    /// Create a new state machine in the Disconnected state.
    pub fn new() -> Self {
        Self::Disconnected
    }

    /// Process an event and return the new state plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller (live-client)
    /// is responsible for executing the returned actions in order.
    pub fn on_event(self, event: Event, policy: &RetryPolicy) -> (Self, Vec<Action>) {
        match (self, event) {
            // Explicit connect / reconnect
            (Self::Disconnected, Event::ConnectRequested) => start_connect(vec![]),
            (Self::Connected, Event::ConnectRequested)
            | (Self::Connecting { .. }, Event::ConnectRequested) => {
                start_connect(vec![Action::Close])
            }
            (Self::Retrying { .. }, Event::ConnectRequested) => {
                start_connect(vec![Action::CancelRetry])
            }

            // From Connecting
            (Self::Connecting { .. }, Event::Opened) => (
                Self::Connected,
                vec![Action::EmitHealth(Self::Connected)],
            ),
            (Self::Connecting { attempt }, Event::Closed { .. }) => {
                retry_after_loss(attempt.saturating_add(1), policy)
            }

            // From Connected
            (Self::Connected, Event::Closed { .. }) => retry_after_loss(1, policy),

            // From Retrying
            (Self::Retrying { attempt }, Event::RetryTimerFired) => {
                let next = Self::Connecting { attempt };
                (next, vec![Action::EmitHealth(next), Action::Connect])
            }
            (Self::Retrying { attempt }, Event::Closed { .. }) => {
                // Timer already armed
                (Self::Retrying { attempt }, vec![])
            }

            // Explicit close
            (Self::Retrying { .. }, Event::CloseRequested) => (
                Self::Disconnected,
                vec![
                    Action::CancelRetry,
                    Action::EmitHealth(Self::Disconnected),
                ],
            ),
            (Self::Connected, Event::CloseRequested)
            | (Self::Connecting { .. }, Event::CloseRequested) => (
                Self::Disconnected,
                vec![Action::Close, Action::EmitHealth(Self::Disconnected)],
            ),

            // Invalid transitions - stay in current state
            (state, _) => (state, vec![]),
        }
    }

    /// Check if push frames are live.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Check if a connection attempt is in progress or pending.
    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Connecting { .. } | Self::Retrying { .. })
    }

    /// Short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting { .. } => "Connecting",
            Self::Connected => "Connected",
            Self::Retrying { .. } => "Retrying",
        }
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

fn start_connect(mut actions: Vec<Action>) -> (ConnectionState, Vec<Action>) {
    let next = ConnectionState::Connecting { attempt: 0 };
    actions.push(Action::EmitHealth(next));
    actions.push(Action::Connect);
    (next, actions)
}

fn retry_after_loss(attempt: u32, policy: &RetryPolicy) -> (ConnectionState, Vec<Action>) {
    match policy.delay_for(attempt) {
        Some(delay) => {
            let next = ConnectionState::Retrying { attempt };
            (
                next,
                vec![
                    Action::EmitHealth(ConnectionState::Disconnected),
                    Action::EmitHealth(next),
                    Action::ScheduleRetry { delay },
                ],
            )
        }
        None => (
            ConnectionState::Disconnected,
            vec![Action::EmitHealth(ConnectionState::Disconnected)],
        ),
    }
}

/// Events that can occur in the push connection lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Connect requested (initial connect or explicit reconnect).
    ConnectRequested,
    /// The transport finished opening.
    Opened,
    /// The connection closed, errored, or failed to open.
    Closed {
        /// Reason for the loss.
        reason: String,
    },
    /// The retry timer elapsed.
    RetryTimerFired,
    /// Close requested by the application.
    CloseRequested,
}

/// Actions to be executed by the supervisor.
///
/// These are instructions, not side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Open the transport.
    Connect,
    /// Close the transport.
    Close,
    /// Arm the retry timer (no-op if one is already armed).
    ScheduleRetry {
        /// Delay before the timer fires.
        delay: Duration,
    },
    /// Disarm the retry timer.
    CancelRetry,
    /// Report connection health to observers.
    EmitHealth(ConnectionState),
}
