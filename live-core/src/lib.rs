//! # live-core
//!
//! Pure logic for repeater live sync (no I/O, instant tests).
//!
//! This crate implements the state machines and algorithms that keep the
//! displayed status consistent across the pull and push channels, without
//! any network I/O or timers.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! The actual I/O (HTTP pulls, the push socket, timers) is performed by
//! `live-client`, which interprets the actions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod connection;
pub mod countdown;
pub mod derive;
pub mod merge;
pub mod retry;
pub mod view;

pub use connection::{Action, ConnectionState, Event};
pub use countdown::{CountdownDisplay, CountdownEffect, PulseToken, HIDDEN_PLACEHOLDER};
pub use derive::{beacon_message, fold_preferences, format_beacon_interval};
pub use merge::{MergeReport, Source, StateMerger};
pub use retry::{Backoff, RetryPolicy};
pub use view::{
    classify, display_text, field_value, project, rssi_percent, Bucket, ChangeNotifier,
    FieldChange, FieldValue, FieldView, SignalLevel, ViewEffect,
};
