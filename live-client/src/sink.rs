//! Display targets for view effects.
//!
//! The engine hands every [`ViewEffect`] to a [`ViewSink`]. A sink that
//! cannot show a field reports [`SinkError::MissingTarget`]; the engine logs
//! it and carries on with the remaining effects.

use live_core::{CountdownEffect, ViewEffect};
use live_types::{Field, SystemInfo};
use thiserror::Error;
use tokio::sync::mpsc;

/// Sink errors.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The display has no element for this field.
    #[error("no display target for {0}")]
    MissingTarget(Field),

    /// The consumer went away.
    #[error("view consumer closed")]
    Closed,
}

/// Somewhere to render view effects.
pub trait ViewSink: Send {
    /// Render one effect.
    fn apply(&mut self, effect: &ViewEffect) -> Result<(), SinkError>;

    /// Render the header banner. Ignored by default.
    fn system_info(&mut self, _info: &SystemInfo) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Field an effect targets, if any.
pub fn effect_target(effect: &ViewEffect) -> Option<Field> {
    match effect {
        ViewEffect::Changed(change) => Some(change.field),
        ViewEffect::Countdown(_) => Some(Field::BeaconCountdown),
        ViewEffect::Health(_) => None,
    }
}

/// Writes effects to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ViewSink for LogSink {
    fn apply(&mut self, effect: &ViewEffect) -> Result<(), SinkError> {
        match effect {
            ViewEffect::Changed(change) => tracing::info!(
                "{} = {} ({:?})",
                change.field,
                change.text,
                change.bucket
            ),
            ViewEffect::Countdown(CountdownEffect::Updated { text, beacon_active }) => {
                tracing::info!("countdown {} (beacon: {})", text, beacon_active)
            }
            ViewEffect::Countdown(other) => tracing::debug!("countdown {:?}", other),
            ViewEffect::Health(state) => tracing::info!("push {}", state.label()),
        }
        Ok(())
    }

    fn system_info(&mut self, info: &SystemInfo) -> Result<(), SinkError> {
        tracing::info!("{} firmware {}", info.callsign, info.version);
        Ok(())
    }
}

/// Forwards effects to a channel, optionally limited to some fields.
///
/// Effects for fields outside `targets` are reported as missing targets.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ViewEffect>,
    targets: Option<Vec<Field>>,
}

impl ChannelSink {
    /// Forward everything.
    pub fn new(tx: mpsc::UnboundedSender<ViewEffect>) -> Self {
        Self { tx, targets: None }
    }

    /// Forward only effects for `targets` (health always passes).
    pub fn with_targets(mut self, targets: Vec<Field>) -> Self {
        self.targets = Some(targets);
        self
    }
}

impl ViewSink for ChannelSink {
    fn apply(&mut self, effect: &ViewEffect) -> Result<(), SinkError> {
        if let (Some(targets), Some(field)) = (&self.targets, effect_target(effect)) {
            if !targets.contains(&field) {
                return Err(SinkError::MissingTarget(field));
            }
        }
        self.tx.send(effect.clone()).map_err(|_| SinkError::Closed)
    }
}
