//! Follow the live status until Ctrl-C.

use anyhow::{bail, Result};
use live_client::{ChannelSink, LiveEngine, WsTransport};
use live_core::{CountdownEffect, ViewEffect};
use live_types::Field;
use tokio::sync::mpsc;

use crate::config::Config;

/// Run the watch command.
pub async fn run(config: &Config, device: Option<&str>, fields: &[String], json: bool) -> Result<()> {
    let endpoint = super::endpoint(config, device)?;
    let client = super::pull_client(config, &endpoint)?;
    let targets = parse_fields(fields)?;

    let (tx, mut effects) = mpsc::unbounded_channel();
    let sink = match targets {
        Some(targets) => ChannelSink::new(tx).with_targets(targets),
        None => ChannelSink::new(tx),
    };

    tracing::info!("Watching {}", endpoint.api_base());
    let engine = LiveEngine::new(
        config.engine_config(),
        client,
        WsTransport::new(),
        &endpoint.push_url(),
        sink,
    );
    let handle = engine.spawn();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
            effect = effects.recv() => {
                let Some(effect) = effect else { break };
                if json {
                    println!("{}", serde_json::to_string(&effect)?);
                } else if let Some(line) = format_effect(&effect) {
                    println!("{}", line);
                }
            }
        }
    }

    handle.shutdown().await?;
    Ok(())
}

/// Map `--fields` names to fields; no names means every field.
pub fn parse_fields(names: &[String]) -> Result<Option<Vec<Field>>> {
    if names.is_empty() {
        return Ok(None);
    }
    let mut fields = Vec::with_capacity(names.len());
    for name in names {
        match Field::from_name(name) {
            Some(field) => fields.push(field),
            None => {
                let known: Vec<_> = Field::ALL.iter().map(|f| f.name()).collect();
                bail!("Unknown field '{}' (known: {})", name, known.join(", "));
            }
        }
    }
    Ok(Some(fields))
}

/// One display line per effect. Pulse ends have nothing to show.
pub fn format_effect(effect: &ViewEffect) -> Option<String> {
    match effect {
        ViewEffect::Changed(change) => Some(format!(
            "{:<24} {} [{}]",
            change.field.name(),
            change.text,
            change.bucket.css_class()
        )),
        ViewEffect::Countdown(CountdownEffect::Updated { text, beacon_active })
        | ViewEffect::Countdown(CountdownEffect::PulseStarted {
            text,
            beacon_active,
            ..
        }) => {
            let marker = if *beacon_active { " (on air)" } else { "" };
            Some(format!("{:<24} {}{}", Field::BeaconCountdown.name(), text, marker))
        }
        ViewEffect::Countdown(CountdownEffect::Hidden) => Some(format!(
            "{:<24} {}",
            Field::BeaconCountdown.name(),
            live_core::HIDDEN_PLACEHOLDER
        )),
        ViewEffect::Countdown(CountdownEffect::PulseEnded { .. }) => None,
        ViewEffect::Health(state) => Some(format!("-- push: {}", state.label())),
    }
}
