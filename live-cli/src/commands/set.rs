//! Change device preferences.

use anyhow::{bail, Context, Result};
use live_client::PullClient;
use live_types::PreferenceUpdate;
use std::path::Path;

use crate::config::{Config, ViewerPrefs};

/// Run the set command.
pub async fn run(
    config: &Config,
    device: Option<&str>,
    data_dir: &Path,
    assignments: &[String],
) -> Result<()> {
    let update = parse(assignments)?;
    let endpoint = super::endpoint(config, device)?;
    let client = super::pull_client(config, &endpoint)?;
    let prefs = ViewerPrefs::load(data_dir).await?;

    apply(&client, &update).await?;
    println!("Updated: {}", update.keys().collect::<Vec<_>>().join(", "));
    println!();

    let report = super::status::collect(&client).await?;
    print!(
        "{}",
        super::status::render(&report, prefs.language.as_deref())
    );
    Ok(())
}

/// Parse `KEY=VALUE` arguments into an update.
pub fn parse(assignments: &[String]) -> Result<PreferenceUpdate> {
    let update =
        PreferenceUpdate::from_assignments(assignments).context("Invalid preference assignment")?;
    if update.is_empty() {
        bail!("Nothing to update");
    }
    Ok(update)
}

/// Post the update.
pub async fn apply<P: PullClient>(client: &P, update: &PreferenceUpdate) -> Result<()> {
    tracing::debug!("Posting preference update");
    client
        .update_preferences(update)
        .await
        .context("Failed to update preferences")
}
