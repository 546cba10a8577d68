//! Print one status snapshot.

use anyhow::{Context, Result};
use live_client::PullClient;
use live_core::{fold_preferences, project, FieldView};
use live_types::{StatusSnapshot, SystemInfo};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

use crate::config::{Config, ViewerPrefs};

/// One full pull: status, preferences and banner.
#[derive(Debug, Serialize)]
pub struct Report {
    /// Header banner, or the placeholder when unavailable.
    pub system_info: SystemInfo,
    /// Status with preferences folded in.
    pub snapshot: StatusSnapshot,
    /// Projected fields in display order.
    pub fields: Vec<FieldView>,
}

/// Run the status command.
pub async fn run(config: &Config, device: Option<&str>, data_dir: &Path, json: bool) -> Result<()> {
    let endpoint = super::endpoint(config, device)?;
    let client = super::pull_client(config, &endpoint)?;
    let prefs = ViewerPrefs::load(data_dir).await?;

    let report = collect(&client).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render(&report, prefs.language.as_deref()));
    }
    Ok(())
}

/// Fetch everything the status table needs.
///
/// A missing banner falls back to the placeholder; a failed status or
/// preferences fetch fails the whole report.
pub async fn collect<P: PullClient>(client: &P) -> Result<Report> {
    let system_info = match client.fetch_system_info().await {
        Ok(info) => info,
        Err(e) => {
            tracing::debug!("System info unavailable: {}", e);
            SystemInfo::fallback()
        }
    };

    let mut snapshot = client
        .fetch_status()
        .await
        .context("Failed to fetch status")?;
    let preferences = client
        .fetch_preferences()
        .await
        .context("Failed to fetch preferences")?;
    fold_preferences(&mut snapshot, &preferences);

    let fields = project(&snapshot);
    Ok(Report {
        system_info,
        snapshot,
        fields,
    })
}

/// Render a report as an aligned table.
pub fn render(report: &Report, language: Option<&str>) -> String {
    let mut out = String::new();
    let info = &report.system_info;

    let _ = writeln!(out, "=== {} (firmware {}) ===", info.callsign, info.version);
    if info.has_banner() {
        let _ = writeln!(out, "{} [{}]", info.status, info.status_class);
    }
    if let Some(language) = language {
        let _ = writeln!(out, "Language: {}", language);
    }
    out.push('\n');

    let width = report
        .fields
        .iter()
        .map(|view| view.field.name().len())
        .max()
        .unwrap_or(0);
    for view in &report.fields {
        let _ = writeln!(
            out,
            "  {:<width$}  {:<12}  {}",
            view.field.name(),
            view.text,
            view.bucket.css_class(),
            width = width
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use live_client::MockPullClient;
    use live_types::Preferences;

    fn device() -> MockPullClient {
        let mock = MockPullClient::new();
        mock.set_status(StatusSnapshot {
            repeater_state: "Repeating".into(),
            rssi: 4095,
            ..StatusSnapshot::default()
        });
        mock.set_preferences(Preferences {
            callsign: "YO3XYZ".into(),
            end_message_active: "QRV".into(),
            beacon_interval_minutes: 2.5,
            ..Preferences::default()
        });
        mock
    }

    #[tokio::test]
    async fn collect_folds_preferences() {
        let report = collect(&device()).await.unwrap();

        assert_eq!(report.snapshot.repeater_state, "Repeating");
        assert_eq!(report.snapshot.beacon_message, "YO3XYZ QRV");
        assert_eq!(report.snapshot.beacon_interval_formatted, "2:30");
        assert_eq!(report.fields.len(), live_types::Field::ALL.len());
    }

    #[tokio::test]
    async fn collect_uses_placeholder_banner() {
        let report = collect(&device()).await.unwrap();
        assert_eq!(report.system_info, SystemInfo::fallback());
    }

    #[tokio::test]
    async fn collect_fails_when_preferences_fail() {
        let mock = device();
        mock.fail_preferences(1);
        assert!(collect(&mock).await.is_err());
    }

    #[tokio::test]
    async fn render_lists_every_field() {
        let mock = device();
        mock.set_system_info(SystemInfo {
            callsign: "YO3XYZ".into(),
            version: "2.1.0".into(),
            status: "Online".into(),
            status_class: "ok".into(),
        });
        let report = collect(&mock).await.unwrap();

        let table = render(&report, Some("ro"));
        assert!(table.starts_with("=== YO3XYZ (firmware 2.1.0) ==="));
        assert!(table.contains("Online [ok]"));
        assert!(table.contains("Language: ro"));
        for field in live_types::Field::ALL {
            assert!(table.contains(field.name()), "missing {}", field);
        }
    }

    #[tokio::test]
    async fn render_without_banner_or_language() {
        let report = collect(&device()).await.unwrap();
        let table = render(&report, None);
        assert!(!table.contains("Language:"));
        assert!(table.contains("{CALLSIGN}"));
    }
}
