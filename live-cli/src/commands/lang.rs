//! Show or set the preferred display language.

use anyhow::{bail, Result};
use std::path::Path;

use crate::config::ViewerPrefs;

/// Run the lang command.
pub async fn run(data_dir: &Path, code: Option<&str>) -> Result<()> {
    let mut prefs = ViewerPrefs::load(data_dir).await?;

    match code {
        Some(code) => {
            let code = normalize(code)?;
            prefs.language = Some(code.clone());
            prefs.save(data_dir).await?;
            tracing::debug!("Saved language {}", code);
            println!("Language set to {}", code);
        }
        None => match prefs.language {
            Some(language) => println!("{}", language),
            None => println!("Language not set"),
        },
    }
    Ok(())
}

/// Lowercase a language tag such as `en` or `pt-BR`.
pub fn normalize(code: &str) -> Result<String> {
    let code = code.trim();
    let valid = !code.is_empty()
        && code.len() <= 16
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        bail!("Invalid language code '{}'", code);
    }
    Ok(code.to_ascii_lowercase())
}
