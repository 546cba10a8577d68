//! # repeater-live
//!
//! Terminal status display for repeater controllers.
//!
//! ## Commands
//!
//! - `watch`: Follow the live status until Ctrl-C
//! - `status`: Print one status snapshot
//! - `set`: Change device preferences
//! - `lang`: Show or set the display language
//!
//! ## Example
//!
//! ```bash
//! # Follow a controller on the local network
//! repeater-live --device http://192.168.4.1/ watch
//!
//! # Only the lines you care about
//! repeater-live watch --fields repeaterState --fields rssi
//!
//! # Lock the repeater
//! repeater-live set userLockActive=true
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{lang, set, status, watch};
use config::Config;

/// Terminal status display for repeater controllers.
#[derive(Parser, Debug)]
#[command(name = "repeater-live")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file (default: ./repeater-live.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Device page URL or host, overrides [device] url
    #[arg(long, global = true)]
    device: Option<String>,

    /// Data directory for viewer settings
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Follow the live status until Ctrl-C
    Watch {
        /// Only show these fields (wire names, e.g. repeaterState)
        #[arg(long, short)]
        fields: Vec<String>,

        /// Print effects as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Pull and print the current status once
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Post preference changes (KEY=VALUE), then print the refreshed status
    Set {
        /// Assignments such as userLockActive=true
        #[arg(required = true)]
        assignments: Vec<String>,
    },

    /// Show or set the preferred display language
    Lang {
        /// Language code to store
        code: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    init_logging(&config.log.filter);

    // Determine data directory
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;

    let device = cli.device.as_deref();
    match cli.command {
        Commands::Watch { fields, json } => {
            watch::run(&config, device, &fields, json).await?;
        }
        Commands::Status { json } => {
            status::run(&config, device, &data_dir, json).await?;
        }
        Commands::Set { assignments } => {
            set::run(&config, device, &data_dir, &assignments).await?;
        }
        Commands::Lang { code } => {
            lang::run(&data_dir, code.as_deref()).await?;
        }
    }

    Ok(())
}

/// Install the tracing subscriber; `RUST_LOG` wins over the config filter.
fn init_logging(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Get the default data directory for repeater-live.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("org", "repeater", "repeater-live")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
