//! Configuration for repeater-live.
//!
//! Settings are loaded from a TOML file (default: `repeater-live.toml`).
//! The viewer's preferred language lives separately in `viewer.json` in the
//! data directory.

use anyhow::{Context, Result};
use live_client::{EngineConfig, DEFAULT_PUSH_PORT};
use live_core::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "repeater-live.toml";

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Device location.
    #[serde(default)]
    pub device: DeviceConfig,
    /// Sync timing.
    #[serde(default)]
    pub sync: SyncConfig,
    /// Logging.
    #[serde(default)]
    pub log: LogConfig,
}

/// Device location.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    /// URL of the device status page (e.g. `http://192.168.4.1/`).
    pub url: Option<String>,
    /// Push channel port (default: 81).
    #[serde(default = "default_push_port")]
    pub push_port: u16,
}

/// Sync timing.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Pull period in seconds (default: 5).
    #[serde(default = "default_pull_interval")]
    pub pull_interval_secs: u64,
    /// Push retry interval in seconds (default: 5).
    #[serde(default = "default_retry_interval")]
    pub retry_interval_secs: u64,
    /// When set, retries back off exponentially up to this many seconds.
    pub retry_max_interval_secs: Option<u64>,
    /// Give up reconnecting after this many retries (default: never).
    pub max_retry_attempts: Option<u32>,
    /// Countdown pulse length in milliseconds (default: 200).
    #[serde(default = "default_pulse_ms")]
    pub pulse_ms: u64,
    /// Push connect timeout in seconds (default: 10).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Pull request timeout in seconds (default: 4).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Logging.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// tracing filter directive; `RUST_LOG` wins when set (default: `info`).
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

// Default value functions
fn default_push_port() -> u16 {
    DEFAULT_PUSH_PORT
}

fn default_pull_interval() -> u64 {
    5
}

fn default_retry_interval() -> u64 {
    5
}

fn default_pulse_ms() -> u64 {
    200
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    4
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            url: None,
            push_port: default_push_port(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            pull_interval_secs: default_pull_interval(),
            retry_interval_secs: default_retry_interval(),
            retry_max_interval_secs: None,
            max_retry_attempts: None,
            pulse_ms: default_pulse_ms(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load an explicit config file, or the default one if it exists.
    ///
    /// A missing explicit file is an error; a missing default file is not.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Device URL, with the command-line override taking precedence.
    pub fn device_url(&self, cli_override: Option<&str>) -> Result<String, ConfigError> {
        cli_override
            .map(str::to_string)
            .or_else(|| self.device.url.clone())
            .ok_or(ConfigError::MissingDevice)
    }

    /// Reconnect policy described by `[sync]`.
    pub fn retry_policy(&self) -> RetryPolicy {
        let base = Duration::from_secs(self.sync.retry_interval_secs);
        let policy = match self.sync.retry_max_interval_secs {
            Some(max) => RetryPolicy::exponential(base, Duration::from_secs(max)),
            None => RetryPolicy::fixed(base),
        };
        match self.sync.max_retry_attempts {
            Some(attempts) => policy.with_max_attempts(attempts),
            None => policy,
        }
    }

    /// Engine timing described by `[sync]`.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_pull_interval(Duration::from_secs(self.sync.pull_interval_secs.max(1)))
            .with_retry(self.retry_policy())
            .with_pulse_duration(Duration::from_millis(self.sync.pulse_ms))
            .with_connect_timeout(Duration::from_secs(self.sync.connect_timeout_secs))
            .with_request_timeout(Duration::from_secs(self.sync.request_timeout_secs))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// No device URL anywhere.
    #[error("no device configured: pass --device or set [device] url in {DEFAULT_CONFIG_FILE}")]
    MissingDevice,
}

/// Viewer settings kept between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerPrefs {
    /// Preferred display language code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl ViewerPrefs {
    /// Load from a data directory; a missing file yields defaults.
    pub async fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join("viewer.json");
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = tokio::fs::read_to_string(&path)
            .await
            .context("Failed to read viewer preferences")?;
        serde_json::from_str(&contents).context("Invalid viewer preferences")
    }

    /// Save to a data directory.
    pub async fn save(&self, data_dir: &Path) -> Result<()> {
        let path = data_dir.join("viewer.json");
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, contents)
            .await
            .context("Failed to save viewer preferences")?;
        Ok(())
    }
}
