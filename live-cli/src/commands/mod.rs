//! CLI command implementations.

pub mod lang;
pub mod set;
pub mod status;
pub mod watch;

use anyhow::{Context, Result};
use live_client::{DeviceEndpoint, HttpPullClient};

use crate::config::Config;

/// Resolve the device endpoint from the command line and config.
pub fn endpoint(config: &Config, device: Option<&str>) -> Result<DeviceEndpoint> {
    let url = config.device_url(device)?;
    let endpoint = DeviceEndpoint::from_page_url(&url)
        .with_context(|| format!("Invalid device URL: {}", url))?;
    Ok(endpoint.with_push_port(config.device.push_port))
}

/// HTTP client for the configured device.
pub fn pull_client(config: &Config, endpoint: &DeviceEndpoint) -> Result<HttpPullClient> {
    let timeout = config.engine_config().request_timeout;
    HttpPullClient::new(endpoint.clone(), timeout).context("Failed to build HTTP client")
}
