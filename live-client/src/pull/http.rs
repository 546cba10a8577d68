//! reqwest-backed pull client.

use super::{PullClient, PullError};
use crate::endpoint::DeviceEndpoint;
use async_trait::async_trait;
use live_types::{PreferenceUpdate, Preferences, StatusSnapshot, SystemInfo};
use std::time::Duration;

/// HTTP client for one device.
#[derive(Debug, Clone)]
pub struct HttpPullClient {
    endpoint: DeviceEndpoint,
    http: reqwest::Client,
}

impl HttpPullClient {
    /// Create a client with a per-request timeout.
    pub fn new(endpoint: DeviceEndpoint, request_timeout: Duration) -> Result<Self, PullError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self { endpoint, http })
    }

    /// Endpoint this client talks to.
    pub fn endpoint(&self) -> &DeviceEndpoint {
        &self.endpoint
    }

    async fn get_text(&self, url: String) -> Result<String, PullError> {
        tracing::trace!("GET {}", url);
        let response = self.http.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(PullError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl PullClient for HttpPullClient {
    async fn fetch_status(&self) -> Result<StatusSnapshot, PullError> {
        let body = self.get_text(self.endpoint.status_url()).await?;
        Ok(StatusSnapshot::from_json(&body)?)
    }

    async fn fetch_preferences(&self) -> Result<Preferences, PullError> {
        let body = self.get_text(self.endpoint.preferences_url()).await?;
        Ok(Preferences::from_json(&body)?)
    }

    async fn update_preferences(&self, update: &PreferenceUpdate) -> Result<(), PullError> {
        let url = self.endpoint.preferences_update_url();
        tracing::debug!("POST {} ({} keys)", url, update.keys().count());
        let response = self.http.post(&url).json(update).send().await?;

        if !response.status().is_success() {
            return Err(PullError::Status {
                url,
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    async fn fetch_system_info(&self) -> Result<SystemInfo, PullError> {
        let body = self.get_text(self.endpoint.system_info_url()).await?;
        Ok(SystemInfo::from_json(&body)?)
    }
}
