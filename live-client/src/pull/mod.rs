//! Pull channel: the device's HTTP status API.
//!
//! Each call is a single request with no retry; a failed cycle is simply
//! skipped and the next timer tick tries again.

mod http;
mod mock;

pub use http::HttpPullClient;
pub use mock::MockPullClient;

use async_trait::async_trait;
use live_types::{PreferenceUpdate, Preferences, StatusSnapshot, SystemInfo, WireError};
use thiserror::Error;

/// Pull errors.
#[derive(Debug, Error)]
pub enum PullError {
    /// Request could not be sent or the response could not be read.
    #[error("http error: {0}")]
    Http(String),

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Device answered with a non-success status.
    #[error("{url} returned status {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Body was not a usable JSON object.
    #[error("invalid response body: {0}")]
    Decode(#[from] WireError),

    /// Device unreachable (used by the mock).
    #[error("device unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for PullError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PullError::Timeout
        } else {
            PullError::Http(e.to_string())
        }
    }
}

/// Client for the device's HTTP API.
#[async_trait]
pub trait PullClient: Send + Sync {
    /// `GET /api/repeater-status`.
    async fn fetch_status(&self) -> Result<StatusSnapshot, PullError>;

    /// `GET /api/preferences`.
    async fn fetch_preferences(&self) -> Result<Preferences, PullError>;

    /// `POST /api/preferences/update`.
    async fn update_preferences(&self, update: &PreferenceUpdate) -> Result<(), PullError>;

    /// `GET /api/system-info`.
    async fn fetch_system_info(&self) -> Result<SystemInfo, PullError>;
}
