//! Device endpoint derivation.
//!
//! Everything is derived from the URL of the device's own status page: the
//! HTTP API shares its origin, and the push channel runs on the same host at
//! a fixed alternate port with the scheme upgraded to match page security.

use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use url::Url;

/// Port the firmware serves the push channel on.
pub const DEFAULT_PUSH_PORT: u16 = 81;

/// Endpoint errors.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// The page URL could not be parsed.
    #[error("invalid device url: {0}")]
    Invalid(#[from] url::ParseError),

    /// The page URL is not http(s).
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    /// The page URL has no host.
    #[error("device url has no host")]
    MissingHost,
}

/// Where the device lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEndpoint {
    base: Url,
    push_port: u16,
}

impl DeviceEndpoint {
    /// Derive endpoints from the device page URL.
    ///
    /// A bare host (`192.168.4.1`) is taken as `http://192.168.4.1/`.
    pub fn from_page_url(page: &str) -> Result<Self, EndpointError> {
        let page = page.trim();
        let parsed = if page.contains("://") {
            Url::parse(page)?
        } else {
            Url::parse(&format!("http://{page}"))?
        };

        match parsed.scheme() {
            "http" | "https" => {}
            other => return Err(EndpointError::UnsupportedScheme(other.to_string())),
        }
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(EndpointError::MissingHost);
        }

        let mut base = parsed;
        base.set_path("/");
        base.set_query(None);
        base.set_fragment(None);

        Ok(Self {
            base,
            push_port: DEFAULT_PUSH_PORT,
        })
    }

    /// Use a different push port.
    pub fn with_push_port(mut self, port: u16) -> Self {
        self.push_port = port;
        self
    }

    /// Whether the device page is served over TLS.
    pub fn is_secure(&self) -> bool {
        self.base.scheme() == "https"
    }

    /// Device host.
    pub fn host(&self) -> &str {
        self.base.host_str().unwrap_or_default()
    }

    /// Origin of the HTTP API, without a trailing slash.
    pub fn api_base(&self) -> String {
        self.base.as_str().trim_end_matches('/').to_string()
    }

    /// Push channel URL: `ws(s)://<host>:<push_port>/`.
    pub fn push_url(&self) -> String {
        let scheme = if self.is_secure() { "wss" } else { "ws" };
        let host = match self.base.host() {
            Some(url::Host::Ipv6(addr)) => format!("[{addr}]"),
            _ => self.host().to_string(),
        };
        format!("{scheme}://{host}:{}/", self.push_port)
    }

    /// `GET` URL for the live status, with a cache buster.
    pub fn status_url(&self) -> String {
        self.busted("/api/repeater-status")
    }

    /// `GET` URL for preferences, with a cache buster.
    pub fn preferences_url(&self) -> String {
        self.busted("/api/preferences")
    }

    /// `POST` URL for preference updates.
    pub fn preferences_update_url(&self) -> String {
        format!("{}/api/preferences/update", self.api_base())
    }

    /// `GET` URL for the system info banner.
    pub fn system_info_url(&self) -> String {
        format!("{}/api/system-info", self.api_base())
    }

    fn busted(&self, path: &str) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        format!("{}{path}?_={millis}", self.api_base())
    }
}
