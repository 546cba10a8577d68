//! Mock pull client for testing.

use super::{PullClient, PullError};
use async_trait::async_trait;
use live_types::{PreferenceUpdate, Preferences, StatusSnapshot, SystemInfo};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock pull client.
///
/// Serves whatever status and preferences the test last set. Clones share
/// state.
#[derive(Debug, Default, Clone)]
pub struct MockPullClient {
    inner: Arc<Mutex<MockPullInner>>,
}

#[derive(Debug, Default)]
struct MockPullInner {
    status: StatusSnapshot,
    preferences: Preferences,
    system_info: Option<SystemInfo>,
    updates: Vec<PreferenceUpdate>,
    status_calls: usize,
    preference_calls: usize,
    fail_status: usize,
    fail_preferences: usize,
    offline: bool,
    delay: Option<Duration>,
}

impl MockPullClient {
    /// Create a mock serving defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Status served by `fetch_status()`.
    pub fn set_status(&self, status: StatusSnapshot) {
        self.inner.lock().unwrap().status = status;
    }

    /// Preferences served by `fetch_preferences()`.
    pub fn set_preferences(&self, preferences: Preferences) {
        self.inner.lock().unwrap().preferences = preferences;
    }

    /// System info served by `fetch_system_info()`. Unset means unreachable.
    pub fn set_system_info(&self, info: SystemInfo) {
        self.inner.lock().unwrap().system_info = Some(info);
    }

    /// Cause the next `count` status fetches to fail.
    pub fn fail_status(&self, count: usize) {
        self.inner.lock().unwrap().fail_status = count;
    }

    /// Cause the next `count` preference fetches to fail.
    pub fn fail_preferences(&self, count: usize) {
        self.inner.lock().unwrap().fail_preferences = count;
    }

    /// Make every request fail until set back.
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().unwrap().offline = offline;
    }

    /// Make every request take `delay` before answering (a slow device).
    pub fn set_delay(&self, delay: Duration) {
        self.inner.lock().unwrap().delay = Some(delay);
    }

    /// Number of status fetches, failed ones included.
    pub fn status_calls(&self) -> usize {
        self.inner.lock().unwrap().status_calls
    }

    /// Number of preference fetches, failed ones included.
    pub fn preference_calls(&self) -> usize {
        self.inner.lock().unwrap().preference_calls
    }

    /// Preference updates received so far.
    pub fn updates(&self) -> Vec<PreferenceUpdate> {
        self.inner.lock().unwrap().updates.clone()
    }

    async fn wait(&self) {
        let delay = self.inner.lock().unwrap().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn take_failure(counter: &mut usize) -> bool {
    if *counter > 0 {
        *counter -= 1;
        true
    } else {
        false
    }
}

#[async_trait]
impl PullClient for MockPullClient {
    async fn fetch_status(&self) -> Result<StatusSnapshot, PullError> {
        self.wait().await;
        let mut inner = self.inner.lock().unwrap();
        inner.status_calls += 1;
        if inner.offline || take_failure(&mut inner.fail_status) {
            return Err(PullError::Unavailable("status".into()));
        }
        Ok(inner.status.clone())
    }

    async fn fetch_preferences(&self) -> Result<Preferences, PullError> {
        self.wait().await;
        let mut inner = self.inner.lock().unwrap();
        inner.preference_calls += 1;
        if inner.offline || take_failure(&mut inner.fail_preferences) {
            return Err(PullError::Unavailable("preferences".into()));
        }
        Ok(inner.preferences.clone())
    }

    async fn update_preferences(&self, update: &PreferenceUpdate) -> Result<(), PullError> {
        self.wait().await;
        let mut inner = self.inner.lock().unwrap();
        if inner.offline {
            return Err(PullError::Unavailable("preferences/update".into()));
        }
        inner.updates.push(update.clone());
        Ok(())
    }

    async fn fetch_system_info(&self) -> Result<SystemInfo, PullError> {
        self.wait().await;
        let inner = self.inner.lock().unwrap();
        match (&inner.system_info, inner.offline) {
            (Some(info), false) => Ok(info.clone()),
            _ => Err(PullError::Unavailable("system-info".into())),
        }
    }
}
