//! Mock transport for testing.
//!
//! Allows pushing frames, forcing failures and simulating a peer close.

use super::{PushTransport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Mock transport for testing.
///
/// Clones share state, so a test keeps one handle while the engine owns
/// another. `recv()` waits until a frame is pushed or the connection drops.
#[derive(Debug, Default, Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
    wake: Arc<Notify>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    connected: bool,
    connected_url: Option<String>,
    connect_count: usize,
    close_count: usize,
    frames: VecDeque<String>,
    peer_closed: bool,
    fail_connects: usize,
    fail_reason: Option<String>,
    hold_connects: bool,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a frame for the next `recv()` call.
    pub fn push_frame(&self, frame: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.frames.push_back(frame.to_string());
        drop(inner);
        self.wake.notify_one();
    }

    /// Simulate the device closing the connection.
    ///
    /// Frames already queued are still delivered first.
    pub fn drop_connection(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.peer_closed = true;
        drop(inner);
        self.wake.notify_one();
    }

    /// Cause the next connect() to fail with the given error.
    pub fn fail_next_connect(&self, error: &str) {
        self.fail_connects(1, error);
    }

    /// Cause the next `count` connect() calls to fail.
    pub fn fail_connects(&self, count: usize, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_connects = count;
        inner.fail_reason = Some(error.to_string());
    }

    /// While set, connect() never completes (a blackholed port).
    pub fn hold_connects(&self, hold: bool) {
        self.inner.lock().unwrap().hold_connects = hold;
    }

    /// Number of connect() calls made, failed ones included.
    pub fn connect_count(&self) -> usize {
        self.inner.lock().unwrap().connect_count
    }

    /// Number of close() calls made.
    pub fn close_count(&self) -> usize {
        self.inner.lock().unwrap().close_count
    }

    /// Get the URL that was connected to.
    pub fn connected_url(&self) -> Option<String> {
        self.inner.lock().unwrap().connected_url.clone()
    }
}

#[async_trait]
impl PushTransport for MockTransport {
    async fn connect(&self, url: &str) -> Result<(), TransportError> {
        let hold = {
            let mut inner = self.inner.lock().unwrap();
            inner.connect_count += 1;
            inner.hold_connects
        };
        if hold {
            std::future::pending::<()>().await;
        }

        let mut inner = self.inner.lock().unwrap();

        // Check for forced failure
        if inner.fail_connects > 0 {
            inner.fail_connects -= 1;
            let reason = inner.fail_reason.clone().unwrap_or_default();
            return Err(TransportError::ConnectionFailed(reason));
        }

        inner.connected = true;
        inner.peer_closed = false;
        inner.connected_url = Some(url.to_string());
        Ok(())
    }

    async fn recv(&self) -> Result<String, TransportError> {
        loop {
            {
                let mut inner = self.inner.lock().unwrap();
                if !inner.connected {
                    return Err(TransportError::NotConnected);
                }
                if let Some(frame) = inner.frames.pop_front() {
                    return Ok(frame);
                }
                if inner.peer_closed {
                    inner.connected = false;
                    return Err(TransportError::ConnectionClosed);
                }
            }
            self.wake.notified().await;
        }
    }

    fn is_connected(&self) -> bool {
        self.inner.lock().unwrap().connected
    }

    async fn close(&self) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.connected = false;
        inner.close_count += 1;
        Ok(())
    }
}
