//! Reconnection supervisor.
//!
//! Interprets the actions of the pure connection state machine from
//! live-core: it owns the transport, the in-flight connect attempt and the
//! single retry deadline, and publishes health on a watch channel.
//!
//! ```text
//! Engine → Supervisor → PushTransport → Device
//!              ↓
//!      live-core ConnectionState (pure state machine)
//! ```
//!
//! Requests return as soon as the state machine has moved; a connect
//! attempt keeps running in the background and its outcome surfaces from
//! [`Supervisor::next_event`] alongside inbound frames and the retry timer.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::future::BoxFuture;
use live_core::{Action, ConnectionState, Event, RetryPolicy};
use tokio::sync::watch;
use tokio::time::{sleep_until, timeout, Instant};

use crate::transport::{PushTransport, TransportError};

type ConnectAttempt = BoxFuture<'static, Result<(), TransportError>>;

/// Something the push side needs the owner to act on.
#[derive(Debug)]
pub enum PushEvent {
    /// An inbound frame, or the error that ended the connection.
    Frame(Result<String, TransportError>),
    /// The in-flight connect attempt finished.
    Opened(Result<(), TransportError>),
    /// The retry deadline passed.
    RetryDue,
}

/// Owns the push connection and its retry timer.
pub struct Supervisor<T: PushTransport> {
    transport: Arc<T>,
    url: String,
    policy: RetryPolicy,
    connect_timeout: Duration,
    state: ConnectionState,
    retry_at: Option<Instant>,
    connecting: Option<ConnectAttempt>,
    health: watch::Sender<ConnectionState>,
}

impl<T: PushTransport + 'static> Supervisor<T> {
    /// Create a disconnected supervisor for `url`.
    pub fn new(transport: T, url: &str, policy: RetryPolicy, connect_timeout: Duration) -> Self {
        let (health, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            transport: Arc::new(transport),
            url: url.to_string(),
            policy,
            connect_timeout,
            state: ConnectionState::Disconnected,
            retry_at: None,
            connecting: None,
            health,
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Watch health changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.health.subscribe()
    }

    /// When the armed retry timer fires, if one is armed.
    pub fn retry_deadline(&self) -> Option<Instant> {
        self.retry_at
    }

    /// Whether a connect attempt is in flight.
    pub fn is_opening(&self) -> bool {
        self.connecting.is_some()
    }

    /// Push endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Start opening (or reopening) the push connection.
    ///
    /// Returns the health states reported so far; the outcome of the
    /// attempt arrives later as [`PushEvent::Opened`].
    pub async fn connect(&mut self) -> Vec<ConnectionState> {
        self.dispatch(Event::ConnectRequested).await
    }

    /// Close the push connection, abandon any attempt and cancel any
    /// pending retry.
    pub async fn close(&mut self) -> Vec<ConnectionState> {
        self.dispatch(Event::CloseRequested).await
    }

    /// The transport reported the connection gone.
    pub async fn connection_lost(&mut self, reason: &str) -> Vec<ConnectionState> {
        self.dispatch(Event::Closed {
            reason: reason.to_string(),
        })
        .await
    }

    /// The retry deadline passed; starts the next attempt.
    pub async fn retry_elapsed(&mut self) -> Vec<ConnectionState> {
        self.retry_at = None;
        self.dispatch(Event::RetryTimerFired).await
    }

    /// Feed the outcome of a connect attempt back into the state machine.
    pub async fn connect_finished(
        &mut self,
        result: Result<(), TransportError>,
    ) -> Vec<ConnectionState> {
        match result {
            Ok(()) => self.dispatch(Event::Opened).await,
            Err(e) => {
                tracing::warn!("Push connection to {} failed: {}", self.url, e);
                self.dispatch(Event::Closed {
                    reason: e.to_string(),
                })
                .await
            }
        }
    }

    /// Wait for the in-flight attempt, if any, and apply its outcome.
    pub async fn settle(&mut self) -> Vec<ConnectionState> {
        match self.connecting.take() {
            Some(attempt) => {
                let result = attempt.await;
                self.connect_finished(result).await
            }
            None => Vec::new(),
        }
    }

    /// Wait for the next push-side event.
    ///
    /// Cancel-safe: an in-flight connect attempt survives being dropped
    /// from a `select!` and is picked up by the next call.
    pub async fn next_event(&mut self) -> PushEvent {
        let connected = self.state.is_connected();
        let transport = &self.transport;
        let connecting = &mut self.connecting;
        let retry_at = self.retry_at;

        tokio::select! {
            frame = transport.recv(), if connected => PushEvent::Frame(frame),
            result = PendingAttempt(connecting) => PushEvent::Opened(result),
            _ = sleep_until_opt(retry_at) => PushEvent::RetryDue,
        }
    }

    async fn dispatch(&mut self, event: Event) -> Vec<ConnectionState> {
        let (next, actions) = self.state.on_event(event, &self.policy);
        self.state = next;

        let mut reported = Vec::new();
        for action in actions {
            match action {
                Action::Connect => {
                    let attempt: ConnectAttempt = Box::pin(open(
                        Arc::clone(&self.transport),
                        self.url.clone(),
                        self.connect_timeout,
                    ));
                    self.connecting = Some(attempt);
                }
                Action::Close => {
                    // Dropping the attempt releases the transport
                    self.connecting = None;
                    if let Err(e) = self.transport.close().await {
                        tracing::debug!("Push close error: {}", e);
                    }
                }
                Action::ScheduleRetry { delay } => {
                    // At most one timer outstanding
                    if self.retry_at.is_none() {
                        tracing::info!("Push reconnect in {:?}", delay);
                        self.retry_at = Some(Instant::now() + delay);
                    }
                }
                Action::CancelRetry => {
                    self.retry_at = None;
                }
                Action::EmitHealth(state) => {
                    tracing::debug!("Push health: {:?}", state);
                    self.health.send_replace(state);
                    reported.push(state);
                }
            }
        }

        reported
    }
}

async fn open<T: PushTransport>(
    transport: Arc<T>,
    url: String,
    limit: Duration,
) -> Result<(), TransportError> {
    match timeout(limit, transport.connect(&url)).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout),
    }
}

/// Polls the in-flight attempt, clearing the slot once it finishes.
/// Pending forever when no attempt is in flight.
struct PendingAttempt<'a>(&'a mut Option<ConnectAttempt>);

impl Future for PendingAttempt<'_> {
    type Output = Result<(), TransportError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let slot = &mut *self.0;
        match slot.as_mut() {
            Some(attempt) => match attempt.as_mut().poll(cx) {
                Poll::Ready(result) => {
                    *slot = None;
                    Poll::Ready(result)
                }
                Poll::Pending => Poll::Pending,
            },
            None => Poll::Pending,
        }
    }
}

pub(crate) async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;

    const URL: &str = "ws://10.0.0.7:81/";

    fn supervisor(transport: MockTransport) -> Supervisor<MockTransport> {
        Supervisor::new(
            transport,
            URL,
            RetryPolicy::default(),
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn connect_reports_connecting_then_connected() {
        let transport = MockTransport::new();
        let mut sup = supervisor(transport.clone());

        let reported = sup.connect().await;
        assert_eq!(reported, vec![ConnectionState::Connecting { attempt: 0 }]);
        assert!(sup.is_opening());

        let reported = sup.settle().await;
        assert_eq!(reported, vec![ConnectionState::Connected]);
        assert!(!sup.is_opening());
        assert!(transport.is_connected());
        assert_eq!(transport.connected_url().as_deref(), Some(URL));
        assert_eq!(*sup.subscribe().borrow(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn attempt_outcome_arrives_as_event() {
        let transport = MockTransport::new();
        let mut sup = supervisor(transport.clone());
        sup.connect().await;

        let event = sup.next_event().await;
        assert!(matches!(event, PushEvent::Opened(Ok(()))));
        assert!(!sup.is_opening());

        let PushEvent::Opened(result) = event else { unreachable!() };
        sup.connect_finished(result).await;
        assert!(sup.state().is_connected());

        transport.push_frame(r#"{"ptt": true}"#);
        assert!(matches!(sup.next_event().await, PushEvent::Frame(Ok(_))));
    }

    #[tokio::test]
    async fn failed_connect_arms_retry() {
        let transport = MockTransport::new();
        transport.fail_next_connect("refused");
        let mut sup = supervisor(transport.clone());

        let before = Instant::now();
        sup.connect().await;
        sup.settle().await;

        assert_eq!(sup.state(), ConnectionState::Retrying { attempt: 1 });
        let deadline = sup.retry_deadline().unwrap();
        assert!(deadline >= before + Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn held_connect_times_out_into_retry() {
        let transport = MockTransport::new();
        transport.hold_connects(true);
        let mut sup = supervisor(transport.clone());
        sup.connect().await;

        let start = Instant::now();
        let PushEvent::Opened(result) = sup.next_event().await else {
            panic!("expected the attempt to finish");
        };
        assert!(matches!(result, Err(TransportError::Timeout)));
        assert!(start.elapsed() >= Duration::from_secs(1));
        assert!(start.elapsed() < Duration::from_secs(2));

        sup.connect_finished(result).await;
        assert_eq!(sup.state(), ConnectionState::Retrying { attempt: 1 });

        // The retry timer surfaces as its own event
        transport.hold_connects(false);
        assert!(matches!(sup.next_event().await, PushEvent::RetryDue));
        sup.retry_elapsed().await;
        sup.settle().await;
        assert!(sup.state().is_connected());
        assert_eq!(transport.connect_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_wait_keeps_attempt_in_flight() {
        let transport = MockTransport::new();
        transport.hold_connects(true);
        let mut sup = Supervisor::new(
            transport.clone(),
            URL,
            RetryPolicy::default(),
            Duration::from_secs(10),
        );
        sup.connect().await;

        let waited = timeout(Duration::from_secs(3), sup.next_event()).await;
        assert!(waited.is_err());
        assert!(sup.is_opening());

        // Same attempt, same deadline: 10 s from the start, not from now
        let start = Instant::now();
        assert!(matches!(
            sup.next_event().await,
            PushEvent::Opened(Err(TransportError::Timeout))
        ));
        assert!(start.elapsed() >= Duration::from_secs(6));
        assert!(start.elapsed() < Duration::from_secs(8));
        assert_eq!(transport.connect_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn close_abandons_attempt() {
        let transport = MockTransport::new();
        transport.hold_connects(true);
        let mut sup = supervisor(transport.clone());
        sup.connect().await;

        let reported = sup.close().await;

        assert_eq!(reported, vec![ConnectionState::Disconnected]);
        assert!(!sup.is_opening());
        assert_eq!(transport.close_count(), 1);
        assert!(timeout(Duration::from_secs(60), sup.next_event())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn double_loss_keeps_one_deadline() {
        let transport = MockTransport::new();
        let mut sup = supervisor(transport.clone());
        sup.connect().await;
        sup.settle().await;

        sup.connection_lost("reset").await;
        let first = sup.retry_deadline();
        sup.connection_lost("error after close").await;

        assert!(first.is_some());
        assert_eq!(sup.retry_deadline(), first);
        assert_eq!(sup.state(), ConnectionState::Retrying { attempt: 1 });
    }

    #[tokio::test]
    async fn retry_elapsed_reconnects() {
        let transport = MockTransport::new();
        let mut sup = supervisor(transport.clone());
        sup.connect().await;
        sup.settle().await;
        sup.connection_lost("reset").await;

        let reported = sup.retry_elapsed().await;
        assert_eq!(reported, vec![ConnectionState::Connecting { attempt: 1 }]);
        assert_eq!(sup.retry_deadline(), None);

        let reported = sup.settle().await;
        assert_eq!(reported, vec![ConnectionState::Connected]);
        assert_eq!(transport.connect_count(), 2);
    }

    #[tokio::test]
    async fn close_cancels_pending_retry() {
        let transport = MockTransport::new();
        transport.fail_next_connect("refused");
        let mut sup = supervisor(transport.clone());
        sup.connect().await;
        sup.settle().await;
        assert!(sup.retry_deadline().is_some());

        sup.close().await;

        assert_eq!(sup.retry_deadline(), None);
        assert_eq!(sup.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn reconnect_closes_previous_connection() {
        let transport = MockTransport::new();
        let mut sup = supervisor(transport.clone());
        sup.connect().await;
        sup.settle().await;

        sup.connect().await;
        sup.settle().await;

        assert_eq!(transport.close_count(), 1);
        assert_eq!(transport.connect_count(), 2);
        assert!(sup.state().is_connected());
    }

    #[tokio::test]
    async fn bounded_policy_stops_retrying() {
        let transport = MockTransport::new();
        transport.fail_connects(10, "refused");
        let mut sup = Supervisor::new(
            transport.clone(),
            URL,
            RetryPolicy::fixed(Duration::from_millis(10)).with_max_attempts(2),
            Duration::from_secs(1),
        );

        sup.connect().await;
        sup.settle().await;
        sup.retry_elapsed().await;
        sup.settle().await;
        sup.retry_elapsed().await;
        sup.settle().await;

        assert_eq!(sup.state(), ConnectionState::Disconnected);
        assert_eq!(sup.retry_deadline(), None);
        assert_eq!(transport.connect_count(), 3);
    }
}
