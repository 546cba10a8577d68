//! LiveEngine - the single writer of the live status.
//!
//! The engine owns the [`StateMerger`] and runs every mutation on one task:
//!
//! ```text
//!  pull tick ───┐
//!  push event ──┤
//!  job result ──┼─► select! ─► StateMerger ─► ChangeNotifier ─► ViewSink
//!  pulse timer ─┤                   │
//!  command ─────┘                   └─► watch (snapshot, health, banner)
//! ```
//!
//! Network waits never run on the loop itself. Pulls, banner fetches and
//! preference posts are spawned as jobs whose results come back through
//! a [`JoinSet`]; connect attempts are driven by the [`Supervisor`]. A
//! slow device therefore never holds up push frames, ticks or deadlines.
//!
//! Each handler runs to completion before the next wakeup is taken, so the
//! snapshot is never observed half-written. Consumers hold an
//! [`EngineHandle`] and read published copies.
//!
//! # Example
//!
//! ```ignore
//! let endpoint = DeviceEndpoint::from_page_url("http://10.0.0.7/")?;
//! let config = EngineConfig::default();
//! let pull = HttpPullClient::new(endpoint.clone(), config.request_timeout)?;
//! let engine = LiveEngine::new(config, pull, WsTransport::new(), &endpoint.push_url(), LogSink);
//!
//! let handle = engine.spawn();
//! let snapshot = handle.snapshot();
//! handle.shutdown().await?;
//! ```

use std::sync::Arc;

use live_core::{
    fold_preferences, ChangeNotifier, ConnectionState, CountdownEffect, MergeReport, PulseToken,
    StateMerger, ViewEffect,
};
use live_types::{PreferenceUpdate, StatusDelta, StatusSnapshot, SystemInfo};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::config::EngineConfig;
use crate::pull::{PullClient, PullError};
use crate::sink::{SinkError, ViewSink};
use crate::supervisor::{sleep_until_opt, PushEvent, Supervisor};
use crate::transport::{PushTransport, TransportError};

/// Engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Pull channel error.
    #[error("pull error: {0}")]
    Pull(#[from] PullError),

    /// The engine task is gone.
    #[error("engine stopped")]
    Stopped,
}

type Reply = oneshot::Sender<Result<(), EngineError>>;

/// Requests sent through an [`EngineHandle`].
#[derive(Debug)]
pub enum EngineCommand {
    /// Run a pull cycle now.
    Refresh {
        /// Outcome of the cycle.
        reply: Reply,
    },
    /// Reopen the push connection.
    Reconnect,
    /// Post a preference update, then pull.
    UpdatePreferences {
        /// Keys to change.
        update: PreferenceUpdate,
        /// Outcome of the post.
        reply: Reply,
    },
    /// Close the push connection and stop.
    Shutdown,
}

/// Why a pull job was started, and who waits for it.
enum PullReason {
    Tick,
    Refresh(Reply),
    AfterUpdate(Reply),
}

/// A finished background job.
enum Job {
    Pulled {
        seq: u64,
        reason: PullReason,
        result: Result<StatusSnapshot, PullError>,
    },
    Banner(Result<SystemInfo, PullError>),
    Posted {
        result: Result<(), PullError>,
        reply: Reply,
    },
}

enum Wake {
    Tick,
    Push(PushEvent),
    Job(Result<Job, JoinError>),
    Pulse,
    Command(Option<EngineCommand>),
}

/// The live sync engine.
pub struct LiveEngine<P: PullClient, T: PushTransport, S: ViewSink> {
    config: EngineConfig,
    pull: Arc<P>,
    supervisor: Supervisor<T>,
    sink: S,
    merger: StateMerger,
    notifier: ChangeNotifier,
    pulse: Option<(Instant, PulseToken)>,
    jobs: JoinSet<Job>,
    pull_seq: u64,
    pull_applied: u64,
    pulls_in_flight: usize,
    banner_in_flight: bool,
    banner_shown: bool,
    snapshot_tx: watch::Sender<StatusSnapshot>,
    system_info_tx: watch::Sender<SystemInfo>,
}

impl<P, T, S> LiveEngine<P, T, S>
where
    P: PullClient + 'static,
    T: PushTransport + 'static,
    S: ViewSink + 'static,
{
    /// Create an engine. Nothing happens until [`start`](Self::start) or
    /// [`spawn`](Self::spawn).
    pub fn new(config: EngineConfig, pull: P, transport: T, push_url: &str, sink: S) -> Self {
        let supervisor = Supervisor::new(
            transport,
            push_url,
            config.retry,
            config.connect_timeout,
        );
        let merger = StateMerger::new();
        let (snapshot_tx, _) = watch::channel(merger.snapshot().clone());
        let (system_info_tx, _) = watch::channel(SystemInfo::fallback());

        Self {
            config,
            pull: Arc::new(pull),
            supervisor,
            sink,
            merger,
            notifier: ChangeNotifier::new(),
            pulse: None,
            jobs: JoinSet::new(),
            pull_seq: 0,
            pull_applied: 0,
            pulls_in_flight: 0,
            banner_in_flight: false,
            banner_shown: false,
            snapshot_tx,
            system_info_tx,
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> &StatusSnapshot {
        self.merger.snapshot()
    }

    /// The merger, for provenance queries.
    pub fn merger(&self) -> &StateMerger {
        &self.merger
    }

    /// Push connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.supervisor.state()
    }

    /// Last fetched banner (fallback until fetched).
    pub fn system_info(&self) -> SystemInfo {
        self.system_info_tx.borrow().clone()
    }

    /// When the running pulse ends, if one is running.
    pub fn pulse_deadline(&self) -> Option<Instant> {
        self.pulse.map(|(at, _)| at)
    }

    /// When the push retry fires, if armed.
    pub fn retry_deadline(&self) -> Option<Instant> {
        self.supervisor.retry_deadline()
    }

    /// Fetch the banner, pull once, then open the push channel, waiting
    /// for each step in turn.
    ///
    /// The event loop issues the same three steps without waiting on any
    /// of them.
    pub async fn start(&mut self) {
        tracing::info!("Starting live sync ({})", self.supervisor.url());
        self.refresh_system_info().await;
        if let Err(e) = self.pull_cycle().await {
            tracing::warn!("Initial pull failed: {}", e);
        }
        self.reconnect().await;
    }

    /// Fetch the system info banner, falling back to placeholders.
    pub async fn refresh_system_info(&mut self) {
        let result = self.pull.fetch_system_info().await;
        self.show_system_info(result);
    }

    /// One pull cycle: status, then preferences, then a full replace.
    ///
    /// Any failure aborts the cycle and leaves the snapshot untouched.
    pub async fn pull_cycle(&mut self) -> Result<(), PullError> {
        self.pull_seq += 1;
        let seq = self.pull_seq;
        let status = fetch_folded(self.pull.as_ref()).await?;
        self.apply_pull(seq, status);
        Ok(())
    }

    /// Apply one push frame. Returns false if the frame was dropped.
    pub fn handle_frame(&mut self, frame: &str) -> bool {
        let delta = match StatusDelta::from_json(frame) {
            Ok(delta) => delta,
            Err(e) => {
                tracing::warn!("Dropping malformed push frame: {}", e);
                return false;
            }
        };
        if delta.is_empty() {
            tracing::trace!("Push frame carried no known fields");
        }

        let report = self.merger.merge_delta(&delta);
        self.publish(report);
        true
    }

    /// The push connection dropped or failed.
    pub async fn connection_lost(&mut self, error: TransportError) {
        tracing::warn!("Push connection lost: {}", error);
        let reported = self.supervisor.connection_lost(&error.to_string()).await;
        self.report_health(reported);
    }

    /// The retry deadline passed; waits for the new attempt to finish.
    pub async fn retry_elapsed(&mut self) {
        let reported = self.supervisor.retry_elapsed().await;
        self.report_health(reported);
        let reported = self.supervisor.settle().await;
        self.report_health(reported);
    }

    /// The pulse deadline passed.
    pub fn pulse_elapsed(&mut self) {
        if let Some((_, token)) = self.pulse.take() {
            if let Some(effect) = self.notifier.pulse_finished(token) {
                self.apply(effect);
            }
        }
    }

    /// Reopen the push connection, closing any current one first, and
    /// wait for the attempt to finish.
    pub async fn reconnect(&mut self) {
        let reported = self.supervisor.connect().await;
        self.report_health(reported);
        let reported = self.supervisor.settle().await;
        self.report_health(reported);
    }

    /// Post a preference update, then pull so the derived fields follow.
    pub async fn update_preferences(&mut self, update: &PreferenceUpdate) -> Result<(), EngineError> {
        self.pull.update_preferences(update).await?;
        if let Err(e) = self.pull_cycle().await {
            tracing::warn!("Pull after preference update failed: {}", e);
        }
        Ok(())
    }

    /// Close the push connection and abandon background jobs.
    pub async fn stop(&mut self) {
        self.jobs.abort_all();
        let reported = self.supervisor.close().await;
        self.report_health(reported);
        self.pulse = None;
    }

    /// Run until shutdown or until every handle is dropped.
    pub async fn run(mut self, mut commands: mpsc::Receiver<EngineCommand>) {
        tracing::info!("Starting live sync ({})", self.supervisor.url());
        self.spawn_banner();
        self.spawn_pull(PullReason::Tick);
        let reported = self.supervisor.connect().await;
        self.report_health(reported);

        let period = self.config.pull_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let pulse_at = self.pulse_deadline();
            let has_jobs = !self.jobs.is_empty();

            let wake = tokio::select! {
                _ = ticker.tick() => Wake::Tick,
                event = self.supervisor.next_event() => Wake::Push(event),
                Some(done) = self.jobs.join_next(), if has_jobs => Wake::Job(done),
                _ = sleep_until_opt(pulse_at) => Wake::Pulse,
                command = commands.recv() => Wake::Command(command),
            };

            match wake {
                Wake::Tick => {
                    self.spawn_banner();
                    if self.pulls_in_flight == 0 {
                        self.spawn_pull(PullReason::Tick);
                    } else {
                        tracing::debug!("Previous pull still running, skipping tick");
                    }
                }
                Wake::Push(PushEvent::Frame(Ok(frame))) => {
                    self.handle_frame(&frame);
                }
                Wake::Push(PushEvent::Frame(Err(e))) => self.connection_lost(e).await,
                Wake::Push(PushEvent::Opened(result)) => {
                    let reported = self.supervisor.connect_finished(result).await;
                    self.report_health(reported);
                }
                Wake::Push(PushEvent::RetryDue) => {
                    let reported = self.supervisor.retry_elapsed().await;
                    self.report_health(reported);
                }
                Wake::Job(Ok(job)) => self.finish(job),
                Wake::Job(Err(e)) => self.job_failed(e),
                Wake::Pulse => self.pulse_elapsed(),
                Wake::Command(Some(EngineCommand::Refresh { reply })) => {
                    self.spawn_pull(PullReason::Refresh(reply));
                }
                Wake::Command(Some(EngineCommand::Reconnect)) => {
                    let reported = self.supervisor.connect().await;
                    self.report_health(reported);
                }
                Wake::Command(Some(EngineCommand::UpdatePreferences { update, reply })) => {
                    self.spawn_post(update, reply);
                }
                Wake::Command(Some(EngineCommand::Shutdown)) | Wake::Command(None) => {
                    tracing::info!("Live sync stopping");
                    self.stop().await;
                    break;
                }
            }
        }
    }

    /// Run the engine on its own task.
    pub fn spawn(self) -> EngineHandle {
        let (commands, rx) = mpsc::channel(16);
        let snapshot = self.snapshot_tx.subscribe();
        let health = self.supervisor.subscribe();
        let system_info = self.system_info_tx.subscribe();
        let task = tokio::spawn(self.run(rx));

        EngineHandle {
            commands,
            snapshot,
            health,
            system_info,
            task,
        }
    }

    fn spawn_pull(&mut self, reason: PullReason) {
        self.pull_seq += 1;
        self.pulls_in_flight += 1;
        let seq = self.pull_seq;
        let pull = Arc::clone(&self.pull);
        self.jobs.spawn(async move {
            let result = fetch_folded(pull.as_ref()).await;
            Job::Pulled {
                seq,
                reason,
                result,
            }
        });
    }

    fn spawn_banner(&mut self) {
        if self.banner_in_flight {
            return;
        }
        self.banner_in_flight = true;
        let pull = Arc::clone(&self.pull);
        self.jobs
            .spawn(async move { Job::Banner(pull.fetch_system_info().await) });
    }

    fn spawn_post(&mut self, update: PreferenceUpdate, reply: Reply) {
        let pull = Arc::clone(&self.pull);
        self.jobs.spawn(async move {
            let result = pull.update_preferences(&update).await;
            Job::Posted { result, reply }
        });
    }

    fn finish(&mut self, job: Job) {
        match job {
            Job::Pulled {
                seq,
                reason,
                result,
            } => {
                self.pulls_in_flight = self.pulls_in_flight.saturating_sub(1);
                let outcome = match result {
                    Ok(status) => {
                        self.apply_pull(seq, status);
                        Ok(())
                    }
                    Err(e) => {
                        tracing::warn!("Pull failed: {}", e);
                        Err(e)
                    }
                };
                match reason {
                    PullReason::Tick => {}
                    PullReason::Refresh(reply) => {
                        let _ = reply.send(outcome.map_err(EngineError::from));
                    }
                    // The post itself went through
                    PullReason::AfterUpdate(reply) => {
                        let _ = reply.send(Ok(()));
                    }
                }
            }
            Job::Banner(result) => {
                self.banner_in_flight = false;
                self.show_system_info(result);
            }
            Job::Posted { result, reply } => match result {
                Ok(()) => self.spawn_pull(PullReason::AfterUpdate(reply)),
                Err(e) => {
                    tracing::warn!("Preference update failed: {}", e);
                    let _ = reply.send(Err(e.into()));
                }
            },
        }
    }

    fn job_failed(&mut self, error: JoinError) {
        if error.is_cancelled() {
            return;
        }
        // The job is unknown here; clear the guards so ticks resume
        tracing::error!("Background job panicked: {}", error);
        self.pulls_in_flight = 0;
        self.banner_in_flight = false;
    }
}

impl<P: PullClient, T: PushTransport, S: ViewSink> LiveEngine<P, T, S> {
    /// Replace the snapshot unless a newer pull already landed.
    fn apply_pull(&mut self, seq: u64, status: StatusSnapshot) {
        if seq < self.pull_applied {
            tracing::debug!("Discarding pull #{} (#{} already applied)", seq, self.pull_applied);
            return;
        }
        self.pull_applied = seq;
        let report = self.merger.replace_all(status);
        self.publish(report);
    }

    fn show_system_info(&mut self, result: Result<SystemInfo, PullError>) {
        let info = match result {
            Ok(info) => info,
            Err(e) => {
                tracing::debug!("System info unavailable: {}", e);
                SystemInfo::fallback()
            }
        };
        if self.banner_shown && *self.system_info_tx.borrow() == info {
            return;
        }
        self.banner_shown = true;
        if let Err(e) = self.sink.system_info(&info) {
            log_sink_error(&e);
        }
        self.system_info_tx.send_replace(info);
    }

    fn publish(&mut self, report: MergeReport) {
        let effects = self
            .notifier
            .notify(&report.previous, self.merger.snapshot(), &report.touched);
        self.snapshot_tx.send_replace(self.merger.snapshot().clone());

        for effect in effects {
            if let ViewEffect::Countdown(CountdownEffect::PulseStarted { token, .. }) = &effect {
                self.pulse = Some((Instant::now() + self.config.pulse_duration, *token));
            }
            self.apply(effect);
        }
    }

    fn report_health(&mut self, reported: Vec<ConnectionState>) {
        for state in reported {
            self.apply(ViewEffect::Health(state));
        }
    }

    fn apply(&mut self, effect: ViewEffect) {
        if let Err(e) = self.sink.apply(&effect) {
            log_sink_error(&e);
        }
    }
}

async fn fetch_folded<P: PullClient + ?Sized>(pull: &P) -> Result<StatusSnapshot, PullError> {
    let mut status = pull.fetch_status().await?;
    let preferences = pull.fetch_preferences().await?;
    fold_preferences(&mut status, &preferences);
    Ok(status)
}

fn log_sink_error(error: &SinkError) {
    match error {
        SinkError::MissingTarget(field) => tracing::debug!("No display target for {}", field),
        other => tracing::warn!("View sink error: {}", other),
    }
}

/// Handle to a running engine.
///
/// Dropping every handle stops the engine.
#[derive(Debug)]
pub struct EngineHandle {
    commands: mpsc::Sender<EngineCommand>,
    snapshot: watch::Receiver<StatusSnapshot>,
    health: watch::Receiver<ConnectionState>,
    system_info: watch::Receiver<SystemInfo>,
    task: JoinHandle<()>,
}

impl EngineHandle {
    /// Latest published snapshot.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Latest push health.
    pub fn health(&self) -> ConnectionState {
        *self.health.borrow()
    }

    /// Latest banner.
    pub fn system_info(&self) -> SystemInfo {
        self.system_info.borrow().clone()
    }

    /// Watch snapshot publications.
    pub fn subscribe_snapshot(&self) -> watch::Receiver<StatusSnapshot> {
        self.snapshot.clone()
    }

    /// Watch push health.
    pub fn subscribe_health(&self) -> watch::Receiver<ConnectionState> {
        self.health.clone()
    }

    /// Watch banner changes.
    pub fn subscribe_system_info(&self) -> watch::Receiver<SystemInfo> {
        self.system_info.clone()
    }

    /// Run a pull cycle now and wait for it.
    pub async fn refresh(&self) -> Result<(), EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Refresh { reply }).await?;
        rx.await.map_err(|_| EngineError::Stopped)?
    }

    /// Reopen the push connection.
    pub async fn reconnect(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::Reconnect).await
    }

    /// Post a preference update and wait for it.
    pub async fn update_preferences(&self, update: PreferenceUpdate) -> Result<(), EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::UpdatePreferences { update, reply })
            .await?;
        rx.await.map_err(|_| EngineError::Stopped)?
    }

    /// Stop the engine and wait for it to finish.
    pub async fn shutdown(self) -> Result<(), EngineError> {
        // Already stopped is fine
        let _ = self.commands.send(EngineCommand::Shutdown).await;
        self.task.await.map_err(|_| EngineError::Stopped)
    }

    async fn send(&self, command: EngineCommand) -> Result<(), EngineError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| EngineError::Stopped)
    }
}
