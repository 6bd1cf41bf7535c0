//! Reconciliation loop and idle tick scheduling.
//!
//! # Ownership
//!
//! The backend owns whether the employee is punched in; this task owns how
//! long they have been idle. Each reconciliation fetch can start or stop an
//! idle episode but never touches its activity clock.
//!
//! Every idle episode gets its own tick interval, stored next to the episode
//! id. Ending the episode drops the interval, so no tick can fire for an
//! episode that no longer exists.

use std::sync::Arc;

use att_api::AttendanceBackend;
use att_core::{
    ActivityKind, AttendanceSnapshot, EpisodeId, IdleMonitor, IdlePhase, Notification,
    SessionStatus, TickAction, TrackerStatus, ValidationError, evaluate,
};
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::config::TrackerConfig;
use crate::error::{CallError, PunchOutFailure, bounded};
use crate::executor::{AutoPunchOut, PunchOutReceipt};
use crate::notify::Notifier;

/// An activity signal, timestamped when it was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivitySignal {
    pub kind: ActivityKind,
    pub at: Instant,
}

impl ActivitySignal {
    /// A signal observed now.
    pub fn now(kind: ActivityKind) -> Self {
        Self {
            kind,
            at: Instant::now(),
        }
    }
}

#[derive(Debug)]
enum Command {
    Activity(ActivitySignal),
    Refresh,
    Shutdown,
}

/// Cloneable sender for activity signals.
#[derive(Debug, Clone)]
pub struct ActivitySender {
    commands: mpsc::UnboundedSender<Command>,
}

impl ActivitySender {
    /// Forwards an activity signal observed now.
    ///
    /// Returns `false` once the tracker has stopped.
    pub fn send(&self, kind: ActivityKind) -> bool {
        self.commands
            .send(Command::Activity(ActivitySignal::now(kind)))
            .is_ok()
    }
}

/// Handle to a running tracker.
#[derive(Debug)]
pub struct TrackerHandle {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<TrackerStatus>,
    task: JoinHandle<()>,
}

impl TrackerHandle {
    /// The latest published status.
    pub fn status(&self) -> TrackerStatus {
        *self.status.borrow()
    }

    /// A receiver that is notified whenever the status changes.
    pub fn subscribe(&self) -> watch::Receiver<TrackerStatus> {
        self.status.clone()
    }

    pub fn activity_sender(&self) -> ActivitySender {
        ActivitySender {
            commands: self.commands.clone(),
        }
    }

    /// Records user activity observed now.
    pub fn record_activity(&self, kind: ActivityKind) {
        let _ = self
            .commands
            .send(Command::Activity(ActivitySignal::now(kind)));
    }

    /// Resets the idle clock as if the employee had just been active.
    pub fn reset_idle_timer(&self) {
        self.record_activity(ActivityKind::Manual);
    }

    /// Re-fetches the snapshot now instead of waiting for the next poll.
    pub fn refresh(&self) {
        let _ = self.commands.send(Command::Refresh);
    }

    /// Stops the tracker, cancelling its timers and in-flight calls.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Err(err) = self.task.await {
            tracing::error!(error = %err, "tracker task failed");
        }
    }
}

/// Attendance session tracker.
pub struct Tracker<B, N> {
    backend: Arc<B>,
    notifier: Arc<N>,
    config: TrackerConfig,
}

impl<B: AttendanceBackend, N: Notifier> Tracker<B, N> {
    pub fn new(
        backend: Arc<B>,
        notifier: Arc<N>,
        config: TrackerConfig,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self {
            backend,
            notifier,
            config,
        })
    }

    /// Starts the tracker on the current tokio runtime.
    ///
    /// The first reconciliation fetch is issued immediately.
    pub fn spawn(self) -> TrackerHandle {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(TrackerStatus::default());

        let runner = Runner {
            backend: self.backend,
            notifier: self.notifier,
            config: self.config,
            monitor: IdleMonitor::new(self.config.thresholds),
            ticker: None,
            server_status: None,
            fetch_in_flight: false,
            refresh_queued: false,
            calls: JoinSet::new(),
            status: status_tx,
        };
        let task = tokio::spawn(runner.run(commands_rx));

        TrackerHandle {
            commands: commands_tx,
            status: status_rx,
            task,
        }
    }
}

/// Tick interval bound to one idle episode.
struct EpisodeTicker {
    episode: EpisodeId,
    interval: Interval,
}

enum CallResult {
    Fetched(Result<AttendanceSnapshot, CallError>),
    PunchOut {
        episode: EpisodeId,
        outcome: Result<PunchOutReceipt, PunchOutFailure>,
    },
}

struct Runner<B, N> {
    backend: Arc<B>,
    notifier: Arc<N>,
    config: TrackerConfig,
    monitor: IdleMonitor,
    ticker: Option<EpisodeTicker>,
    /// Last status reported by the backend; `None` until a fetch succeeds.
    server_status: Option<SessionStatus>,
    fetch_in_flight: bool,
    refresh_queued: bool,
    calls: JoinSet<CallResult>,
    status: watch::Sender<TrackerStatus>,
}

impl<B: AttendanceBackend, N: Notifier> Runner<B, N> {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let mut reconcile = time::interval(self.config.reconciliation_interval);
        reconcile.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // Commands first, so activity that arrived before a tick is
            // applied before that tick is evaluated.
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(Command::Activity(signal)) => self.on_activity(signal),
                    Some(Command::Refresh) => self.request_refresh(),
                    Some(Command::Shutdown) | None => break,
                },
                Some(joined) = self.calls.join_next() => match joined {
                    Ok(result) => self.on_call_result(result),
                    Err(err) => {
                        tracing::error!(error = %err, "tracker call did not complete");
                        self.fetch_in_flight = false;
                    }
                },
                episode = next_tick(&mut self.ticker) => self.on_tick(episode),
                _ = reconcile.tick() => self.on_reconcile_tick(),
            }
            self.publish();
        }

        self.calls.abort_all();
        self.ticker = None;
        tracing::debug!("tracker stopped");
    }

    fn on_reconcile_tick(&mut self) {
        if self.fetch_in_flight {
            tracing::debug!("previous attendance fetch still running; skipping poll");
            return;
        }
        self.start_fetch();
    }

    fn request_refresh(&mut self) {
        if self.fetch_in_flight {
            self.refresh_queued = true;
            return;
        }
        self.start_fetch();
    }

    fn start_fetch(&mut self) {
        self.fetch_in_flight = true;
        let backend = Arc::clone(&self.backend);
        let limit = self.config.fetch_timeout;
        self.calls.spawn(async move {
            CallResult::Fetched(bounded(limit, backend.today_attendance()).await)
        });
    }

    fn on_call_result(&mut self, result: CallResult) {
        match result {
            CallResult::Fetched(fetched) => {
                self.fetch_in_flight = false;
                match fetched {
                    Ok(snapshot) => self.reconcile(evaluate(&snapshot)),
                    Err(err) => {
                        tracing::warn!(error = %err, "attendance fetch failed; skipping reconciliation");
                    }
                }
                if std::mem::take(&mut self.refresh_queued) {
                    self.start_fetch();
                }
            }
            CallResult::PunchOut { episode, outcome } => match outcome {
                Ok(receipt) => {
                    tracing::debug!(%episode, ?receipt, "auto punch-out finished; refreshing");
                    self.request_refresh();
                }
                Err(failure) => {
                    tracing::debug!(%episode, %failure, "episode stays closed until the session changes");
                }
            },
        }
    }

    /// Maps the backend status onto the idle episode lifecycle.
    fn reconcile(&mut self, status: SessionStatus) {
        let now = Instant::now();
        let previous = self.server_status.replace(status);
        if previous != Some(status) {
            tracing::info!(%status, "session status changed");
        }

        let running = self
            .monitor
            .episode()
            .map(|episode| (episode.id(), episode.session_start()));

        match (status, running) {
            (SessionStatus::PunchedIn { since }, None) => self.begin_episode(since, now),
            (SessionStatus::PunchedIn { since }, Some((episode, started))) if started != since => {
                tracing::info!(%episode, "open session was replaced; restarting idle episode");
                self.end_episode();
                self.begin_episode(since, now);
            }
            (SessionStatus::PunchedOut, Some(_)) => self.end_episode(),
            _ => {}
        }
    }

    fn begin_episode(&mut self, session_start: DateTime<Utc>, now: Instant) {
        let episode = self.monitor.begin(session_start, now.into_std());
        let period = self.config.tick_interval;
        let mut interval = time::interval_at(now + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.ticker = Some(EpisodeTicker { episode, interval });
        tracing::info!(%episode, "idle episode started");
    }

    fn end_episode(&mut self) {
        self.ticker = None;
        if let Some(episode) = self.monitor.end() {
            tracing::info!(%episode, "idle episode ended");
        }
    }

    fn on_activity(&mut self, signal: ActivitySignal) {
        let was_warned = self
            .monitor
            .episode()
            .is_some_and(|episode| episode.phase() == IdlePhase::Warned);

        if self.monitor.record_activity(signal.at.into_std()) {
            if was_warned {
                tracing::info!(kind = %signal.kind, "activity resumed; idle warning cleared");
            } else {
                tracing::trace!(kind = %signal.kind, "activity");
            }
        }
    }

    fn on_tick(&mut self, episode: EpisodeId) {
        let now = Instant::now().into_std();
        match self.monitor.tick(episode, now) {
            TickAction::Continue => {}
            TickAction::Warn { remaining } => {
                tracing::warn!(%episode, ?remaining, "idle warning");
                self.notifier
                    .notify(&Notification::IdleWarning { remaining });
            }
            TickAction::AutoPunchOut(episode) => {
                // The episode is terminal; nothing is left to tick.
                self.ticker = None;
                self.start_auto_punch_out(episode, now);
            }
        }
    }

    fn start_auto_punch_out(&mut self, episode: EpisodeId, now: std::time::Instant) {
        let Some(current) = self.monitor.episode().filter(|current| current.id() == episode) else {
            return;
        };
        let idle_for = current.idle_for(now);
        tracing::info!(%episode, ?idle_for, "idle limit reached; punching out");
        let executor = AutoPunchOut::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.notifier),
            current,
            idle_for,
            self.config.fetch_timeout,
        );
        self.calls.spawn(async move {
            CallResult::PunchOut {
                episode,
                outcome: executor.execute().await,
            }
        });
    }

    fn publish(&self) {
        let status = self
            .monitor
            .status(self.server_status, Instant::now().into_std());
        self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}

async fn next_tick(ticker: &mut Option<EpisodeTicker>) -> EpisodeId {
    match ticker {
        Some(ticker) => {
            ticker.interval.tick().await;
            ticker.episode
        }
        None => std::future::pending().await,
    }
}
