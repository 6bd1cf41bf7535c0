//! Automatic punch-out.

use std::sync::Arc;
use std::time::Duration;

use att_api::AttendanceBackend;
use att_core::{EpisodeId, IdleEpisode, Notification, SessionStatus, evaluate};
use chrono::{DateTime, Utc};

use crate::error::{PunchOutFailure, bounded};
use crate::notify::Notifier;

/// What the executor did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunchOutReceipt {
    /// The punch-out call succeeded.
    PunchedOut,
    /// The session was already closed, so no call was made.
    AlreadyPunchedOut,
    /// A different session is open now, so no call was made.
    SessionReplaced,
}

/// One automatic punch-out for an idle episode.
///
/// Consumed by [`execute`](Self::execute), so each instance issues at most
/// one punch-out call.
#[derive(Debug)]
pub struct AutoPunchOut<B, N> {
    backend: Arc<B>,
    notifier: Arc<N>,
    episode: EpisodeId,
    session_start: DateTime<Utc>,
    idle_for: Duration,
    timeout: Duration,
}

impl<B: AttendanceBackend, N: Notifier> AutoPunchOut<B, N> {
    pub fn new(
        backend: Arc<B>,
        notifier: Arc<N>,
        episode: &IdleEpisode,
        idle_for: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            notifier,
            episode: episode.id(),
            session_start: episode.session_start(),
            idle_for,
            timeout,
        }
    }

    /// Punches the employee out and notifies them of the outcome.
    ///
    /// The session is re-checked first. Nothing is sent when the episode's
    /// session has been closed in the meantime, or replaced by a newer one.
    /// If the re-check itself fails the punch-out is attempted anyway.
    pub async fn execute(self) -> Result<PunchOutReceipt, PunchOutFailure> {
        let episode = self.episode;

        match bounded(self.timeout, self.backend.today_attendance()).await {
            Ok(snapshot) => match evaluate(&snapshot) {
                SessionStatus::PunchedOut => {
                    tracing::info!(%episode, "session already closed; skipping auto punch-out");
                    return Ok(PunchOutReceipt::AlreadyPunchedOut);
                }
                SessionStatus::PunchedIn { since } if since != self.session_start => {
                    tracing::info!(%episode, %since, "session was replaced; skipping auto punch-out");
                    return Ok(PunchOutReceipt::SessionReplaced);
                }
                SessionStatus::PunchedIn { .. } => {}
            },
            Err(err) => {
                tracing::warn!(%episode, error = %err, "could not re-check session before auto punch-out");
            }
        }

        match bounded(self.timeout, self.backend.punch_out()).await {
            Ok(()) => {
                tracing::info!(%episode, idle_for = ?self.idle_for, "auto punched out");
                self.notifier.notify(&Notification::AutoPunchedOut {
                    idle_for: self.idle_for,
                });
                Ok(PunchOutReceipt::PunchedOut)
            }
            Err(err) => {
                tracing::error!(%episode, error = %err, "auto punch-out failed");
                self.notifier.notify(&Notification::AutoPunchOutFailed {
                    reason: err.to_string(),
                });
                Err(PunchOutFailure(err))
            }
        }
    }
}
