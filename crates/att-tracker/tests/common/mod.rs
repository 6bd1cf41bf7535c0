//! In-memory backend and notifier shared by the tracker tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use att_api::{ApiError, AttendanceBackend};
use att_core::{AttendanceSnapshot, Notification, PunchSession};
use att_tracker::{Notifier, Tracker, TrackerConfig, TrackerHandle};
use chrono::{DateTime, TimeZone, Utc};
use tokio::time::Instant;

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, hour, minute, 0).unwrap()
}

/// Sleeps until `millis` after `start` on the (paused) tokio clock.
pub async fn advance_to(start: Instant, millis: u64) {
    tokio::time::sleep_until(start + Duration::from_millis(millis)).await;
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub sessions: Vec<PunchSession>,
    pub fail_fetch: bool,
    pub fail_punch_out: bool,
    pub fetch_delay: Option<Duration>,
    /// Response body served instead of `sessions`, parsed like the HTTP client does.
    pub body: Option<&'static str>,
    pub fetch_calls: usize,
    pub punch_out_calls: usize,
}

/// Attendance backend holding today's sessions in memory.
#[derive(Debug, Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn punched_in_at(since: DateTime<Utc>) -> Self {
        let backend = Self::default();
        backend.with(|state| state.sessions.push(PunchSession::open(since)));
        backend
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    /// Closes the open session, as an admin edit or another device would.
    pub fn close_session(&self, at: DateTime<Utc>) {
        self.with(|state| {
            if let Some(last) = state.sessions.last_mut() {
                last.punch_out = Some(at);
            }
        });
    }

    pub fn punch_in(&self, at: DateTime<Utc>) {
        self.with(|state| state.sessions.push(PunchSession::open(at)));
    }

    pub fn punch_out_calls(&self) -> usize {
        self.with(|state| state.punch_out_calls)
    }

    pub fn fetch_calls(&self) -> usize {
        self.with(|state| state.fetch_calls)
    }
}

impl AttendanceBackend for FakeBackend {
    async fn today_attendance(&self) -> Result<AttendanceSnapshot, ApiError> {
        let delay = self.with(|state| {
            state.fetch_calls += 1;
            state.fetch_delay
        });
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.with(|state| {
            if state.fail_fetch {
                Err(ApiError::InvalidResponse("backend unavailable".to_string()))
            } else if let Some(body) = state.body {
                AttendanceSnapshot::from_json(body)
                    .map(|parsed| parsed.snapshot)
                    .map_err(|err| ApiError::InvalidResponse(err.to_string()))
            } else {
                Ok(AttendanceSnapshot::new(state.sessions.clone()))
            }
        })
    }

    async fn punch_out(&self) -> Result<(), ApiError> {
        self.with(|state| {
            state.punch_out_calls += 1;
            if state.fail_punch_out {
                return Err(ApiError::InvalidResponse("punch-out rejected".to_string()));
            }
            if let Some(last) = state.sessions.last_mut() {
                if last.punch_out.is_none() {
                    last.punch_out = Some(at(17, 0));
                }
            }
            Ok(())
        })
    }
}

/// Notifier that keeps everything it was asked to show.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> usize {
        self.notifications()
            .iter()
            .filter(|n| matches!(n, Notification::IdleWarning { .. }))
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        self.seen.lock().unwrap().push(notification.clone());
    }
}

pub struct Harness {
    pub backend: Arc<FakeBackend>,
    pub notifier: Arc<RecordingNotifier>,
    pub handle: TrackerHandle,
    pub start: Instant,
}

/// Spawns a tracker with default timings against `backend`.
pub fn start(backend: FakeBackend) -> Harness {
    let backend = Arc::new(backend);
    let notifier = Arc::new(RecordingNotifier::default());
    let start = Instant::now();
    let handle = Tracker::new(
        Arc::clone(&backend),
        Arc::clone(&notifier),
        TrackerConfig::default(),
    )
    .unwrap()
    .spawn();

    Harness {
        backend,
        notifier,
        handle,
        start,
    }
}
