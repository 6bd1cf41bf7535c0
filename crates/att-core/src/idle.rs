//! Idle detection while punched in.
//!
//! # State Machine
//!
//! Each idle episode moves `Active -> Warned -> (Active | AutoPunchedOut)`.
//! Activity returns a warned episode to `Active`; crossing the auto punch-out
//! threshold is terminal for the episode.
//!
//! The monitor does no timing of its own. The caller ticks it at a fixed
//! cadence with the current instant, and every tick measures idle time from
//! the episode's current `last_activity_at`, so an activity signal recorded
//! between ticks always cancels a pending warning or punch-out.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::indicator::TrackerStatus;
use crate::status::SessionStatus;
use crate::types::{EpisodeId, ValidationError};

/// Idle time after which the employee is warned.
pub const DEFAULT_WARNING_THRESHOLD: Duration = Duration::from_secs(240);

/// Idle time after which the employee is punched out automatically.
pub const DEFAULT_AUTO_PUNCH_OUT_THRESHOLD: Duration = Duration::from_secs(300);

/// Warning and auto punch-out thresholds, measured from the last activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleThresholds {
    warning: Duration,
    auto_punch_out: Duration,
}

impl IdleThresholds {
    /// Creates thresholds, requiring `0 < warning < auto_punch_out`.
    pub fn new(warning: Duration, auto_punch_out: Duration) -> Result<Self, ValidationError> {
        if warning.is_zero() {
            return Err(ValidationError::Zero {
                field: "warning threshold",
            });
        }
        if warning >= auto_punch_out {
            return Err(ValidationError::ThresholdOrder {
                warning,
                auto_punch_out,
            });
        }
        Ok(Self {
            warning,
            auto_punch_out,
        })
    }

    pub const fn warning(&self) -> Duration {
        self.warning
    }

    pub const fn auto_punch_out(&self) -> Duration {
        self.auto_punch_out
    }
}

impl Default for IdleThresholds {
    fn default() -> Self {
        Self {
            warning: DEFAULT_WARNING_THRESHOLD,
            auto_punch_out: DEFAULT_AUTO_PUNCH_OUT_THRESHOLD,
        }
    }
}

/// Where an idle episode is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdlePhase {
    Active,
    Warned,
    AutoPunchedOut,
}

/// What the caller should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    /// Nothing to do.
    Continue,
    /// Surface the idle warning. Returned once per warning period.
    Warn { remaining: Duration },
    /// Punch the employee out. Returned at most once per episode.
    AutoPunchOut(EpisodeId),
}

/// Local idle tracking for one continuous punched-in period.
#[derive(Debug, Clone)]
pub struct IdleEpisode {
    id: EpisodeId,
    session_start: DateTime<Utc>,
    last_activity_at: Instant,
    warning_issued: bool,
    triggered: bool,
}

impl IdleEpisode {
    pub const fn id(&self) -> EpisodeId {
        self.id
    }

    /// Punch-in time of the backend session this episode tracks.
    pub const fn session_start(&self) -> DateTime<Utc> {
        self.session_start
    }

    pub const fn last_activity_at(&self) -> Instant {
        self.last_activity_at
    }

    pub const fn phase(&self) -> IdlePhase {
        if self.triggered {
            IdlePhase::AutoPunchedOut
        } else if self.warning_issued {
            IdlePhase::Warned
        } else {
            IdlePhase::Active
        }
    }

    /// Time since the last activity signal.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity_at)
    }

    /// Time left before auto punch-out, or `None` once it has fired.
    pub fn remaining(&self, now: Instant, thresholds: &IdleThresholds) -> Option<Duration> {
        if self.triggered {
            return None;
        }
        Some(thresholds.auto_punch_out.saturating_sub(self.idle_for(now)))
    }
}

/// Owns the single idle episode of a client and decides when to warn and
/// when to punch out.
#[derive(Debug)]
pub struct IdleMonitor {
    thresholds: IdleThresholds,
    episode: Option<IdleEpisode>,
    next_id: u64,
}

impl IdleMonitor {
    pub const fn new(thresholds: IdleThresholds) -> Self {
        Self {
            thresholds,
            episode: None,
            next_id: 1,
        }
    }

    pub const fn thresholds(&self) -> &IdleThresholds {
        &self.thresholds
    }

    pub const fn episode(&self) -> Option<&IdleEpisode> {
        self.episode.as_ref()
    }

    /// Starts an episode for the session that began at `session_start`.
    ///
    /// At most one episode exists; if one is already running its id is
    /// returned unchanged.
    pub fn begin(&mut self, session_start: DateTime<Utc>, now: Instant) -> EpisodeId {
        if let Some(episode) = &self.episode {
            tracing::debug!(episode = %episode.id, "idle episode already running");
            return episode.id;
        }

        let id = EpisodeId::new(self.next_id);
        self.next_id += 1;
        self.episode = Some(IdleEpisode {
            id,
            session_start,
            last_activity_at: now,
            warning_issued: false,
            triggered: false,
        });
        id
    }

    /// Destroys the current episode, returning its id.
    pub fn end(&mut self) -> Option<EpisodeId> {
        self.episode.take().map(|episode| episode.id)
    }

    /// Records an activity signal observed at `at`.
    ///
    /// Returns `true` when the idle clock was reset. Signals are ignored when
    /// no episode is running, after auto punch-out, and when older than the
    /// last recorded activity.
    pub fn record_activity(&mut self, at: Instant) -> bool {
        let Some(episode) = self.episode.as_mut() else {
            return false;
        };
        if episode.triggered || at < episode.last_activity_at {
            return false;
        }
        episode.last_activity_at = at;
        episode.warning_issued = false;
        true
    }

    /// Evaluates the thresholds for episode `id` at `now`.
    ///
    /// A tick for an episode that no longer exists is a no-op.
    pub fn tick(&mut self, id: EpisodeId, now: Instant) -> TickAction {
        let thresholds = self.thresholds;
        let Some(episode) = self.episode.as_mut().filter(|episode| episode.id == id) else {
            return TickAction::Continue;
        };
        if episode.triggered {
            return TickAction::Continue;
        }

        let idle = episode.idle_for(now);
        if idle >= thresholds.auto_punch_out {
            episode.triggered = true;
            return TickAction::AutoPunchOut(episode.id);
        }
        if idle >= thresholds.warning && !episode.warning_issued {
            episode.warning_issued = true;
            return TickAction::Warn {
                remaining: thresholds.auto_punch_out - idle,
            };
        }
        TickAction::Continue
    }

    /// The readout for the status indicator at `now`.
    ///
    /// `session` is the latest status reported by the backend, or `None`
    /// before the first successful fetch. Punched-in state always comes from
    /// it; the episode only contributes the countdown and idle phase.
    pub fn status(&self, session: Option<SessionStatus>, now: Instant) -> TrackerStatus {
        let mut status = TrackerStatus {
            is_known: session.is_some(),
            is_punched_in: session.is_some_and(|session| session.is_punched_in()),
            ..TrackerStatus::default()
        };
        if let Some(episode) = &self.episode {
            let phase = episode.phase();
            status.seconds_remaining = episode.remaining(now, &self.thresholds).map(ceil_secs);
            status.is_warning = phase == IdlePhase::Warned;
            status.idle_phase = Some(phase);
        }
        status
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    const SECOND: Duration = Duration::from_secs(1);

    fn nine_am() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap()
    }

    fn open() -> SessionStatus {
        SessionStatus::PunchedIn { since: nine_am() }
    }

    fn monitor() -> IdleMonitor {
        IdleMonitor::new(IdleThresholds::default())
    }

    /// Ticks once per second from `from` (exclusive) through `to` (inclusive)
    /// seconds after `start`, collecting every action that is not `Continue`.
    fn tick_through(
        monitor: &mut IdleMonitor,
        id: EpisodeId,
        start: Instant,
        from: u64,
        to: u64,
    ) -> Vec<(u64, TickAction)> {
        (from + 1..=to)
            .filter_map(|second| {
                let action = monitor.tick(id, start + SECOND * u32::try_from(second).unwrap());
                (action != TickAction::Continue).then_some((second, action))
            })
            .collect()
    }

    #[test]
    fn thresholds_reject_zero_warning() {
        assert_eq!(
            IdleThresholds::new(Duration::ZERO, SECOND),
            Err(ValidationError::Zero {
                field: "warning threshold"
            })
        );
    }

    #[test]
    fn thresholds_reject_warning_not_before_punch_out() {
        let err = IdleThresholds::new(SECOND * 300, SECOND * 300).unwrap_err();
        assert!(matches!(err, ValidationError::ThresholdOrder { .. }));
    }

    #[test]
    fn default_thresholds_are_four_and_five_minutes() {
        let thresholds = IdleThresholds::default();
        assert_eq!(thresholds.warning(), Duration::from_secs(240));
        assert_eq!(thresholds.auto_punch_out(), Duration::from_secs(300));
    }

    #[test]
    fn warns_once_then_punches_out_once() {
        let mut monitor = monitor();
        let start = Instant::now();
        let id = monitor.begin(nine_am(), start);

        let actions = tick_through(&mut monitor, id, start, 0, 400);

        assert_eq!(
            actions,
            vec![
                (
                    240,
                    TickAction::Warn {
                        remaining: SECOND * 60
                    }
                ),
                (300, TickAction::AutoPunchOut(id)),
            ]
        );
        assert_eq!(
            monitor.episode().unwrap().phase(),
            IdlePhase::AutoPunchedOut
        );
    }

    #[test]
    fn overlapping_ticks_trigger_punch_out_once() {
        let mut monitor = monitor();
        let start = Instant::now();
        let id = monitor.begin(nine_am(), start);
        let late = start + SECOND * 301;

        assert_eq!(monitor.tick(id, late), TickAction::AutoPunchOut(id));
        assert_eq!(monitor.tick(id, late), TickAction::Continue);
        assert_eq!(monitor.tick(id, late + SECOND), TickAction::Continue);
    }

    #[test]
    fn activity_just_before_threshold_prevents_punch_out() {
        let mut monitor = monitor();
        let start = Instant::now();
        let id = monitor.begin(nine_am(), start);

        assert_eq!(tick_through(&mut monitor, id, start, 0, 299).len(), 1);
        assert_eq!(monitor.episode().unwrap().phase(), IdlePhase::Warned);

        let activity = start + SECOND * 300 - Duration::from_millis(1);
        assert!(monitor.record_activity(activity));
        assert_eq!(monitor.episode().unwrap().phase(), IdlePhase::Active);

        assert_eq!(monitor.tick(id, start + SECOND * 300), TickAction::Continue);
        let status = monitor.status(Some(open()), start + SECOND * 300);
        assert_eq!(status.seconds_remaining, Some(300));
        assert!(!status.is_warning);

        // The countdown restarts from the activity, not from the episode start.
        let actions = tick_through(&mut monitor, id, start, 300, 600);
        assert_eq!(
            actions.iter().map(|(second, _)| *second).collect::<Vec<_>>(),
            vec![540, 600]
        );
    }

    #[test]
    fn jump_past_both_thresholds_punches_out_directly() {
        let mut monitor = monitor();
        let start = Instant::now();
        let id = monitor.begin(nine_am(), start);

        assert_eq!(
            monitor.tick(id, start + SECOND * 900),
            TickAction::AutoPunchOut(id)
        );
    }

    #[test]
    fn stale_episode_tick_is_a_no_op() {
        let mut monitor = monitor();
        let start = Instant::now();
        let first = monitor.begin(nine_am(), start);
        assert_eq!(monitor.end(), Some(first));

        let second = monitor.begin(nine_am(), start + SECOND * 10);
        assert_ne!(first, second);

        assert_eq!(
            monitor.tick(first, start + SECOND * 1000),
            TickAction::Continue
        );
        assert_eq!(monitor.episode().unwrap().phase(), IdlePhase::Active);
    }

    #[test]
    fn tick_after_end_is_a_no_op() {
        let mut monitor = monitor();
        let start = Instant::now();
        let id = monitor.begin(nine_am(), start);
        monitor.end();

        assert_eq!(monitor.tick(id, start + SECOND * 1000), TickAction::Continue);
    }

    #[test]
    fn begin_keeps_the_running_episode() {
        let mut monitor = monitor();
        let start = Instant::now();
        let first = monitor.begin(nine_am(), start);
        let again = monitor.begin(nine_am(), start + SECOND * 100);

        assert_eq!(first, again);
        assert_eq!(monitor.episode().unwrap().last_activity_at(), start);
    }

    #[test]
    fn new_episode_starts_with_a_fresh_clock() {
        let mut monitor = monitor();
        let start = Instant::now();
        monitor.begin(nine_am(), start);
        monitor.end();

        let restart = start + SECOND * 200;
        let id = monitor.begin(nine_am(), restart);

        assert_eq!(monitor.status(Some(open()), restart).seconds_remaining, Some(300));
        assert_eq!(monitor.tick(id, start + SECOND * 439), TickAction::Continue);
    }

    #[test]
    fn activity_without_episode_is_ignored() {
        let mut monitor = monitor();
        assert!(!monitor.record_activity(Instant::now()));
    }

    #[test]
    fn activity_after_auto_punch_out_is_ignored() {
        let mut monitor = monitor();
        let start = Instant::now();
        let id = monitor.begin(nine_am(), start);
        monitor.tick(id, start + SECOND * 300);

        assert!(!monitor.record_activity(start + SECOND * 301));
        assert_eq!(
            monitor.episode().unwrap().phase(),
            IdlePhase::AutoPunchedOut
        );
    }

    #[test]
    fn older_activity_does_not_rewind_the_clock() {
        let mut monitor = monitor();
        let start = Instant::now();
        monitor.begin(nine_am(), start);

        assert!(monitor.record_activity(start + SECOND * 50));
        assert!(!monitor.record_activity(start + SECOND * 20));
        assert_eq!(
            monitor.episode().unwrap().last_activity_at(),
            start + SECOND * 50
        );
    }

    #[test]
    fn status_reports_remaining_and_warning() {
        let mut monitor = monitor();
        let start = Instant::now();
        assert_eq!(monitor.status(None, start), TrackerStatus::default());

        let id = monitor.begin(nine_am(), start);
        let status = monitor.status(Some(open()), start + Duration::from_millis(1500));
        assert!(status.is_known);
        assert!(status.is_punched_in);
        assert_eq!(status.seconds_remaining, Some(299));
        assert!(!status.is_warning);

        monitor.tick(id, start + SECOND * 250);
        let status = monitor.status(Some(open()), start + SECOND * 250);
        assert!(status.is_warning);
        assert_eq!(status.seconds_remaining, Some(50));
        assert_eq!(status.idle_phase, Some(IdlePhase::Warned));

        monitor.tick(id, start + SECOND * 300);
        let status = monitor.status(Some(open()), start + SECOND * 300);
        assert!(status.is_punched_in);
        assert_eq!(status.seconds_remaining, None);
        assert_eq!(status.idle_phase, Some(IdlePhase::AutoPunchedOut));
    }

    #[test]
    fn punched_in_state_follows_the_backend() {
        let mut monitor = monitor();
        let start = Instant::now();
        monitor.begin(nine_am(), start);

        let status = monitor.status(Some(SessionStatus::PunchedOut), start);
        assert!(status.is_known);
        assert!(!status.is_punched_in);

        let status = monitor.status(None, start);
        assert!(!status.is_known);
        assert!(!status.is_punched_in);
    }
}
