//! Runtime settings for the tracker.

use std::time::Duration;

use att_core::{IdleThresholds, ValidationError};

/// Timing settings for a [`Tracker`](crate::Tracker).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Warning and auto punch-out thresholds.
    pub thresholds: IdleThresholds,

    /// How often the attendance snapshot is re-fetched.
    /// Default: 30 seconds.
    pub reconciliation_interval: Duration,

    /// How often the idle monitor is evaluated while punched in.
    /// Default: 1 second.
    pub tick_interval: Duration,

    /// Upper bound on each backend call made by the tracker. A call that
    /// runs longer is treated as failed.
    /// Default: 10 seconds.
    pub fetch_timeout: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            thresholds: IdleThresholds::default(),
            reconciliation_interval: Duration::from_secs(30),
            tick_interval: Duration::from_secs(1),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

impl TrackerConfig {
    /// Checks that every interval is positive.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("reconciliation interval", self.reconciliation_interval),
            ("tick interval", self.tick_interval),
            ("fetch timeout", self.fetch_timeout),
        ] {
            if value.is_zero() {
                return Err(ValidationError::Zero { field });
            }
        }
        Ok(())
    }
}
