//! Core type definitions with validation.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Validation errors for tracker settings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A duration that must be positive was zero.
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    /// The warning would fire at or after the auto punch-out.
    #[error(
        "warning threshold ({warning:?}) must be shorter than auto punch-out threshold ({auto_punch_out:?})"
    )]
    ThresholdOrder {
        warning: Duration,
        auto_punch_out: Duration,
    },
}

/// Identity of one idle episode.
///
/// Allocated by the idle monitor from a monotonically increasing counter, so an
/// id is never reused within a process. Timers and in-flight calls carry the id
/// of the episode they were started for and are ignored once it is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EpisodeId(u64);

impl EpisodeId {
    pub(crate) const fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "episode-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn episode_id_display() {
        assert_eq!(EpisodeId::new(7).to_string(), "episode-7");
    }

    #[test]
    fn threshold_order_message_names_both_values() {
        let err = ValidationError::ThresholdOrder {
            warning: Duration::from_secs(300),
            auto_punch_out: Duration::from_secs(240),
        };
        assert_eq!(
            err.to_string(),
            "warning threshold (300s) must be shorter than auto punch-out threshold (240s)"
        );
    }
}
