//! User-visible notifications raised by the tracker.

use std::fmt;
use std::time::Duration;

/// How prominently a notification should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A message for the employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Inactivity crossed the warning threshold.
    IdleWarning { remaining: Duration },
    /// The tracker punched the employee out.
    AutoPunchedOut { idle_for: Duration },
    /// The automatic punch-out call failed; the employee must punch out by hand.
    AutoPunchOutFailed { reason: String },
}

impl Notification {
    pub const fn severity(&self) -> Severity {
        match self {
            Self::IdleWarning { .. } => Severity::Warning,
            Self::AutoPunchedOut { .. } => Severity::Info,
            Self::AutoPunchOutFailed { .. } => Severity::Error,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdleWarning { remaining } => write!(
                f,
                "You have been inactive. You will be punched out automatically in {} unless you resume activity.",
                humanize(*remaining)
            ),
            Self::AutoPunchedOut { idle_for } => write!(
                f,
                "You were punched out automatically after {} of inactivity.",
                humanize(*idle_for)
            ),
            Self::AutoPunchOutFailed { reason } => write!(
                f,
                "Automatic punch-out failed ({reason}). Please punch out manually."
            ),
        }
    }
}

/// Renders a duration as minutes and seconds, e.g. `4 minutes 30 seconds`.
fn humanize(duration: Duration) -> String {
    let total = duration.as_secs();
    let (minutes, seconds) = (total / 60, total % 60);
    let unit = |n: u64, name: &str| {
        if n == 1 {
            format!("1 {name}")
        } else {
            format!("{n} {name}s")
        }
    };
    match (minutes, seconds) {
        (0, s) => unit(s, "second"),
        (m, 0) => unit(m, "minute"),
        (m, s) => format!("{} {}", unit(m, "minute"), unit(s, "second")),
    }
}
