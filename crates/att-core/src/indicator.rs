//! Status indicator readout.

use serde::Serialize;

use crate::idle::IdlePhase;

/// Subscribable tracker status consumed by the surrounding UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrackerStatus {
    /// A snapshot has been fetched successfully at least once.
    pub is_known: bool,
    /// The latest snapshot shows an open session.
    pub is_punched_in: bool,
    /// Whole seconds until auto punch-out, rounded up.
    pub seconds_remaining: Option<u64>,
    pub is_warning: bool,
    pub idle_phase: Option<IdlePhase>,
}

/// Renders the one-line indicator text.
pub fn render(status: &TrackerStatus) -> String {
    if !status.is_known {
        return "Status unknown".to_string();
    }
    if status.idle_phase == Some(IdlePhase::AutoPunchedOut) {
        return if status.is_punched_in {
            "Punched in | auto punch-out not confirmed".to_string()
        } else {
            "Auto punched out".to_string()
        };
    }
    match (status.is_punched_in, status.seconds_remaining) {
        (true, Some(seconds)) if status.is_warning => {
            format!("Idle warning | auto punch-out in {}", clock(seconds))
        }
        (true, Some(seconds)) => format!("Punched in | auto punch-out in {}", clock(seconds)),
        (true, None) => "Punched in".to_string(),
        (false, _) => "Punched out".to_string(),
    }
}

/// Formats seconds as `M:SS`.
pub fn clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
