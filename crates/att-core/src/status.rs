//! Session state evaluation.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::snapshot::AttendanceSnapshot;

/// Whether the employee is on the clock, derived from a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// The last session is open.
    PunchedIn {
        /// Punch-in time of the open session; identifies it across polls.
        since: DateTime<Utc>,
    },
    PunchedOut,
}

impl SessionStatus {
    pub const fn is_punched_in(&self) -> bool {
        matches!(self, Self::PunchedIn { .. })
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PunchedIn { since } => write!(f, "punched in since {}", since.to_rfc3339()),
            Self::PunchedOut => write!(f, "punched out"),
        }
    }
}

/// Derives the session status from a snapshot.
///
/// Punched in only when the last session has a readable punch-in and no
/// punch-out. Empty snapshots and malformed sessions evaluate to punched out.
pub fn evaluate(snapshot: &AttendanceSnapshot) -> SessionStatus {
    match snapshot.last_session() {
        Some(session) if session.is_open() => session
            .punch_in
            .map_or(SessionStatus::PunchedOut, |since| SessionStatus::PunchedIn {
                since,
            }),
        _ => SessionStatus::PunchedOut,
    }
}
