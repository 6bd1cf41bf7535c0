//! Today's attendance record as last observed from the backend.
//!
//! The backend response is read leniently: anything unexpected inside a
//! session is reported as a [`SnapshotIssue`] and the session is marked
//! malformed, which the evaluator treats as closed.

use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

/// One contiguous interval of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PunchSession {
    /// When the employee punched in.
    pub punch_in: Option<DateTime<Utc>>,
    /// When the employee punched out; absent while the session is open.
    pub punch_out: Option<DateTime<Utc>>,
    /// The backend sent fields we could not read.
    pub malformed: bool,
}

impl PunchSession {
    /// A session that is still running.
    pub const fn open(punch_in: DateTime<Utc>) -> Self {
        Self {
            punch_in: Some(punch_in),
            punch_out: None,
            malformed: false,
        }
    }

    /// A finished session.
    pub const fn closed(punch_in: DateTime<Utc>, punch_out: DateTime<Utc>) -> Self {
        Self {
            punch_in: Some(punch_in),
            punch_out: Some(punch_out),
            malformed: false,
        }
    }

    /// Whether this session clearly evidences an open punch.
    pub const fn is_open(&self) -> bool {
        !self.malformed && self.punch_in.is_some() && self.punch_out.is_none()
    }

    /// Time worked in this session, counting an open session up to `now`.
    pub fn worked(&self, now: DateTime<Utc>) -> Duration {
        match (self.punch_in, self.punch_out) {
            (Some(start), Some(end)) if end > start => end - start,
            (Some(start), None) if self.is_open() && now > start => now - start,
            _ => Duration::zero(),
        }
    }
}

/// Today's attendance record.
///
/// Replaced wholesale on every successful fetch and never mutated locally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceSnapshot {
    /// Punch sessions in chronological order.
    pub sessions: Vec<PunchSession>,
    /// Hours the backend has credited for today.
    pub total_hours: f64,
}

impl AttendanceSnapshot {
    /// Creates a snapshot from sessions, with no hours credited yet.
    pub const fn new(sessions: Vec<PunchSession>) -> Self {
        Self {
            sessions,
            total_hours: 0.0,
        }
    }

    /// The most recent session, if any.
    pub fn last_session(&self) -> Option<&PunchSession> {
        self.sessions.last()
    }

    /// Sum of worked time across all sessions.
    pub fn worked(&self, now: DateTime<Utc>) -> Duration {
        self.sessions
            .iter()
            .fold(Duration::zero(), |acc, session| acc + session.worked(now))
    }

    /// Parses a `today-attendance` response body.
    ///
    /// Fails only when the body is not a JSON object. Anything unexpected
    /// inside it is collected as an issue.
    pub fn from_json(body: &str) -> Result<ParsedSnapshot, serde_json::Error> {
        match serde_json::from_str::<Value>(body)? {
            Value::Object(fields) => Ok(read_attendance(&fields)),
            _ => Err(serde::de::Error::custom("expected a JSON object")),
        }
    }
}

/// A snapshot together with the malformed content found while reading it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSnapshot {
    pub snapshot: AttendanceSnapshot,
    pub issues: Vec<SnapshotIssue>,
}

/// Malformed content in a `today-attendance` response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotIssue {
    #[error("response has no punchSessions array")]
    MissingSessions,

    #[error("session {index} is not an object")]
    MalformedSession { index: usize },

    #[error("session {index} has no punch-in time")]
    MissingPunchIn { index: usize },

    #[error("session {index} has a punch-out without a time")]
    MissingPunchOutTime { index: usize },

    #[error("session {index} has an unreadable {field} time: {value}")]
    InvalidTime {
        index: usize,
        field: &'static str,
        value: String,
    },

    #[error("totalHours is not a number: {value}")]
    InvalidTotalHours { value: String },
}

fn read_attendance(fields: &Map<String, Value>) -> ParsedSnapshot {
    let mut issues = Vec::new();

    let sessions = match fields.get("punchSessions") {
        Some(Value::Array(entries)) => entries
            .iter()
            .enumerate()
            .map(|(index, entry)| read_session(index, entry, &mut issues))
            .collect(),
        _ => {
            issues.push(SnapshotIssue::MissingSessions);
            Vec::new()
        }
    };

    let total_hours = match fields.get("totalHours") {
        None | Some(Value::Null) => 0.0,
        Some(value) => read_hours(value).unwrap_or_else(|| {
            issues.push(SnapshotIssue::InvalidTotalHours {
                value: value.to_string(),
            });
            0.0
        }),
    };

    ParsedSnapshot {
        snapshot: AttendanceSnapshot {
            sessions,
            total_hours,
        },
        issues,
    }
}

fn read_session(index: usize, entry: &Value, issues: &mut Vec<SnapshotIssue>) -> PunchSession {
    let Value::Object(fields) = entry else {
        issues.push(SnapshotIssue::MalformedSession { index });
        return PunchSession {
            punch_in: None,
            punch_out: None,
            malformed: true,
        };
    };

    let mut malformed = false;

    let punch_in = match fields.get("punchIn") {
        None | Some(Value::Null) => {
            issues.push(SnapshotIssue::MissingPunchIn { index });
            malformed = true;
            None
        }
        Some(stamp) => match stamp_time(stamp) {
            Some(Value::Null) | None if stamp.is_object() => {
                issues.push(SnapshotIssue::MissingPunchIn { index });
                malformed = true;
                None
            }
            time => read_stamp(index, "punchIn", stamp, time, &mut malformed, issues),
        },
    };

    // An absent or null punchOut means the session is open. A punchOut we
    // cannot read must not be mistaken for an open session.
    let punch_out = match fields.get("punchOut") {
        None | Some(Value::Null) => None,
        Some(stamp) => match stamp_time(stamp) {
            Some(Value::Null) | None if stamp.is_object() => {
                issues.push(SnapshotIssue::MissingPunchOutTime { index });
                malformed = true;
                None
            }
            time => read_stamp(index, "punchOut", stamp, time, &mut malformed, issues),
        },
    };

    PunchSession {
        punch_in,
        punch_out,
        malformed,
    }
}

/// The `time` member of a `{ "time": ... }` stamp.
fn stamp_time(stamp: &Value) -> Option<&Value> {
    stamp.as_object().and_then(|fields| fields.get("time"))
}

fn read_stamp(
    index: usize,
    field: &'static str,
    stamp: &Value,
    time: Option<&Value>,
    malformed: &mut bool,
    issues: &mut Vec<SnapshotIssue>,
) -> Option<DateTime<Utc>> {
    let parsed = time.and_then(read_time);
    if parsed.is_none() {
        issues.push(SnapshotIssue::InvalidTime {
            index,
            field,
            value: time.unwrap_or(stamp).to_string(),
        });
        *malformed = true;
    }
    parsed
}

/// Reads an RFC 3339 string or epoch milliseconds.
fn read_time(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn read_hours(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
