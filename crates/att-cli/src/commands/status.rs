//! Status command for showing today's attendance.

use std::fmt::Display;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use serde::Serialize;

use att_core::{AttendanceSnapshot, PunchSession, SessionStatus, evaluate};

use crate::Config;

pub async fn run<W: Write>(writer: &mut W, config: &Config, json: bool) -> Result<()> {
    let client = config.client().context("failed to create API client")?;
    let snapshot = client
        .fetch_today_attendance()
        .await
        .context("failed to fetch today's attendance")?;

    let now = Utc::now();
    if json {
        render_json(writer, &snapshot, now)
    } else {
        render(writer, &snapshot, now, &Local)
    }
}

/// Writes the human-readable report, with times shown in `tz`.
pub fn render<W, Tz>(
    writer: &mut W,
    snapshot: &AttendanceSnapshot,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Result<()>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    writeln!(writer, "Attendance today")?;
    match evaluate(snapshot) {
        SessionStatus::PunchedIn { since } => {
            writeln!(writer, "Status: punched in since {}", clock(since, tz))?;
        }
        SessionStatus::PunchedOut => writeln!(writer, "Status: punched out")?,
    }

    if snapshot.sessions.is_empty() {
        writeln!(writer, "No punches recorded today.")?;
        return Ok(());
    }

    writeln!(writer, "Worked: {}", hours_minutes(snapshot.worked(now)))?;
    writeln!(writer, "Credited: {:.2}h", snapshot.total_hours)?;
    writeln!(writer, "Sessions:")?;
    for session in &snapshot.sessions {
        writeln!(writer, "- {}", session_line(session, now, tz))?;
    }

    Ok(())
}

fn session_line<Tz>(session: &PunchSession, now: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let start = session
        .punch_in
        .map_or_else(|| "--:--".to_string(), |at| clock(at, tz));
    let end = if session.is_open() {
        "open".to_string()
    } else {
        session
            .punch_out
            .map_or_else(|| "--:--".to_string(), |at| clock(at, tz))
    };
    let worked = if session.malformed {
        "unreadable".to_string()
    } else {
        hours_minutes(session.worked(now))
    };
    format!("{start} -> {end} ({worked})")
}

fn clock<Tz>(at: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.with_timezone(tz).format("%H:%M").to_string()
}

fn hours_minutes(duration: Duration) -> String {
    let minutes = duration.num_minutes();
    format!("{}h {:02}m", minutes / 60, minutes % 60)
}

#[derive(Debug, Serialize)]
struct StatusReport {
    punched_in: bool,
    since: Option<DateTime<Utc>>,
    worked_minutes: i64,
    total_hours: f64,
    sessions: Vec<SessionReport>,
}

#[derive(Debug, Serialize)]
struct SessionReport {
    punch_in: Option<DateTime<Utc>>,
    punch_out: Option<DateTime<Utc>>,
    open: bool,
    malformed: bool,
}

/// Writes the report as pretty-printed JSON.
pub fn render_json<W: Write>(
    writer: &mut W,
    snapshot: &AttendanceSnapshot,
    now: DateTime<Utc>,
) -> Result<()> {
    let since = match evaluate(snapshot) {
        SessionStatus::PunchedIn { since } => Some(since),
        SessionStatus::PunchedOut => None,
    };
    let report = StatusReport {
        punched_in: since.is_some(),
        since,
        worked_minutes: snapshot.worked(now).num_minutes(),
        total_hours: snapshot.total_hours,
        sessions: snapshot
            .sessions
            .iter()
            .map(|session| SessionReport {
                punch_in: session.punch_in,
                punch_out: session.punch_out,
                open: session.is_open(),
                malformed: session.malformed,
            })
            .collect(),
    };
    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, hour, minute, 0).unwrap()
    }

    fn render_to_string(snapshot: &AttendanceSnapshot, now: DateTime<Utc>) -> String {
        let mut output = Vec::new();
        render(&mut output, snapshot, now, &Utc).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn status_lists_sessions_and_open_punch() {
        let mut snapshot = AttendanceSnapshot::new(vec![
            PunchSession::closed(at(9, 0), at(12, 0)),
            PunchSession::open(at(13, 0)),
        ]);
        snapshot.total_hours = 3.0;

        let output = render_to_string(&snapshot, at(14, 30));
        assert_snapshot!(output, @r"
Attendance today
Status: punched in since 13:00
Worked: 4h 30m
Credited: 3.00h
Sessions:
- 09:00 -> 12:00 (3h 00m)
- 13:00 -> open (1h 30m)
");
    }

    #[test]
    fn status_without_sessions() {
        let output = render_to_string(&AttendanceSnapshot::default(), at(8, 0));
        assert_snapshot!(output, @r"
Attendance today
Status: punched out
No punches recorded today.
");
    }

    #[test]
    fn malformed_last_session_reads_as_punched_out() {
        let snapshot = AttendanceSnapshot::new(vec![
            PunchSession::closed(at(9, 0), at(9, 45)),
            PunchSession {
                punch_in: Some(at(10, 0)),
                punch_out: None,
                malformed: true,
            },
        ]);

        let output = render_to_string(&snapshot, at(11, 0));
        assert_snapshot!(output, @r"
Attendance today
Status: punched out
Worked: 0h 45m
Credited: 0.00h
Sessions:
- 09:00 -> 09:45 (0h 45m)
- 10:00 -> --:-- (unreadable)
");
    }

    #[test]
    fn json_report_marks_open_session() {
        let snapshot = AttendanceSnapshot::new(vec![PunchSession::open(at(9, 0))]);
        let mut output = Vec::new();
        render_json(&mut output, &snapshot, at(9, 30)).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["punched_in"], true);
        assert_eq!(value["since"], "2025-03-14T09:00:00Z");
        assert_eq!(value["worked_minutes"], 30);
        assert_eq!(value["sessions"][0]["open"], true);
        assert_eq!(value["sessions"][0]["punch_out"], serde_json::Value::Null);
    }
}
