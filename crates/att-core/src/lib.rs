//! Core domain logic for attendance session tracking.
//!
//! This crate contains the fundamental types and logic for:
//! - Snapshots: today's punch sessions as reported by the backend
//! - Session evaluation: deriving punched-in/punched-out from a snapshot
//! - Idle monitoring: warning and auto punch-out decisions per idle episode
//! - Status indicator: the readout consumed by the surrounding UI

pub mod activity;
pub mod idle;
pub mod indicator;
pub mod notification;
pub mod snapshot;
pub mod status;
mod types;

pub use activity::{ActivityKind, UnknownActivityKind};
pub use idle::{IdleEpisode, IdleMonitor, IdlePhase, IdleThresholds, TickAction};
pub use indicator::TrackerStatus;
pub use notification::{Notification, Severity};
pub use snapshot::{AttendanceSnapshot, ParsedSnapshot, PunchSession, SnapshotIssue};
pub use status::{SessionStatus, evaluate};
pub use types::{EpisodeId, ValidationError};
