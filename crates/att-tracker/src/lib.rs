//! Idle monitoring and reconciliation runtime.
//!
//! Runs the attendance session tracker on tokio:
//! - Reconciliation: polls today's attendance and starts or stops idle episodes
//! - Idle ticks: drives the idle monitor at a fixed cadence while punched in
//! - Auto punch-out: calls the backend once per idle episode
//!
//! All mutable state lives in a single task; callers interact with it
//! through a [`TrackerHandle`].

mod config;
mod error;
mod executor;
mod notify;
mod tracker;

pub use config::TrackerConfig;
pub use error::{CallError, PunchOutFailure};
pub use executor::{AutoPunchOut, PunchOutReceipt};
pub use notify::Notifier;
pub use tracker::{ActivitySender, ActivitySignal, Tracker, TrackerHandle};
