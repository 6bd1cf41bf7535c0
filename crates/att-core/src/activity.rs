//! Activity signal kinds as the single source of truth for their string names.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// User input that proves the employee is at the desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    Pointer,
    Key,
    Scroll,
    Click,
    Touch,
    /// Injected through `reset_idle_timer` rather than observed input.
    Manual,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pointer => "pointer",
            Self::Key => "key",
            Self::Scroll => "scroll",
            Self::Click => "click",
            Self::Touch => "touch",
            Self::Manual => "manual",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ActivityKind {
    type Err = UnknownActivityKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pointer" | "mousemove" | "pointermove" => Ok(Self::Pointer),
            "key" | "keydown" | "keypress" => Ok(Self::Key),
            "scroll" | "wheel" => Ok(Self::Scroll),
            "click" | "mousedown" => Ok(Self::Click),
            "touch" | "touchstart" => Ok(Self::Touch),
            "manual" => Ok(Self::Manual),
            _ => Err(UnknownActivityKind(s.to_string())),
        }
    }
}

/// Error type for unknown activity kind strings.
#[derive(Debug, Clone, Error)]
#[error("unknown activity kind: {0}")]
pub struct UnknownActivityKind(String);
