//! CLI subcommand implementations.

pub mod config;
pub mod punch;
pub mod status;
pub mod watch;
