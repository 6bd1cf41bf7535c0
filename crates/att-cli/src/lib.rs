//! Attendance tracker CLI library.
//!
//! This crate provides the command-line front end: configuration, terminal
//! notifications and the subcommands.

mod cli;
pub mod commands;
mod config;
pub mod notify;

pub use cli::{Cli, Commands};
pub use config::Config;
