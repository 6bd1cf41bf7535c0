//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Attendance tracker with idle auto punch-out.
///
/// Keeps today's attendance in sync with the HR backend and punches the
/// employee out after a long stretch of inactivity.
#[derive(Debug, Parser)]
#[command(name = "att", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Track the session until interrupted.
    ///
    /// Activity is read from stdin, one signal per line (e.g. `key`,
    /// `pointer`). An empty line counts as manual activity.
    Watch {
        /// Print the status indicator whenever it changes.
        #[arg(long)]
        indicator: bool,

        /// Print each status change as a JSON line.
        #[arg(long, conflicts_with = "indicator")]
        json: bool,
    },

    /// Show today's attendance.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Punch in now.
    PunchIn,

    /// Punch out now.
    PunchOut,

    /// Print the effective configuration.
    Config,
}
