//! Watch command: runs the tracker until interrupted.

use std::sync::Arc;

use anyhow::{Context, Result};
use att_core::{ActivityKind, TrackerStatus, indicator};
use att_tracker::{ActivitySender, Tracker};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::Config;
use crate::notify::TerminalNotifier;

/// How status changes are printed while watching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutput {
    Silent,
    /// The one-line indicator text.
    Indicator,
    /// One JSON object per line.
    Json,
}

impl StatusOutput {
    /// The line to print for `status`, if any.
    pub fn line(self, status: &TrackerStatus) -> Result<Option<String>> {
        Ok(match self {
            Self::Silent => None,
            Self::Indicator => Some(indicator::render(status)),
            Self::Json => Some(serde_json::to_string(status)?),
        })
    }
}

pub async fn run(config: &Config, output: StatusOutput) -> Result<()> {
    let client = config.client().context("failed to create API client")?;
    let tracker_config = config
        .tracker_config()
        .context("invalid tracker configuration")?;
    tracing::info!(base_url = %client.base_url(), "starting attendance tracker");

    let handle = Tracker::new(Arc::new(client), Arc::new(TerminalNotifier), tracker_config)?
        .spawn();
    let activity = tokio::spawn(forward_activity(
        BufReader::new(tokio::io::stdin()),
        handle.activity_sender(),
    ));

    let mut status = handle.subscribe();
    let mut last_line = String::new();
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for ctrl-c")?;
                break;
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *status.borrow_and_update();
                if let Some(line) = output.line(&current)? {
                    if line != last_line {
                        println!("{line}");
                        last_line = line;
                    }
                }
            }
        }
    }

    activity.abort();
    handle.shutdown().await;
    tracing::info!("attendance tracker stopped");
    Ok(())
}

/// Forwards activity lines to the tracker until input ends or the tracker
/// stops. Returns the number of signals forwarded.
///
/// Each line names an [`ActivityKind`]; an empty line counts as manual
/// activity. Unknown kinds are logged and skipped.
pub async fn forward_activity<R>(reader: R, sender: ActivitySender) -> usize
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded = 0;
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read activity input");
                break;
            }
        };

        let trimmed = line.trim();
        let kind = if trimmed.is_empty() {
            ActivityKind::Manual
        } else {
            match trimmed.parse::<ActivityKind>() {
                Ok(kind) => kind,
                Err(err) => {
                    tracing::warn!(error = %err, "ignoring activity line");
                    continue;
                }
            }
        };

        if !sender.send(kind) {
            break;
        }
        forwarded += 1;
    }
    forwarded
}
