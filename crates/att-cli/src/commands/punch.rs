//! Manual punch-in and punch-out.

use std::io::Write;

use anyhow::{Context, Result};

use crate::Config;

pub async fn punch_in<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let client = config.client().context("failed to create API client")?;
    client.submit_punch_in().await.context("punch-in failed")?;
    tracing::info!("punched in");
    writeln!(writer, "Punched in.")?;
    Ok(())
}

pub async fn punch_out<W: Write>(writer: &mut W, config: &Config) -> Result<()> {
    let client = config.client().context("failed to create API client")?;
    client.submit_punch_out().await.context("punch-out failed")?;
    tracing::info!("punched out");
    writeln!(writer, "Punched out.")?;
    Ok(())
}
