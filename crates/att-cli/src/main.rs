use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use att_cli::commands::{config, punch, status, watch};
use att_cli::{Cli, Commands, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so stdout stays clean for command output
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let mut stdout = std::io::stdout();
    match command {
        Commands::Watch { indicator, json } => {
            let output = if *json {
                watch::StatusOutput::Json
            } else if *indicator {
                watch::StatusOutput::Indicator
            } else {
                watch::StatusOutput::Silent
            };
            watch::run(&config, output).await?;
        }
        Commands::Status { json } => status::run(&mut stdout, &config, *json).await?,
        Commands::PunchIn => punch::punch_in(&mut stdout, &config).await?,
        Commands::PunchOut => punch::punch_out(&mut stdout, &config).await?,
        Commands::Config => config::run(&mut stdout, &config)?,
    }

    Ok(())
}
