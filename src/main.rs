mod app;
mod cli;
mod config;
mod download;
mod error;
mod install;
mod interface;
mod listing;
mod local;
mod present;
mod releases;
mod select;
mod source;
mod types;

#[cfg(test)]
mod tests;

use anyhow::Result;
use app::{App, Outcome};
use clap::Parser;
use cli::Cli;
use config::Config;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(&cli) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    if cli.version {
        println!("{}", cli::version_line());
        return ExitCode::SUCCESS;
    }

    match run(&cli).await {
        Ok(Outcome::Success) => ExitCode::SUCCESS,
        Ok(Outcome::Failure) => ExitCode::FAILURE,
        Ok(Outcome::Cancelled) => {
            tracing::info!("Operation cancelled.");
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<Outcome> {
    if !cli.update {
        return run_once(cli).await;
    }

    for step in cli.update_steps() {
        let outcome = run_once(&step).await?;
        if outcome != Outcome::Success {
            return Ok(outcome);
        }
    }
    Ok(Outcome::Success)
}

async fn run_once(cli: &Cli) -> Result<Outcome> {
    let config = Config::from_cli(cli)?;
    App::new(cli, config).run().await
}

fn setup_logging(cli: &Cli) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    // stdout is reserved for listings and test mode output
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(cli.verbose)
        .without_time()
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(())
}
