mod config;
mod lunar;
mod message;
mod notifier;
mod quote;
#[cfg(test)]
mod test_support;
mod weather;
mod wechat;

use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use notifier::{Notifier, RunStatus};

#[derive(Parser)]
#[command(
    name = "lunar-notify",
    version,
    about = "Daily weather, lunar calendar and quote push for WeChat Official Accounts"
)]
struct Cli {
    #[arg(short, long, default_value = "config.toml", env = "LUNAR_NOTIFY_CONFIG")]
    config: String,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Gather everything and send today's message (default)
    Run,
    /// Write a sample config file
    Init,
    /// Print the lunar summary and holiday countdowns without sending anything
    Lunar {
        /// Date to describe (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Number of countdowns to show
        #[arg(long, default_value_t = 3)]
        limit: usize,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(&cli.config).await,
        Commands::Init => init(&cli.config).await,
        Commands::Lunar { date, limit } => {
            print_lunar(date.unwrap_or_else(|| Local::now().date_naive()), limit);
            Ok(RunStatus::Success)
        }
    };
    exit_code(result)
}

async fn run(config_path: &str) -> Result<RunStatus> {
    if std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true") {
        tracing::info!("Running under GitHub Actions");
    }
    tracing::info!("Starting daily notification run");

    let cfg = config::load(config_path)?;
    let mut notifier = Notifier::new(cfg)?;
    notifier.run(Local::now().date_naive()).await
}

async fn init(config_path: &str) -> Result<RunStatus> {
    if config::init_config(config_path)
        .await
        .context("Failed to initialize config")?
    {
        tracing::info!("Wrote sample config to {config_path}");
    } else {
        tracing::warn!("{config_path} already exists, leaving it untouched");
    }
    Ok(RunStatus::Success)
}

fn print_lunar(date: NaiveDate, limit: usize) {
    let (summary, countdowns) = notifier::lunar_section(date, limit);
    println!("{date}  {summary}");
    for countdown in &countdowns {
        println!("  {}", message::format_countdown(countdown));
    }
}

fn exit_code(result: Result<RunStatus>) -> ExitCode {
    match result {
        Ok(RunStatus::Success) => {
            tracing::info!("Done");
            ExitCode::SUCCESS
        }
        Ok(RunStatus::SendFailed { failed, total }) => {
            tracing::error!("Message delivery failed for {failed} of {total} recipient(s)");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
