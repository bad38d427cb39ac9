//! Qvick CLI - dormitory attendance dashboard client

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::Commands;
use config::Settings;
use qvick_core::tracing::{InstrumentationConfig, init_tracing};
use qvick_http::ClientError;
use std::path::PathBuf;
use tracing::{debug, error};

#[derive(Parser)]
#[command(name = "qvick")]
#[command(about = "Dormitory attendance dashboard client")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML or YAML)
    #[arg(short = 'c', long = "config", global = true, env = "QVICK_CONFIG")]
    config: Option<PathBuf>,

    /// Set logging level (overrides the configured level)
    #[arg(short = 'l', long, global = true)]
    log_level: Option<LogLevel>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    const fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    let mut instrumentation = InstrumentationConfig::new(
        "qvick-cli",
        cli.log_level
            .map_or_else(|| settings.log_level.clone(), |level| level.as_filter().to_string()),
    );
    instrumentation.json = cli.json_logs;
    init_tracing(&instrumentation)?;

    debug!(base_url = %settings.api.base_url, "settings loaded");

    let client = commands::build_client(&settings)?;
    if let Err(e) = cli.command.execute(&client).await {
        error!("Command failed: {e:#}");
        eprintln!("Error: {e:#}");
        if e
            .downcast_ref::<ClientError>()
            .is_some_and(ClientError::is_session_expired)
        {
            eprintln!("Run `qvick login` to sign in.");
        }
        std::process::exit(1);
    }

    Ok(())
}
