//! Pantera - trip-offer detection and auto-bid engine
//!
//! Main entry point for the Pantera CLI.

mod cli;
mod cmd_check;
mod cmd_quote;
mod cmd_run;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use pantera_config::ConfigLoader;

use crate::cli::{Cli, Commands};

/// Base directory for Pantera state (`~/.pantera`).
fn pantera_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".pantera"))
        .unwrap_or_else(|| PathBuf::from(".pantera"))
}

/// Initialize tracing with console and daily-rotated file output.
fn init_tracing(json_logs: bool, log_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let log_dir = log_dir.unwrap_or_else(|| pantera_dir().join("logs"));
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("pantera")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&log_dir)
        .context("building log file appender")?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keeps the file writer flushing until the process exits.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console = if json_logs {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer().with_target(true).with_ansi(true).boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    let log_dir = config
        .supervisor
        .log_dir
        .as_ref()
        .map(|dir| PathBuf::from(ConfigLoader::expand_path(&dir.to_string_lossy())));
    init_tracing(cli.json_logs, log_dir)?;

    match cli.command {
        Commands::Run { scenario } => cmd_run::run(config, &scenario).await,
        Commands::Quote { text } => cmd_quote::quote(&config, &text),
        Commands::Check => cmd_check::check(&config),
    }
}
