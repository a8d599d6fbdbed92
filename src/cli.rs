//! CLI definitions for Pantera.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Pantera CLI.
#[derive(Parser)]
#[command(name = "pantera")]
#[command(about = "Trip-offer detection and auto-bid engine")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    /// Emit console logs as JSON
    #[arg(long, global = true, env = "PANTERA_JSON_LOGS")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Replay a captured session through the engine under supervision
    Run {
        /// Replay scenario (JSON)
        #[arg(short, long)]
        scenario: PathBuf,
    },

    /// Extract, filter and price one trip text, printed as JSON
    Quote {
        /// Trip text as shown in the offer list
        text: String,
    },

    /// Validate the configuration and print warnings
    Check,
}
