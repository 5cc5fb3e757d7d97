//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `tracksync`.
#[derive(Debug, Parser)]
#[command(name = "tracksync", version, about = "Turn pushed commits into tracked issues")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the webhook server.
    Serve {
        /// Address to bind, overriding `server.host`.
        #[arg(long)]
        host: Option<String>,
        /// Port to bind, overriding `server.port`.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Process a stored push payload and print the batch report as JSON.
    Process {
        /// Path to a GitLab push event JSON file.
        payload: PathBuf,
        /// Decide everything but leave the tracker and the ledger untouched.
        #[arg(long)]
        dry_run: bool,
        /// Serve upstream calls from a cassette file or directory.
        #[arg(long, value_name = "CASSETTE")]
        replay: Option<PathBuf>,
    },
    /// Check connectivity to GitLab, Redmine and the model API.
    Check,
    /// List projects on both sides and suggest a mapping table.
    Projects,
}
