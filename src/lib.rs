//! Core library entry for the `tracksync` service.
//!
//! GitLab push events come in through the webhook server or the `process`
//! command; each commit is classified and mirrored into Redmine by the
//! [`engine::SyncEngine`].

pub mod adapters;
pub mod cassette;
pub mod classify;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod diff;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod model;
pub mod ports;
pub mod reference;
pub mod webhook;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(&cli.command)
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn run_errors_on_unknown_subcommand() {
        let result = run(["tracksync", "unknown"]);
        assert!(result.is_err());
    }

    #[test]
    fn run_errors_without_subcommand() {
        assert!(run(["tracksync"]).is_err());
    }
}
