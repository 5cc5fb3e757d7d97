//! Command dispatch and handlers.

pub mod check;
pub mod process;
pub mod projects;
pub mod serve;

use std::env;
use std::path::PathBuf;

use crate::cassette::session::RecordingSession;
use crate::cli::Command;
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::logging;

/// Environment variable naming the directory recordings are written to.
pub const RECORD_ENV: &str = "TRACKSYNC_RECORD";

/// Dispatch a parsed command to its handler.
///
/// When `TRACKSYNC_RECORD` is set to a directory path, all upstream
/// interactions are recorded to per-port cassette files in that directory.
///
/// # Errors
///
/// Returns an error string if configuration is unusable or the selected
/// command handler fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    let mut settings = Settings::load().map_err(|e| e.to_string())?;
    apply_overrides(command, &mut settings);
    let _log_guard = logging::init(&settings.log_level, &settings.log_dir)?;

    let replay = match command {
        Command::Process { replay, .. } => replay.as_deref(),
        _ => None,
    };
    let (ctx, session) = if let Some(path) = replay {
        (ServiceContext::replaying(path)?, None)
    } else {
        settings.validate().map_err(|e| e.to_string())?;
        if let Ok(dir) = env::var(RECORD_ENV) {
            let session = RecordingSession::new(&PathBuf::from(dir))?;
            (ServiceContext::recording(&settings, &session), Some(session))
        } else {
            (ServiceContext::live(&settings), None)
        }
    };

    let result = dispatch_with_context(command, &ctx, &settings);

    // Finish recording after command completes (even on error)
    if let Some(session) = session {
        // Drop context first to release the recorders
        drop(ctx);
        finish_recording(session)?;
    }

    result
}

/// Folds command-line flags into the loaded settings.
fn apply_overrides(command: &Command, settings: &mut Settings) {
    match command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                settings.server.host.clone_from(host);
            }
            if let Some(port) = port {
                settings.server.port = *port;
            }
        }
        Command::Process { dry_run: true, .. } => settings.dry_run = true,
        _ => {}
    }
}

/// Dispatch a command with the given service context.
fn dispatch_with_context(
    command: &Command,
    ctx: &ServiceContext,
    settings: &Settings,
) -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))?;

    match command {
        Command::Serve { .. } => runtime.block_on(serve::run(ctx, settings)),
        Command::Process { payload, .. } => {
            let report = runtime.block_on(process::run(ctx, settings, payload))?;
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| format!("Failed to encode report: {e}"))?;
            println!("{json}");
            Ok(())
        }
        Command::Check => runtime.block_on(check::run(ctx, settings)),
        Command::Projects => runtime.block_on(projects::run(ctx, settings)),
    }
}

/// Finish a recording session and print the output directory.
fn finish_recording(session: RecordingSession) -> Result<(), String> {
    let output_dir = session.finish()?;
    eprintln!("Recording saved to: {}", output_dir.display());
    Ok(())
}
