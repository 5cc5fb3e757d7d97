//! `tracksync process` command.

use std::path::Path;

use crate::config::Settings;
use crate::context::ServiceContext;
use crate::engine::SyncEngine;
use crate::model::BatchReport;
use crate::webhook::payload::PushEvent;

/// Runs one stored push payload through the engine.
///
/// # Errors
///
/// Returns an error string if the payload cannot be read or parsed, or the
/// engine cannot be built. Per-commit failures are part of the report.
pub async fn run(
    ctx: &ServiceContext,
    settings: &Settings,
    payload: &Path,
) -> Result<BatchReport, String> {
    let text = ctx
        .fs
        .read_to_string(payload)
        .map_err(|e| format!("Failed to read payload {}: {e}", payload.display()))?;
    let event: PushEvent = serde_json::from_str(&text)
        .map_err(|e| format!("Failed to parse payload {}: {e}", payload.display()))?;

    let engine = SyncEngine::new(ctx, settings)?;
    Ok(engine.process_push(&event).await)
}
