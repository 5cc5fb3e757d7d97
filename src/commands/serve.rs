//! `tracksync serve` command.

use crate::config::Settings;
use crate::context::ServiceContext;
use crate::engine::SyncEngine;
use crate::webhook::queue::{run_consumer, EventQueue};
use crate::webhook::server::{self, AppState};

/// Serves the webhook endpoint and processes queued pushes until shutdown.
///
/// The consumer keeps draining queued events after the server stops.
///
/// # Errors
///
/// Returns an error string if the engine cannot be built or the server
/// cannot bind its address.
pub async fn run(ctx: &ServiceContext, settings: &Settings) -> Result<(), String> {
    let engine = SyncEngine::new(ctx, settings)?;
    let (queue, rx) = EventQueue::bounded(settings.server.queue_capacity);
    let state = AppState::new(
        queue,
        settings.gitlab.webhook_secret.as_str(),
        settings.gitlab.url.as_str(),
        settings.redmine.url.as_str(),
    );
    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    let (served, _) = tokio::join!(server::serve(&addr, state), run_consumer(&engine, rx));
    served.map_err(|e| format!("Webhook server on {addr} failed: {e}"))
}
