//! `tracksync check` command.

use crate::config::Settings;
use crate::context::ServiceContext;
use crate::ports::CompletionRequest;

/// Probes each upstream service once and prints one line per service.
///
/// # Errors
///
/// Returns an error string naming the services that failed.
pub async fn run(ctx: &ServiceContext, settings: &Settings) -> Result<(), String> {
    let visible = |count: usize| format!("{count} projects visible");
    let gitlab = ctx.scm.list_projects().await.map(|p| visible(p.len()));
    let redmine = ctx.tracker.list_projects().await.map(|p| visible(p.len()));
    let request = CompletionRequest {
        model: settings.llm.model.clone(),
        system: "You are a connectivity probe.".into(),
        prompt: "Reply with OK.".into(),
        max_tokens: 5,
        temperature: 0.0,
    };
    let llm = ctx
        .llm
        .complete(&request)
        .await
        .map(|r| format!("model {} answered ({} tokens)", settings.llm.model, r.completion_tokens));

    let mut failed = Vec::new();
    for (service, result) in [("GitLab", gitlab), ("Redmine", redmine), ("LLM", llm)] {
        match result {
            Ok(detail) => println!("✓ {service}: {detail}"),
            Err(e) => {
                println!("✗ {service}: {e}");
                failed.push(service);
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(format!("Connectivity check failed for: {}", failed.join(", ")))
    }
}
