//! `tracksync projects` command.

use std::fmt::Write as _;

use crate::config::{ProjectSettings, Settings};
use crate::context::ServiceContext;
use crate::engine::project::{resolve_project, MatchKind};
use crate::ports::{ScmProject, TrackerProject};

/// Lists GitLab and Redmine projects and prints a suggested mapping.
///
/// # Errors
///
/// Returns an error string if either project list cannot be fetched.
pub async fn run(ctx: &ServiceContext, settings: &Settings) -> Result<(), String> {
    let gitlab =
        ctx.scm.list_projects().await.map_err(|e| format!("Failed to list GitLab projects: {e}"))?;
    let redmine = ctx
        .tracker
        .list_projects()
        .await
        .map_err(|e| format!("Failed to list Redmine projects: {e}"))?;

    println!("GitLab projects:");
    for project in &gitlab {
        println!("  - {} (ID: {})", project.name, project.id);
    }
    println!("\nRedmine projects:");
    for project in &redmine {
        println!("  - {} (ID: {}, identifier: {})", project.name, project.id, project.identifier);
    }
    println!("\n{}", suggest_mapping(&gitlab, &redmine, &settings.projects));
    Ok(())
}

/// Renders a `projects.mapping` YAML block with one commented line per
/// GitLab project.
fn suggest_mapping(
    gitlab: &[ScmProject],
    redmine: &[TrackerProject],
    settings: &ProjectSettings,
) -> String {
    let mut out = String::from("Suggested configuration:\n\nprojects:\n  mapping:\n");
    for project in gitlab {
        let (target, note) = match resolve_project(&project.name, settings, redmine) {
            Some((found, MatchKind::Exact)) => (found.name.as_str(), "exact match"),
            Some((found, MatchKind::CaseInsensitive)) => {
                (found.name.as_str(), "case-insensitive match")
            }
            None => ("???", "no match found, set manually"),
        };
        let _ = writeln!(out, "    \"{}\": \"{target}\"  # {note}", project.name);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker(id: u64, name: &str, identifier: &str) -> TrackerProject {
        TrackerProject { id, name: name.into(), identifier: identifier.into() }
    }

    fn scm(id: u64, name: &str) -> ScmProject {
        ScmProject { id, name: name.into() }
    }

    #[test]
    fn suggestion_marks_each_match_kind() {
        let gitlab = [scm(1, "Web"), scm(2, "API"), scm(3, "infra")];
        let redmine = [tracker(10, "Web", "web"), tracker(11, "api", "backend")];
        let text = suggest_mapping(&gitlab, &redmine, &ProjectSettings::default());

        assert!(text.contains("\"Web\": \"Web\"  # exact match"));
        assert!(text.contains("\"API\": \"api\"  # case-insensitive match"));
        assert!(text.contains("\"infra\": \"???\"  # no match found, set manually"));
    }
}
