//! Prompt templates.
//!
//! Templates use `{name}` placeholders. Unknown placeholders are left as
//! they are, so JSON examples inside a template survive rendering.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Deserialize;

use crate::ports::{ScmIssue, TrackerIssue};

const DEFAULT_SYSTEM: &str = "You link source-control commits to issues in a Redmine \
tracker. Given one commit and the project's open issues, decide whether the commit \
continues an existing issue or needs a new one. Answer with a single JSON object and \
nothing else.";

const DECISION_CONTRACT: &str = r#"Respond with JSON only:
{"action": "create" or "update",
 "redmine_issue_id": <existing issue id, required for update>,
 "tracker_id": <1 bug, 2 feature, 3 support>,
 "priority_id": <1 low, 2 normal, 3 high, 4 urgent, 5 immediate>,
 "subject": "<one-line subject>",
 "description": "<what changed and why>",
 "done_ratio": <0-100>,
 "confidence": <0-100>,
 "reasoning": "<why this issue, or why a new one>"}"#;

const DEFAULT_ANALYSIS: &str = "Repository: {repository}
Branch: {branch}
Author: {author}
Commit: {commit_hash}

Commit message:
{commit_message}

Changed files: {files_count}
{diff_summary}

Source-control issue:
{scm_issue}

Open tracker issues:
{open_issues}

Decide whether this commit advances one of the open issues or needs a new issue.
{decision_contract}";

const DEFAULT_CHUNK: &str = r#"Repository: {repository}
Commit: {commit_hash}
Commit message:
{commit_message}

This is part {chunk_index} of {chunk_count} of a large commit.
{diff_summary}

Describe only this part. Respond with JSON only:
{"summary": "<what this part changes>",
 "kind": "feature, bugfix, refactor, docs, test or chore",
 "areas": ["<module or component>"],
 "issue_hints": ["<issue numbers or topics this part relates to>"]}"#;

const DEFAULT_SYNTHESIS: &str = "Repository: {repository}
Branch: {branch}
Author: {author}
Commit: {commit_hash}

Commit message:
{commit_message}

Changed files: {files_count}
The diff was too large to read at once. It was split into {chunk_count} parts, \
summarized below in order. Parts marked unavailable could not be summarized.

{chunk_results}

Source-control issue:
{scm_issue}

Open tracker issues:
{open_issues}

Decide whether this commit advances one of the open issues or needs a new issue.
{decision_contract}";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("valid placeholder pattern"));

/// Fills `{name}` placeholders from `values`; unknown names stay verbatim.
#[must_use]
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let name = &caps[1];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map_or_else(|| caps[0].to_string(), |(_, value)| (*value).to_string())
        })
        .into_owned()
}

#[derive(Debug, Default, Deserialize)]
struct PromptOverrides {
    system: Option<String>,
    analysis: Option<String>,
    chunk: Option<String>,
    synthesis: Option<String>,
}

/// The four templates used to talk to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    /// Role instruction sent as the system message.
    pub system: String,
    /// Single-shot classification prompt.
    pub analysis: String,
    /// Per-chunk notes prompt.
    pub chunk: String,
    /// Chunk synthesis prompt.
    pub synthesis: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        let with_contract = |t: &str| render(t, &[("decision_contract", DECISION_CONTRACT)]);
        Self {
            system: DEFAULT_SYSTEM.to_string(),
            analysis: with_contract(DEFAULT_ANALYSIS),
            chunk: DEFAULT_CHUNK.to_string(),
            synthesis: with_contract(DEFAULT_SYNTHESIS),
        }
    }
}

impl PromptSet {
    /// Built-in templates, with any keys of the YAML file at `path` replacing
    /// the matching template.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a YAML mapping
    /// of template names to strings.
    pub fn load(path: Option<&Path>) -> Result<Self, String> {
        let mut prompts = Self::default();
        let Some(path) = path else {
            return Ok(prompts);
        };
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read prompt file {}: {e}", path.display()))?;
        let overrides: PromptOverrides = serde_yaml::from_str(&content)
            .map_err(|e| format!("Failed to parse prompt file {}: {e}", path.display()))?;

        let slots = [
            (overrides.system, &mut prompts.system),
            (overrides.analysis, &mut prompts.analysis),
            (overrides.chunk, &mut prompts.chunk),
            (overrides.synthesis, &mut prompts.synthesis),
        ];
        for (value, slot) in slots {
            if let Some(value) = value {
                *slot = render(&value, &[("decision_contract", DECISION_CONTRACT)]);
            }
        }
        Ok(prompts)
    }
}

fn excerpt(text: Option<&str>, max_chars: usize) -> String {
    let text = text.map(str::trim).filter(|t| !t.is_empty()).unwrap_or("N/A");
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        out.push_str("...");
    }
    out.replace('\n', " ")
}

/// Numbered listing of open issues for a prompt.
#[must_use]
pub fn format_open_issues(issues: &[TrackerIssue]) -> String {
    if issues.is_empty() {
        return "No open issues.".to_string();
    }
    let name = |r: Option<&crate::ports::NamedRef>, fallback: &str| {
        r.map_or_else(|| fallback.to_string(), |r| r.name.clone())
    };

    let mut out = String::new();
    for (n, issue) in issues.iter().enumerate() {
        if n > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{}. Issue #{}: \"{}\"", n + 1, issue.id, issue.subject);
        let _ = writeln!(out, "   - Tracker: {}", name(issue.tracker.as_ref(), "Unknown"));
        let _ = writeln!(out, "   - Status: {}", name(issue.status.as_ref(), "Unknown"));
        let _ = writeln!(out, "   - Assigned: {}", name(issue.assigned_to.as_ref(), "Unassigned"));
        let _ = writeln!(out, "   - Progress: {}%", issue.done_ratio);
        let _ = writeln!(out, "   - Description: {}", excerpt(issue.description.as_deref(), 100));
    }
    out.trim_end().to_string()
}

/// Block describing the referenced source-control issue, or `none`.
#[must_use]
pub fn format_scm_issue(issue: Option<&ScmIssue>) -> String {
    issue.map_or_else(
        || "none".to_string(),
        |issue| {
            format!(
                "Issue #{}: {}\nDescription: {}",
                issue.iid,
                issue.title,
                excerpt(issue.description.as_deref(), 200)
            )
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::NamedRef;

    #[test]
    fn render_fills_known_and_keeps_unknown_placeholders() {
        let values = [("repository", "shop"), ("branch", "main")];
        let out = render("{repository}@{branch} {unknown} {\"a\": 1}", &values);
        assert_eq!(out, "shop@main {unknown} {\"a\": 1}");
    }

    #[test]
    fn defaults_carry_every_analysis_placeholder() {
        let prompts = PromptSet::default();
        for name in [
            "repository",
            "branch",
            "author",
            "commit_hash",
            "commit_message",
            "files_count",
            "diff_summary",
            "scm_issue",
            "open_issues",
        ] {
            assert!(prompts.analysis.contains(&format!("{{{name}}}")), "missing {name}");
        }
        assert!(prompts.analysis.contains("\"redmine_issue_id\""));
        assert!(!prompts.synthesis.contains("{decision_contract}"));
        assert!(prompts.synthesis.contains("{chunk_results}"));
    }

    #[test]
    fn yaml_file_overrides_only_named_templates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompts.yaml");
        std::fs::write(&path, "system: Be terse.\n").unwrap();

        let prompts = PromptSet::load(Some(&path)).unwrap();
        assert_eq!(prompts.system, "Be terse.");
        assert_eq!(prompts.analysis, PromptSet::default().analysis);
    }

    #[test]
    fn missing_prompt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PromptSet::load(Some(&dir.path().join("absent.yaml"))).is_err());
    }

    #[test]
    fn open_issue_listing_truncates_descriptions() {
        let issue = TrackerIssue {
            id: 15,
            subject: "Checkout crashes".into(),
            description: Some("x".repeat(150)),
            tracker: Some(NamedRef { id: 1, name: "Bug".into(), is_closed: false }),
            status: Some(NamedRef { id: 2, name: "In Progress".into(), is_closed: false }),
            priority: None,
            assigned_to: None,
            done_ratio: 40,
        };
        let text = format_open_issues(&[issue]);

        assert!(text.starts_with("1. Issue #15: \"Checkout crashes\""));
        assert!(text.contains("   - Tracker: Bug"));
        assert!(text.contains("   - Assigned: Unassigned"));
        assert!(text.contains("   - Progress: 40%"));
        assert!(text.contains(&format!("   - Description: {}...", "x".repeat(100))));
        assert_eq!(format_open_issues(&[]), "No open issues.");
    }

    #[test]
    fn scm_issue_block_or_none() {
        let issue = ScmIssue { iid: 4, title: "Retry uploads".into(), description: None };
        assert_eq!(format_scm_issue(Some(&issue)), "Issue #4: Retry uploads\nDescription: N/A");
        assert_eq!(format_scm_issue(None), "none");
    }
}
