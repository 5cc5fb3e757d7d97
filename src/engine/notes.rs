//! Textile notes written into tracker issues.

use std::fmt::Write as _;

use crate::classify::Classification;
use crate::diff::DiffTotals;
use crate::model::CommitRecord;

fn confidence(classification: &Classification) -> String {
    classification.confidence.map_or_else(|| "N/A".to_string(), |c| format!("{c}%"))
}

fn reasoning(classification: &Classification) -> &str {
    classification.reasoning.as_deref().unwrap_or("N/A")
}

/// Note for an explicitly referenced issue. `resolved_ratio` is set when a
/// resolution keyword raised the completion ratio.
#[must_use]
pub fn explicit_note(
    commit: &CommitRecord,
    totals: &DiffTotals,
    resolved_ratio: Option<u8>,
) -> String {
    let mut note = format!(
        "h4. GitLab Sync\n\n* Commit: @{}@\n* Author: _{}_\n* Message: {}\n\
         * Changed: *{}* files (+{}, -{})",
        commit.short_id,
        commit.author,
        commit.message.trim(),
        totals.files,
        totals.additions,
        totals.deletions,
    );
    if let Some(ratio) = resolved_ratio {
        let _ = write!(
            note,
            "\n\n[Automatic: commit marks the issue as resolved, progress set to {ratio}%]"
        );
    }
    note
}

/// Description of a new issue: the model's text followed by a sync footer.
#[must_use]
pub fn create_description(commit: &CommitRecord, classification: &Classification) -> String {
    let body = classification.description.as_deref().unwrap_or(&classification.subject);
    format!(
        "{body}\n\n---\n\nh4. GitLab Sync Info\n\n* Commit: @{}@\n* Author: _{}_\n\
         * Confidence: *{}*\n\n_Reasoning: {}_",
        commit.short_id,
        commit.author,
        confidence(classification),
        reasoning(classification),
    )
}

/// Journal note for a model-chosen update.
#[must_use]
pub fn update_note(commit: &CommitRecord, classification: &Classification) -> String {
    format!(
        "h4. GitLab Update\n\n* Commit: @{}@\n* Author: _{}_\n* Message: {}\n\
         * Confidence: *{}*\n\n_Reasoning: {}_",
        commit.short_id,
        commit.author,
        commit.message.trim(),
        confidence(classification),
        reasoning(classification),
    )
}
