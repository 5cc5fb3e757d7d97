//! Domain records shared by the engine, the ports, and the audit log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of hash characters used as the stable display and lookup key.
pub const SHORT_ID_LEN: usize = 8;

/// Returns the short form of a commit hash.
#[must_use]
pub fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}

/// A single commit as seen by the engine. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Full commit hash.
    pub id: String,
    /// First eight characters of the hash.
    pub short_id: String,
    /// Author display name.
    pub author: String,
    /// Free-text commit message.
    pub message: String,
    /// Repository (project) name.
    pub repository: String,
    /// Branch name, without the `refs/heads/` prefix.
    pub branch: String,
}

impl CommitRecord {
    /// Builds a record, deriving the short id from `id`.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        author: impl Into<String>,
        message: impl Into<String>,
        repository: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            short_id: short_id(&id),
            id,
            author: author.into(),
            message: message.into(),
            repository: repository.into(),
            branch: branch.into(),
        }
    }
}

/// One modified file within a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Path of the file after the change.
    pub path: String,
    /// Number of added lines.
    pub additions: u64,
    /// Number of removed lines.
    pub deletions: u64,
    /// Raw unified-diff text, when the source-control API returned it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

impl FileChange {
    /// Builds a change whose line counts are derived from the patch text.
    ///
    /// `+++`/`---` file headers are not counted.
    #[must_use]
    pub fn from_patch(path: impl Into<String>, patch: impl Into<String>) -> Self {
        let patch = patch.into();
        let mut additions = 0;
        let mut deletions = 0;
        for line in patch.lines() {
            if line.starts_with("+++") || line.starts_with("---") {
                continue;
            }
            if line.starts_with('+') {
                additions += 1;
            } else if line.starts_with('-') {
                deletions += 1;
            }
        }
        Self { path: path.into(), additions, deletions, patch: Some(patch) }
    }

    /// Additions plus deletions, used for ranking.
    #[must_use]
    pub fn churn(&self) -> u64 {
        self.additions + self.deletions
    }
}

/// Lifecycle status of a single commit's synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Not yet decided.
    Pending,
    /// A tracker mutation succeeded.
    Success,
    /// Ignored by policy (merge, bot, duplicate, dry run).
    Skipped,
    /// A per-commit error stopped processing.
    Failed,
}

/// The tracker mutation chosen for a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    /// A new tracked issue.
    Create,
    /// An existing tracked issue.
    Update,
}

/// Terminal result of processing one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    /// Full commit hash.
    pub commit: String,
    /// Short commit hash.
    pub short_id: String,
    /// Final status.
    pub status: SyncStatus,
    /// Action taken (or planned, in dry-run mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<SyncAction>,
    /// Created or updated tracker issue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_id: Option<u64>,
    /// Why the commit was skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Error text for failed commits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncOutcome {
    fn base(commit: &CommitRecord, status: SyncStatus) -> Self {
        Self {
            commit: commit.id.clone(),
            short_id: commit.short_id.clone(),
            status,
            action: None,
            issue_id: None,
            reason: None,
            error: None,
        }
    }

    /// A skipped outcome carrying the skip reason.
    #[must_use]
    pub fn skipped(commit: &CommitRecord, reason: impl ToString) -> Self {
        Self { reason: Some(reason.to_string()), ..Self::base(commit, SyncStatus::Skipped) }
    }

    /// A failed outcome carrying the error text.
    #[must_use]
    pub fn failed(commit: &CommitRecord, error: impl ToString) -> Self {
        Self { error: Some(error.to_string()), ..Self::base(commit, SyncStatus::Failed) }
    }

    /// A successful mutation of `issue_id`.
    #[must_use]
    pub fn success(commit: &CommitRecord, action: SyncAction, issue_id: u64) -> Self {
        Self {
            action: Some(action),
            issue_id: Some(issue_id),
            ..Self::base(commit, SyncStatus::Success)
        }
    }
}

/// Outcomes for every commit of one push, in payload order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Identifier of this processing run.
    pub run_id: String,
    /// Repository the push belongs to.
    pub repository: String,
    /// Branch the push targeted.
    pub branch: String,
    /// When processing of the push started.
    pub received_at: DateTime<Utc>,
    /// Why the whole push was ignored, if it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
    /// Per-commit outcomes.
    pub outcomes: Vec<SyncOutcome>,
}

impl BatchReport {
    /// Number of outcomes with the given status.
    #[must_use]
    pub fn count(&self, status: SyncStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}
