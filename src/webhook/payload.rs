//! GitLab push event payload.

use serde::{Deserialize, Serialize};

use crate::model::CommitRecord;

/// Project block of a push event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushProject {
    /// Project name, used as the repository name.
    #[serde(default)]
    pub name: String,
    /// `group/project` path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_with_namespace: Option<String>,
}

/// Commit author as embedded in a push event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushAuthor {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// E-mail address.
    #[serde(default)]
    pub email: String,
}

/// One commit of a push event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushCommit {
    /// Full hash.
    pub id: String,
    /// Commit message.
    #[serde(default)]
    pub message: String,
    /// Author.
    #[serde(default)]
    pub author: PushAuthor,
}

/// A GitLab webhook event. Only push events are synchronized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEvent {
    /// `push` for push events.
    #[serde(default)]
    pub object_kind: String,
    /// Event name as GitLab reports it.
    #[serde(default)]
    pub event_name: Option<String>,
    /// Pushed ref, e.g. `refs/heads/main`.
    #[serde(rename = "ref", default)]
    pub git_ref: String,
    /// Numeric project id.
    #[serde(default)]
    pub project_id: u64,
    /// Project block.
    #[serde(default)]
    pub project: PushProject,
    /// Commits in push order.
    #[serde(default)]
    pub commits: Vec<PushCommit>,
}

impl PushEvent {
    /// Whether this is a push event.
    #[must_use]
    pub fn is_push(&self) -> bool {
        self.object_kind == "push" || self.event_name.as_deref() == Some("push")
    }

    /// Branch name without the `refs/heads/` prefix.
    #[must_use]
    pub fn branch(&self) -> &str {
        let branch = self.git_ref.strip_prefix("refs/heads/").unwrap_or(&self.git_ref);
        if branch.is_empty() { "unknown" } else { branch }
    }

    /// Repository name.
    #[must_use]
    pub fn repository(&self) -> &str {
        &self.project.name
    }

    /// Commit records built from the payload, in push order.
    #[must_use]
    pub fn commit_records(&self) -> Vec<CommitRecord> {
        self.commits
            .iter()
            .map(|c| {
                let author =
                    if c.author.name.is_empty() { "Unknown" } else { c.author.name.as_str() };
                CommitRecord::new(&c.id, author, &c.message, self.repository(), self.branch())
            })
            .collect()
    }
}
