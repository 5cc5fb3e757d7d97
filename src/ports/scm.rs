//! Source-control port for commit, diff, and issue lookups.

use serde::{Deserialize, Serialize};

use super::PortFuture;
use crate::model::FileChange;

/// Commit metadata returned by the source-control API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDetail {
    /// Full commit hash.
    pub id: String,
    /// Full commit message.
    pub message: String,
    /// Author display name.
    pub author_name: String,
}

/// An issue in the source-control host, used as classification context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScmIssue {
    /// Project-scoped issue number.
    pub iid: u64,
    /// Issue title.
    pub title: String,
    /// Issue body.
    #[serde(default)]
    pub description: Option<String>,
}

/// A project in the source-control host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScmProject {
    /// Numeric project id.
    pub id: u64,
    /// Display name.
    pub name: String,
}

/// Read access to the source-control host.
///
/// Abstracting the host API allows deterministic replay and testing
/// without a running server.
pub trait SourceControl: Send + Sync {
    /// Fetches commit metadata. `Ok(None)` when the commit does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is unreachable or answers with a failure.
    fn get_commit(&self, project_id: u64, sha: &str) -> PortFuture<'_, Option<CommitDetail>>;

    /// Fetches the per-file changes of a commit.
    ///
    /// # Errors
    ///
    /// Returns an error if the diff cannot be retrieved or decoded.
    fn get_commit_diff(&self, project_id: u64, sha: &str) -> PortFuture<'_, Vec<FileChange>>;

    /// Fetches an issue by its project-scoped number. `Ok(None)` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is unreachable or answers with a failure.
    fn get_issue(&self, project_id: u64, iid: u64) -> PortFuture<'_, Option<ScmIssue>>;

    /// Lists the projects visible to the configured token.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is unreachable or answers with a failure.
    fn list_projects(&self) -> PortFuture<'_, Vec<ScmProject>>;
}
