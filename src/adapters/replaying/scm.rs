//! Replaying adapter for the `SourceControl` port.

use super::{next_output, replay_result, SharedReplayer};
use crate::model::FileChange;
use crate::ports::{CommitDetail, PortFuture, ScmIssue, ScmProject, SourceControl};

/// Serves recorded source-control answers.
pub struct ReplayingSourceControl {
    replayer: SharedReplayer,
}

impl ReplayingSourceControl {
    /// Creates a source-control adapter backed by `replayer`.
    #[must_use]
    pub fn new(replayer: SharedReplayer) -> Self {
        Self { replayer }
    }

    fn serve<T>(&self, method: &str) -> PortFuture<'_, T>
    where
        T: serde::de::DeserializeOwned + Send + 'static,
    {
        let output = next_output(&self.replayer, "scm", method);
        Box::pin(async move { replay_result(output) })
    }
}

impl SourceControl for ReplayingSourceControl {
    fn get_commit(&self, _project_id: u64, _sha: &str) -> PortFuture<'_, Option<CommitDetail>> {
        self.serve("get_commit")
    }

    fn get_commit_diff(&self, _project_id: u64, _sha: &str) -> PortFuture<'_, Vec<FileChange>> {
        self.serve("get_commit_diff")
    }

    fn get_issue(&self, _project_id: u64, _iid: u64) -> PortFuture<'_, Option<ScmIssue>> {
        self.serve("get_issue")
    }

    fn list_projects(&self) -> PortFuture<'_, Vec<ScmProject>> {
        self.serve("list_projects")
    }
}
