//! Replaying adapter for the `IssueTracker` port.

use super::{next_output, replay_result, SharedReplayer};
use crate::ports::{IssueTracker, IssueUpdate, NewIssue, PortFuture, TrackerIssue, TrackerProject};

/// Serves recorded tracker answers. Mutations are not applied anywhere;
/// their recorded result is returned.
pub struct ReplayingIssueTracker {
    replayer: SharedReplayer,
}

impl ReplayingIssueTracker {
    /// Creates a tracker adapter backed by `replayer`.
    #[must_use]
    pub fn new(replayer: SharedReplayer) -> Self {
        Self { replayer }
    }

    fn serve<T>(&self, method: &str) -> PortFuture<'_, T>
    where
        T: serde::de::DeserializeOwned + Send + 'static,
    {
        let output = next_output(&self.replayer, "tracker", method);
        Box::pin(async move { replay_result(output) })
    }
}

impl IssueTracker for ReplayingIssueTracker {
    fn list_projects(&self) -> PortFuture<'_, Vec<TrackerProject>> {
        self.serve("list_projects")
    }

    fn list_open_issues(
        &self,
        _project_id: u64,
        _limit: usize,
    ) -> PortFuture<'_, Vec<TrackerIssue>> {
        self.serve("list_open_issues")
    }

    fn get_issue(&self, _id: u64) -> PortFuture<'_, Option<TrackerIssue>> {
        self.serve("get_issue")
    }

    fn create_issue(&self, _issue: &NewIssue) -> PortFuture<'_, TrackerIssue> {
        self.serve("create_issue")
    }

    fn update_issue(&self, _id: u64, _update: &IssueUpdate) -> PortFuture<'_, TrackerIssue> {
        self.serve("update_issue")
    }
}
