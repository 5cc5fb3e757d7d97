//! Recording adapter for the `IssueTracker` port.

use std::sync::{Arc, Mutex};

use serde_json::json;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{
    IssueTracker, IssueUpdate, NewIssue, PortFuture, TrackerIssue, TrackerProject,
};

/// Records tracker calls, mutations included, while delegating to an inner
/// adapter.
pub struct RecordingIssueTracker {
    inner: Box<dyn IssueTracker>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingIssueTracker {
    /// Wraps `inner`, recording into `recorder`.
    pub fn new(inner: Box<dyn IssueTracker>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl IssueTracker for RecordingIssueTracker {
    fn list_projects(&self) -> PortFuture<'_, Vec<TrackerProject>> {
        Box::pin(async move {
            let result = self.inner.list_projects().await;
            record_result(&self.recorder, "tracker", "list_projects", &json!({}), &result);
            result
        })
    }

    fn list_open_issues(
        &self,
        project_id: u64,
        limit: usize,
    ) -> PortFuture<'_, Vec<TrackerIssue>> {
        Box::pin(async move {
            let result = self.inner.list_open_issues(project_id, limit).await;
            let input = json!({ "project_id": project_id, "limit": limit });
            record_result(&self.recorder, "tracker", "list_open_issues", &input, &result);
            result
        })
    }

    fn get_issue(&self, id: u64) -> PortFuture<'_, Option<TrackerIssue>> {
        Box::pin(async move {
            let result = self.inner.get_issue(id).await;
            record_result(&self.recorder, "tracker", "get_issue", &json!({ "id": id }), &result);
            result
        })
    }

    fn create_issue(&self, issue: &NewIssue) -> PortFuture<'_, TrackerIssue> {
        let issue = issue.clone();
        Box::pin(async move {
            let result = self.inner.create_issue(&issue).await;
            record_result(&self.recorder, "tracker", "create_issue", &issue, &result);
            result
        })
    }

    fn update_issue(&self, id: u64, update: &IssueUpdate) -> PortFuture<'_, TrackerIssue> {
        let update = update.clone();
        Box::pin(async move {
            let result = self.inner.update_issue(id, &update).await;
            let input = json!({ "id": id, "update": update });
            record_result(&self.recorder, "tracker", "update_issue", &input, &result);
            result
        })
    }
}
