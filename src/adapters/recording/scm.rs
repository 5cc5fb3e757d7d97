//! Recording adapter for the `SourceControl` port.

use std::sync::{Arc, Mutex};

use serde_json::json;

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::model::FileChange;
use crate::ports::{CommitDetail, PortFuture, ScmIssue, ScmProject, SourceControl};

/// Records source-control calls while delegating to an inner adapter.
pub struct RecordingSourceControl {
    inner: Box<dyn SourceControl>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingSourceControl {
    /// Wraps `inner`, recording into `recorder`.
    pub fn new(inner: Box<dyn SourceControl>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl SourceControl for RecordingSourceControl {
    fn get_commit(&self, project_id: u64, sha: &str) -> PortFuture<'_, Option<CommitDetail>> {
        let sha = sha.to_string();
        Box::pin(async move {
            let result = self.inner.get_commit(project_id, &sha).await;
            let input = json!({ "project_id": project_id, "sha": sha });
            record_result(&self.recorder, "scm", "get_commit", &input, &result);
            result
        })
    }

    fn get_commit_diff(&self, project_id: u64, sha: &str) -> PortFuture<'_, Vec<FileChange>> {
        let sha = sha.to_string();
        Box::pin(async move {
            let result = self.inner.get_commit_diff(project_id, &sha).await;
            let input = json!({ "project_id": project_id, "sha": sha });
            record_result(&self.recorder, "scm", "get_commit_diff", &input, &result);
            result
        })
    }

    fn get_issue(&self, project_id: u64, iid: u64) -> PortFuture<'_, Option<ScmIssue>> {
        Box::pin(async move {
            let result = self.inner.get_issue(project_id, iid).await;
            let input = json!({ "project_id": project_id, "iid": iid });
            record_result(&self.recorder, "scm", "get_issue", &input, &result);
            result
        })
    }

    fn list_projects(&self) -> PortFuture<'_, Vec<ScmProject>> {
        Box::pin(async move {
            let result = self.inner.list_projects().await;
            record_result(&self.recorder, "scm", "list_projects", &json!({}), &result);
            result
        })
    }
}
