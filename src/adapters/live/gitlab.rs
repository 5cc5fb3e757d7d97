//! Live adapter for the `SourceControl` port using the GitLab v4 REST API.

use reqwest::Client;
use serde::Deserialize;

use super::http::{self, DIFF_TIMEOUT, METADATA_TIMEOUT};
use crate::config::GitlabSettings;
use crate::model::FileChange;
use crate::ports::{CommitDetail, PortFuture, ScmIssue, ScmProject, SourceControl};

const SERVICE: &str = "GitLab";
const PRIVATE_TOKEN: &str = "PRIVATE-TOKEN";

/// One entry of `GET .../repository/commits/{sha}/diff`.
#[derive(Deserialize)]
struct GitlabDiff {
    new_path: String,
    #[serde(default)]
    diff: String,
}

/// Live GitLab client.
pub struct GitlabClient {
    client: Client,
    api_url: String,
    token: String,
}

impl GitlabClient {
    /// Creates a client for the instance at `settings.url`.
    #[must_use]
    pub fn new(settings: &GitlabSettings) -> Self {
        Self {
            client: Client::new(),
            api_url: http::join(&settings.url, "api/v4"),
            token: settings.token.clone(),
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(http::join(&self.api_url, path))
            .header(PRIVATE_TOKEN, &self.token)
            .timeout(METADATA_TIMEOUT)
    }
}

impl SourceControl for GitlabClient {
    fn get_commit(&self, project_id: u64, sha: &str) -> PortFuture<'_, Option<CommitDetail>> {
        let request = self.get(&format!("projects/{project_id}/repository/commits/{sha}"));
        Box::pin(http::fetch_optional(SERVICE, request))
    }

    fn get_commit_diff(&self, project_id: u64, sha: &str) -> PortFuture<'_, Vec<FileChange>> {
        let request = self
            .get(&format!("projects/{project_id}/repository/commits/{sha}/diff"))
            .timeout(DIFF_TIMEOUT);
        Box::pin(async move {
            let diffs: Vec<GitlabDiff> = http::fetch(SERVICE, request).await?;
            Ok(diffs.into_iter().map(|d| FileChange::from_patch(d.new_path, d.diff)).collect())
        })
    }

    fn get_issue(&self, project_id: u64, iid: u64) -> PortFuture<'_, Option<ScmIssue>> {
        let request = self.get(&format!("projects/{project_id}/issues/{iid}"));
        Box::pin(http::fetch_optional(SERVICE, request))
    }

    fn list_projects(&self) -> PortFuture<'_, Vec<ScmProject>> {
        let request = self.get("projects").query(&[("membership", "true"), ("per_page", "100")]);
        Box::pin(http::fetch(SERVICE, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_entries_decode_without_patch_text() {
        let body = r#"[{"old_path":"a.bin","new_path":"a.bin","binary":true},
                       {"old_path":"x.rs","new_path":"y.rs","diff":"@@ -1 +1 @@\n-a\n+b\n"}]"#;
        let diffs: Vec<GitlabDiff> = serde_json::from_str(body).unwrap();
        let changes: Vec<FileChange> =
            diffs.into_iter().map(|d| FileChange::from_patch(d.new_path, d.diff)).collect();
        assert_eq!(changes[0].churn(), 0);
        assert_eq!(changes[1].path, "y.rs");
        assert_eq!((changes[1].additions, changes[1].deletions), (1, 1));
    }

    #[test]
    fn api_url_is_rooted_at_v4() {
        let settings =
            GitlabSettings { url: "https://git.example.com/".into(), ..Default::default() };
        assert_eq!(GitlabClient::new(&settings).api_url, "https://git.example.com/api/v4");
    }
}
