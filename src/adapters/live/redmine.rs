//! Live adapter for the `IssueTracker` port using the Redmine REST API.

use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::http::{self, METADATA_TIMEOUT};
use crate::config::RedmineSettings;
use crate::ports::{
    IssueTracker, IssueUpdate, NewIssue, PortFuture, TrackerIssue, TrackerProject,
};

const SERVICE: &str = "Redmine";
const API_KEY_HEADER: &str = "X-Redmine-API-Key";

#[derive(Deserialize)]
struct ProjectList {
    projects: Vec<TrackerProject>,
}

#[derive(Deserialize)]
struct IssueList {
    issues: Vec<TrackerIssue>,
}

/// Redmine wraps single issues as `{"issue": {...}}` in both directions.
#[derive(Serialize, Deserialize)]
struct IssueEnvelope<T> {
    issue: T,
}

/// Live Redmine client.
pub struct RedmineClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RedmineClient {
    /// Creates a client for the instance at `settings.url`.
    #[must_use]
    pub fn new(settings: &RedmineSettings) -> Self {
        Self {
            client: Client::new(),
            base_url: settings.url.clone(),
            api_key: settings.api_key.clone(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, http::join(&self.base_url, path))
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(METADATA_TIMEOUT)
    }
}

impl IssueTracker for RedmineClient {
    fn list_projects(&self) -> PortFuture<'_, Vec<TrackerProject>> {
        let request = self.request(Method::GET, "projects.json").query(&[("limit", "100")]);
        Box::pin(async move {
            let list: ProjectList = http::fetch(SERVICE, request).await?;
            Ok(list.projects)
        })
    }

    fn list_open_issues(
        &self,
        project_id: u64,
        limit: usize,
    ) -> PortFuture<'_, Vec<TrackerIssue>> {
        let request = self.request(Method::GET, "issues.json").query(&[
            ("project_id", project_id.to_string()),
            ("status_id", "open".to_string()),
            ("limit", limit.to_string()),
        ]);
        Box::pin(async move {
            let list: IssueList = http::fetch(SERVICE, request).await?;
            Ok(list.issues)
        })
    }

    fn get_issue(&self, id: u64) -> PortFuture<'_, Option<TrackerIssue>> {
        let request = self.request(Method::GET, &format!("issues/{id}.json"));
        Box::pin(async move {
            let envelope: Option<IssueEnvelope<TrackerIssue>> =
                http::fetch_optional(SERVICE, request).await?;
            Ok(envelope.map(|e| e.issue))
        })
    }

    fn create_issue(&self, issue: &NewIssue) -> PortFuture<'_, TrackerIssue> {
        let request =
            self.request(Method::POST, "issues.json").json(&IssueEnvelope { issue: issue.clone() });
        Box::pin(async move {
            let created: IssueEnvelope<TrackerIssue> = http::fetch(SERVICE, request).await?;
            Ok(created.issue)
        })
    }

    fn update_issue(&self, id: u64, update: &IssueUpdate) -> PortFuture<'_, TrackerIssue> {
        let request = self
            .request(Method::PUT, &format!("issues/{id}.json"))
            .json(&IssueEnvelope { issue: update.clone() });
        Box::pin(async move {
            // Redmine answers a successful PUT with 204 and no body.
            http::execute(SERVICE, request).await?;
            // The update is applied at this point; a failed read-back must not undo that.
            match self.get_issue(id).await {
                Ok(Some(issue)) => Ok(issue),
                Ok(None) => {
                    warn!(issue = id, "updated issue not found on read-back");
                    Ok(TrackerIssue { id, ..TrackerIssue::default() })
                }
                Err(e) => {
                    warn!(issue = id, error = %e, "cannot read back updated issue");
                    Ok(TrackerIssue { id, ..TrackerIssue::default() })
                }
            }
        })
    }
}
