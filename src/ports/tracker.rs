//! Issue tracker port for reading and mutating tracked issues.

use serde::{Deserialize, Serialize};

use super::PortFuture;

/// An `{id, name}` reference as the tracker embeds them in issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    /// Numeric id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Set on status references when the status counts as closed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_closed: bool,
}

/// A project in the issue tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerProject {
    /// Numeric project id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// URL-safe identifier.
    pub identifier: String,
}

/// A tracked issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerIssue {
    /// Issue id.
    pub id: u64,
    /// One-line subject.
    pub subject: String,
    /// Long description.
    #[serde(default)]
    pub description: Option<String>,
    /// Tracker (bug, feature, ...).
    #[serde(default)]
    pub tracker: Option<NamedRef>,
    /// Workflow status.
    #[serde(default)]
    pub status: Option<NamedRef>,
    /// Priority.
    #[serde(default)]
    pub priority: Option<NamedRef>,
    /// Assignee.
    #[serde(default)]
    pub assigned_to: Option<NamedRef>,
    /// Completion percentage.
    #[serde(default)]
    pub done_ratio: u8,
}

impl TrackerIssue {
    /// Returns `true` when the issue's status is a closed one.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.is_closed)
    }
}

/// Fields for a new tracked issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIssue {
    /// Destination project.
    pub project_id: u64,
    /// One-line subject.
    pub subject: String,
    /// Description including the audit footer.
    pub description: String,
    /// Tracker id.
    pub tracker_id: u64,
    /// Priority id.
    pub priority_id: u64,
    /// Completion percentage.
    pub done_ratio: u8,
    /// Start date, `YYYY-MM-DD`.
    pub start_date: String,
}

/// Changes applied to an existing tracked issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueUpdate {
    /// New completion percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_ratio: Option<u8>,
    /// New priority id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_id: Option<u64>,
    /// Journal note appended to the issue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Manages issues in an external tracker.
///
/// Abstracting issue tracking allows deterministic replay and testing
/// without touching a real issue tracker API.
pub trait IssueTracker: Send + Sync {
    /// Lists all projects.
    ///
    /// # Errors
    ///
    /// Returns an error if the projects cannot be listed.
    fn list_projects(&self) -> PortFuture<'_, Vec<TrackerProject>>;

    /// Lists open issues of a project, at most `limit` of them.
    ///
    /// # Errors
    ///
    /// Returns an error if the issues cannot be listed.
    fn list_open_issues(&self, project_id: u64, limit: usize)
        -> PortFuture<'_, Vec<TrackerIssue>>;

    /// Fetches one issue. `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracker is unreachable or answers with a failure.
    fn get_issue(&self, id: u64) -> PortFuture<'_, Option<TrackerIssue>>;

    /// Creates a new issue and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracker rejects the issue.
    fn create_issue(&self, issue: &NewIssue) -> PortFuture<'_, TrackerIssue>;

    /// Applies an update to an existing issue and returns the updated issue.
    ///
    /// Once the tracker has accepted the update this must return `Ok`, even
    /// when the updated issue cannot be read back.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracker rejects the update.
    fn update_issue(&self, id: u64, update: &IssueUpdate) -> PortFuture<'_, TrackerIssue>;
}
