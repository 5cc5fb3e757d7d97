//! LLM-backed commit classification.
//!
//! [`Classifier`] sends one commit, its diff summary and the project's open
//! issues to the model and turns the answer into a [`Classification`]. The
//! [`chunk`] module splits oversized diffs into several cheaper calls and a
//! final synthesis call that goes through the same validation.

pub mod chunk;
pub mod prompt;
pub mod response;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::LlmSettings;
use crate::diff::DiffSummary;
use crate::model::{CommitRecord, SyncAction};
use crate::ports::{CompletionRequest, LlmClient, ScmIssue, TrackerIssue};
use prompt::PromptSet;

/// Why a classification attempt produced no result.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The model could not be reached or answered with an error.
    #[error("model call failed: {0}")]
    Upstream(String),

    /// No JSON object could be found in the answer.
    #[error("unparseable model response: {0}")]
    Parse(String),

    /// The JSON object does not satisfy the classification contract.
    #[error("invalid classification: {0}")]
    Validation(String),
}

/// The tracker mutation the model asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueAction {
    /// Open a new issue.
    Create,
    /// Advance an existing issue.
    Update {
        /// Target issue.
        issue_id: u64,
    },
}

/// A validated model decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Create or update.
    pub action: IssueAction,
    /// Issue subject.
    pub subject: String,
    /// Issue description.
    pub description: Option<String>,
    /// Tracker id.
    pub tracker_id: u64,
    /// Priority id.
    pub priority_id: u64,
    /// Completion percentage, clamped to 0..=100.
    pub done_ratio: u8,
    /// Model confidence, clamped to 0..=100.
    pub confidence: Option<u8>,
    /// Model explanation.
    pub reasoning: Option<String>,
}

impl Classification {
    /// The outcome action corresponding to this decision.
    #[must_use]
    pub fn sync_action(&self) -> SyncAction {
        match self.action {
            IssueAction::Create => SyncAction::Create,
            IssueAction::Update { .. } => SyncAction::Update,
        }
    }
}

/// What the classifier knows about the commit under decision.
#[derive(Debug, Clone, Copy)]
pub struct CommitContext<'a> {
    /// The commit.
    pub commit: &'a CommitRecord,
    /// Its filtered, tiered diff.
    pub summary: &'a DiffSummary,
}

impl CommitContext<'_> {
    fn header(&self) -> [(&'static str, String); 6] {
        let c = self.commit;
        [
            ("repository", c.repository.clone()),
            ("branch", c.branch.clone()),
            ("author", c.author.clone()),
            ("commit_hash", c.short_id.clone()),
            ("commit_message", c.message.trim().to_string()),
            ("files_count", self.summary.totals.files.to_string()),
        ]
    }
}

/// Wraps model calls with the request and response contract.
pub struct Classifier<'a> {
    llm: &'a dyn LlmClient,
    prompts: &'a PromptSet,
    settings: &'a LlmSettings,
    max_open_issues: usize,
}

impl<'a> Classifier<'a> {
    /// Creates a classifier. At most `max_open_issues` open issues are
    /// listed in a prompt.
    #[must_use]
    pub fn new(
        llm: &'a dyn LlmClient,
        prompts: &'a PromptSet,
        settings: &'a LlmSettings,
        max_open_issues: usize,
    ) -> Self {
        Self { llm, prompts, settings, max_open_issues }
    }

    /// Classifies one commit in a single call.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::Upstream`] if the call fails,
    /// [`ClassifyError::Parse`] if the answer holds no JSON object, and
    /// [`ClassifyError::Validation`] if the object breaks the contract.
    pub async fn classify(
        &self,
        context: &CommitContext<'_>,
        open_issues: &[TrackerIssue],
        scm_issue: Option<&ScmIssue>,
    ) -> Result<Classification, ClassifyError> {
        let diff_summary = context.summary.render();
        let open_issues = self.open_issue_listing(open_issues);
        let scm_issue = prompt::format_scm_issue(scm_issue);

        let header = context.header();
        let mut values: Vec<(&str, &str)> = header.iter().map(|(k, v)| (*k, v.as_str())).collect();
        values.extend([
            ("diff_summary", diff_summary.as_str()),
            ("open_issues", open_issues.as_str()),
            ("scm_issue", scm_issue.as_str()),
        ]);
        let user_prompt = prompt::render(&self.prompts.analysis, &values);

        info!(
            commit = %context.commit.short_id,
            tier = ?context.summary.tier,
            "classifying commit"
        );
        self.decide(user_prompt).await
    }

    /// Open issues as listed in prompts, capped at the configured maximum.
    pub(crate) fn open_issue_listing(&self, open_issues: &[TrackerIssue]) -> String {
        let shown = &open_issues[..open_issues.len().min(self.max_open_issues)];
        prompt::format_open_issues(shown)
    }

    /// Sends a fully rendered decision prompt to the primary model and
    /// validates the answer.
    pub(crate) async fn decide(
        &self,
        user_prompt: String,
    ) -> Result<Classification, ClassifyError> {
        let request = CompletionRequest {
            model: self.settings.model.clone(),
            system: self.prompts.system.clone(),
            prompt: user_prompt,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };
        let response =
            self.llm.complete(&request).await.map_err(|e| ClassifyError::Upstream(e.to_string()))?;
        debug!(
            prompt_tokens = response.prompt_tokens,
            completion_tokens = response.completion_tokens,
            "model answered"
        );

        let value = response::extract_json(&response.text).ok_or_else(|| {
            let preview: String = response.text.chars().take(200).collect();
            ClassifyError::Parse(format!("no JSON object in answer: {preview}"))
        })?;
        let classification = response::validate(&value)?;
        info!(
            action = ?classification.sync_action(),
            confidence = ?classification.confidence,
            "classification complete"
        );
        Ok(classification)
    }

    pub(crate) fn llm(&self) -> &'a dyn LlmClient {
        self.llm
    }

    pub(crate) fn prompts(&self) -> &'a PromptSet {
        self.prompts
    }

    pub(crate) fn settings(&self) -> &'a LlmSettings {
        self.settings
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::DiffSettings;
    use crate::diff::{summarize, DiffPolicy};
    use crate::model::FileChange;
    use crate::ports::{CompletionFuture, CompletionResponse};
    use std::sync::Mutex;

    /// Answers every request with the next scripted text and keeps the
    /// requests for inspection.
    pub(crate) struct ScriptedLlm {
        answers: Mutex<Vec<Result<String, String>>>,
        pub(crate) requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedLlm {
        pub(crate) fn new(answers: Vec<Result<String, String>>) -> Self {
            Self { answers: Mutex::new(answers), requests: Mutex::new(Vec::new()) }
        }
    }

    impl LlmClient for ScriptedLlm {
        fn complete(&self, request: &CompletionRequest) -> CompletionFuture<'_> {
            self.requests.lock().unwrap().push(request.clone());
            let answer = self.answers.lock().unwrap().remove(0);
            Box::pin(async move {
                let text = answer?;
                Ok(CompletionResponse { text, prompt_tokens: 10, completion_tokens: 5 })
            })
        }
    }

    fn commit() -> CommitRecord {
        CommitRecord::new("0123456789abcdef", "Ann", "Add retry to uploads", "shop", "main")
    }

    fn summary() -> DiffSummary {
        let policy = DiffPolicy::from_settings(&DiffSettings::default()).unwrap();
        summarize(&[FileChange::from_patch("src/upload.rs", "@@ -1 +1,2 @@\n+retry();\n")], &policy)
    }

    fn issue(id: u64) -> TrackerIssue {
        TrackerIssue {
            id,
            subject: format!("Issue {id}"),
            description: None,
            tracker: None,
            status: None,
            priority: None,
            assigned_to: None,
            done_ratio: 0,
        }
    }

    #[tokio::test]
    async fn classify_renders_prompt_and_validates_answer() {
        let llm = ScriptedLlm::new(vec![Ok(
            "```json\n{\"action\":\"update\",\"redmine_issue_id\":7,\"tracker_id\":2,\"priority_id\":3,\"subject\":\"Uploads\",\"done_ratio\":60,\"confidence\":80}\n```".into(),
        )]);
        let prompts = PromptSet::default();
        let settings = LlmSettings::default();
        let classifier = Classifier::new(&llm, &prompts, &settings, 1);
        let (commit, summary) = (commit(), summary());

        let result = classifier
            .classify(
                &CommitContext { commit: &commit, summary: &summary },
                &[issue(7), issue(8)],
                None,
            )
            .await
            .unwrap();

        assert_eq!(result.action, IssueAction::Update { issue_id: 7 });
        assert_eq!(result.confidence, Some(80));

        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gpt-4o");
        assert_eq!(requests[0].system, prompts.system);
        assert!(requests[0].prompt.contains("Commit: 01234567"));
        assert!(requests[0].prompt.contains("- src/upload.rs (+1, -0)"));
        assert!(requests[0].prompt.contains("Issue #7"));
        assert!(!requests[0].prompt.contains("Issue #8"), "open issues must be capped");
        assert!(requests[0].prompt.contains("Source-control issue:\nnone"));
    }

    #[tokio::test]
    async fn transport_failure_is_upstream_error() {
        let llm = ScriptedLlm::new(vec![Err("connection refused".into())]);
        let (prompts, settings) = (PromptSet::default(), LlmSettings::default());
        let classifier = Classifier::new(&llm, &prompts, &settings, 50);
        let (commit, summary) = (commit(), summary());

        let err = classifier
            .classify(&CommitContext { commit: &commit, summary: &summary }, &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClassifyError::Upstream(ref m) if m.contains("connection refused")));
    }

    #[tokio::test]
    async fn prose_answer_is_parse_error() {
        let llm = ScriptedLlm::new(vec![Ok("This looks like a new feature.".into())]);
        let (prompts, settings) = (PromptSet::default(), LlmSettings::default());
        let classifier = Classifier::new(&llm, &prompts, &settings, 50);
        let (commit, summary) = (commit(), summary());

        let err = classifier
            .classify(&CommitContext { commit: &commit, summary: &summary }, &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClassifyError::Parse(_)));
    }
}
