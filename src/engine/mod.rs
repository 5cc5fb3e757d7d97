//! The per-commit decision engine and the per-push batch driver.
//!
//! A commit moves through these steps, stopping at the first terminal one:
//!
//! 1. skip rules on the message (merge, revert, bot markers),
//! 2. the idempotency ledger,
//! 3. commit detail and diff fetch, then diff summarization,
//! 4. an explicit tracker reference in the message updates that issue,
//! 5. otherwise the model classifies the commit against the open issues
//!    of the matching tracker project and an issue is created or updated.
//!
//! Errors end only the commit they occurred in. Every commit's outcome is
//! appended to the audit log once.

pub mod notes;
pub mod project;
pub mod rules;

use tracing::{debug, error, info, warn};

use crate::classify::chunk::ChunkCoordinator;
use crate::classify::prompt::PromptSet;
use crate::classify::{Classification, Classifier, CommitContext, IssueAction};
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::diff::{summarize, DiffPolicy, DiffSummary};
use crate::error::SyncError;
use crate::ledger::Ledger;
use crate::model::{BatchReport, CommitRecord, FileChange, SyncAction, SyncOutcome, SyncStatus};
use crate::ports::{IssueUpdate, NewIssue, ScmIssue};
use crate::reference::{resolve_scm_reference, resolve_tracker_reference};
use crate::webhook::payload::PushEvent;
use rules::{SkipReason, SkipRules};

fn upstream(what: &str) -> impl FnOnce(crate::ports::PortError) -> SyncError + '_ {
    move |e| SyncError::UpstreamFetch(format!("{what}: {e}"))
}

/// Synchronizes pushed commits into the tracker.
pub struct SyncEngine<'a> {
    ctx: &'a ServiceContext,
    settings: &'a Settings,
    prompts: PromptSet,
    policy: DiffPolicy,
    rules: SkipRules,
    ledger: Ledger<'a>,
}

impl<'a> SyncEngine<'a> {
    /// Builds an engine over the ports of `ctx`.
    ///
    /// # Errors
    ///
    /// Returns an error if an ignore pattern is invalid or the prompt
    /// override file cannot be loaded.
    pub fn new(ctx: &'a ServiceContext, settings: &'a Settings) -> Result<Self, String> {
        Ok(Self {
            ctx,
            settings,
            prompts: PromptSet::load(settings.prompts.as_deref())?,
            policy: DiffPolicy::from_settings(&settings.diff)?,
            rules: SkipRules::from_settings(&settings.rules),
            ledger: Ledger::new(ctx.fs.as_ref(), ctx.clock.as_ref(), &settings.state_dir),
        })
    }

    /// The idempotency ledger used by this engine.
    #[must_use]
    pub fn ledger(&self) -> &Ledger<'a> {
        &self.ledger
    }

    /// Processes every commit of a push, in payload order.
    ///
    /// Non-push events and pushes without commits produce an empty report
    /// whose `skipped` field says why.
    pub async fn process_push(&self, event: &PushEvent) -> BatchReport {
        let mut report = BatchReport {
            run_id: self.ctx.id_gen.generate_id(),
            repository: event.repository().to_string(),
            branch: event.branch().to_string(),
            received_at: self.ctx.clock.now(),
            skipped: None,
            outcomes: Vec::new(),
        };

        if !event.is_push() {
            info!(kind = %event.object_kind, "ignoring non-push event");
            report.skipped = Some(format!("not a push event ({})", event.object_kind));
            return report;
        }
        let commits = event.commit_records();
        if commits.is_empty() {
            info!(repository = %report.repository, "push carries no commits");
            report.skipped = Some("no commits in push".into());
            return report;
        }

        info!(
            run_id = %report.run_id,
            repository = %report.repository,
            branch = %report.branch,
            commits = commits.len(),
            "processing push"
        );
        for commit in &commits {
            let outcome = self.process_commit(event.project_id, commit).await;
            let recorded = self.ledger.record_outcome(
                &report.run_id,
                &report.repository,
                &report.branch,
                &outcome,
            );
            if let Err(e) = recorded {
                error!(commit = %commit.short_id, error = %e, "failed to write audit log");
            }
            report.outcomes.push(outcome);
        }
        info!(
            run_id = %report.run_id,
            success = report.count(SyncStatus::Success),
            skipped = report.count(SyncStatus::Skipped),
            failed = report.count(SyncStatus::Failed),
            "push processed"
        );
        report
    }

    /// Processes one commit and returns its terminal outcome.
    pub async fn process_commit(&self, project_id: u64, commit: &CommitRecord) -> SyncOutcome {
        if let Some(reason) = self.rules.check(&commit.message) {
            info!(commit = %commit.short_id, %reason, "skipping commit");
            return SyncOutcome::skipped(commit, reason);
        }
        if self.ledger.already_processed(&commit.id) {
            info!(commit = %commit.short_id, "commit already processed");
            return SyncOutcome::skipped(commit, SkipReason::AlreadyProcessed);
        }

        match self.sync_commit(project_id, commit).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(commit = %commit.short_id, error = %e, "commit sync failed");
                SyncOutcome::failed(commit, e)
            }
        }
    }

    async fn sync_commit(
        &self,
        project_id: u64,
        pushed: &CommitRecord,
    ) -> Result<SyncOutcome, SyncError> {
        let detail = self
            .ctx
            .scm
            .get_commit(project_id, &pushed.id)
            .await
            .map_err(upstream("commit detail"))?
            .ok_or_else(|| {
                SyncError::UpstreamFetch(format!("commit {} not found", pushed.short_id))
            })?;
        let author =
            if detail.author_name.is_empty() { &pushed.author } else { &detail.author_name };
        let message = if detail.message.is_empty() { &pushed.message } else { &detail.message };
        let commit =
            CommitRecord::new(&pushed.id, author, message, &pushed.repository, &pushed.branch);

        let changes = self
            .ctx
            .scm
            .get_commit_diff(project_id, &commit.id)
            .await
            .map_err(upstream("commit diff"))?;
        let summary = summarize(&changes, &self.policy);
        debug!(
            commit = %commit.short_id,
            tier = ?summary.tier,
            lines = summary.totals.lines,
            "diff summarized"
        );

        if let Some(issue_id) = resolve_tracker_reference(&commit.message) {
            info!(commit = %commit.short_id, issue = issue_id, "explicit issue reference");
            return self.update_explicit(&commit, issue_id, &summary).await;
        }
        self.classify_and_apply(project_id, &commit, &changes, &summary).await
    }

    async fn update_explicit(
        &self,
        commit: &CommitRecord,
        issue_id: u64,
        summary: &DiffSummary,
    ) -> Result<SyncOutcome, SyncError> {
        let issue = self
            .ctx
            .tracker
            .get_issue(issue_id)
            .await
            .map_err(upstream("tracker issue"))?
            .ok_or(SyncError::IssueNotFound(issue_id))?;
        if issue.is_closed() {
            let status = issue.status.as_ref().map_or("closed", |s| s.name.as_str());
            info!(issue = issue_id, %status, "referenced issue is closed, updating anyway");
        }

        let resolved = self
            .rules
            .signals_resolution(&commit.message)
            .then_some(self.settings.rules.resolved_done_ratio);
        let update = IssueUpdate {
            done_ratio: resolved,
            priority_id: None,
            notes: Some(notes::explicit_note(commit, &summary.totals, resolved)),
        };
        self.apply_update(commit, issue_id, &update).await
    }

    async fn classify_and_apply(
        &self,
        project_id: u64,
        commit: &CommitRecord,
        changes: &[FileChange],
        summary: &DiffSummary,
    ) -> Result<SyncOutcome, SyncError> {
        let projects =
            self.ctx.tracker.list_projects().await.map_err(upstream("tracker projects"))?;
        let (project, kind) =
            project::resolve_project(&commit.repository, &self.settings.projects, &projects)
                .ok_or_else(|| SyncError::ProjectResolution(commit.repository.clone()))?;
        debug!(project = %project.name, ?kind, "resolved tracker project");

        let limit = self.settings.redmine.max_open_issues;
        let open_issues = self
            .ctx
            .tracker
            .list_open_issues(project.id, limit)
            .await
            .map_err(upstream("open issues"))?;
        let scm_issue = self.scm_issue(project_id, &commit.message).await;

        let classifier =
            Classifier::new(self.ctx.llm.as_ref(), &self.prompts, &self.settings.llm, limit);
        let classification = if self.should_chunk(summary) {
            let kept = self.policy.filter(changes);
            info!(commit = %commit.short_id, files = kept.len(), "chunking large diff");
            let chunk_size = self.settings.chunking.chunk_size;
            ChunkCoordinator::new(&classifier, chunk_size, self.policy.preview_lines())
                .classify(commit, &kept, &open_issues, scm_issue.as_ref())
                .await?
        } else {
            let context = CommitContext { commit, summary };
            classifier.classify(&context, &open_issues, scm_issue.as_ref()).await?
        };

        match classification.action {
            IssueAction::Create => self.create(commit, project.id, &classification).await,
            IssueAction::Update { issue_id } => {
                let update = IssueUpdate {
                    done_ratio: Some(classification.done_ratio),
                    priority_id: Some(classification.priority_id),
                    notes: Some(notes::update_note(commit, &classification)),
                };
                self.apply_update(commit, issue_id, &update).await
            }
        }
    }

    fn should_chunk(&self, summary: &DiffSummary) -> bool {
        let chunking = &self.settings.chunking;
        chunking.enabled && summary.totals.lines >= chunking.threshold_lines
    }

    async fn scm_issue(&self, project_id: u64, message: &str) -> Option<ScmIssue> {
        let iid = resolve_scm_reference(message)?;
        match self.ctx.scm.get_issue(project_id, iid).await {
            Ok(issue) => issue,
            Err(e) => {
                warn!(iid, error = %e, "cannot fetch source-control issue, continuing without it");
                None
            }
        }
    }

    async fn create(
        &self,
        commit: &CommitRecord,
        project_id: u64,
        classification: &Classification,
    ) -> Result<SyncOutcome, SyncError> {
        let issue = NewIssue {
            project_id,
            subject: classification.subject.clone(),
            description: notes::create_description(commit, classification),
            tracker_id: classification.tracker_id,
            priority_id: classification.priority_id,
            done_ratio: classification.done_ratio,
            start_date: self.ctx.clock.today().format("%Y-%m-%d").to_string(),
        };
        if self.settings.dry_run {
            return Ok(planned(commit, SyncAction::Create, None));
        }

        let created = self
            .ctx
            .tracker
            .create_issue(&issue)
            .await
            .map_err(|e| SyncError::Mutation(e.to_string()))?;
        self.mark(commit);
        info!(commit = %commit.short_id, issue = created.id, "created issue");
        Ok(SyncOutcome::success(commit, SyncAction::Create, created.id))
    }

    async fn apply_update(
        &self,
        commit: &CommitRecord,
        issue_id: u64,
        update: &IssueUpdate,
    ) -> Result<SyncOutcome, SyncError> {
        if self.settings.dry_run {
            return Ok(planned(commit, SyncAction::Update, Some(issue_id)));
        }
        let updated = self
            .ctx
            .tracker
            .update_issue(issue_id, update)
            .await
            .map_err(|e| SyncError::Mutation(e.to_string()))?;
        self.mark(commit);
        info!(commit = %commit.short_id, issue = updated.id, "updated issue");
        Ok(SyncOutcome::success(commit, SyncAction::Update, updated.id))
    }

    // The audit log's success line still protects the commit if this fails.
    fn mark(&self, commit: &CommitRecord) {
        if let Err(e) = self.ledger.mark_processed(&commit.id) {
            error!(commit = %commit.short_id, error = %e, "failed to mark commit as processed");
        }
    }
}

fn planned(commit: &CommitRecord, action: SyncAction, issue_id: Option<u64>) -> SyncOutcome {
    info!(commit = %commit.short_id, ?action, ?issue_id, "dry run, tracker left untouched");
    SyncOutcome {
        action: Some(action),
        issue_id,
        ..SyncOutcome::skipped(commit, SkipReason::DryRun)
    }
}
