//! Map/reduce classification for oversized diffs.
//!
//! The map phase asks the lighter model for free-form JSON notes on each
//! fixed-size group of files, all groups at once. The reduce phase hands
//! every note, in group order, to the primary model, whose answer must
//! satisfy the full classification contract. A group whose call fails is
//! reported to the reduce phase as unavailable.

use futures::future::join_all;
use serde_json::Value;
use tracing::{info, warn};

use super::{prompt, response, Classification, ClassifyError, Classifier};
use crate::diff::preview::truncate_patch;
use crate::diff::{DiffFile, DiffSummary, DiffTotals, Tier};
use crate::model::{CommitRecord, FileChange};
use crate::ports::{CompletionRequest, ScmIssue, TrackerIssue};

/// Result of one map call.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkNote {
    /// JSON notes returned by the model.
    Notes(Value),
    /// The call or its parsing failed.
    Unavailable(String),
}

impl ChunkNote {
    fn render(&self) -> String {
        match self {
            Self::Notes(value) => value.to_string(),
            Self::Unavailable(error) => format!("unavailable: {error}"),
        }
    }
}

/// Drives the map and reduce phases.
pub struct ChunkCoordinator<'c, 'a> {
    classifier: &'c Classifier<'a>,
    chunk_size: usize,
    preview_lines: usize,
}

impl<'c, 'a> ChunkCoordinator<'c, 'a> {
    /// Creates a coordinator grouping `chunk_size` files per map call and
    /// bounding each patch to `preview_lines` lines.
    #[must_use]
    pub fn new(classifier: &'c Classifier<'a>, chunk_size: usize, preview_lines: usize) -> Self {
        Self { classifier, chunk_size: chunk_size.max(1), preview_lines }
    }

    /// Classifies a commit from its filtered changes.
    ///
    /// # Errors
    ///
    /// Returns the synthesis call's [`ClassifyError`]. Map failures never
    /// surface here.
    pub async fn classify(
        &self,
        commit: &CommitRecord,
        changes: &[FileChange],
        open_issues: &[TrackerIssue],
        scm_issue: Option<&ScmIssue>,
    ) -> Result<Classification, ClassifyError> {
        let notes = self.map(commit, changes).await;
        let count = notes.len();
        let failed = notes.iter().filter(|n| matches!(n, ChunkNote::Unavailable(_))).count();
        info!(commit = %commit.short_id, chunks = count, failed, "chunk notes collected");

        let chunk_results = notes
            .iter()
            .enumerate()
            .map(|(i, note)| format!("Chunk {}/{count}:\n{}", i + 1, note.render()))
            .collect::<Vec<_>>()
            .join("\n\n");
        let open_issues = self.classifier.open_issue_listing(open_issues);
        let scm_issue = prompt::format_scm_issue(scm_issue);
        let files_count = changes.len().to_string();
        let chunk_count = count.to_string();
        let message = commit.message.trim();

        let user_prompt = prompt::render(
            &self.classifier.prompts().synthesis,
            &[
                ("repository", commit.repository.as_str()),
                ("branch", commit.branch.as_str()),
                ("author", commit.author.as_str()),
                ("commit_hash", commit.short_id.as_str()),
                ("commit_message", message),
                ("files_count", files_count.as_str()),
                ("chunk_count", chunk_count.as_str()),
                ("chunk_results", chunk_results.as_str()),
                ("open_issues", open_issues.as_str()),
                ("scm_issue", scm_issue.as_str()),
            ],
        );
        self.classifier.decide(user_prompt).await
    }

    /// Runs the map phase. Notes come back in chunk order.
    pub async fn map(&self, commit: &CommitRecord, changes: &[FileChange]) -> Vec<ChunkNote> {
        let chunks: Vec<&[FileChange]> = changes.chunks(self.chunk_size).collect();
        let count = chunks.len();
        let calls =
            chunks.iter().enumerate().map(|(i, chunk)| self.note(commit, i + 1, count, chunk));
        join_all(calls).await
    }

    async fn note(
        &self,
        commit: &CommitRecord,
        index: usize,
        count: usize,
        chunk: &[FileChange],
    ) -> ChunkNote {
        let settings = self.classifier.settings();
        let diff_summary = self.chunk_summary(chunk).render();
        let (index_text, count_text) = (index.to_string(), count.to_string());
        let user_prompt = prompt::render(
            &self.classifier.prompts().chunk,
            &[
                ("repository", commit.repository.as_str()),
                ("commit_hash", commit.short_id.as_str()),
                ("commit_message", commit.message.trim()),
                ("chunk_index", index_text.as_str()),
                ("chunk_count", count_text.as_str()),
                ("diff_summary", diff_summary.as_str()),
            ],
        );
        let request = CompletionRequest {
            model: settings.chunk_model.clone(),
            system: self.classifier.prompts().system.clone(),
            prompt: user_prompt,
            max_tokens: settings.chunk_max_tokens,
            temperature: settings.temperature,
        };

        match self.classifier.llm().complete(&request).await {
            Ok(response) => match response::extract_json(&response.text) {
                Some(value) => ChunkNote::Notes(value),
                None => {
                    warn!(commit = %commit.short_id, chunk = index, "chunk answer holds no JSON");
                    ChunkNote::Unavailable("answer holds no JSON object".into())
                }
            },
            Err(e) => {
                warn!(commit = %commit.short_id, chunk = index, error = %e, "chunk call failed");
                ChunkNote::Unavailable(e.to_string())
            }
        }
    }

    fn chunk_summary(&self, chunk: &[FileChange]) -> DiffSummary {
        let files = chunk
            .iter()
            .map(|c| DiffFile {
                path: c.path.clone(),
                additions: c.additions,
                deletions: c.deletions,
                patch: c.patch.as_deref().map(|p| truncate_patch(p, self.preview_lines)),
            })
            .collect();
        DiffSummary { tier: Tier::Summary, totals: DiffTotals::of(chunk), files }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::tests::ScriptedLlm;
    use crate::classify::IssueAction;
    use crate::config::LlmSettings;
    use crate::classify::prompt::PromptSet;

    fn changes(n: usize) -> Vec<FileChange> {
        (0..n)
            .map(|i| FileChange::from_patch(format!("src/f{i}.rs"), format!("+line {i}\n")))
            .collect()
    }

    fn commit() -> CommitRecord {
        CommitRecord::new("feedface00000000", "Bo", "Rework storage layer", "shop", "main")
    }

    const FINAL: &str = r#"{"action":"create","tracker_id":2,"priority_id":2,"subject":"Storage rework","done_ratio":20}"#;

    #[tokio::test]
    async fn synthesis_sees_every_chunk_in_order_even_when_one_fails() {
        let llm = ScriptedLlm::new(vec![
            Ok(r#"{"summary":"first"}"#.into()),
            Err("rate limited".into()),
            Ok(r#"{"summary":"third"}"#.into()),
            Ok(FINAL.into()),
        ]);
        let (prompts, settings) = (PromptSet::default(), LlmSettings::default());
        let classifier = Classifier::new(&llm, &prompts, &settings, 50);
        let coordinator = ChunkCoordinator::new(&classifier, 2, 20);

        let result = coordinator.classify(&commit(), &changes(5), &[], None).await.unwrap();
        assert_eq!(result.action, IssueAction::Create);
        assert_eq!(result.subject, "Storage rework");

        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests.len(), 4);
        assert!(requests[..3].iter().all(|r| r.model == settings.chunk_model));
        assert!(requests[0].prompt.contains("part 1 of 3"));
        assert!(requests[0].prompt.contains("src/f1.rs"));
        assert!(!requests[0].prompt.contains("src/f2.rs"));

        let synthesis = &requests[3];
        assert_eq!(synthesis.model, settings.model);
        let first = synthesis.prompt.find("Chunk 1/3:\n{\"summary\":\"first\"}").unwrap();
        let second = synthesis.prompt.find("Chunk 2/3:\nunavailable: rate limited").unwrap();
        let third = synthesis.prompt.find("Chunk 3/3:\n{\"summary\":\"third\"}").unwrap();
        assert!(first < second && second < third);
    }

    #[tokio::test]
    async fn unparseable_chunk_answer_is_unavailable() {
        let llm = ScriptedLlm::new(vec![Ok("no idea".into())]);
        let (prompts, settings) = (PromptSet::default(), LlmSettings::default());
        let classifier = Classifier::new(&llm, &prompts, &settings, 50);
        let coordinator = ChunkCoordinator::new(&classifier, 10, 20);

        let notes = coordinator.map(&commit(), &changes(3)).await;
        assert_eq!(notes, vec![ChunkNote::Unavailable("answer holds no JSON object".into())]);
    }

    #[tokio::test]
    async fn reduce_runs_when_every_chunk_failed() {
        let llm = ScriptedLlm::new(vec![Err("down".into()), Ok(FINAL.into())]);
        let (prompts, settings) = (PromptSet::default(), LlmSettings::default());
        let classifier = Classifier::new(&llm, &prompts, &settings, 50);
        let coordinator = ChunkCoordinator::new(&classifier, 10, 20);

        let result = coordinator.classify(&commit(), &changes(2), &[], None).await;
        assert!(result.is_ok());
        assert!(llm.requests.lock().unwrap()[1].prompt.contains("Chunk 1/1:\nunavailable: down"));
    }

    #[tokio::test]
    async fn invalid_synthesis_is_a_classification_error() {
        let llm = ScriptedLlm::new(vec![
            Ok(r#"{"summary":"x"}"#.into()),
            Ok(r#"{"action":"archive","tracker_id":1,"priority_id":1,"subject":"s","done_ratio":0}"#.into()),
        ]);
        let (prompts, settings) = (PromptSet::default(), LlmSettings::default());
        let classifier = Classifier::new(&llm, &prompts, &settings, 50);
        let coordinator = ChunkCoordinator::new(&classifier, 10, 20);

        let err = coordinator.classify(&commit(), &changes(1), &[], None).await.unwrap_err();
        assert!(matches!(err, ClassifyError::Validation(_)));
    }
}
