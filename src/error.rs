//! Per-commit failure taxonomy.

use thiserror::Error;

use crate::classify::ClassifyError;

/// Why a commit's synchronization failed.
///
/// Every variant is local to one commit; the batch driver turns it into a
/// `failed` outcome and moves on to the next commit.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Source control or tracker unreachable, or answered with an error.
    #[error("upstream fetch failed: {0}")]
    UpstreamFetch(String),

    /// No tracker project matches the repository.
    #[error("no tracker project matches repository '{0}'")]
    ProjectResolution(String),

    /// An explicitly referenced issue does not exist.
    #[error("Issue #{0} not found")]
    IssueNotFound(u64),

    /// The model call failed or its answer was unusable.
    #[error(transparent)]
    Classification(#[from] ClassifyError),

    /// The tracker rejected a create or update.
    #[error("tracker mutation failed: {0}")]
    Mutation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_not_found_message_names_the_issue() {
        assert_eq!(SyncError::IssueNotFound(15).to_string(), "Issue #15 not found");
    }

    #[test]
    fn classification_errors_display_transparently() {
        let cause = ClassifyError::Validation("missing required field 'subject'".into());
        let err = SyncError::from(cause);
        assert_eq!(err.to_string(), "invalid classification: missing required field 'subject'");
    }
}
