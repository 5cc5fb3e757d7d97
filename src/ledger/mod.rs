//! Idempotency ledger and audit log.
//!
//! Two append-only JSON-lines stores live in the state directory:
//!
//! - `processed_commits.jsonl`: one `{"commit", "at"}` record per commit
//!   that caused a tracker mutation. This is the fast lookup.
//! - `sync-YYYY-MM-DD.jsonl`: one [`AuditEntry`] per processed commit,
//!   whatever its status. Scanned as a fallback for commits processed
//!   before the tracking file existed.
//!
//! Reads fail open: a store that cannot be read is logged and treated as
//! empty so a damaged ledger never blocks synchronization.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::model::{short_id, SyncOutcome, SyncStatus};
use crate::ports::{Clock, FileSystem};

/// File name of the tracking record.
pub const TRACKING_FILE: &str = "processed_commits.jsonl";

const AUDIT_PREFIX: &str = "sync-";
const AUDIT_SUFFIX: &str = ".jsonl";

/// Name of the audit log for `date`.
#[must_use]
pub fn audit_file_name(date: NaiveDate) -> String {
    format!("{AUDIT_PREFIX}{}{AUDIT_SUFFIX}", date.format("%Y-%m-%d"))
}

/// Errors raised when a ledger write fails.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Appending to a ledger file failed.
    #[error("cannot append to {path}: {message}")]
    Write {
        /// File that failed.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },

    /// A record could not be serialized.
    #[error("cannot encode ledger record: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct TrackingRecord {
    commit: String,
    at: DateTime<Utc>,
}

/// One line of the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the outcome was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Processing run that produced the outcome.
    pub run_id: String,
    /// Repository of the commit.
    pub repository: String,
    /// Branch of the push.
    pub branch: String,
    /// The outcome itself.
    #[serde(flatten)]
    pub outcome: SyncOutcome,
}

/// Answers "has this commit already caused a tracker mutation".
pub struct Ledger<'a> {
    fs: &'a dyn FileSystem,
    clock: &'a dyn Clock,
    dir: PathBuf,
    // Short ids of the tracking file; `None` until first use.
    seen: Mutex<Option<HashSet<String>>>,
}

impl<'a> Ledger<'a> {
    /// Opens the ledger stored in `dir`. Nothing is read until first use.
    #[must_use]
    pub fn new(fs: &'a dyn FileSystem, clock: &'a dyn Clock, dir: impl Into<PathBuf>) -> Self {
        Self { fs, clock, dir: dir.into(), seen: Mutex::new(None) }
    }

    /// State directory of this ledger.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether `commit_id` (full or short) was already synchronized.
    ///
    /// Checks the tracking record first, then the audit logs, where only
    /// `success` outcomes count. A commit found only in the audit logs is
    /// copied into the tracking record.
    pub fn already_processed(&self, commit_id: &str) -> bool {
        let short = short_id(commit_id);
        {
            let mut guard = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
            if guard.get_or_insert_with(|| self.load_tracking()).contains(&short) {
                return true;
            }
        }

        if !self.succeeded_in_audit_logs(commit_id, &short) {
            return false;
        }
        info!(commit = %short, "found in audit log, migrating to tracking record");
        if let Err(e) = self.mark_processed(commit_id) {
            warn!(commit = %short, error = %e, "failed to migrate commit to tracking record");
        }
        true
    }

    /// Records that `commit_id` caused a tracker mutation.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the tracking record cannot be appended.
    pub fn mark_processed(&self, commit_id: &str) -> Result<(), LedgerError> {
        let short = short_id(commit_id);
        let record = TrackingRecord { commit: short.clone(), at: self.clock.now() };
        let line = serde_json::to_string(&record)? + "\n";

        let mut guard = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        let seen = guard.get_or_insert_with(|| self.load_tracking());
        self.append(&self.dir.join(TRACKING_FILE), &line)?;
        seen.insert(short);
        Ok(())
    }

    /// Appends one outcome to today's audit log.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the entry cannot be encoded or written.
    pub fn record_outcome(
        &self,
        run_id: &str,
        repository: &str,
        branch: &str,
        outcome: &SyncOutcome,
    ) -> Result<(), LedgerError> {
        let entry = AuditEntry {
            recorded_at: self.clock.now(),
            run_id: run_id.to_string(),
            repository: repository.to_string(),
            branch: branch.to_string(),
            outcome: outcome.clone(),
        };
        let line = serde_json::to_string(&entry)? + "\n";
        let path = self.dir.join(audit_file_name(self.clock.today()));

        let _guard = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        self.append(&path, &line)
    }

    fn append(&self, path: &Path, line: &str) -> Result<(), LedgerError> {
        self.fs
            .append(path, line)
            .map_err(|e| LedgerError::Write { path: path.to_path_buf(), message: e.to_string() })
    }

    fn load_tracking(&self) -> HashSet<String> {
        let path = self.dir.join(TRACKING_FILE);
        if !self.fs.exists(&path) {
            return HashSet::new();
        }
        let content = match self.fs.read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read tracking record");
                return HashSet::new();
            }
        };

        let mut seen = HashSet::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str::<TrackingRecord>(line) {
                Ok(record) => {
                    seen.insert(record.commit);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping bad tracking line"),
            }
        }
        debug!(count = seen.len(), "loaded tracking record");
        seen
    }

    fn succeeded_in_audit_logs(&self, commit_id: &str, short: &str) -> bool {
        if commit_id.is_empty() || !self.fs.exists(&self.dir) {
            return false;
        }
        let names = match self.fs.list_dir(&self.dir) {
            Ok(names) => names,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "cannot list audit logs");
                return false;
            }
        };

        let logs =
            names.iter().filter(|n| n.starts_with(AUDIT_PREFIX) && n.ends_with(AUDIT_SUFFIX));
        for name in logs {
            let path = self.dir.join(name);
            let content = match self.fs.read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cannot read audit log, skipping");
                    continue;
                }
            };
            let hit = content
                .lines()
                .filter(|line| line.contains(commit_id) || line.contains(short))
                .any(is_success_line);
            if hit {
                return true;
            }
        }
        false
    }
}

fn is_success_line(line: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(line)
        .ok()
        .and_then(|v| serde_json::from_value::<SyncStatus>(v.get("status")?.clone()).ok())
        == Some(SyncStatus::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::live::filesystem::LiveFileSystem;
    use crate::model::{CommitRecord, SyncAction};
    use chrono::TimeZone;

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap()
        }
    }

    fn commit(id: &str) -> CommitRecord {
        CommitRecord::new(id, "Ann", "msg", "shop", "main")
    }

    #[test]
    fn unknown_commit_is_not_processed() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(&LiveFileSystem, &FixedClock, dir.path());
        assert!(!ledger.already_processed("0123456789abcdef"));
    }

    #[test]
    fn marked_commit_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(&LiveFileSystem, &FixedClock, dir.path());
        ledger.mark_processed("0123456789abcdef").unwrap();
        assert!(ledger.already_processed("0123456789abcdef"));

        let reopened = Ledger::new(&LiveFileSystem, &FixedClock, dir.path());
        assert!(reopened.already_processed("0123456789abcdef"));
        assert!(reopened.already_processed("01234567"));
        assert!(!reopened.already_processed("fedcba9876543210"));
    }

    #[test]
    fn successful_audit_entry_is_migrated() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(&LiveFileSystem, &FixedClock, dir.path());
        let outcome = SyncOutcome::success(&commit("aaaabbbbccccdddd"), SyncAction::Update, 15);
        ledger.record_outcome("run-1", "shop", "main", &outcome).unwrap();
        assert!(!dir.path().join(TRACKING_FILE).exists());

        let reopened = Ledger::new(&LiveFileSystem, &FixedClock, dir.path());
        assert!(reopened.already_processed("aaaabbbbccccdddd"));
        let tracking = std::fs::read_to_string(dir.path().join(TRACKING_FILE)).unwrap();
        assert!(tracking.contains("\"commit\":\"aaaabbbb\""));
    }

    #[test]
    fn empty_commit_id_never_matches_audit_lines() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(&LiveFileSystem, &FixedClock, dir.path());
        let outcome = SyncOutcome::success(&commit("aaaabbbbccccdddd"), SyncAction::Update, 15);
        ledger.record_outcome("run-1", "shop", "main", &outcome).unwrap();

        let reopened = Ledger::new(&LiveFileSystem, &FixedClock, dir.path());
        assert!(!reopened.already_processed(""));
        assert!(!dir.path().join(TRACKING_FILE).exists());
    }

    #[test]
    fn failed_and_skipped_audit_entries_stay_retryable() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(&LiveFileSystem, &FixedClock, dir.path());
        ledger
            .record_outcome(
                "run-1",
                "shop",
                "main",
                &SyncOutcome::failed(&commit("1111222233334444"), "boom"),
            )
            .unwrap();
        ledger
            .record_outcome(
                "run-1",
                "shop",
                "main",
                &SyncOutcome::skipped(&commit("5555666677778888"), "dry run"),
            )
            .unwrap();

        assert!(!ledger.already_processed("1111222233334444"));
        assert!(!ledger.already_processed("5555666677778888"));
    }

    #[test]
    fn audit_log_is_named_by_clock_date_and_flattens_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(&LiveFileSystem, &FixedClock, dir.path());
        let outcome = SyncOutcome::skipped(&commit("deadbeefcafe0000"), "merge commit");
        ledger.record_outcome("run-7", "shop", "main", &outcome).unwrap();

        let path = dir.path().join("sync-2024-03-09.jsonl");
        let line = std::fs::read_to_string(path).unwrap();
        let entry: AuditEntry = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(entry.run_id, "run-7");
        assert_eq!(entry.outcome, outcome);
        assert!(line.contains("\"status\":\"skipped\""));
    }

    #[test]
    fn corrupt_tracking_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(TRACKING_FILE),
            "not json\n{\"commit\":\"abcdef12\",\"at\":\"2024-03-09T12:00:00Z\"}\n",
        )
        .unwrap();

        let ledger = Ledger::new(&LiveFileSystem, &FixedClock, dir.path());
        assert!(ledger.already_processed("abcdef1234567890"));
    }
}
