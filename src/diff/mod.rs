//! Diff summarization.
//!
//! A commit's file changes are filtered against an ignore list and reduced
//! to one of three tiers depending on how many lines changed:
//!
//! - `full`: every surviving file with its complete patch,
//! - `summary`: every surviving file with a bounded preview,
//! - `high_level`: the files with the most churn, without patch text.
//!
//! Totals always describe the filtered set.

pub mod preview;
pub mod redact;

use std::fmt::Write as _;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::config::DiffSettings;
use crate::model::FileChange;

/// Granularity at which a diff is rendered for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Complete patches.
    Full,
    /// Bounded previews.
    Summary,
    /// Top files by churn only.
    HighLevel,
}

impl Tier {
    fn headline(self) -> &'static str {
        match self {
            Self::Full => "Full diff",
            Self::Summary => "Diff summary",
            Self::HighLevel => "Large change",
        }
    }
}

/// Ignore list and tier thresholds.
#[derive(Debug, Clone)]
pub struct DiffPolicy {
    ignore: GlobSet,
    full_max_lines: u64,
    summary_max_lines: u64,
    preview_lines: usize,
    top_files: usize,
}

impl DiffPolicy {
    /// Compiles the ignore patterns of `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first pattern that is not a valid glob.
    pub fn from_settings(settings: &DiffSettings) -> Result<Self, String> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &settings.ignore_patterns {
            let glob = Glob::new(pattern)
                .map_err(|e| format!("invalid ignore pattern '{pattern}': {e}"))?;
            builder.add(glob);
        }
        let ignore = builder.build().map_err(|e| format!("cannot build ignore set: {e}"))?;
        Ok(Self {
            ignore,
            full_max_lines: settings.full_max_lines,
            summary_max_lines: settings.summary_max_lines,
            preview_lines: settings.preview_lines,
            top_files: settings.top_files,
        })
    }

    /// Lines kept per file preview.
    #[must_use]
    pub fn preview_lines(&self) -> usize {
        self.preview_lines
    }

    /// Whether `path` (or its file name) matches an ignore pattern.
    #[must_use]
    pub fn is_ignored(&self, path: &str) -> bool {
        if self.ignore.is_match(path) {
            return true;
        }
        Path::new(path).file_name().is_some_and(|name| self.ignore.is_match(name))
    }

    /// The changes that survive the ignore list, in input order.
    #[must_use]
    pub fn filter(&self, changes: &[FileChange]) -> Vec<FileChange> {
        changes.iter().filter(|c| !self.is_ignored(&c.path)).cloned().collect()
    }

    /// Tier for a diff of `lines` changed lines.
    #[must_use]
    pub fn tier_for(&self, lines: u64) -> Tier {
        if lines < self.full_max_lines {
            Tier::Full
        } else if lines < self.summary_max_lines {
            Tier::Summary
        } else {
            Tier::HighLevel
        }
    }
}

/// Aggregate counts over the filtered changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffTotals {
    /// Number of files.
    pub files: usize,
    /// Added lines.
    pub additions: u64,
    /// Removed lines.
    pub deletions: u64,
    /// Added plus removed lines.
    pub lines: u64,
}

impl DiffTotals {
    /// Sums the counts of `changes`.
    #[must_use]
    pub fn of(changes: &[FileChange]) -> Self {
        let additions = changes.iter().map(|c| c.additions).sum();
        let deletions = changes.iter().map(|c| c.deletions).sum();
        Self { files: changes.len(), additions, deletions, lines: additions + deletions }
    }
}

/// One file entry of a summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffFile {
    /// File path.
    pub path: String,
    /// Added lines.
    pub additions: u64,
    /// Removed lines.
    pub deletions: u64,
    /// Complete patch (`full`), preview (`summary`) or nothing (`high_level`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

/// Tiered, filtered view of a commit's changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    /// Chosen tier.
    pub tier: Tier,
    /// Totals over the filtered changes.
    pub totals: DiffTotals,
    /// Per-tier file entries.
    pub files: Vec<DiffFile>,
}

/// Filters `changes` and reduces them to the tier their size calls for.
#[must_use]
pub fn summarize(changes: &[FileChange], policy: &DiffPolicy) -> DiffSummary {
    let kept = policy.filter(changes);
    let totals = DiffTotals::of(&kept);
    let tier = policy.tier_for(totals.lines);

    let files = match tier {
        Tier::Full => kept
            .into_iter()
            .map(|c| DiffFile {
                path: c.path,
                additions: c.additions,
                deletions: c.deletions,
                patch: c.patch,
            })
            .collect(),
        Tier::Summary => kept
            .into_iter()
            .map(|c| DiffFile {
                patch: c.patch.as_deref().map(|p| preview::truncate_patch(p, policy.preview_lines)),
                path: c.path,
                additions: c.additions,
                deletions: c.deletions,
            })
            .collect(),
        Tier::HighLevel => {
            let mut ranked = kept;
            // Stable: equal churn keeps input order.
            ranked.sort_by(|a, b| b.churn().cmp(&a.churn()));
            ranked
                .into_iter()
                .take(policy.top_files)
                .map(|c| DiffFile {
                    path: c.path,
                    additions: c.additions,
                    deletions: c.deletions,
                    patch: None,
                })
                .collect()
        }
    };

    DiffSummary { tier, totals, files }
}

impl DiffSummary {
    /// Human-readable text for a prompt. Patch text is redacted.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!(
            "{} ({} lines changed in {} files, +{} -{})\n",
            self.tier.headline(),
            self.totals.lines,
            self.totals.files,
            self.totals.additions,
            self.totals.deletions,
        );
        if self.tier == Tier::HighLevel {
            out.push_str("Top changed files:\n");
        }
        for file in &self.files {
            let _ = writeln!(out, "- {} (+{}, -{})", file.path, file.additions, file.deletions);
        }
        for file in &self.files {
            if let Some(patch) = file.patch.as_deref().filter(|p| !p.is_empty()) {
                let patch = redact::redact_secrets(patch.trim_end());
                let _ = write!(out, "\n### {}\n```diff\n{patch}\n```\n", file.path);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> DiffPolicy {
        DiffPolicy::from_settings(&DiffSettings::default()).unwrap()
    }

    fn change(path: &str, additions: u64, deletions: u64) -> FileChange {
        let patch = Some("@@ -1 +1 @@\n-a\n+b".into());
        FileChange { path: path.into(), additions, deletions, patch }
    }

    #[test]
    fn ignore_list_matches_paths_and_nested_file_names() {
        let policy = policy();
        assert!(policy.is_ignored("yarn.lock"));
        assert!(policy.is_ignored("web/yarn.lock"));
        assert!(policy.is_ignored("assets/img/logo.png"));
        assert!(policy.is_ignored("dist/bundle.js"));
        assert!(!policy.is_ignored("src/main.rs"));
    }

    #[test]
    fn small_diff_is_full_and_totals_exclude_ignored_files() {
        let changes = vec![
            change("src/a.rs", 10, 2),
            change("package-lock.json", 4000, 3000),
            change("src/b.rs", 1, 1),
        ];
        let summary = summarize(&changes, &policy());

        assert_eq!(summary.tier, Tier::Full);
        assert_eq!(summary.files.len(), 2);
        assert_eq!(summary.totals, DiffTotals { files: 2, additions: 11, deletions: 3, lines: 14 });
        assert_eq!(summary.files[0].patch.as_deref(), Some("@@ -1 +1 @@\n-a\n+b"));
    }

    #[test]
    fn medium_diff_gets_bounded_previews() {
        let long_patch: String = (0..50).map(|i| format!("+line {i}\n")).collect();
        let changes = vec![FileChange {
            path: "src/a.rs".into(),
            additions: 600,
            deletions: 0,
            patch: Some(long_patch),
        }];
        let summary = summarize(&changes, &policy());

        assert_eq!(summary.tier, Tier::Summary);
        let preview = summary.files[0].patch.as_deref().unwrap();
        assert_eq!(preview.lines().count(), 21);
        assert!(preview.ends_with("more lines)"));
    }

    #[test]
    fn large_diff_keeps_top_ten_by_churn_with_stable_ties() {
        let mut changes: Vec<FileChange> =
            (0..12).map(|i| change(&format!("f{i}.rs"), 100, 100)).collect();
        changes.push(change("big.rs", 900, 100));
        let summary = summarize(&changes, &policy());

        assert_eq!(summary.tier, Tier::HighLevel);
        assert_eq!(summary.totals.files, 13);
        assert_eq!(summary.files.len(), 10);
        assert_eq!(summary.files[0].path, "big.rs");
        assert_eq!(summary.files[1].path, "f0.rs");
        assert_eq!(summary.files[9].path, "f8.rs");
        assert!(summary.files.iter().all(|f| f.patch.is_none()));
    }

    #[test]
    fn nothing_left_after_filtering_is_an_empty_full_summary() {
        let summary = summarize(&[change("logo.svg", 5000, 0)], &policy());
        assert_eq!(summary.tier, Tier::Full);
        assert!(summary.files.is_empty());
        assert_eq!(summary.totals, DiffTotals::default());
    }

    #[test]
    fn render_lists_files_and_redacts_patches() {
        let changes = vec![FileChange {
            path: "config.py".into(),
            additions: 1,
            deletions: 0,
            patch: Some("+API_KEY = 'sk-live'".into()),
        }];
        let text = summarize(&changes, &policy()).render();

        assert!(text.starts_with("Full diff (1 lines changed in 1 files, +1 -0)"));
        assert!(text.contains("- config.py (+1, -0)"));
        assert!(text.contains("API_KEY=***"));
        assert!(!text.contains("sk-live"));
    }
}
