//! Named, configuration-driven message rules.

use std::fmt;

use crate::config::RuleSettings;

/// Why a commit was not synchronized. Skips are outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Message starts with `merge`.
    Merge,
    /// Message starts with `revert`.
    Revert,
    /// Message starts with another configured prefix or carries a marker.
    Automated,
    /// The ledger already holds the commit.
    AlreadyProcessed,
    /// Dry-run mode stopped before mutating the tracker.
    DryRun,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Merge => "merge commit",
            Self::Revert => "revert commit",
            Self::Automated => "bot/CI commit",
            Self::AlreadyProcessed => "already processed",
            Self::DryRun => "dry run",
        })
    }
}

/// Pre-fetch skip rules and the resolution keyword heuristic.
///
/// All comparisons are case-insensitive; keywords are stored lowercased.
#[derive(Debug, Clone)]
pub struct SkipRules {
    prefixes: Vec<String>,
    markers: Vec<String>,
    resolution_keywords: Vec<String>,
}

fn lowercase_all(items: &[String]) -> Vec<String> {
    items.iter().map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty()).collect()
}

impl SkipRules {
    /// Builds the rule set from configuration.
    #[must_use]
    pub fn from_settings(settings: &RuleSettings) -> Self {
        Self {
            prefixes: lowercase_all(&settings.skip_prefixes),
            markers: lowercase_all(&settings.skip_markers),
            resolution_keywords: lowercase_all(&settings.resolution_keywords),
        }
    }

    /// The reason a commit with `message` must not be synchronized, if any.
    #[must_use]
    pub fn check(&self, message: &str) -> Option<SkipReason> {
        let message = message.trim_start().to_lowercase();
        if let Some(prefix) = self.prefixes.iter().find(|p| message.starts_with(p.as_str())) {
            return Some(match prefix.as_str() {
                "merge" => SkipReason::Merge,
                "revert" => SkipReason::Revert,
                _ => SkipReason::Automated,
            });
        }
        self.markers.iter().any(|m| message.contains(m.as_str())).then_some(SkipReason::Automated)
    }

    /// Whether `message` states that the referenced issue is resolved.
    ///
    /// ASCII keywords must start a word, so "fix" matches "fixes" but not
    /// "prefix". Other keywords match anywhere.
    #[must_use]
    pub fn signals_resolution(&self, message: &str) -> bool {
        let message = message.to_lowercase();
        self.resolution_keywords.iter().any(|k| contains_keyword(&message, k))
    }
}

fn contains_keyword(message: &str, keyword: &str) -> bool {
    if !keyword.is_ascii() {
        return message.contains(keyword);
    }
    message.match_indices(keyword).any(|(at, _)| {
        message[..at].chars().next_back().is_none_or(|c| !c.is_alphanumeric())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> SkipRules {
        SkipRules::from_settings(&RuleSettings::default())
    }

    #[test]
    fn merge_and_revert_prefixes_are_case_insensitive() {
        assert_eq!(rules().check("Merge branch 'x'"), Some(SkipReason::Merge));
        assert_eq!(rules().check("REVERT \"add cache\""), Some(SkipReason::Revert));
        assert_eq!(rules().check("Merge branch 'x'").unwrap().to_string(), "merge commit");
    }

    #[test]
    fn markers_match_anywhere() {
        assert_eq!(rules().check("bump deps [Skip CI]"), Some(SkipReason::Automated));
        assert_eq!(rules().check("renovate[bot]: update"), Some(SkipReason::Automated));
        assert_eq!(SkipReason::Automated.to_string(), "bot/CI commit");
    }

    #[test]
    fn ordinary_commits_pass() {
        assert_eq!(rules().check("Add retry logic to uploads"), None);
        assert_eq!(rules().check("emerge from the cave"), None);
    }

    #[test]
    fn custom_prefix_counts_as_automated() {
        let settings = RuleSettings {
            skip_prefixes: vec!["chore(release)".into()],
            ..RuleSettings::default()
        };
        let rules = SkipRules::from_settings(&settings);
        assert_eq!(rules.check("chore(release): 1.2.0"), Some(SkipReason::Automated));
        assert_eq!(rules.check("Merge branch 'x'"), None);
    }

    #[test]
    fn resolution_keywords_are_bilingual() {
        assert!(rules().signals_resolution("Fix #15 null pointer"));
        assert!(rules().signals_resolution("로그인 오류 수정 #3"));
        assert!(rules().signals_resolution("Closes #9"));
        assert!(!rules().signals_resolution("refs #15 add logging"));
    }

    #[test]
    fn ascii_keywords_need_a_word_start() {
        assert!(!rules().signals_resolution("refs #15 add prefix parsing"));
        assert!(!rules().signals_resolution("refs #15 enclosed values"));
        assert!(rules().signals_resolution("refs #15 prefix parsing, fixes crash"));
        assert!(rules().signals_resolution("(fixed) #15"));
        assert!(rules().signals_resolution("버그수정 #4"));
    }
}
