//! Issue references in commit messages.
//!
//! Two resolvers share the same shape: an ordered list of case-insensitive
//! patterns where the first pattern that matches anywhere in the message
//! wins. Keyword forms (`fix #N`) therefore beat a bare `#N` that appears
//! earlier in the text.

use std::sync::LazyLock;

use regex::Regex;

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).expect("valid reference pattern")).collect()
}

static TRACKER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)\brefs?\s+#(\d+)",
        r"(?i)\bfix(?:es|ed)?\s+#(\d+)",
        r"(?i)\bclose[sd]?\s+#(\d+)",
        r"(?i)\bresolve[sd]?\s+#(\d+)",
        r"(?i)\bissue\s+#(\d+)",
        r"#(\d+)",
    ])
});

static SCM_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[r"(?i)\bgitlab\s*#(\d+)", r"(?i)\bissue\s+#(\d+)", r"#(\d+)"])
});

// Source-control references must not be mistaken for tracker ids.
static SCM_QUALIFIED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bgitlab\s*#\d+").expect("valid qualified pattern"));

fn first_match(patterns: &[Regex], message: &str) -> Option<u64> {
    patterns
        .iter()
        .find_map(|re| re.captures(message).and_then(|caps| caps[1].parse().ok()))
}

/// Tracker issue explicitly named in `message`.
///
/// Pattern priority: `refs #N`, `fix #N`, `close #N`, `resolve #N`,
/// `issue #N`, then a bare `#N`. References qualified as `gitlab #N` are
/// ignored here.
#[must_use]
pub fn resolve_tracker_reference(message: &str) -> Option<u64> {
    let unqualified = SCM_QUALIFIED.replace_all(message, "");
    first_match(&TRACKER_PATTERNS, &unqualified)
}

/// Source-control issue named in `message`, used as extra context.
///
/// Pattern priority: `gitlab #N`, `issue #N`, then a bare `#N`.
#[must_use]
pub fn resolve_scm_reference(message: &str) -> Option<u64> {
    first_match(&SCM_PATTERNS, message)
}
