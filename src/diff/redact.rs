//! Masks credentials that appear in patch text.

use std::sync::LazyLock;

use regex::Regex;

static PASSWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(password|passwd|pwd)\s*[:=]\s*["']?[^"'\s]+["']?"#)
        .expect("valid password pattern")
});

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(api[_-]?key|token|secret)\s*[:=]\s*["']?[^"'\s]+["']?"#)
        .expect("valid token pattern")
});

/// Replaces `key = value` assignments of passwords, API keys, tokens and
/// secrets with `key=***`. The key keeps its original spelling.
#[must_use]
pub fn redact_secrets(text: &str) -> String {
    let text = PASSWORD.replace_all(text, "${1}=***");
    TOKEN.replace_all(&text, "${1}=***").into_owned()
}
