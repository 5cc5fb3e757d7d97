//! Bounded patch previews for the `summary` tier.

/// Shortens a patch to at most `max_lines` significant lines.
///
/// A patch that already fits is returned unchanged. Otherwise hunk headers
/// and added/removed lines are kept in order, context lines are dropped,
/// and a `... (N more lines)` marker reports how much was left out.
#[must_use]
pub fn truncate_patch(patch: &str, max_lines: usize) -> String {
    if patch.is_empty() {
        return String::new();
    }
    let lines: Vec<&str> = patch.split('\n').collect();
    if lines.len() <= max_lines {
        return patch.to_string();
    }

    let kept: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|line| line.starts_with("@@") || line.starts_with('+') || line.starts_with('-'))
        .take(max_lines)
        .collect();

    let mut preview = kept.join("\n");
    preview.push_str(&format!("\n... ({} more lines)", lines.len() - kept.len()));
    preview
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_patch_is_verbatim() {
        let patch = "@@ -1 +1 @@\n-a\n+b";
        assert_eq!(truncate_patch(patch, 20), patch);
    }

    #[test]
    fn long_patch_keeps_changes_and_counts_the_rest() {
        let mut patch = String::from("@@ -1,30 +1,30 @@\n");
        for i in 0..30 {
            patch.push_str(&format!(" context {i}\n+added {i}\n"));
        }
        let preview = truncate_patch(patch.trim_end(), 5);
        let lines: Vec<&str> = preview.lines().collect();

        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "@@ -1,30 +1,30 @@");
        assert_eq!(lines[1], "+added 0");
        assert!(lines.iter().all(|l| !l.starts_with(' ')));
        assert_eq!(lines[5], "... (56 more lines)");
    }

    #[test]
    fn empty_patch_stays_empty() {
        assert_eq!(truncate_patch("", 3), "");
    }
}
