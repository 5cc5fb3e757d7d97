//! Mapping a repository to its tracker project.

use crate::config::ProjectSettings;
use crate::ports::TrackerProject;

/// Which rule matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// The exact name, or the lowercased name as identifier.
    Exact,
    /// Names equal ignoring case.
    CaseInsensitive,
}

/// Finds the tracker project for `repository`.
///
/// The mapping table is consulted first and replaces the name to look for.
/// Then, for the name and each variant with a configured suffix removed,
/// a project matches if its name equals the candidate or its identifier
/// equals the lowercased candidate. Finally names are compared ignoring
/// case.
#[must_use]
pub fn resolve_project<'p>(
    repository: &str,
    settings: &ProjectSettings,
    projects: &'p [TrackerProject],
) -> Option<(&'p TrackerProject, MatchKind)> {
    let wanted = settings.mapping.get(repository).map_or(repository, String::as_str);

    let mut candidates = vec![wanted];
    for suffix in settings.strip_suffixes.iter().filter(|s| !s.is_empty()) {
        if let Some(stripped) = wanted.strip_suffix(suffix.as_str()).filter(|s| !s.is_empty()) {
            candidates.push(stripped);
        }
    }

    for candidate in &candidates {
        let identifier = candidate.to_lowercase();
        let found = projects.iter().find(|p| p.name == *candidate || p.identifier == identifier);
        if let Some(project) = found {
            return Some((project, MatchKind::Exact));
        }
    }
    candidates.iter().find_map(|candidate| {
        let lowered = candidate.to_lowercase();
        projects
            .iter()
            .find(|p| p.name.to_lowercase() == lowered)
            .map(|p| (p, MatchKind::CaseInsensitive))
    })
}
