use crate::model::MatchKind;

use super::normalize::{contains_on_word_boundary, normalize_key};
use super::registry::{CheckerSpec, Registry};

#[derive(Debug, Clone, Copy)]
pub struct Resolution<'r> {
    pub spec: &'r CheckerSpec,
    pub matched_key: &'r str,
    pub kind: MatchKind,
}

/// Resolves a checklist tip to at most one checker.
///
/// Exact normalized match first; otherwise the longest registry key found in
/// the tip on word boundaries, ties broken by the smallest key. Pure in
/// `(tip, registry)`.
pub fn resolve<'r>(tip: &str, registry: &'r Registry) -> Option<Resolution<'r>> {
    let normalized = normalize_key(tip);
    if normalized.is_empty() {
        return None;
    }

    if let Some((key, spec)) = registry.lookup_entry(&normalized) {
        return Some(Resolution {
            spec,
            matched_key: key,
            kind: MatchKind::Exact,
        });
    }

    registry
        .keys()
        .filter(|(key, _)| contains_on_word_boundary(&normalized, key))
        .fold(None::<(&str, &CheckerSpec)>, |best, candidate| match best {
            Some(current) if !is_better(candidate.0, current.0) => Some(current),
            _ => Some(candidate),
        })
        .map(|(key, spec)| Resolution {
            spec,
            matched_key: key,
            kind: MatchKind::Contains,
        })
}

fn is_better(candidate: &str, current: &str) -> bool {
    let (candidate_len, current_len) = (candidate.chars().count(), current.chars().count());
    candidate_len > current_len || (candidate_len == current_len && candidate < current)
}
