//! Free-text name relevance.

use super::normalize::normalize;
use crate::model::Record;

pub const SCORE_EXACT: i32 = 1000;
pub const SCORE_PREFIX: i32 = 800;
pub const SCORE_SUBSTRING: i32 = 600;
pub const SCORE_TOKEN_BASE: i32 = 400;
pub const SCORE_PER_TOKEN: i32 = 25;

/// Relevance of `name` for `query`; negative means "exclude".
///
/// Both sides are case and whitespace folded, nothing more: punctuation is
/// significant, so "autodesk" is a prefix of "Autodesk, Inc." but "autodesk inc"
/// is not.
pub fn score_name(name: &str, query: &str) -> i32 {
    let query = normalize(query);
    if query.is_empty() {
        return 0;
    }
    let name = normalize(name);
    if name.is_empty() {
        return -1;
    }
    if name == query {
        return SCORE_EXACT;
    }
    if name.starts_with(&query) {
        return SCORE_PREFIX;
    }
    if name.contains(&query) {
        return SCORE_SUBSTRING;
    }
    let hits = query
        .split(' ')
        .filter(|token| name.contains(token))
        .count() as i32;
    if hits == 0 {
        -1
    } else {
        SCORE_TOKEN_BASE + SCORE_PER_TOKEN * hits
    }
}

/// Reorders candidates by descending name relevance, dropping non-matches.
///
/// The sort is stable, so ties keep their input order and an empty query
/// returns the input unchanged.
pub fn rank_by_name<'a, R: Record>(candidates: Vec<&'a R>, query: &str) -> Vec<&'a R> {
    if normalize(query).is_empty() {
        return candidates;
    }
    let before = candidates.len();
    let mut scored: Vec<(i32, &R)> = candidates
        .into_iter()
        .map(|r| (score_name(r.display_name(), query), r))
        .filter(|(score, _)| *score >= 0)
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    tracing::debug!(query, candidates = before, kept = scored.len(), "rank_complete");
    scored.into_iter().map(|(_, r)| r).collect()
}
