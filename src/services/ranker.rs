use std::collections::HashSet;

use crate::models::{Candidate, RawItem};

/// Merges the raw pool into a unique, ranked, exclusion-filtered shortlist.
///
/// The pool is walked in its original facet-iteration order and the first
/// occurrence of each normalized title wins; later duplicates are discarded
/// without comparing ratings, which keeps the result deterministic for a
/// deterministic facet order. Exclusion-set members and items with an empty
/// normalized title are dropped. The survivors are sorted by rating
/// descending with popularity as the tie-break, then truncated to `limit`.
///
/// Pure function: no I/O, deterministic, idempotent.
pub fn rank_candidates(
    pool: Vec<RawItem>,
    exclusions: &HashSet<String>,
    limit: usize,
) -> Vec<Candidate> {
    let mut seen_titles: HashSet<String> = HashSet::new();
    let mut candidates: Vec<Candidate> = Vec::new();

    for raw in pool {
        let candidate = Candidate::from_raw(raw);
        if candidate.normalized_title.is_empty() {
            continue;
        }
        if exclusions.contains(&candidate.normalized_title) {
            continue;
        }
        // First occurrence wins
        if !seen_titles.insert(candidate.normalized_title.clone()) {
            continue;
        }
        candidates.push(candidate);
    }

    candidates.sort_by(|a, b| {
        b.rating
            .total_cmp(&a.rating)
            .then(b.popularity.total_cmp(&a.popularity))
    });
    candidates.truncate(limit);

    candidates
}
