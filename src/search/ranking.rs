//! Ranking & Scoring
//!
//! Score constants for the value matcher, the fuzzy acceptance policy, and the
//! result-set operations of the orchestrator: merge with dedup, stable sort
//! and pagination.

use super::types::SearchResult;
use crate::record::RecordKey;
use std::collections::HashSet;

/// Value equals the pattern (case-insensitive)
pub const EXACT_SCORE: f64 = 1.0;
/// Value starts with the pattern
pub const PREFIX_SCORE: f64 = 0.9;
/// Pattern occurs elsewhere in the value
pub const SUBSTRING_SCORE: f64 = 0.7;
/// Any wildcard match
pub const WILDCARD_SCORE: f64 = 0.8;

/// Acceptance rules for approximate matches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyPolicy {
    /// Minimum raw similarity
    pub accept_threshold: f64,
    /// Multiplier marking fuzzy provenance
    pub penalty: f64,
    /// Minimum score after the penalty
    pub min_score: f64,
}

impl Default for FuzzyPolicy {
    fn default() -> Self {
        Self {
            accept_threshold: 0.7,
            penalty: 0.8,
            min_score: 0.6,
        }
    }
}

impl FuzzyPolicy {
    /// Penalised score for a raw similarity, or `None` when it is rejected
    pub fn score(&self, similarity: f64) -> Option<f64> {
        if !similarity.is_finite() || similarity < self.accept_threshold {
            return None;
        }
        let score = similarity.min(1.0) * self.penalty;
        (score >= self.min_score).then_some(score)
    }
}

/// Append `secondary` to `primary`, keeping only the first result per
/// `(collection_id, record_id)`. Primary entries always win over later duplicates.
pub fn merge_unique(primary: Vec<SearchResult>, secondary: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut seen: HashSet<RecordKey> = HashSet::new();
    primary
        .into_iter()
        .chain(secondary)
        .filter(|result| seen.insert(result.key()))
        .collect()
}

/// Sort by score, highest first. Ties keep their enumeration order.
pub fn sort_by_score(results: &mut [SearchResult]) {
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// Slice one page out of a fully materialised result list
pub fn paginate<T>(items: Vec<T>, offset: usize, limit: usize) -> Vec<T> {
    items.into_iter().skip(offset).take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn result(id: &str, score: f64) -> SearchResult {
        SearchResult {
            record_id: id.to_string(),
            collection_id: "case-1".to_string(),
            record_type: "profile".to_string(),
            score,
            highlights: BTreeMap::new(),
            matched_fields: Vec::new(),
            record_summary: BTreeMap::new(),
        }
    }

    #[test]
    fn test_score_ordering_of_match_kinds() {
        assert!(EXACT_SCORE > PREFIX_SCORE);
        assert!(PREFIX_SCORE > WILDCARD_SCORE);
        assert!(WILDCARD_SCORE > SUBSTRING_SCORE);
        assert!(SUBSTRING_SCORE > 0.0);
    }

    #[test]
    fn test_fuzzy_policy() {
        let policy = FuzzyPolicy::default();

        // Below the raw threshold
        assert_eq!(policy.score(0.65), None);
        // Accepted raw, but 0.72 * 0.8 = 0.576 < 0.6
        assert_eq!(policy.score(0.72), None);
        // 0.75 * 0.8 = 0.6 is kept
        let kept = policy.score(0.75).unwrap();
        assert!((kept - 0.6).abs() < 1e-9);
        let perfect = policy.score(1.0).unwrap();
        assert!((perfect - 0.8).abs() < 1e-9);
        assert_eq!(policy.score(f64::NAN), None);
    }

    #[test]
    fn test_merge_keeps_primary_duplicate() {
        let primary = vec![result("a", 0.7), result("b", 0.9)];
        let fuzzy = vec![result("a", 0.8), result("c", 0.64)];

        let merged = merge_unique(primary, fuzzy);
        let ids: Vec<&str> = merged.iter().map(|r| r.record_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(merged[0].score, 0.7);
    }

    #[test]
    fn test_merge_keys_on_collection_and_id() {
        let mut other = result("a", 0.64);
        other.collection_id = "case-2".to_string();

        let merged = merge_unique(vec![result("a", 0.7)], vec![other, result("a", 0.6)]);
        let keys: Vec<(&str, &str)> = merged
            .iter()
            .map(|r| (r.collection_id.as_str(), r.record_id.as_str()))
            .collect();
        assert_eq!(keys, vec![("case-1", "a"), ("case-2", "a")]);
    }

    #[test]
    fn test_sort_is_stable_on_ties() {
        let mut results = vec![
            result("first", 0.7),
            result("top", 1.0),
            result("second", 0.7),
            result("third", 0.7),
        ];
        sort_by_score(&mut results);
        let ids: Vec<&str> = results.iter().map(|r| r.record_id.as_str()).collect();
        assert_eq!(ids, vec!["top", "first", "second", "third"]);
    }

    #[test]
    fn test_paginate_tail_page() {
        let items: Vec<usize> = (0..37).collect();
        let page = paginate(items.clone(), 30, 10);
        assert_eq!(page, vec![30, 31, 32, 33, 34, 35, 36]);

        assert!(paginate(items.clone(), 37, 10).is_empty());
        assert!(paginate(items, 50, 10).is_empty());
    }
}
