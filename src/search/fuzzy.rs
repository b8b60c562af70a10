//! Fuzzy augmentation
//!
//! Optional approximate-similarity second pass. The similarity backend is a
//! trait object chosen once when the engine is built; [`NullSimilarity`]
//! stands in when fuzzy matching is disabled and makes the pass a no-op.

use super::highlight::fold;
use super::ranking::FuzzyPolicy;
use super::resolver::resolve_field;
use crate::record::{Record, RecordKey};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Source of normalized string similarity in [0, 1]
#[async_trait]
pub trait SimilarityBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_available(&self) -> bool;

    /// Similarity between two strings, or `None` if it can't be computed
    async fn similarity(&self, a: &str, b: &str) -> Option<f64>;
}

/// Normalized Levenshtein similarity over case-folded NFC text
#[derive(Debug, Default, Clone, Copy)]
pub struct StrsimSimilarity;

impl StrsimSimilarity {
    fn normalize(text: &str) -> String {
        fold(&text.nfc().collect::<String>())
    }
}

#[async_trait]
impl SimilarityBackend for StrsimSimilarity {
    fn name(&self) -> &'static str {
        "strsim"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn similarity(&self, a: &str, b: &str) -> Option<f64> {
        let a = Self::normalize(a);
        let b = Self::normalize(b);
        if a.is_empty() || b.is_empty() {
            return None;
        }
        Some(strsim::normalized_levenshtein(&a, &b))
    }
}

/// Backend that is never available
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSimilarity;

#[async_trait]
impl SimilarityBackend for NullSimilarity {
    fn name(&self) -> &'static str {
        "none"
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn similarity(&self, _a: &str, _b: &str) -> Option<f64> {
        None
    }
}

/// Pick the backend for the lifetime of the process
pub fn select_backend(enabled: bool) -> Arc<dyn SimilarityBackend> {
    if enabled {
        Arc::new(StrsimSimilarity)
    } else {
        Arc::new(NullSimilarity)
    }
}

/// A record accepted by the fuzzy pass
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyHit {
    /// Index into the candidate slice
    pub index: usize,
    /// Penalised score
    pub score: f64,
    /// Field path of the best-matching value
    pub path: String,
    pub value: String,
}

/// Runs the fuzzy pass over records the primary pass didn't return
pub struct FuzzyAugmenter {
    backend: Arc<dyn SimilarityBackend>,
    policy: FuzzyPolicy,
}

impl FuzzyAugmenter {
    pub fn new(backend: Arc<dyn SimilarityBackend>) -> Self {
        Self {
            backend,
            policy: FuzzyPolicy::default(),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Fuzzy runs only when asked for, when the primary pass didn't fill a
    /// page, and when a backend is actually there.
    pub fn should_run(&self, requested: bool, primary_len: usize, limit: usize) -> bool {
        requested && primary_len < limit && self.backend.is_available()
    }

    /// Score every candidate not in `exclude` against `query_text`.
    ///
    /// Each searchable value is compared whole and word by word; the best
    /// similarity of the record is run through the acceptance policy.
    pub async fn augment(
        &self,
        query_text: &str,
        candidates: &[Record],
        exclude: &HashSet<RecordKey>,
        fields: &[String],
    ) -> Vec<FuzzyHit> {
        let query_text = query_text.trim();
        if query_text.is_empty() || !self.backend.is_available() {
            return Vec::new();
        }

        let mut hits = Vec::new();
        for (index, record) in candidates.iter().enumerate() {
            if exclude.contains(&record.key()) {
                continue;
            }

            let mut best: Option<(f64, String, String)> = None;
            for field in fields {
                for (path, value) in resolve_field(record, field) {
                    for text in value.flatten() {
                        let Some(similarity) = self.best_similarity(query_text, &text).await else {
                            continue;
                        };
                        if best.as_ref().is_none_or(|(s, _, _)| similarity > *s) {
                            best = Some((similarity, path.clone(), text));
                        }
                    }
                }
            }

            if let Some((similarity, path, value)) = best {
                if let Some(score) = self.policy.score(similarity) {
                    tracing::debug!(
                        "Fuzzy hit {} via {} (similarity {:.3})",
                        record.id,
                        path,
                        similarity
                    );
                    hits.push(FuzzyHit {
                        index,
                        score,
                        path,
                        value,
                    });
                }
            }
        }

        hits
    }

    async fn best_similarity(&self, query: &str, text: &str) -> Option<f64> {
        let mut best = self.backend.similarity(query, text).await;
        for word in text.unicode_words() {
            if word == text {
                continue;
            }
            if let Some(s) = self.backend.similarity(query, word).await {
                best = Some(best.map_or(s, |b| b.max(s)));
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields() -> Vec<String> {
        vec!["core.name".to_string(), "core.email".to_string()]
    }

    fn people() -> Vec<Record> {
        vec![
            Record::new("case-1", "smyth", json!({"core": {"name": "Jon Smyth"}})),
            Record::new("case-1", "other", json!({"core": {"name": "Zelda Quux"}})),
            Record::new("case-1", "exact", json!({"core": {"name": "John Smith"}})),
        ]
    }

    #[tokio::test]
    async fn test_strsim_similarity() {
        let backend = StrsimSimilarity;
        assert_eq!(backend.similarity("John", "john").await, Some(1.0));
        let s = backend.similarity("john", "jon").await.unwrap();
        assert!((s - 0.75).abs() < 1e-9);
        assert_eq!(backend.similarity("", "john").await, None);
    }

    #[tokio::test]
    async fn test_null_backend_is_unavailable() {
        let backend = NullSimilarity;
        assert!(!backend.is_available());
        assert_eq!(backend.similarity("a", "a").await, None);

        let augmenter = FuzzyAugmenter::new(Arc::new(NullSimilarity));
        assert!(!augmenter.should_run(true, 0, 20));
        let hits = augmenter
            .augment("john", &people(), &HashSet::new(), &fields())
            .await;
        assert!(hits.is_empty());
    }

    #[test]
    fn test_should_run_conditions() {
        let augmenter = FuzzyAugmenter::new(select_backend(true));
        assert!(augmenter.should_run(true, 3, 20));
        assert!(!augmenter.should_run(false, 3, 20));
        assert!(!augmenter.should_run(true, 20, 20));
        assert_eq!(augmenter.backend_name(), "strsim");
        assert_eq!(select_backend(false).name(), "none");
    }

    #[tokio::test]
    async fn test_augment_finds_near_miss() {
        let augmenter = FuzzyAugmenter::new(select_backend(true));
        let hits = augmenter
            .augment("john", &people(), &HashSet::new(), &fields())
            .await;

        let ids: Vec<usize> = hits.iter().map(|h| h.index).collect();
        // "Jon" is 0.75 similar, "John" is exact; Zelda is rejected
        assert_eq!(ids, vec![0, 2]);
        assert!((hits[0].score - 0.6).abs() < 1e-9);
        assert!((hits[1].score - 0.8).abs() < 1e-9);
        assert_eq!(hits[1].path, "core.name");
        for hit in &hits {
            assert!(hit.score >= 0.6 && hit.score <= 0.8);
        }
    }

    #[tokio::test]
    async fn test_augment_skips_excluded_records() {
        let augmenter = FuzzyAugmenter::new(select_backend(true));
        let exclude: HashSet<RecordKey> = [("case-1".to_string(), "exact".to_string())]
            .into_iter()
            .collect();
        let hits = augmenter.augment("john", &people(), &exclude, &fields()).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].index, 0);

        // Same id in another collection is a different record
        let exclude: HashSet<RecordKey> = [("case-2".to_string(), "exact".to_string())]
            .into_iter()
            .collect();
        let hits = augmenter.augment("john", &people(), &exclude, &fields()).await;
        assert_eq!(hits.len(), 2);
    }
}
