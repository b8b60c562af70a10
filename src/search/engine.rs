//! Search Engine
//!
//! Orchestrates one search: normalise and parse the query, fetch candidates
//! through the store's index (or scan when the index fails), evaluate every
//! candidate, optionally run the fuzzy pass, then merge, sort and paginate.
//!
//! The engine holds no per-call state, so one instance can serve concurrent
//! searches.

use super::evaluator::{EvalContext, Evaluation, Plan};
use super::fuzzy::{select_backend, FuzzyAugmenter, FuzzyHit, SimilarityBackend};
use super::highlight::approximate_snippet;
use super::parser::QueryParser;
use super::ranking::{merge_unique, paginate, sort_by_score};
use super::types::{ParsedQuery, SearchPage, SearchQuery, SearchResult};
use crate::config::SearchConfig;
use crate::error::{normalize_text, AppError};
use crate::indexer::build_search_text;
use crate::record::{Record, RecordKey};
use crate::schema::{FieldCatalog, Schema};
use crate::store::RecordStore;
use futures::future::join_all;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct SearchEngine {
    store: Arc<dyn RecordStore>,
    catalog: FieldCatalog,
    fuzzy: FuzzyAugmenter,
    snippet_context: usize,
}

impl SearchEngine {
    pub fn new(
        store: Arc<dyn RecordStore>,
        schema: Schema,
        similarity: Arc<dyn SimilarityBackend>,
    ) -> Self {
        Self {
            store,
            catalog: FieldCatalog::new(schema),
            fuzzy: FuzzyAugmenter::new(similarity),
            snippet_context: super::highlight::DEFAULT_CONTEXT,
        }
    }

    pub fn from_config(store: Arc<dyn RecordStore>, config: &SearchConfig) -> Self {
        let engine = Self::new(
            store,
            config.schema.clone(),
            select_backend(config.fuzzy_enabled),
        )
        .with_snippet_context(config.snippet_context);
        debug!("Similarity backend: {}", engine.fuzzy.backend_name());
        engine
    }

    pub fn with_snippet_context(mut self, context: usize) -> Self {
        self.snippet_context = context;
        self
    }

    /// Run a search and return one page of results plus the total match count.
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchPage, AppError> {
        let text = normalize_text(&query.text);
        if text.is_empty() {
            return Ok(SearchPage::empty());
        }

        let (expr, fuzzy_text) = if query.advanced {
            let parsed = QueryParser::parse(&text);
            if let Some(error) = &parsed.error {
                warn!("Query {:?} not parsed: {}", text, error);
                return Ok(SearchPage::empty());
            }
            (QueryParser::build_expr(&parsed), parsed.positive_text())
        } else {
            (QueryParser::free_text_expr(&text), text.clone())
        };

        let Some(expr) = expr else {
            debug!("Query {:?} has no terms", text);
            return Ok(SearchPage::empty());
        };
        let plan = Plan::compile(&expr);

        let fields: Vec<String> = if query.fields.is_empty() {
            self.catalog.searchable_fields().to_vec()
        } else {
            query.fields.clone()
        };

        let mut candidates = self.candidates(query.collection.as_deref(), &text).await?;
        if !query.record_types.is_empty() {
            candidates.retain(|r| query.record_types.contains(&r.record_type));
        }
        debug!(
            "Evaluating {} candidates (advanced: {})",
            candidates.len(),
            query.advanced
        );

        // Lets a caller's timeout land between the store and evaluation
        tokio::task::yield_now().await;

        let ctx = EvalContext {
            searchable: &fields,
            highlight: query.highlight,
            context: self.snippet_context,
        };
        let mut results: Vec<SearchResult> = candidates
            .iter()
            .filter_map(|record| {
                let eval = plan.evaluate(record, &ctx);
                eval.matched.then(|| self.build_result(record, eval))
            })
            .collect();

        if self.fuzzy.should_run(query.fuzzy, results.len(), query.limit) {
            let exclude: HashSet<RecordKey> = results.iter().map(SearchResult::key).collect();
            let hits = self
                .fuzzy
                .augment(&fuzzy_text, &candidates, &exclude, &fields)
                .await;
            debug!("Fuzzy pass added {} candidates", hits.len());

            let fuzzy_results = hits
                .into_iter()
                .map(|hit| self.build_fuzzy_result(&candidates[hit.index], hit, query.highlight))
                .collect();
            results = merge_unique(results, fuzzy_results);
        }

        sort_by_score(&mut results);
        let total = results.len();
        let results = paginate(results, query.offset, query.limit);
        info!(
            "Search {:?}: {} matches, returning {}",
            text,
            total,
            results.len()
        );

        Ok(SearchPage { total, results })
    }

    /// Match free-text terms against every leaf of one record, one result per
    /// matching leaf path, best first. An unknown record yields nothing.
    pub async fn search_within_record(
        &self,
        collection: &str,
        record_id: &str,
        text: &str,
    ) -> Result<Vec<SearchResult>, AppError> {
        let text = normalize_text(text);
        let Some(expr) = QueryParser::free_text_expr(&text) else {
            return Ok(Vec::new());
        };
        let Some(record) = self.store.get_record(collection, record_id).await? else {
            debug!("Record {}/{} not found", collection, record_id);
            return Ok(Vec::new());
        };

        let plan = Plan::compile(&expr);
        let ctx = EvalContext {
            searchable: &[],
            highlight: true,
            context: self.snippet_context,
        };
        let mut results = Vec::new();
        for (path, value) in record.leaf_values() {
            let eval = plan.evaluate_leaf(&path, value, &ctx);
            if eval.matched {
                results.push(self.build_result(&record, eval));
            }
        }

        sort_by_score(&mut results);
        Ok(results)
    }

    /// Parse a query for inspection without running it
    pub fn parse_query(&self, text: &str) -> ParsedQuery {
        QueryParser::parse(&normalize_text(text))
    }

    pub fn list_searchable_fields(&self) -> &[String] {
        self.catalog.searchable_fields()
    }

    /// Write the denormalized search text of every record in scope back to the
    /// store. Returns how many records were written.
    pub async fn rebuild_search_index(&self, collection: Option<&str>) -> Result<usize, AppError> {
        let records = self.scan(collection).await?;
        let fields = self.catalog.searchable_fields();

        for record in &records {
            let text = build_search_text(record, fields);
            self.store.upsert_denormalized_text(&record.id, &text).await?;
        }

        info!("Indexed {} records", records.len());
        Ok(records.len())
    }

    /// Candidates from the store index, or from a full scan if that fails
    async fn candidates(&self, collection: Option<&str>, pattern: &str) -> Result<Vec<Record>, AppError> {
        match self.store.indexed_query(collection, pattern).await {
            Ok(hits) => {
                debug!("Index returned {} candidates", hits.len());
                Ok(hits.into_iter().map(|hit| hit.record).collect())
            }
            Err(e) => {
                warn!("Indexed lookup failed, scanning records: {}", e);
                self.scan(collection).await
            }
        }
    }

    async fn scan(&self, collection: Option<&str>) -> Result<Vec<Record>, AppError> {
        if let Some(collection) = collection {
            return Ok(self.store.enumerate_records(collection).await?);
        }

        let collections = self.store.enumerate_collections().await?;
        let fetched = join_all(
            collections
                .iter()
                .map(|name| self.store.enumerate_records(name)),
        )
        .await;

        let mut records = Vec::new();
        for (name, result) in collections.iter().zip(fetched) {
            match result {
                Ok(batch) => records.extend(batch),
                Err(e) => warn!("Skipping collection {}: {}", name, e),
            }
        }
        Ok(records)
    }

    fn build_result(&self, record: &Record, eval: Evaluation) -> SearchResult {
        let mut matched_fields: Vec<String> = Vec::new();
        let mut highlights: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for hit in eval.hits {
            if !matched_fields.contains(&hit.path) {
                matched_fields.push(hit.path.clone());
            }
            if !hit.highlights.is_empty() {
                highlights.entry(hit.path).or_default().extend(hit.highlights);
            }
        }

        SearchResult {
            record_id: record.id.clone(),
            collection_id: record.collection_id.clone(),
            record_type: record.record_type.clone(),
            score: eval.score,
            highlights,
            matched_fields,
            record_summary: self.catalog.summarize(record),
        }
    }

    fn build_fuzzy_result(&self, record: &Record, hit: FuzzyHit, highlight: bool) -> SearchResult {
        let mut highlights = BTreeMap::new();
        if highlight {
            highlights.insert(
                hit.path.clone(),
                vec![approximate_snippet(&hit.value, self.snippet_context)],
            );
        }

        SearchResult {
            record_id: record.id.clone(),
            collection_id: record.collection_id.clone(),
            record_type: record.record_type.clone(),
            score: hit.score,
            highlights,
            matched_fields: vec![hit.path],
            record_summary: self.catalog.summarize(record),
        }
    }
}
