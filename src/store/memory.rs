//! In-memory record store
//!
//! Collections live in a `BTreeMap` so enumeration order is stable. The
//! "index" is the denormalized text table written by the index build; until a
//! record in scope has an entry there, `indexed_query` reports the index as
//! unavailable.

use super::{IndexHit, RecordStore};
use crate::error::StoreError;
use crate::record::Record;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tokio::sync::RwLock;

/// On-disk layout: `{"collections": {"<name>": [record, ...]}}`
#[derive(Debug, Deserialize)]
struct StoreFile {
    #[serde(default)]
    collections: BTreeMap<String, Vec<Record>>,
}

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<String, Vec<Record>>>,
    search_text: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_collections(collections: BTreeMap<String, Vec<Record>>) -> Self {
        let collections = collections
            .into_iter()
            .map(|(name, records)| {
                let records = records
                    .into_iter()
                    .map(|mut record| {
                        record.collection_id = name.clone();
                        record
                    })
                    .collect();
                (name, records)
            })
            .collect();

        Self {
            collections: RwLock::new(collections),
            search_text: RwLock::new(HashMap::new()),
        }
    }

    /// Load a JSON store file
    pub fn load_json(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)?;
        let file: StoreFile = serde_json::from_str(&content)?;
        tracing::debug!(
            "Loaded {} collections from {}",
            file.collections.len(),
            path.display()
        );
        Ok(Self::from_collections(file.collections))
    }

    /// Add a record, creating its collection if needed
    pub async fn insert(&self, collection: &str, mut record: Record) {
        record.collection_id = collection.to_string();
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(record);
    }

    /// Denormalized text previously written for a record
    pub async fn search_text(&self, record_id: &str) -> Option<String> {
        self.search_text.read().await.get(record_id).cloned()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn enumerate_collections(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.collections.read().await.keys().cloned().collect())
    }

    async fn enumerate_records(&self, collection: &str) -> Result<Vec<Record>, StoreError> {
        self.collections
            .read()
            .await
            .get(collection)
            .cloned()
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))
    }

    async fn get_record(&self, collection: &str, id: &str) -> Result<Option<Record>, StoreError> {
        let collections = self.collections.read().await;
        let records = collections
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    /// Every record in scope, in enumeration order, scored by the share of
    /// pattern words found in its indexed text. Scope with no indexed record
    /// at all, or with records indexed only partially, is unavailable.
    async fn indexed_query(
        &self,
        collection: Option<&str>,
        pattern: &str,
    ) -> Result<Vec<IndexHit>, StoreError> {
        let collections = self.collections.read().await;
        let search_text = self.search_text.read().await;

        let scoped: Vec<&Record> = match collection {
            Some(name) => collections
                .get(name)
                .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))?
                .iter()
                .collect(),
            None => collections.values().flatten().collect(),
        };

        let indexed = scoped
            .iter()
            .filter(|r| search_text.contains_key(&r.id))
            .count();
        if indexed == 0 || indexed < scoped.len() {
            return Err(StoreError::IndexUnavailable(format!(
                "{} of {} records indexed",
                indexed,
                scoped.len()
            )));
        }

        let words: Vec<String> = pattern
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();

        Ok(scoped
            .into_iter()
            .map(|record| {
                let text = search_text.get(&record.id).map(String::as_str).unwrap_or("");
                let found = words.iter().filter(|w| text.contains(w.as_str())).count();
                let score = if words.is_empty() {
                    0.0
                } else {
                    found as f64 / words.len() as f64
                };
                IndexHit {
                    record_id: record.id.clone(),
                    collection_id: record.collection_id.clone(),
                    score,
                    record: record.clone(),
                }
            })
            .collect())
    }

    async fn upsert_denormalized_text(&self, record_id: &str, text: &str) -> Result<(), StoreError> {
        self.search_text
            .write()
            .await
            .insert(record_id.to_string(), text.to_string());
        Ok(())
    }
}
