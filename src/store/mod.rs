//! Record store collaborator
//!
//! The engine never owns records: it reads them through [`RecordStore`], which
//! a real deployment backs with its document database. [`MemoryStore`] is the
//! in-process implementation used by the CLI and the tests.

mod memory;

pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::record::Record;
use async_trait::async_trait;

/// One candidate returned by the store's own index
#[derive(Debug, Clone)]
pub struct IndexHit {
    pub record_id: String,
    pub collection_id: String,
    /// Backend relevance hint; the evaluator's score is authoritative
    pub score: f64,
    pub record: Record,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn enumerate_collections(&self) -> Result<Vec<String>, StoreError>;

    async fn enumerate_records(&self, collection: &str) -> Result<Vec<Record>, StoreError>;

    async fn get_record(&self, collection: &str, id: &str) -> Result<Option<Record>, StoreError>;

    /// Candidate lookup through the backend index. Any error here makes the
    /// engine fall back to a full scan.
    async fn indexed_query(
        &self,
        collection: Option<&str>,
        pattern: &str,
    ) -> Result<Vec<IndexHit>, StoreError>;

    /// Write the denormalized searchable text of one record
    async fn upsert_denormalized_text(&self, record_id: &str, text: &str) -> Result<(), StoreError>;
}
