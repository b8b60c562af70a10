//! casefile: search over semi-structured profile records
//!
//! Free text, `field:value` terms, quoted phrases, `AND`/`OR`/`NOT` with
//! grouping, and `*`/`?` wildcards, evaluated against records read from a
//! [`store::RecordStore`]. Results are ranked, paginated and highlighted, with
//! an optional fuzzy pass for near misses.

pub mod config;
pub mod error;
pub mod indexer;
pub mod record;
pub mod schema;
pub mod search;
pub mod store;

pub use config::SearchConfig;
pub use error::{AppError, StoreError};
pub use record::{Record, Scalar, Value};
pub use search::{SearchEngine, SearchPage, SearchQuery, SearchResult};
pub use store::{MemoryStore, RecordStore};
