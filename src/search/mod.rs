//! Query parsing and evaluation over profile records
//!
//! Pipeline: `parser` turns text into an expression tree, `evaluator` runs it
//! per record using `resolver` and `matcher`, `fuzzy` adds approximate hits,
//! and `engine` ties it together with `ranking` for sort and pagination.

pub mod engine;
pub mod evaluator;
pub mod fuzzy;
pub mod highlight;
pub mod matcher;
pub mod parser;
pub mod ranking;
pub mod resolver;
pub mod types;


pub use engine::SearchEngine;
pub use fuzzy::{NullSimilarity, SimilarityBackend, StrsimSimilarity};
pub use parser::{Expr, QueryParser};
pub use types::{ParsedQuery, QueryToken, SearchPage, SearchQuery, SearchResult};
