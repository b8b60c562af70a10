//! Query, token and result types shared across the search pipeline

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use crate::record::RecordKey;
use std::collections::BTreeMap;
use thiserror::Error;

/// Kind of a lexical query token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Word,
    Phrase,
    Field,
    Operator,
    Group,
}

/// One token of a parsed query, in source order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryToken {
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub negated: bool,
    pub has_wildcards: bool,
    /// `field:"..."` values require full-value equality like phrases
    #[serde(default)]
    pub quoted: bool,
}

impl QueryToken {
    pub fn word(value: impl Into<String>) -> Self {
        Self::new(TokenKind::Word, value.into(), None)
    }

    pub fn phrase(value: impl Into<String>) -> Self {
        let mut token = Self::new(TokenKind::Phrase, value.into(), None);
        token.quoted = true;
        token
    }

    pub fn field(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(TokenKind::Field, value.into(), Some(field.into()))
    }

    pub fn operator(value: impl Into<String>) -> Self {
        Self::new(TokenKind::Operator, value.into(), None)
    }

    pub fn group(value: impl Into<String>) -> Self {
        Self::new(TokenKind::Group, value.into(), None)
    }

    fn new(kind: TokenKind, value: String, field: Option<String>) -> Self {
        let has_wildcards = matches!(kind, TokenKind::Word | TokenKind::Phrase | TokenKind::Field)
            && value.contains(|c: char| c == '*' || c == '?');
        Self {
            kind,
            value,
            field,
            negated: false,
            has_wildcards,
            quoted: false,
        }
    }

    pub fn negate(mut self) -> Self {
        self.negated = true;
        self
    }

    pub fn quoted(mut self) -> Self {
        self.quoted = true;
        self
    }

    /// Word, phrase or field token
    pub fn is_term(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Word | TokenKind::Phrase | TokenKind::Field
        )
    }
}

/// Structured parse failures, carried as data on [`ParsedQuery`]
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryParseError {
    #[error("empty query")]
    Empty,
    #[error("unterminated quote starting at position {position}")]
    UnterminatedQuote { position: usize },
}

/// Result of parsing a raw query string
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub tokens: Vec<QueryToken>,
    /// Field name -> requested values, for introspection only
    pub field_conditions: BTreeMap<String, Vec<String>>,
    pub has_wildcards: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<QueryParseError>,
}

impl ParsedQuery {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Values of the non-negated terms, joined with spaces. This is the text
    /// the fuzzy pass compares record values against.
    pub fn positive_text(&self) -> String {
        self.tokens
            .iter()
            .filter(|t| t.is_term() && !t.negated)
            .map(|t| t.value.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn default_limit() -> usize {
    20
}

fn default_true() -> bool {
    true
}

/// A search request as received from the API layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchQuery {
    /// Raw query text
    pub text: String,
    /// Restrict to one collection
    #[serde(default)]
    pub collection: Option<String>,
    /// Keep only these record types (empty = all)
    #[serde(default)]
    pub record_types: Vec<String>,
    /// Fields unscoped terms are matched against (empty = every searchable field)
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    /// Allow the approximate-match fallback pass
    #[serde(default)]
    pub fuzzy: bool,
    #[serde(default = "default_true")]
    pub highlight: bool,
    /// Parse operators, fields, phrases and groups instead of plain terms
    #[serde(default)]
    pub advanced: bool,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            collection: None,
            record_types: Vec::new(),
            fields: Vec::new(),
            limit: default_limit(),
            offset: 0,
            fuzzy: false,
            highlight: true,
            advanced: false,
        }
    }

    pub fn advanced(mut self) -> Self {
        self.advanced = true;
        self
    }

    pub fn fuzzy(mut self) -> Self {
        self.fuzzy = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn record_types(mut self, types: &[&str]) -> Self {
        self.record_types = types.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn without_highlights(mut self) -> Self {
        self.highlight = false;
        self
    }
}

/// One ranked hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub record_id: String,
    pub collection_id: String,
    pub record_type: String,
    pub score: f64,
    pub highlights: BTreeMap<String, Vec<String>>,
    pub matched_fields: Vec<String>,
    pub record_summary: BTreeMap<String, String>,
}

/// One page of results plus the pre-pagination count
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub total: usize,
    pub results: Vec<SearchResult>,
}

impl SearchResult {
    pub fn key(&self) -> RecordKey {
        (self.collection_id.clone(), self.record_id.clone())
    }
}

impl SearchPage {
    pub fn empty() -> Self {
        Self::default()
    }
}
