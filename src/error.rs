//! Error types and input validation for the search core

use crate::search::types::SearchQuery;
use thiserror::Error;

/// Failures reported by a record store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    #[error("Search index unavailable: {0}")]
    IndexUnavailable(String),
    #[error("Store backend failure: {0}")]
    Backend(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Application error types surfaced to callers of the engine
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code for CLI/API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "invalid_input",
            AppError::Store(StoreError::CollectionNotFound(_)) => "not_found",
            AppError::Store(_) => "store_error",
            AppError::Timeout(_) => "timeout",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Longest query text accepted at the boundary
pub const MAX_QUERY_LEN: usize = 1000;

/// Boundary validation for a search request. The engine itself assumes
/// requests have passed through here.
pub fn validate_search_query(query: &SearchQuery, max_limit: usize) -> Result<(), AppError> {
    if query.text.len() > MAX_QUERY_LEN {
        return Err(AppError::InvalidInput(format!(
            "Query too long, maximum {} characters",
            MAX_QUERY_LEN
        )));
    }

    if query.limit == 0 || query.limit > max_limit {
        return Err(AppError::InvalidInput(format!(
            "Limit must be between 1 and {}",
            max_limit
        )));
    }

    if query.fields.iter().any(|f| f.trim().is_empty()) {
        return Err(AppError::InvalidInput(
            "Field filter entries cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Normalize text using Unicode NFKC and trim surrounding whitespace
pub fn normalize_text(text: &str) -> String {
    use unicode_normalization::UnicodeNormalization;
    text.nfkc().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = StoreError::CollectionNotFound("case-7".to_string());
        assert_eq!(error.to_string(), "Collection not found: case-7");

        let error = AppError::Store(StoreError::IndexUnavailable("not built".to_string()));
        assert_eq!(
            error.to_string(),
            "Store error: Search index unavailable: not built"
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::InvalidInput("x".to_string()).error_code(),
            "invalid_input"
        );
        assert_eq!(
            AppError::Store(StoreError::CollectionNotFound("c".to_string())).error_code(),
            "not_found"
        );
        assert_eq!(
            AppError::Store(StoreError::Backend("down".to_string())).error_code(),
            "store_error"
        );
        assert_eq!(AppError::Timeout("slow".to_string()).error_code(), "timeout");
    }

    #[test]
    fn test_store_error_from_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let store_error: StoreError = json_error.into();
        assert!(matches!(store_error, StoreError::Json(_)));
    }

    #[test]
    fn test_validate_search_query() {
        let query = SearchQuery::new("john");
        assert!(validate_search_query(&query, 200).is_ok());

        let too_many = SearchQuery::new("john").limit(500);
        assert!(validate_search_query(&too_many, 200).is_err());

        let zero = SearchQuery::new("john").limit(0);
        assert!(validate_search_query(&zero, 200).is_err());

        let long = SearchQuery::new("x".repeat(MAX_QUERY_LEN + 1));
        assert!(validate_search_query(&long, 200).is_err());
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  ﬁle  "), "file");
        assert_eq!(normalize_text("\t\n"), "");
    }
}
