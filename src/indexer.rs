//! Denormalized search text for the index build

use crate::record::Record;
use crate::search::resolver::resolve_field;

/// Lowercased, whitespace-joined text of every searchable value of a record
pub fn build_search_text(record: &Record, fields: &[String]) -> String {
    let mut parts: Vec<String> = Vec::new();
    for field in fields {
        for (_, value) in resolve_field(record, field) {
            parts.extend(
                value
                    .flatten()
                    .into_iter()
                    .map(|text| text.trim().to_lowercase())
                    .filter(|text| !text.is_empty()),
            );
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_search_text() {
        let record = Record::new(
            "case-1",
            "r1",
            json!({
                "core": {"name": "John DOE", "aliases": ["JD", " "], "ssn": "123"},
                "tags": {"status": "Active"}
            }),
        );
        let fields = vec![
            "core.name".to_string(),
            "core.aliases".to_string(),
            "tags.status".to_string(),
            "core.missing".to_string(),
        ];
        assert_eq!(build_search_text(&record, &fields), "john doe jd active");
    }

    #[test]
    fn test_empty_record() {
        let record = Record::new("case-1", "r1", json!({}));
        assert_eq!(build_search_text(&record, &["core.name".to_string()]), "");
    }
}
