//! Field value resolution over nested profile records

use crate::record::{Record, Value};

/// Walk a dotted path from the record root. Mapping steps look up keys,
/// sequence steps need a numeric index. Anything that doesn't line up is `None`.
pub fn get_field_value<'a>(record: &'a Record, dotted_path: &str) -> Option<&'a Value> {
    let mut segments = dotted_path.split('.');
    let first = segments.next().filter(|s| !s.is_empty())?;
    let root = record.profile.get(first)?;
    walk(root, segments)
}

fn walk<'a, 'p>(start: &'a Value, segments: impl Iterator<Item = &'p str>) -> Option<&'a Value> {
    let mut current = start;
    for segment in segments {
        current = match current {
            Value::Mapping(map) => map.get(segment)?,
            Value::Sequence(items) => items.get(segment.parse::<usize>().ok()?)?,
            Value::Scalar(_) => return None,
        };
    }
    Some(current)
}

/// Resolve a user-supplied field name to every `(path, value)` it may refer to.
///
/// A path that resolves from the root wins outright. Otherwise the path is
/// tried under each top-level section, so `status` finds `tags.status`.
pub fn resolve_field<'a>(record: &'a Record, field: &str) -> Vec<(String, &'a Value)> {
    if let Some(value) = get_field_value(record, field) {
        return vec![(field.to_string(), value)];
    }

    if field.is_empty() {
        return Vec::new();
    }

    record
        .profile
        .iter()
        .filter(|(_, section)| section.as_mapping().is_some())
        .filter_map(|(name, section)| {
            walk(section, field.split('.')).map(|value| (format!("{}.{}", name, field), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Scalar;
    use serde_json::json;

    fn sample() -> Record {
        Record::new(
            "case-1",
            "r1",
            json!({
                "core": {
                    "name": "John Doe",
                    "phones": ["555-0100", "555-0199"],
                    "address": {"city": "Porto"}
                },
                "tags": {"status": "active"}
            }),
        )
    }

    #[test]
    fn test_get_nested_value() {
        let record = sample();
        assert_eq!(
            get_field_value(&record, "core.address.city"),
            Some(&Value::text("Porto"))
        );
    }

    #[test]
    fn test_get_sequence_index() {
        let record = sample();
        assert_eq!(
            get_field_value(&record, "core.phones.1"),
            Some(&Value::text("555-0199"))
        );
        assert_eq!(get_field_value(&record, "core.phones.7"), None);
        assert_eq!(get_field_value(&record, "core.phones.first"), None);
    }

    #[test]
    fn test_missing_and_mismatched_paths_are_absent() {
        let record = sample();
        assert_eq!(get_field_value(&record, "core.nickname"), None);
        assert_eq!(get_field_value(&record, "core.name.first"), None);
        assert_eq!(get_field_value(&record, "nothing"), None);
        assert_eq!(get_field_value(&record, ""), None);
    }

    #[test]
    fn test_whole_section_resolves() {
        let record = sample();
        assert!(matches!(
            get_field_value(&record, "tags"),
            Some(Value::Mapping(_))
        ));
    }

    #[test]
    fn test_resolve_bare_field_under_sections() {
        let record = sample();
        let found = resolve_field(&record, "status");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "tags.status");
        assert_eq!(found[0].1, &Value::Scalar(Scalar::Text("active".to_string())));
    }

    #[test]
    fn test_resolve_full_path_first() {
        let record = sample();
        let found = resolve_field(&record, "core.name");
        assert_eq!(found, vec![("core.name".to_string(), &Value::text("John Doe"))]);
        assert!(resolve_field(&record, "missing").is_empty());
    }
}
