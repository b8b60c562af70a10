//! Declared profile schema and the searchable-field catalog

use crate::record::Record;
use crate::search::resolver::get_field_value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    /// Matched by terms without an explicit field
    #[serde(default = "default_true")]
    pub searchable: bool,
    /// Shown in `record_summary`
    #[serde(default)]
    pub summary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSchema {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub sections: Vec<SectionSchema>,
}

impl Schema {
    /// `(dotted_path, field)` for every declared field, in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (String, &FieldSchema)> {
        self.sections.iter().flat_map(|section| {
            section
                .fields
                .iter()
                .map(move |field| (format!("{}.{}", section.name, field.name), field))
        })
    }
}

impl Default for Schema {
    /// Investigator profile layout
    fn default() -> Self {
        fn field(name: &str, summary: bool) -> FieldSchema {
            FieldSchema {
                name: name.to_string(),
                searchable: true,
                summary,
            }
        }
        fn section(name: &str, fields: Vec<FieldSchema>) -> SectionSchema {
            SectionSchema {
                name: name.to_string(),
                fields,
            }
        }

        Schema {
            sections: vec![
                section(
                    "core",
                    vec![
                        field("name", true),
                        field("aliases", false),
                        field("email", true),
                        field("phone", false),
                        field("username", false),
                        field("dob", false),
                    ],
                ),
                section(
                    "location",
                    vec![
                        field("city", false),
                        field("country", false),
                        field("address", false),
                    ],
                ),
                section("social", vec![field("profiles", false)]),
                section("tags", vec![field("status", true), field("category", false)]),
                section("notes", vec![field("summary", false)]),
            ],
        }
    }
}

/// Schema plus the lazily derived field lists.
///
/// Built once with the engine and shared read-only; the derived lists are
/// computed on first use.
#[derive(Debug, Default)]
pub struct FieldCatalog {
    schema: Schema,
    searchable: OnceLock<Vec<String>>,
    summary: OnceLock<Vec<String>>,
}

impl FieldCatalog {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            searchable: OnceLock::new(),
            summary: OnceLock::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn searchable_fields(&self) -> &[String] {
        self.searchable.get_or_init(|| {
            self.schema
                .fields()
                .filter(|(_, f)| f.searchable)
                .map(|(path, _)| path)
                .collect()
        })
    }

    pub fn summary_fields(&self) -> &[String] {
        self.summary.get_or_init(|| {
            self.schema
                .fields()
                .filter(|(_, f)| f.summary)
                .map(|(path, _)| path)
                .collect()
        })
    }

    /// Summary field path -> comma-joined flattened value. Absent or empty
    /// values are left out.
    pub fn summarize(&self, record: &Record) -> BTreeMap<String, String> {
        self.summary_fields()
            .iter()
            .filter_map(|path| {
                let parts = get_field_value(record, path)?.flatten();
                (!parts.is_empty()).then(|| (path.clone(), parts.join(", ")))
            })
            .collect()
    }
}
