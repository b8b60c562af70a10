//! Profile record model
//!
//! A record is addressed by `(collection_id, id)` and carries a profile body:
//! a mapping from section name to a value tree. Values are a tagged union of
//! scalars, ordered sequences and nested mappings, and every consumer that
//! needs text goes through the single recursive [`Value::flatten`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Leaf value of a profile field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// String form used for matching. `Null` has none.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Scalar::Null => None,
            Scalar::Bool(b) => Some(b.to_string()),
            Scalar::Integer(i) => Some(i.to_string()),
            Scalar::Float(f) => Some(f.to_string()),
            Scalar::Text(s) => Some(s.clone()),
        }
    }
}

/// Any field value: scalar, sequence or mapping, nested to any depth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(Scalar),
    Sequence(Vec<Value>),
    Mapping(BTreeMap<String, Value>),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Scalar(Scalar::Text(s.into()))
    }

    /// Flatten to the string forms of every scalar leaf, in document order.
    pub fn flatten(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(&self, out: &mut Vec<String>) {
        match self {
            Value::Scalar(scalar) => {
                if let Some(text) = scalar.as_text() {
                    out.push(text);
                }
            }
            Value::Sequence(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
            Value::Mapping(map) => {
                for value in map.values() {
                    value.flatten_into(out);
                }
            }
        }
    }

    /// Collect `(dotted_path, scalar)` for every leaf below `prefix`.
    /// Sequence elements get their index as a path segment. Keys containing
    /// `.` are joined as-is, so such paths are not walkable by dotted lookup.
    pub fn leaf_values_into<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a Value)>) {
        match self {
            Value::Scalar(_) => out.push((prefix.to_string(), self)),
            Value::Sequence(items) => {
                for (i, item) in items.iter().enumerate() {
                    item.leaf_values_into(&join_path(prefix, &i.to_string()), out);
                }
            }
            Value::Mapping(map) => {
                for (key, value) in map {
                    value.leaf_values_into(&join_path(prefix, key), out);
                }
            }
        }
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }
}

fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", prefix, segment)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Scalar(Scalar::Null),
            serde_json::Value::Bool(b) => Value::Scalar(Scalar::Bool(b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Scalar(Scalar::Integer(i)),
                None => Value::Scalar(Scalar::Float(n.as_f64().unwrap_or_default())),
            },
            serde_json::Value::String(s) => Value::Scalar(Scalar::Text(s)),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Mapping(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

fn default_record_type() -> String {
    "profile".to_string()
}

/// A profile document held by the external record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    /// Filled in by the store when the record is enumerated
    #[serde(default)]
    pub collection_id: String,
    #[serde(default = "default_record_type")]
    pub record_type: String,
    /// Section name -> section body
    #[serde(default)]
    pub profile: BTreeMap<String, Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// `(collection_id, id)`: a record id is only unique within its collection
pub type RecordKey = (String, String);

impl Record {
    /// Build a record from a JSON profile body. Non-object bodies yield an empty profile.
    pub fn new(
        collection_id: impl Into<String>,
        id: impl Into<String>,
        profile: serde_json::Value,
    ) -> Self {
        let profile = match Value::from(profile) {
            Value::Mapping(map) => map,
            _ => BTreeMap::new(),
        };

        Self {
            id: id.into(),
            collection_id: collection_id.into(),
            record_type: default_record_type(),
            profile,
            created_at: None,
        }
    }

    pub fn key(&self) -> RecordKey {
        (self.collection_id.clone(), self.id.clone())
    }

    pub fn with_type(mut self, record_type: impl Into<String>) -> Self {
        self.record_type = record_type.into();
        self
    }

    /// Every scalar leaf of the profile with its dotted path
    pub fn leaf_values(&self) -> Vec<(String, &Value)> {
        let mut out = Vec::new();
        for (section, value) in &self.profile {
            value.leaf_values_into(section, &mut out);
        }
        out
    }

    /// Text form of every non-null leaf with its dotted path
    pub fn leaves(&self) -> Vec<(String, String)> {
        self.leaf_values()
            .into_iter()
            .filter_map(|(path, value)| match value {
                Value::Scalar(scalar) => scalar.as_text().map(|text| (path, text)),
                _ => None,
            })
            .collect()
    }
}
