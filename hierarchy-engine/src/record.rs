//! FILENAME: hierarchy-engine/src/record.rs
//! Field access over externally supplied records.
//!
//! Dimension rows and fact rows arrive already materialized, in whatever shape
//! the data source produced. The engine only needs "give me field X as text",
//! so everything upstream is reached through `FieldAccess`.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Read access to named fields of a record, rendered as text.
pub trait FieldAccess {
    /// Returns the field's text, or `None` when absent or null.
    fn field(&self, name: &str) -> Option<Cow<'_, str>>;
}

/// Renders a JSON scalar the way a correlated identifier is compared.
fn json_scalar_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
        // Nested values never carry an identifier.
        Value::Array(_) | Value::Object(_) => None,
    }
}

impl FieldAccess for Map<String, Value> {
    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).and_then(json_scalar_text)
    }
}

impl FieldAccess for Value {
    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match self {
            Value::Object(map) => map.field(name),
            _ => None,
        }
    }
}

impl<S: BuildHasher> FieldAccess for HashMap<String, String, S> {
    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|s| Cow::Borrowed(s.as_str()))
    }
}

impl FieldAccess for BTreeMap<String, String> {
    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|s| Cow::Borrowed(s.as_str()))
    }
}

impl<T: FieldAccess + ?Sized> FieldAccess for &T {
    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        (**self).field(name)
    }
}

// ============================================================================
// NORMALIZED DIMENSION RECORD
// ============================================================================

/// A dimension row reduced to the three things the builder reads.
/// Kept on the hierarchy as its `flat_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionRecord {
    pub path: String,
    pub leaf_id: String,
    pub leaf_label: Option<String>,
}

impl DimensionRecord {
    pub fn new(path: impl Into<String>, leaf_id: impl Into<String>) -> Self {
        DimensionRecord {
            path: path.into(),
            leaf_id: leaf_id.into(),
            leaf_label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.leaf_label = Some(label.into());
        self
    }
}
