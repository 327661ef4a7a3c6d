//! The flat document representation exchanged with the backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A typed field value.
///
/// Serialized untagged, so documents read as plain JSON objects. Variant
/// order matters for deserialization: integers are tried before floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point.
    Float(f64),
    /// Full-text string.
    Text(String),
    /// Array of strings.
    TextArray(Vec<String>),
}

/// A flat document: a string id plus typed named fields.
///
/// The id is the upsert key within a collection and is not itself a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier within the collection.
    pub id: String,
    /// Named fields, ordered for deterministic serialization.
    #[serde(flatten)]
    fields: BTreeMap<String, FieldValue>,
}

impl Document {
    /// Create an empty document with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Set a text field.
    pub fn with_text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.insert(name.to_string(), FieldValue::Text(value.into()));
        self
    }

    /// Set a text-array field.
    pub fn with_text_array(mut self, name: &str, values: Vec<String>) -> Self {
        self.fields.insert(name.to_string(), FieldValue::TextArray(values));
        self
    }

    /// Set an integer field.
    pub fn with_int(mut self, name: &str, value: i64) -> Self {
        self.fields.insert(name.to_string(), FieldValue::Int(value));
        self
    }

    /// Set a float field.
    pub fn with_float(mut self, name: &str, value: f64) -> Self {
        self.fields.insert(name.to_string(), FieldValue::Float(value));
        self
    }

    /// Set a boolean field.
    pub fn with_bool(mut self, name: &str, value: bool) -> Self {
        self.fields.insert(name.to_string(), FieldValue::Bool(value));
        self
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Iterate over the fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Merge another document's fields into this one (partial update).
    pub fn merge(&mut self, other: &Document) {
        for (name, value) in other.fields() {
            self.fields.insert(name.to_string(), value.clone());
        }
    }

    /// The indexing-time relevance weight, `1.0` when absent.
    pub fn weight(&self) -> f32 {
        match self.get("weight") {
            Some(FieldValue::Float(w)) => *w as f32,
            Some(FieldValue::Int(w)) => *w as f32,
            _ => 1.0,
        }
    }

    /// Fraction of the query terms found in the document's text fields.
    ///
    /// A crude term-presence score in `[0, 1]`, sufficient to rank and to
    /// exercise the weight multiplication; a real backend substitutes its
    /// own match score here.
    pub fn text_match(&self, query: &str) -> f32 {
        let terms: Vec<String> = query
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect();
        if terms.is_empty() {
            return 0.0;
        }

        let mut haystacks: Vec<String> = Vec::new();
        for (_, value) in self.fields() {
            match value {
                FieldValue::Text(t) => haystacks.push(t.to_lowercase()),
                FieldValue::TextArray(items) => {
                    haystacks.extend(items.iter().map(|t| t.to_lowercase()));
                }
                _ => {}
            }
        }

        let matched = terms
            .iter()
            .filter(|term| haystacks.iter().any(|h| h.contains(term.as_str())))
            .count();
        matched as f32 / terms.len() as f32
    }
}
