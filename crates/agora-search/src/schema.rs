//! Document kinds and collection schemas.
//!
//! Each indexable record maps to exactly one collection, named by its
//! [`DocumentKind`]. The schema of a collection is a flat list of typed
//! fields; the backend validates imported documents against it.

use agora_core::{Error, Result};

use crate::document::{Document, FieldValue};

/// The closed set of document kinds the engine indexes.
///
/// The collection names are part of the on-disk/wire contract with the
/// backend and must not change without a full reindex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// Forum topic.
    Topic,
    /// Forum post.
    Post,
    /// Top-level published content.
    PublishedContent,
    /// Synthetic chapter page derived from a published content section.
    Chapter,
}

impl DocumentKind {
    /// All kinds, in the order collections are created and queried.
    pub fn all() -> [DocumentKind; 4] {
        [
            DocumentKind::Topic,
            DocumentKind::Post,
            DocumentKind::PublishedContent,
            DocumentKind::Chapter,
        ]
    }

    /// Collection name in the backend.
    pub fn collection_name(self) -> &'static str {
        match self {
            DocumentKind::Topic => "topic",
            DocumentKind::Post => "post",
            DocumentKind::PublishedContent => "publishedcontent",
            DocumentKind::Chapter => "chapter",
        }
    }

    /// Reverse lookup from a collection name.
    pub fn from_collection(name: &str) -> Option<DocumentKind> {
        DocumentKind::all()
            .into_iter()
            .find(|kind| kind.collection_name() == name)
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.collection_name())
    }
}

/// Value type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Boolean flag.
    Bool,
    /// Signed integer (primary keys, positions, timestamps).
    Int,
    /// Floating point (the `weight` field).
    Float,
    /// Full-text string.
    Text,
    /// Array of strings (tags, categories).
    TextArray,
}

impl FieldKind {
    fn accepts(self, value: &FieldValue) -> bool {
        matches!(
            (self, value),
            (FieldKind::Bool, FieldValue::Bool(_))
                | (FieldKind::Int, FieldValue::Int(_))
                | (FieldKind::Float, FieldValue::Float(_))
                | (FieldKind::Text, FieldValue::Text(_))
                | (FieldKind::TextArray, FieldValue::TextArray(_))
        )
    }
}

/// One declared field of a collection.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    /// Field name.
    pub name: &'static str,
    /// Value type.
    pub kind: FieldKind,
}

impl FieldDef {
    /// Declare a field.
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// Schema of one collection.
#[derive(Debug, Clone)]
pub struct CollectionSchema {
    /// Owning document kind; also names the collection.
    pub kind: DocumentKind,
    /// Declared fields. The document id is not a field.
    pub fields: Vec<FieldDef>,
}

impl CollectionSchema {
    /// Build a schema for a kind.
    pub fn new(kind: DocumentKind, fields: Vec<FieldDef>) -> Self {
        Self { kind, fields }
    }

    /// Collection name in the backend.
    pub fn collection_name(&self) -> &'static str {
        self.kind.collection_name()
    }

    fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check a document against this schema.
    ///
    /// Every document field must be declared with a matching type. Missing
    /// declared fields are allowed (partial updates carry only a subset).
    pub fn validate_document(&self, document: &Document) -> Result<()> {
        for (name, value) in document.fields() {
            let Some(def) = self.field(name) else {
                return Err(Error::operation(format!(
                    "collection '{}': unknown field '{}'",
                    self.collection_name(),
                    name
                )));
            };
            if !def.kind.accepts(value) {
                return Err(Error::operation(format!(
                    "collection '{}': field '{}' has wrong type",
                    self.collection_name(),
                    name
                )));
            }
        }
        Ok(())
    }
}
