//! Backend filter expressions.
//!
//! A [`SearchFilter`] is a conjunction of clauses over document fields,
//! built by the caller (visibility restrictions, category scoping,
//! exclusion lists) and pushed down to the backend with the query. The
//! textual form follows the backend's filter syntax:
//!
//! ```text
//! (forum_pk:=[1,2]) && (is_visible:true) && (content_pk:!=[7,9])
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::{Document, FieldValue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Clause {
    /// Field value (or one of its array elements) is one of the given values.
    ExactIn { field: String, values: Vec<String> },
    /// Boolean field equals the given value.
    Boolean { field: String, value: bool },
    /// Numeric field is none of the given values.
    NotIn { field: String, values: Vec<i64> },
}

/// A conjunction of field clauses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    clauses: Vec<Clause>,
}

impl SearchFilter {
    /// Empty filter; matches every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no clause has been added.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Require `field` to be (or contain) one of `values`.
    pub fn exact_in<S: ToString>(mut self, field: &str, values: &[S]) -> Self {
        self.clauses.push(Clause::ExactIn {
            field: field.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        });
        self
    }

    /// Require a boolean `field` to equal `value`.
    pub fn boolean(mut self, field: &str, value: bool) -> Self {
        self.clauses.push(Clause::Boolean {
            field: field.to_string(),
            value,
        });
        self
    }

    /// Require a numeric `field` to be none of `values`.
    pub fn not_in(mut self, field: &str, values: &[i64]) -> Self {
        self.clauses.push(Clause::NotIn {
            field: field.to_string(),
            values: values.to_vec(),
        });
        self
    }

    /// Evaluate the filter against a document.
    ///
    /// Absent fields fail equality clauses and pass exclusion clauses.
    pub fn matches(&self, document: &Document) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::ExactIn { field, values } => match document.get(field) {
                Some(FieldValue::Text(t)) => values.contains(t),
                Some(FieldValue::TextArray(items)) => {
                    items.iter().any(|item| values.contains(item))
                }
                Some(FieldValue::Int(i)) => values.contains(&i.to_string()),
                _ => false,
            },
            Clause::Boolean { field, value } => {
                matches!(document.get(field), Some(FieldValue::Bool(b)) if b == value)
            }
            Clause::NotIn { field, values } => match document.get(field) {
                Some(FieldValue::Int(i)) => !values.contains(i),
                _ => true,
            },
        })
    }
}

impl fmt::Display for SearchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" && ")?;
            }
            match clause {
                Clause::ExactIn { field, values } => {
                    write!(f, "({field}:=[{}])", values.join(","))?;
                }
                Clause::Boolean { field, value } => {
                    write!(f, "({field}:{value})")?;
                }
                Clause::NotIn { field, values } => {
                    let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                    write!(f, "({field}:!=[{}])", values.join(","))?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_syntax() {
        let filter = SearchFilter::new()
            .exact_in("forum_pk", &[1, 2])
            .boolean("is_visible", true)
            .not_in("content_pk", &[7, 9]);
        assert_eq!(
            filter.to_string(),
            "(forum_pk:=[1,2]) && (is_visible:true) && (content_pk:!=[7,9])"
        );
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let doc = Document::new("1");
        assert!(SearchFilter::new().matches(&doc));
    }

    #[test]
    fn test_exact_in_on_scalar_and_array() {
        let doc = Document::new("1")
            .with_int("forum_pk", 2)
            .with_text_array("categories", vec!["programming".to_string()]);

        assert!(SearchFilter::new().exact_in("forum_pk", &[1, 2]).matches(&doc));
        assert!(!SearchFilter::new().exact_in("forum_pk", &[3]).matches(&doc));
        assert!(SearchFilter::new()
            .exact_in("categories", &["programming"])
            .matches(&doc));
    }

    #[test]
    fn test_boolean_requires_presence() {
        let doc = Document::new("1").with_bool("is_visible", true);
        assert!(SearchFilter::new().boolean("is_visible", true).matches(&doc));
        assert!(!SearchFilter::new().boolean("is_visible", false).matches(&doc));
        // Absent boolean field fails the clause.
        assert!(!SearchFilter::new().boolean("is_solved", true).matches(&doc));
    }

    #[test]
    fn test_not_in_passes_on_absent_field() {
        let doc = Document::new("1").with_int("content_pk", 7);
        assert!(!SearchFilter::new().not_in("content_pk", &[7]).matches(&doc));
        assert!(SearchFilter::new().not_in("content_pk", &[8]).matches(&doc));
        assert!(SearchFilter::new().not_in("parent_pk", &[7]).matches(&doc));
    }

    #[test]
    fn test_clauses_conjoin() {
        let doc = Document::new("1").with_int("forum_pk", 2).with_bool("is_visible", true);
        let filter = SearchFilter::new()
            .exact_in("forum_pk", &[2])
            .boolean("is_visible", false);
        assert!(!filter.matches(&doc));
    }
}
