//! Predicate filtering for query execution
//!
//! A filter is a document of `path: value` pairs. A stored document
//! matches when every pair matches (AND). Paths may be dotted to reach
//! into embedded documents. Each comparison follows the cross-type rules
//! of `compare::matches`; there are no operators.

use bson::RawDocument;

use crate::compare;
use crate::value::{field, ValueView};

/// Evaluates filter documents against stored documents
pub struct PredicateFilter;

impl PredicateFilter {
    /// Checks if `document` matches every field of `filter`.
    ///
    /// An empty filter matches everything. A filter that cannot be parsed
    /// matches nothing.
    pub fn matches(document: &RawDocument, filter: &RawDocument) -> bool {
        for element in filter {
            let (path, expected) = match element {
                Ok(pair) => pair,
                Err(_) => return false,
            };
            let actual = match Self::resolve(document, path) {
                Some(v) => v,
                None => return false, // Missing field = no match
            };
            if !compare::matches(ValueView::from(expected), actual) {
                return false;
            }
        }
        true
    }

    /// Follows a dotted path through embedded documents.
    pub fn resolve<'a>(document: &'a RawDocument, path: &str) -> Option<ValueView<'a>> {
        let mut segments = path.split('.');
        let mut current = field(document, segments.next()?)?;
        for segment in segments {
            current = match current {
                ValueView::Document(inner) => field(inner, segment)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::rawdoc;

    #[test]
    fn test_empty_filter_matches_all() {
        let doc = rawdoc! { "a": 1 };
        assert!(PredicateFilter::matches(&doc, &rawdoc! {}));
    }

    #[test]
    fn test_numeric_fields_match_across_types() {
        let doc = rawdoc! { "qty": 42_i64, "name": "bolt" };
        assert!(PredicateFilter::matches(&doc, &rawdoc! { "qty": 42 }));
        assert!(PredicateFilter::matches(&doc, &rawdoc! { "qty": 42.0 }));
        assert!(!PredicateFilter::matches(&doc, &rawdoc! { "qty": 42.5 }));
    }

    #[test]
    fn test_and_semantics() {
        let doc = rawdoc! { "qty": 42, "name": "bolt" };
        assert!(PredicateFilter::matches(&doc, &rawdoc! { "qty": 42, "name": "bolt" }));
        assert!(!PredicateFilter::matches(&doc, &rawdoc! { "qty": 42, "name": "nut" }));
    }

    #[test]
    fn test_missing_field_never_matches() {
        let doc = rawdoc! { "qty": 42 };
        assert!(!PredicateFilter::matches(&doc, &rawdoc! { "price": 1 }));
        assert!(!PredicateFilter::matches(&doc, &rawdoc! { "price": null }));
    }

    #[test]
    fn test_string_never_matches_number() {
        let doc = rawdoc! { "qty": "42" };
        assert!(!PredicateFilter::matches(&doc, &rawdoc! { "qty": 42 }));
    }

    #[test]
    fn test_dotted_path() {
        let doc = rawdoc! { "dims": { "w": 10, "h": { "cm": 2.0 } } };
        assert!(PredicateFilter::matches(&doc, &rawdoc! { "dims.w": 10_i64 }));
        assert!(PredicateFilter::matches(&doc, &rawdoc! { "dims.h.cm": 2 }));
        assert!(!PredicateFilter::matches(&doc, &rawdoc! { "dims.w.x": 10 }));
        assert!(!PredicateFilter::matches(&doc, &rawdoc! { "dims.d": 10 }));
    }

    #[test]
    fn test_whole_embedded_document() {
        let doc = rawdoc! { "dims": { "w": 10, "h": 2 } };
        assert!(PredicateFilter::matches(&doc, &rawdoc! { "dims": { "w": 10.0, "h": 2_i64 } }));
        assert!(!PredicateFilter::matches(&doc, &rawdoc! { "dims": { "w": 10 } }));
    }
}
