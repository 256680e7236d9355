//! Cross-type matcher
//!
//! Equality between a filter value and a document value. Values of
//! different type families never match: `"42"` does not match `42`,
//! `true` does not match `1`, and `[1, 2, 3]` does not match `123`.

use std::collections::HashSet;

use bson::raw::{RawArray, RawDocument};

use super::numeric::compare_numeric;
use crate::value::ValueView;

/// Decides whether `document` satisfies an equality test against `filter`.
///
/// - numeric: equal under `compare_numeric`, so 42, 42L and 42.0 match
/// - string, boolean, null: exact equality
/// - array: same length, element-wise match in order
/// - document: same field names, per-field match, field order ignored
/// - anything else: identical element type and identical encoded payload
///
/// Malformed embedded bytes never match.
pub fn matches(filter: ValueView<'_>, document: ValueView<'_>) -> bool {
    if filter.family() != document.family() {
        return false;
    }

    match (filter, document) {
        (f, d) if f.is_numeric() => compare_numeric(f, d).is_eq(),
        (ValueView::String(a), ValueView::String(b)) => a == b,
        (ValueView::Boolean(a), ValueView::Boolean(b)) => a == b,
        (ValueView::Null, ValueView::Null) => true,
        (ValueView::Array(a), ValueView::Array(b)) => arrays_match(a, b),
        (ValueView::Document(a), ValueView::Document(b)) => documents_match(a, b),
        (ValueView::ObjectId(a), ValueView::ObjectId(b)) => a == b,
        (ValueView::Other(a), ValueView::Other(b)) => a == b,
        _ => false,
    }
}

fn arrays_match(filter: &RawArray, document: &RawArray) -> bool {
    let mut filter_items = filter.into_iter();
    let mut document_items = document.into_iter();

    loop {
        match (filter_items.next(), document_items.next()) {
            (None, None) => return true,
            (Some(Ok(f)), Some(Ok(d))) => {
                if !matches(f.into(), d.into()) {
                    return false;
                }
            }
            // Length mismatch or malformed element
            _ => return false,
        }
    }
}

fn documents_match(filter: &RawDocument, document: &RawDocument) -> bool {
    let mut filter_keys = HashSet::new();

    for element in filter {
        let Ok((key, f)) = element else {
            return false;
        };
        filter_keys.insert(key);

        match document.get(key) {
            Ok(Some(d)) => {
                if !matches(f.into(), d.into()) {
                    return false;
                }
            }
            _ => return false,
        }
    }

    // Same key sets: every filter key resolved above, so the document may
    // not carry a key the filter lacks.
    for element in document {
        match element {
            Ok((key, _)) if filter_keys.contains(key) => {}
            _ => return false,
        }
    }
    true
}
