//! Zero-copy typed views over BSON fields
//!
//! A `ValueView` borrows from the document buffer it was read out of.
//! Scalars are copied out of the buffer (they are at most 16 bytes);
//! strings, arrays and embedded documents stay borrowed.

use std::fmt;

use bson::oid::ObjectId;
use bson::raw::{RawArray, RawBsonRef, RawDocument};
use bson::spec::ElementType;
use bson::Decimal128;

/// A borrowed, tagged view of one decoded field value.
#[derive(Debug, Clone, Copy)]
pub enum ValueView<'a> {
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// IEEE-754 binary64
    Double(f64),
    /// IEEE-754 decimal128, kept as its encoded bytes
    Decimal128(Decimal128),
    /// UTF-8 string
    String(&'a str),
    /// Boolean
    Boolean(bool),
    /// Explicit null
    Null,
    /// Embedded array
    Array(&'a RawArray),
    /// Embedded document
    Document(&'a RawDocument),
    /// 12-byte object id
    ObjectId(ObjectId),
    /// Any other BSON element, compared only byte-for-byte
    Other(RawBsonRef<'a>),
}

/// Coarse classification gating cross-type matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    Numeric,
    String,
    Boolean,
    Null,
    Array,
    Document,
    Opaque,
}

impl TypeFamily {
    /// Returns the family name used in logs and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeFamily::Numeric => "numeric",
            TypeFamily::String => "string",
            TypeFamily::Boolean => "boolean",
            TypeFamily::Null => "null",
            TypeFamily::Array => "array",
            TypeFamily::Document => "document",
            TypeFamily::Opaque => "opaque",
        }
    }
}

impl fmt::Display for TypeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl<'a> ValueView<'a> {
    /// Returns the type family of this value.
    pub fn family(&self) -> TypeFamily {
        match self {
            ValueView::Int32(_)
            | ValueView::Int64(_)
            | ValueView::Double(_)
            | ValueView::Decimal128(_) => TypeFamily::Numeric,
            ValueView::String(_) => TypeFamily::String,
            ValueView::Boolean(_) => TypeFamily::Boolean,
            ValueView::Null => TypeFamily::Null,
            ValueView::Array(_) => TypeFamily::Array,
            ValueView::Document(_) => TypeFamily::Document,
            ValueView::ObjectId(_) | ValueView::Other(_) => TypeFamily::Opaque,
        }
    }

    /// Returns the BSON element type this view was decoded from.
    pub fn element_type(&self) -> ElementType {
        match self {
            ValueView::Int32(_) => ElementType::Int32,
            ValueView::Int64(_) => ElementType::Int64,
            ValueView::Double(_) => ElementType::Double,
            ValueView::Decimal128(_) => ElementType::Decimal128,
            ValueView::String(_) => ElementType::String,
            ValueView::Boolean(_) => ElementType::Boolean,
            ValueView::Null => ElementType::Null,
            ValueView::Array(_) => ElementType::Array,
            ValueView::Document(_) => ElementType::EmbeddedDocument,
            ValueView::ObjectId(_) => ElementType::ObjectId,
            ValueView::Other(raw) => raw.element_type(),
        }
    }

    /// Whether this value belongs to the numeric family
    pub fn is_numeric(&self) -> bool {
        self.family() == TypeFamily::Numeric
    }
}

impl<'a> From<RawBsonRef<'a>> for ValueView<'a> {
    fn from(raw: RawBsonRef<'a>) -> Self {
        match raw {
            RawBsonRef::Int32(v) => ValueView::Int32(v),
            RawBsonRef::Int64(v) => ValueView::Int64(v),
            RawBsonRef::Double(v) => ValueView::Double(v),
            RawBsonRef::Decimal128(v) => ValueView::Decimal128(v),
            RawBsonRef::String(s) => ValueView::String(s),
            RawBsonRef::Boolean(b) => ValueView::Boolean(b),
            RawBsonRef::Null => ValueView::Null,
            RawBsonRef::Array(a) => ValueView::Array(a),
            RawBsonRef::Document(d) => ValueView::Document(d),
            RawBsonRef::ObjectId(oid) => ValueView::ObjectId(oid),
            other => ValueView::Other(other),
        }
    }
}

/// Reads one top-level field of `doc` as a view.
///
/// Returns `None` when the field is absent or the buffer is malformed
/// around it.
pub fn field<'a>(doc: &'a RawDocument, key: &str) -> Option<ValueView<'a>> {
    doc.get(key).ok().flatten().map(ValueView::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::rawdoc;

    #[test]
    fn test_numeric_widths_share_family() {
        assert_eq!(ValueView::Int32(1).family(), TypeFamily::Numeric);
        assert_eq!(ValueView::Int64(1).family(), TypeFamily::Numeric);
        assert_eq!(ValueView::Double(1.0).family(), TypeFamily::Numeric);
        assert_eq!(
            ValueView::Decimal128(Decimal128::from_bytes([0; 16])).family(),
            TypeFamily::Numeric
        );
    }

    #[test]
    fn test_views_borrow_from_document() {
        let doc = rawdoc! {
            "name": "alice",
            "age": 30_i32,
            "big": 5_000_000_000_i64,
            "score": 1.5,
            "active": true,
            "nothing": null,
            "tags": ["a", "b"],
            "nested": { "x": 1_i32 },
        };

        assert!(matches!(field(&doc, "name"), Some(ValueView::String("alice"))));
        assert!(matches!(field(&doc, "age"), Some(ValueView::Int32(30))));
        assert!(matches!(field(&doc, "big"), Some(ValueView::Int64(5_000_000_000))));
        assert!(matches!(field(&doc, "score"), Some(ValueView::Double(v)) if v == 1.5));
        assert!(matches!(field(&doc, "active"), Some(ValueView::Boolean(true))));
        assert!(matches!(field(&doc, "nothing"), Some(ValueView::Null)));
        assert_eq!(field(&doc, "tags").map(|v| v.family()), Some(TypeFamily::Array));
        assert_eq!(
            field(&doc, "nested").map(|v| v.family()),
            Some(TypeFamily::Document)
        );
        assert!(field(&doc, "missing").is_none());
    }

    #[test]
    fn test_other_types_are_opaque() {
        let doc = rawdoc! { "when": bson::DateTime::from_millis(0) };
        let view = field(&doc, "when").unwrap();
        assert_eq!(view.family(), TypeFamily::Opaque);
        assert_eq!(view.element_type(), ElementType::DateTime);
    }
}
