//! JSON convenience parsing
//!
//! Documents arrive as (extended) JSON from the CLI and from tests.
//! Plain JSON integers become Int32 when they fit and Int64 otherwise;
//! fractional numbers become Double. Extended JSON wrappers such as
//! `{"$numberLong": "42"}` or `{"$numberDecimal": "1.5"}` pick the type
//! explicitly.

use bson::{Bson, Document, RawDocument, RawDocumentBuf};
use serde_json::Value;

use super::errors::{ValueError, ValueResult};

/// Converts a JSON value into a BSON document.
pub fn document_from_json(value: Value) -> ValueResult<Document> {
    let bson = Bson::try_from(value).map_err(|e| ValueError::ExtendedJson(e.to_string()))?;
    match bson {
        Bson::Document(doc) => Ok(doc),
        other => Err(ValueError::NotADocument(other.element_type())),
    }
}

/// Parses JSON text into a BSON document.
pub fn document_from_json_str(text: &str) -> ValueResult<Document> {
    let value: Value = serde_json::from_str(text)?;
    document_from_json(value)
}

/// Encodes a document into its raw byte form.
pub fn to_raw_document(doc: &Document) -> ValueResult<RawDocumentBuf> {
    RawDocumentBuf::from_document(doc).map_err(|e| ValueError::Encode(e.to_string()))
}

/// Validates raw bytes as a BSON document and borrows them.
pub fn raw_document_from_bytes(bytes: &[u8]) -> ValueResult<&RawDocument> {
    RawDocument::from_bytes(bytes).map_err(|e| ValueError::Malformed(e.to_string()))
}

/// Renders a raw document as relaxed extended JSON.
pub fn document_to_json(raw: &RawDocument) -> ValueResult<Value> {
    let doc = Document::try_from(raw).map_err(|e| ValueError::Malformed(e.to_string()))?;
    Ok(Bson::Document(doc).into_relaxed_extjson())
}
